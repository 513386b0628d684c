// models/src/errors.rs

pub use thiserror::Error;

/// A user-correctable input problem. Every variant carries the message
/// shown back on the form that produced it.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// A required field was left empty.
    #[error("all fields are required")]
    MissingFields,
    /// Employee identifiers are exactly six letters or digits.
    #[error("employee id must be exactly 6 letters or digits")]
    InvalidEmployeeId,
    #[error("invalid email address")]
    InvalidEmail,
    #[error("password must be at least 8 characters and include a lowercase letter, an uppercase letter, a digit and a symbol")]
    WeakPassword,
    /// No roster entry matches the submitted (employee id, email) pair.
    #[error("no provisioned employee matches this employee id and email")]
    NotProvisioned,
    #[error("email is already registered")]
    EmailTaken,
    #[error("employee id is already registered")]
    EmployeeIdTaken,
    #[error("unknown role '{0}'")]
    UnknownRole(String),
    #[error("gender must be one of male, female or other")]
    InvalidGender(String),
    #[error("invalid date format: {0}")]
    InvalidDateFormat(String),
    #[error("age derived from date of birth must be between 0 and 120")]
    AgeOutOfRange,
    #[error("unknown work type '{0}'")]
    UnknownWorkType(String),
    #[error("ever married must be yes or no")]
    UnknownMaritalStatus(String),
    #[error("residence type must be urban or rural")]
    UnknownResidenceType(String),
    #[error("unknown smoking status '{0}'")]
    UnknownSmokingStatus(String),
    #[error("{0} must be 0 or 1")]
    InvalidFlag(&'static str),
    #[error("average glucose level must be between 40 and 400")]
    GlucoseOutOfRange,
    #[error("bmi must be between 10 and 80")]
    BmiOutOfRange,
    #[error("invalid phone number")]
    InvalidPhone,
    #[error("unknown relationship '{0}'")]
    UnknownRelationship(String),
    /// A patient already holds the maximum of two emergency contacts.
    #[error("a patient may have at most 2 emergency contacts")]
    ContactLimitExceeded,
}

/// A type alias for a `Result` that returns a `ValidationError` on failure.
pub type ValidationResult<T> = Result<T, ValidationError>;
