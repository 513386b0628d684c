// models/src/patient.rs

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::validation;

pub const MIN_AGE: i32 = 0;
pub const MAX_AGE: i32 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            _ => Err(ValidationError::InvalidGender(value.to_string())),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whole years between `date_of_birth` and `on`, never negative for a
/// birth date in the past.
pub fn age_on(date_of_birth: NaiveDate, on: NaiveDate) -> i32 {
    let mut age = on.year() - date_of_birth.year();
    if (on.month(), on.day()) < (date_of_birth.month(), date_of_birth.day()) {
        age -= 1;
    }
    age
}

/// A demographics record. `source_row` links back to the bulk-import
/// row the record came from; manually registered patients have none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_row: Option<u64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub source_row: Option<u64>,
}

impl NewPatient {
    /// Validates raw registration input into a well-formed record:
    /// email shape, parseable date of birth, derived age within
    /// [0, 120], and a known gender.
    pub fn parse(
        first_name: &str,
        last_name: &str,
        email: &str,
        date_of_birth: &str,
        gender: &str,
        source_row: Option<u64>,
    ) -> Result<Self, ValidationError> {
        if first_name.trim().is_empty()
            || last_name.trim().is_empty()
            || email.trim().is_empty()
            || date_of_birth.trim().is_empty()
            || gender.trim().is_empty()
        {
            return Err(ValidationError::MissingFields);
        }
        if !validation::is_valid_email(email) {
            return Err(ValidationError::InvalidEmail);
        }
        let date_of_birth = parse_birth_date(date_of_birth)?;
        let gender = Gender::parse(gender)?;
        Ok(NewPatient {
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            email: email.trim().to_string(),
            date_of_birth,
            gender,
            source_row,
        })
    }

    pub fn into_patient(self, id: u64) -> Patient {
        Patient {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            date_of_birth: self.date_of_birth,
            gender: self.gender,
            source_row: self.source_row,
            created_at: Utc::now(),
        }
    }
}

/// Demographic fields an update endpoint may touch. Email and
/// provenance are deliberately absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientUpdate {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
}

impl PatientUpdate {
    pub fn parse(
        first_name: &str,
        last_name: &str,
        date_of_birth: &str,
        gender: &str,
    ) -> Result<Self, ValidationError> {
        if first_name.trim().is_empty()
            || last_name.trim().is_empty()
            || date_of_birth.trim().is_empty()
            || gender.trim().is_empty()
        {
            return Err(ValidationError::MissingFields);
        }
        Ok(PatientUpdate {
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            date_of_birth: parse_birth_date(date_of_birth)?,
            gender: Gender::parse(gender)?,
        })
    }

    pub fn apply(self, patient: &mut Patient) {
        patient.first_name = self.first_name;
        patient.last_name = self.last_name;
        patient.date_of_birth = self.date_of_birth;
        patient.gender = self.gender;
    }
}

fn parse_birth_date(value: &str) -> Result<NaiveDate, ValidationError> {
    let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDateFormat(value.to_string()))?;
    let age = age_on(date, Utc::now().date_naive());
    if !(MIN_AGE..=MAX_AGE).contains(&age) {
        return Err(ValidationError::AgeOutOfRange);
    }
    Ok(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn should_compute_age_around_birthday() {
        assert_eq!(age_on(date(1990, 6, 15), date(2020, 6, 14)), 29);
        assert_eq!(age_on(date(1990, 6, 15), date(2020, 6, 15)), 30);
        assert_eq!(age_on(date(1990, 6, 15), date(2020, 6, 16)), 30);
    }

    #[test]
    fn should_reject_out_of_range_age() {
        let err = NewPatient::parse("Ada", "Lovelace", "ada@x.com", "1850-01-01", "female", None)
            .unwrap_err();
        assert_eq!(err, ValidationError::AgeOutOfRange);
    }

    #[test]
    fn should_reject_future_birth_date() {
        let err = NewPatient::parse("Ada", "Lovelace", "ada@x.com", "2999-01-01", "female", None)
            .unwrap_err();
        assert_eq!(err, ValidationError::AgeOutOfRange);
    }

    #[test]
    fn should_reject_malformed_birth_date() {
        let err = NewPatient::parse("Ada", "Lovelace", "ada@x.com", "01/01/1990", "female", None)
            .unwrap_err();
        assert_eq!(err, ValidationError::InvalidDateFormat("01/01/1990".to_string()));
    }

    #[test]
    fn should_parse_valid_patient() {
        let new = NewPatient::parse("Ada", "Lovelace", "ada@x.com", "1990-06-15", "Female", None)
            .unwrap();
        assert_eq!(new.gender, Gender::Female);
        assert_eq!(new.date_of_birth, date(1990, 6, 15));
    }

    #[test]
    fn should_keep_email_out_of_update() {
        let mut patient = NewPatient::parse("Ada", "Lovelace", "ada@x.com", "1990-06-15", "female", None)
            .unwrap()
            .into_patient(1);
        let update = PatientUpdate::parse("Ada", "King", "1991-01-02", "other").unwrap();
        update.apply(&mut patient);
        assert_eq!(patient.last_name, "King");
        assert_eq!(patient.gender, Gender::Other);
        assert_eq!(patient.email, "ada@x.com");
    }
}
