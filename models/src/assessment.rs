// models/src/assessment.rs
//
// Stroke-risk assessment observations. These live in the document
// store, so the stored shape is a JSON document keyed by a generated
// identifier and referencing the patient by numeric id only.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ValidationError;

pub const GLUCOSE_RANGE: (f64, f64) = (40.0, 400.0);
pub const BMI_RANGE: (f64, f64) = (10.0, 80.0);

/// Normalizes a categorical form value: trimmed, lower-cased, with the
/// dataset's hyphen/underscore spellings folded to spaces.
fn fold(value: &str) -> String {
    value.trim().to_ascii_lowercase().replace(['-', '_'], " ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkType {
    #[serde(rename = "private")]
    Private,
    #[serde(rename = "self employed")]
    SelfEmployed,
    #[serde(rename = "govt job")]
    GovtJob,
    #[serde(rename = "never worked")]
    NeverWorked,
    #[serde(rename = "children")]
    Children,
}

impl WorkType {
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match fold(value).as_str() {
            "private" => Ok(WorkType::Private),
            "self employed" => Ok(WorkType::SelfEmployed),
            "govt job" => Ok(WorkType::GovtJob),
            "never worked" => Ok(WorkType::NeverWorked),
            "children" => Ok(WorkType::Children),
            _ => Err(ValidationError::UnknownWorkType(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EverMarried {
    Yes,
    No,
}

impl EverMarried {
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match fold(value).as_str() {
            "yes" => Ok(EverMarried::Yes),
            "no" => Ok(EverMarried::No),
            _ => Err(ValidationError::UnknownMaritalStatus(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResidenceType {
    Urban,
    Rural,
}

impl ResidenceType {
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match fold(value).as_str() {
            "urban" => Ok(ResidenceType::Urban),
            "rural" => Ok(ResidenceType::Rural),
            _ => Err(ValidationError::UnknownResidenceType(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SmokingStatus {
    #[serde(rename = "formerly smoked")]
    FormerlySmoked,
    #[serde(rename = "never smoked")]
    NeverSmoked,
    #[serde(rename = "smokes")]
    Smokes,
    #[serde(rename = "unknown")]
    Unknown,
}

impl SmokingStatus {
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match fold(value).as_str() {
            "formerly smoked" => Ok(SmokingStatus::FormerlySmoked),
            "never smoked" => Ok(SmokingStatus::NeverSmoked),
            "smokes" => Ok(SmokingStatus::Smokes),
            "unknown" => Ok(SmokingStatus::Unknown),
            _ => Err(ValidationError::UnknownSmokingStatus(value.to_string())),
        }
    }
}

/// A clinical 0/1 status flag, kept in the "0"/"1" wire form the
/// source dataset uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Flag {
    #[serde(rename = "0")]
    No,
    #[serde(rename = "1")]
    Yes,
}

impl Flag {
    pub fn parse(field: &'static str, value: &str) -> Result<Self, ValidationError> {
        match value.trim() {
            "0" => Ok(Flag::No),
            "1" => Ok(Flag::Yes),
            _ => Err(ValidationError::InvalidFlag(field)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Flag::No => "0",
            Flag::Yes => "1",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored assessment document. Append-only: documents are never updated
/// or individually deleted, only bulk-removed with their patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub id: Uuid,
    pub patient_id: u64,
    pub work_type: WorkType,
    pub ever_married: EverMarried,
    pub residence_type: ResidenceType,
    pub avg_glucose_level: f64,
    pub hypertension: Flag,
    pub bmi: f64,
    pub smoking_status: SmokingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Flag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_row: Option<u64>,
    pub recorded_at: DateTime<Utc>,
}

/// Raw assessment form input, exactly as the recording endpoint
/// receives it. Absent fields deserialize to defaults and fail the
/// matching check instead of rejecting the whole form. `validate` is
/// the only path to a stored document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AssessmentDraft {
    pub work_type: String,
    pub ever_married: String,
    pub residence_type: String,
    pub avg_glucose_level: f64,
    pub hypertensiv_status: String,
    pub bmi: f64,
    pub smoking_status: String,
    pub stroke_status: Option<String>,
}

impl AssessmentDraft {
    /// Checks every categorical field against its allowed set and both
    /// numeric fields against their clinical ranges, returning the
    /// normalized document on success.
    pub fn validate(self, patient_id: u64) -> Result<Assessment, ValidationError> {
        let work_type = WorkType::parse(&self.work_type)?;
        let ever_married = EverMarried::parse(&self.ever_married)?;
        let residence_type = ResidenceType::parse(&self.residence_type)?;
        let hypertension = Flag::parse("hypertensiv_status", &self.hypertensiv_status)?;
        let smoking_status = SmokingStatus::parse(&self.smoking_status)?;
        let stroke = match self.stroke_status.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(Flag::parse("stroke_status", raw)?),
        };
        if !(GLUCOSE_RANGE.0..=GLUCOSE_RANGE.1).contains(&self.avg_glucose_level) {
            return Err(ValidationError::GlucoseOutOfRange);
        }
        if !(BMI_RANGE.0..=BMI_RANGE.1).contains(&self.bmi) {
            return Err(ValidationError::BmiOutOfRange);
        }
        Ok(Assessment {
            id: Uuid::new_v4(),
            patient_id,
            work_type,
            ever_married,
            residence_type,
            avg_glucose_level: self.avg_glucose_level,
            hypertension,
            bmi: self.bmi,
            smoking_status,
            stroke,
            source_row: None,
            recorded_at: Utc::now(),
        })
    }
}
