// models/src/contact.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ValidationError;
use crate::validation;

/// Hard cap on emergency contacts per patient, enforced at write time
/// because the document store has no row-count constraint.
pub const MAX_CONTACTS_PER_PATIENT: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relationship {
    #[serde(rename = "parent")]
    Parent,
    #[serde(rename = "brother")]
    Brother,
    #[serde(rename = "sister")]
    Sister,
    #[serde(rename = "family friend")]
    FamilyFriend,
    #[serde(rename = "friend")]
    Friend,
    #[serde(rename = "spouse")]
    Spouse,
}

impl Relationship {
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let normalized = value.trim().to_ascii_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "parent" => Ok(Relationship::Parent),
            "brother" => Ok(Relationship::Brother),
            "sister" => Ok(Relationship::Sister),
            "family friend" => Ok(Relationship::FamilyFriend),
            "friend" => Ok(Relationship::Friend),
            "spouse" => Ok(Relationship::Spouse),
            _ => Err(ValidationError::UnknownRelationship(value.to_string())),
        }
    }
}

/// Stored emergency-contact document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub id: Uuid,
    pub patient_id: u64,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub relationship: Relationship,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw contact form input; used for both create and update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactDraft {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub relationship: String,
}

impl ContactDraft {
    fn checked(&self) -> Result<Relationship, ValidationError> {
        if self.first_name.trim().is_empty()
            || self.last_name.trim().is_empty()
            || self.phone.trim().is_empty()
            || self.relationship.trim().is_empty()
        {
            return Err(ValidationError::MissingFields);
        }
        if !validation::is_valid_phone(self.phone.trim()) {
            return Err(ValidationError::InvalidPhone);
        }
        Relationship::parse(&self.relationship)
    }

    pub fn validate(self, patient_id: u64) -> Result<EmergencyContact, ValidationError> {
        let relationship = self.checked()?;
        let now = Utc::now();
        Ok(EmergencyContact {
            id: Uuid::new_v4(),
            patient_id,
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            relationship,
            created_at: now,
            updated_at: now,
        })
    }

    /// Validates the draft and applies it onto an existing contact,
    /// keeping identifier and creation timestamp.
    pub fn apply(self, contact: &mut EmergencyContact) -> Result<(), ValidationError> {
        let relationship = self.checked()?;
        contact.first_name = self.first_name.trim().to_string();
        contact.last_name = self.last_name.trim().to_string();
        contact.phone = self.phone.trim().to_string();
        contact.relationship = relationship;
        contact.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ContactDraft {
        ContactDraft {
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            phone: "+14845551234".into(),
            relationship: "family friend".into(),
        }
    }

    #[test]
    fn should_build_contact_from_valid_draft() {
        let contact = draft().validate(9).unwrap();
        assert_eq!(contact.patient_id, 9);
        assert_eq!(contact.relationship, Relationship::FamilyFriend);
    }

    #[test]
    fn should_reject_bad_phone() {
        let mut d = draft();
        d.phone = "call me".into();
        assert_eq!(d.validate(9), Err(ValidationError::InvalidPhone));
    }

    #[test]
    fn should_reject_unknown_relationship() {
        let mut d = draft();
        d.relationship = "neighbor".into();
        assert_eq!(
            d.validate(9),
            Err(ValidationError::UnknownRelationship("neighbor".to_string()))
        );
    }

    #[test]
    fn should_update_in_place_and_bump_timestamp() {
        let mut contact = draft().validate(9).unwrap();
        let created = contact.created_at;
        let mut update = draft();
        update.relationship = "spouse".into();
        update.apply(&mut contact).unwrap();
        assert_eq!(contact.relationship, Relationship::Spouse);
        assert_eq!(contact.created_at, created);
        assert!(contact.updated_at >= created);
    }
}
