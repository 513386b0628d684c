// store/src/documents.rs
//
// Sled-backed document store. Separate database from the relational
// store; the only link between the two is the numeric patient id
// embedded in the document keys.

use std::collections::BTreeSet;
use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

use models::contact::MAX_CONTACTS_PER_PATIENT;
use models::{Assessment, EmergencyContact};

use crate::errors::{StoreError, StoreResult};
use crate::keys::{doc_key, doc_prefix, read_id};
use crate::DocumentStore;

const TREE_ASSESSMENTS: &str = "assessments";
const TREE_CONTACTS: &str = "emergency_contacts";

#[derive(Debug, Clone)]
pub struct SledDocumentStore {
    assessments: sled::Tree,
    contacts: sled::Tree,
}

impl SledDocumentStore {
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        info!(path = %path.as_ref().display(), "opening document store");
        Self::from_db(sled::open(path)?)
    }

    /// In-memory instance for tests.
    pub fn temporary() -> StoreResult<Self> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: sled::Db) -> StoreResult<Self> {
        Ok(SledDocumentStore {
            assessments: db.open_tree(TREE_ASSESSMENTS)?,
            contacts: db.open_tree(TREE_CONTACTS)?,
        })
    }

    fn delete_prefix(tree: &sled::Tree, patient_id: u64) -> StoreResult<u64> {
        let keys: Vec<sled::IVec> = tree
            .scan_prefix(doc_prefix(patient_id))
            .keys()
            .collect::<Result<_, _>>()?;
        let mut removed = 0;
        for key in keys {
            if tree.remove(&key)?.is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn collect_patient_ids(tree: &sled::Tree, into: &mut BTreeSet<u64>) -> StoreResult<()> {
        for key in tree.iter().keys() {
            into.insert(read_id(&key?));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for SledDocumentStore {
    async fn insert_assessment(&self, assessment: Assessment) -> StoreResult<Assessment> {
        let key = doc_key(assessment.patient_id, &assessment.id);
        self.assessments.insert(&key[..], serde_json::to_vec(&assessment)?)?;
        debug!(patient_id = assessment.patient_id, "recorded assessment");
        Ok(assessment)
    }

    async fn assessments_for(&self, patient_id: u64) -> StoreResult<Vec<Assessment>> {
        let mut out = Vec::new();
        for entry in self.assessments.scan_prefix(doc_prefix(patient_id)) {
            let (_, value) = entry?;
            out.push(serde_json::from_slice(&value)?);
        }
        Ok(out)
    }

    async fn assessment_count(&self) -> StoreResult<u64> {
        Ok(self.assessments.len() as u64)
    }

    async fn delete_assessments_for(&self, patient_id: u64) -> StoreResult<u64> {
        Self::delete_prefix(&self.assessments, patient_id)
    }

    async fn insert_contact(&self, contact: EmergencyContact) -> StoreResult<EmergencyContact> {
        // Check-then-act: the store has no row-count constraint, so the
        // cap is enforced here at write time.
        let existing = self.contacts.scan_prefix(doc_prefix(contact.patient_id)).count();
        if existing >= MAX_CONTACTS_PER_PATIENT {
            return Err(StoreError::ContactLimit);
        }
        let key = doc_key(contact.patient_id, &contact.id);
        self.contacts.insert(&key[..], serde_json::to_vec(&contact)?)?;
        Ok(contact)
    }

    async fn contact_by_id(
        &self,
        patient_id: u64,
        contact_id: Uuid,
    ) -> StoreResult<Option<EmergencyContact>> {
        match self.contacts.get(doc_key(patient_id, &contact_id))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn put_contact(&self, contact: EmergencyContact) -> StoreResult<()> {
        let key = doc_key(contact.patient_id, &contact.id);
        if !self.contacts.contains_key(&key[..])? {
            return Err(StoreError::NotFound("emergency contact"));
        }
        self.contacts.insert(&key[..], serde_json::to_vec(&contact)?)?;
        Ok(())
    }

    async fn delete_contact(&self, patient_id: u64, contact_id: Uuid) -> StoreResult<()> {
        match self.contacts.remove(doc_key(patient_id, &contact_id))? {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound("emergency contact")),
        }
    }

    async fn contacts_for(&self, patient_id: u64) -> StoreResult<Vec<EmergencyContact>> {
        let mut out = Vec::new();
        for entry in self.contacts.scan_prefix(doc_prefix(patient_id)) {
            let (_, value) = entry?;
            out.push(serde_json::from_slice(&value)?);
        }
        Ok(out)
    }

    async fn delete_contacts_for(&self, patient_id: u64) -> StoreResult<u64> {
        let removed = Self::delete_prefix(&self.contacts, patient_id)?;
        if removed > 0 {
            debug!(patient_id, removed, "removed emergency contacts");
        }
        Ok(removed)
    }

    async fn referenced_patient_ids(&self) -> StoreResult<BTreeSet<u64>> {
        let mut ids = BTreeSet::new();
        Self::collect_patient_ids(&self.assessments, &mut ids)?;
        Self::collect_patient_ids(&self.contacts, &mut ids)?;
        Ok(ids)
    }
}
