// store/src/cascade.rs
//
// The cross-store consistency boundary. The relational and document
// databases are disjoint engines with no shared transaction, so patient
// deletion is an ordered two-phase operation: documents first, row
// last. If document deletion fails the row must survive, leaving a
// retryable state instead of orphaned documents. `sweep_orphans` is the
// reconciliation routine for anything that slips through anyway.

use tracing::{info, warn};

use crate::errors::{StoreError, StoreResult};
use crate::{DocumentStore, PatientStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CascadeReport {
    pub assessments_deleted: u64,
    pub contacts_deleted: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepReport {
    pub orphaned_assessments: u64,
    pub orphaned_contacts: u64,
}

/// Deletes a patient and every document referencing it. Assessment and
/// contact documents go before the patient row; any store failure
/// aborts the sequence with the row still in place.
pub async fn delete_patient(
    patients: &dyn PatientStore,
    documents: &dyn DocumentStore,
    patient_id: u64,
) -> StoreResult<CascadeReport> {
    if !patients.patient_exists(patient_id).await? {
        return Err(StoreError::NotFound("patient"));
    }
    let assessments_deleted = documents.delete_assessments_for(patient_id).await?;
    let contacts_deleted = documents.delete_contacts_for(patient_id).await?;
    patients.remove_patient_row(patient_id).await?;
    info!(patient_id, assessments_deleted, contacts_deleted, "deleted patient");
    Ok(CascadeReport { assessments_deleted, contacts_deleted })
}

/// Removes documents whose patient id no longer resolves to a row.
pub async fn sweep_orphans(
    patients: &dyn PatientStore,
    documents: &dyn DocumentStore,
) -> StoreResult<SweepReport> {
    let mut report = SweepReport::default();
    for patient_id in documents.referenced_patient_ids().await? {
        if patients.patient_exists(patient_id).await? {
            continue;
        }
        let assessments = documents.delete_assessments_for(patient_id).await?;
        let contacts = documents.delete_contacts_for(patient_id).await?;
        if assessments > 0 || contacts > 0 {
            warn!(patient_id, assessments, contacts, "swept orphaned documents");
        }
        report.orphaned_assessments += assessments;
        report.orphaned_contacts += contacts;
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SledDocumentStore, SledRelationalStore};
    use models::{AssessmentDraft, ContactDraft, NewPatient, Patient};

    async fn patient(store: &SledRelationalStore, email: &str) -> Patient {
        let new = NewPatient::parse("Ada", "Lovelace", email, "1990-06-15", "female", None).unwrap();
        crate::PatientStore::create_patient(store, new).await.unwrap()
    }

    async fn record_assessment(docs: &SledDocumentStore, patient_id: u64) {
        let assessment = AssessmentDraft {
            work_type: "private".into(),
            ever_married: "no".into(),
            residence_type: "rural".into(),
            avg_glucose_level: 90.0,
            hypertensiv_status: "0".into(),
            bmi: 21.0,
            smoking_status: "unknown".into(),
            stroke_status: None,
        }
        .validate(patient_id)
        .unwrap();
        crate::DocumentStore::insert_assessment(docs, assessment).await.unwrap();
    }

    async fn record_contact(docs: &SledDocumentStore, patient_id: u64) {
        let contact = ContactDraft {
            first_name: "Kin".into(),
            last_name: "Folk".into(),
            phone: "+1555123456".into(),
            relationship: "spouse".into(),
        }
        .validate(patient_id)
        .unwrap();
        crate::DocumentStore::insert_contact(docs, contact).await.unwrap();
    }

    #[tokio::test]
    async fn should_leave_no_documents_after_patient_delete() {
        let relational = SledRelationalStore::temporary().unwrap();
        let docs = SledDocumentStore::temporary().unwrap();
        let p = patient(&relational, "p@x.com").await;
        record_assessment(&docs, p.id).await;
        record_assessment(&docs, p.id).await;
        record_contact(&docs, p.id).await;

        let report = delete_patient(&relational, &docs, p.id).await.unwrap();
        assert_eq!(report.assessments_deleted, 2);
        assert_eq!(report.contacts_deleted, 1);
        assert!(!crate::PatientStore::patient_exists(&relational, p.id).await.unwrap());
        assert!(crate::DocumentStore::assessments_for(&docs, p.id).await.unwrap().is_empty());
        assert!(crate::DocumentStore::contacts_for(&docs, p.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_refuse_delete_for_unknown_patient() {
        let relational = SledRelationalStore::temporary().unwrap();
        let docs = SledDocumentStore::temporary().unwrap();
        assert!(matches!(
            delete_patient(&relational, &docs, 404).await.unwrap_err(),
            StoreError::NotFound("patient")
        ));
    }

    #[tokio::test]
    async fn should_not_touch_other_patients_documents() {
        let relational = SledRelationalStore::temporary().unwrap();
        let docs = SledDocumentStore::temporary().unwrap();
        let doomed = patient(&relational, "a@x.com").await;
        let kept = patient(&relational, "b@x.com").await;
        record_assessment(&docs, doomed.id).await;
        record_assessment(&docs, kept.id).await;

        delete_patient(&relational, &docs, doomed.id).await.unwrap();
        assert_eq!(crate::DocumentStore::assessments_for(&docs, kept.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn should_sweep_only_orphaned_documents() {
        let relational = SledRelationalStore::temporary().unwrap();
        let docs = SledDocumentStore::temporary().unwrap();
        let live = patient(&relational, "live@x.com").await;
        record_assessment(&docs, live.id).await;
        // Documents referencing a patient id that never had a row.
        record_assessment(&docs, 9000).await;
        record_contact(&docs, 9000).await;

        let report = sweep_orphans(&relational, &docs).await.unwrap();
        assert_eq!(report.orphaned_assessments, 1);
        assert_eq!(report.orphaned_contacts, 1);
        assert_eq!(crate::DocumentStore::assessments_for(&docs, live.id).await.unwrap().len(), 1);

        // A second sweep finds nothing.
        let again = sweep_orphans(&relational, &docs).await.unwrap();
        assert_eq!(again, SweepReport::default());
    }
}
