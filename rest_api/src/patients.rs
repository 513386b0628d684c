// rest_api/src/patients.rs
//
// Patient management: listing, registration, demographics updates, the
// cross-store delete, assessment recording and emergency contacts.
// Missing patients never 404 here; the actor is sent back to the
// listing view with a notice, matching the navigation flow.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Form, Json};
use serde::Deserialize;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use models::{AssessmentDraft, ContactDraft, NewPatient, PatientUpdate};
use store::StoreError;

use crate::{ApiError, AppState, PER_PAGE};

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct PatientForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_of_birth: String,
    pub gender: String,
}

#[derive(Debug, Deserialize)]
pub struct PatientUpdateForm {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub gender: String,
}

fn not_found_redirect() -> Response {
    Redirect::to("/patient-management?error=patient-not-found").into_response()
}

/// Overview statistics shown on the management dashboards.
async fn overview(state: &AppState) -> Result<serde_json::Value, ApiError> {
    let total_patients = state.patients.patient_count().await?;
    let total_users = state.identity.user_count().await?;
    let total_assessments = state.documents.assessment_count().await?;
    Ok(json!([
        {
            "label": "Total Patients",
            "value": total_patients,
            "description": "Registered patients in the system",
        },
        {
            "label": "Total Users",
            "value": total_users,
            "description": "Active users managing data",
        },
        {
            "label": "Total Assessments",
            "value": total_assessments,
            "description": "Stroke-risk assessments recorded",
        },
    ]))
}

pub async fn patient_management(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let page = state
        .patients
        .list_patients(query.page.unwrap_or(1), PER_PAGE)
        .await?;
    Ok(Json(json!({
        "overview": overview(&state).await?,
        "patients": page,
    })))
}

pub async fn register_patient_page(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(json!({
        "page": "register-patient",
        "overview": overview(&state).await?,
    })))
}

pub async fn register_patient(
    State(state): State<AppState>,
    Form(form): Form<PatientForm>,
) -> Result<Response, ApiError> {
    let parsed = NewPatient::parse(
        &form.first_name,
        &form.last_name,
        &form.email,
        &form.date_of_birth,
        &form.gender,
        None,
    );
    let new_patient = match parsed {
        Ok(new_patient) => new_patient,
        Err(reason) => return Ok(validation_reply(reason, patient_form_echo(&form))),
    };
    match state.patients.create_patient(new_patient).await {
        Ok(_) => Ok(Redirect::to("/patient-management?notice=patient-registered").into_response()),
        Err(StoreError::DuplicateEmail) => Ok(validation_reply(
            models::errors::ValidationError::EmailTaken,
            patient_form_echo(&form),
        )),
        Err(other) => Err(other.into()),
    }
}

pub async fn patient_info(
    State(state): State<AppState>,
    Path(patient_id): Path<u64>,
) -> Result<Response, ApiError> {
    let Some(patient) = state.patients.patient_by_id(patient_id).await? else {
        return Ok(not_found_redirect());
    };
    let assessments = state.documents.assessments_for(patient_id).await?;
    let contacts = state.documents.contacts_for(patient_id).await?;
    Ok(Json(json!({
        "patient": patient,
        "assessments": assessments,
        "emergency_contacts": contacts,
    }))
    .into_response())
}

pub async fn update_patient_page(
    State(state): State<AppState>,
    Path(patient_id): Path<u64>,
) -> Result<Response, ApiError> {
    let Some(patient) = state.patients.patient_by_id(patient_id).await? else {
        return Ok(not_found_redirect());
    };
    Ok(Json(json!({ "page": "update-patient", "patient": patient })).into_response())
}

pub async fn update_patient(
    State(state): State<AppState>,
    Path(patient_id): Path<u64>,
    Form(form): Form<PatientUpdateForm>,
) -> Result<Response, ApiError> {
    let update = match PatientUpdate::parse(
        &form.first_name,
        &form.last_name,
        &form.date_of_birth,
        &form.gender,
    ) {
        Ok(update) => update,
        Err(reason) => {
            return Ok(validation_reply(
                reason,
                json!({
                    "first_name": form.first_name.trim(),
                    "last_name": form.last_name.trim(),
                    "date_of_birth": form.date_of_birth.trim(),
                    "gender": form.gender.trim(),
                }),
            ))
        }
    };
    match state.patients.update_patient(patient_id, update).await {
        Ok(_) => Ok(Redirect::to(&format!(
            "/patient-management/patient/{patient_id}?notice=patient-updated"
        ))
        .into_response()),
        Err(StoreError::NotFound(_)) => Ok(not_found_redirect()),
        Err(other) => Err(other.into()),
    }
}

pub async fn delete_patient(
    State(state): State<AppState>,
    Path(patient_id): Path<u64>,
) -> Result<Response, ApiError> {
    match store::delete_patient(state.patients.as_ref(), state.documents.as_ref(), patient_id)
        .await
    {
        Ok(_) => Ok(Redirect::to("/patient-management?notice=patient-deleted").into_response()),
        Err(StoreError::NotFound(_)) => Ok(not_found_redirect()),
        Err(other) => {
            // The row is still present; the delete can be retried.
            error!(patient_id, detail = %other, "patient delete failed");
            Ok(Redirect::to("/patient-management?error=delete-failed").into_response())
        }
    }
}

pub async fn record_assessment(
    State(state): State<AppState>,
    Path(patient_id): Path<u64>,
    Form(draft): Form<AssessmentDraft>,
) -> Result<Response, ApiError> {
    if !state.patients.patient_exists(patient_id).await? {
        return Ok(not_found_redirect());
    }
    let assessment = match draft.clone().validate(patient_id) {
        Ok(assessment) => assessment,
        Err(reason) => return Ok(validation_reply(reason, assessment_form_echo(&draft))),
    };
    state.documents.insert_assessment(assessment).await?;
    Ok(Redirect::to(&format!(
        "/patient-management/patient/{patient_id}?notice=assessment-recorded"
    ))
    .into_response())
}

pub async fn add_emergency_contact(
    State(state): State<AppState>,
    Path(patient_id): Path<u64>,
    Form(draft): Form<ContactDraft>,
) -> Result<Response, ApiError> {
    if !state.patients.patient_exists(patient_id).await? {
        return Ok(not_found_redirect());
    }
    let contact = match draft.clone().validate(patient_id) {
        Ok(contact) => contact,
        Err(reason) => return Ok(validation_reply(reason, contact_form_echo(&draft))),
    };
    match state.documents.insert_contact(contact).await {
        Ok(_) => Ok(Redirect::to(&format!(
            "/patient-management/patient/{patient_id}?notice=contact-added"
        ))
        .into_response()),
        Err(StoreError::ContactLimit) => Ok(validation_reply(
            models::errors::ValidationError::ContactLimitExceeded,
            contact_form_echo(&draft),
        )),
        Err(other) => Err(other.into()),
    }
}

pub async fn update_emergency_contact(
    State(state): State<AppState>,
    Path((patient_id, contact_id)): Path<(u64, Uuid)>,
    Form(draft): Form<ContactDraft>,
) -> Result<Response, ApiError> {
    let Some(mut contact) = state.documents.contact_by_id(patient_id, contact_id).await? else {
        return Ok(contact_not_found_redirect(patient_id));
    };
    if let Err(reason) = draft.clone().apply(&mut contact) {
        return Ok(validation_reply(reason, contact_form_echo(&draft)));
    }
    match state.documents.put_contact(contact).await {
        Ok(()) => Ok(Redirect::to(&format!(
            "/patient-management/patient/{patient_id}?notice=contact-updated"
        ))
        .into_response()),
        Err(StoreError::NotFound(_)) => Ok(contact_not_found_redirect(patient_id)),
        Err(other) => Err(other.into()),
    }
}

pub async fn delete_emergency_contact(
    State(state): State<AppState>,
    Path((patient_id, contact_id)): Path<(u64, Uuid)>,
) -> Result<Response, ApiError> {
    match state.documents.delete_contact(patient_id, contact_id).await {
        Ok(()) => Ok(Redirect::to(&format!(
            "/patient-management/patient/{patient_id}?notice=contact-removed"
        ))
        .into_response()),
        Err(StoreError::NotFound(_)) => Ok(contact_not_found_redirect(patient_id)),
        Err(other) => Err(other.into()),
    }
}

fn contact_not_found_redirect(patient_id: u64) -> Response {
    Redirect::to(&format!(
        "/patient-management/patient/{patient_id}?error=contact-not-found"
    ))
    .into_response()
}

fn validation_reply(reason: models::errors::ValidationError, form_data: serde_json::Value) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({
            "status": "error",
            "message": reason.to_string(),
            "form_data": form_data,
        })),
    )
        .into_response()
}

fn patient_form_echo(form: &PatientForm) -> serde_json::Value {
    json!({
        "first_name": form.first_name.trim(),
        "last_name": form.last_name.trim(),
        "email": form.email.trim(),
        "date_of_birth": form.date_of_birth.trim(),
        "gender": form.gender.trim(),
    })
}

fn assessment_form_echo(draft: &AssessmentDraft) -> serde_json::Value {
    json!({
        "work_type": draft.work_type,
        "ever_married": draft.ever_married,
        "residence_type": draft.residence_type,
        "avg_glucose_level": draft.avg_glucose_level,
        "hypertensiv_status": draft.hypertensiv_status,
        "bmi": draft.bmi,
        "smoking_status": draft.smoking_status,
        "stroke_status": draft.stroke_status,
    })
}

fn contact_form_echo(draft: &ContactDraft) -> serde_json::Value {
    json!({
        "first_name": draft.first_name,
        "last_name": draft.last_name,
        "phone": draft.phone,
        "relationship": draft.relationship,
    })
}
