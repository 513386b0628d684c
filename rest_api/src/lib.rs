// rest_api/src/lib.rs

use axum::http::{Method, StatusCode};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use anyhow::Context;
use anyhow::Error as AnyhowError;

use models::errors::ValidationError;
use security::accounts::AccountError;
use security::middleware::{
    require_role, GuardContext, DOCTOR_ONLY, DOCTOR_OR_NURSE, HEALTH_PROFESSIONALS,
    SUPER_ADMIN_ONLY,
};
use security::registration::RegistrationError;
use security::{AuthError, SessionSigner};
use store::{
    DocumentStore, IdentityStore, PatientStore, SledDocumentStore, SledRelationalStore, StoreError,
};

mod auth;
mod config;
mod patients;
mod users;

pub use crate::config::{load_config, ServerConfig};

pub const PER_PAGE: usize = 10;

// Define the REST API error enum
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("This account has been deactivated")]
    AccountInactive,
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("An unexpected error occurred. Please try again.")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => ApiError::Validation(ValidationError::EmailTaken),
            StoreError::DuplicateEmployeeId => {
                ApiError::Validation(ValidationError::EmployeeIdTaken)
            }
            StoreError::ContactLimit => {
                ApiError::Validation(ValidationError::ContactLimitExceeded)
            }
            StoreError::NotFound(what) => ApiError::NotFound(what),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::InvalidCredentials,
            AuthError::AccountInactive => ApiError::AccountInactive,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<RegistrationError> for ApiError {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::Invalid(inner) => ApiError::Validation(inner),
            RegistrationError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::SuperAdminImmutable => {
                ApiError::Forbidden("Cannot change a super admin account")
            }
            AccountError::NotFound => ApiError::NotFound("user"),
            AccountError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

// Convert errors into HTTP responses. Raw store messages never reach
// the client; anything unanticipated is logged and reported generically.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::AccountInactive | ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(detail) => {
                error!(%detail, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "status": "error",
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

// Shared state for the Axum application
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<dyn IdentityStore>,
    pub patients: Arc<dyn PatientStore>,
    pub documents: Arc<dyn DocumentStore>,
    pub sessions: SessionSigner,
}

impl AppState {
    pub fn guard_ctx(&self) -> GuardContext {
        GuardContext {
            identity: Arc::clone(&self.identity),
            sessions: self.sessions.clone(),
        }
    }
}

// Handler for the /healthz endpoint
async fn health_check_handler() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(json!({ "status": "ok", "message": "service is healthy" })))
}

/// Builds the full route tree with each group behind its role guard.
pub fn app(state: AppState) -> Router {
    let public = Router::new()
        .route("/", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", get(auth::logout))
        .route("/healthz", get(health_check_handler));

    let health_professionals = Router::new()
        .route(
            "/patient-management",
            get(patients::patient_management).post(patients::patient_management),
        )
        .route_layer(middleware::from_fn_with_state(
            (state.guard_ctx(), HEALTH_PROFESSIONALS),
            require_role,
        ));

    let doctor_or_nurse = Router::new()
        .route("/patient-management/patient/:id", get(patients::patient_info))
        .route_layer(middleware::from_fn_with_state(
            (state.guard_ctx(), DOCTOR_OR_NURSE),
            require_role,
        ));

    let doctor_only = Router::new()
        .route(
            "/patient-management/patient/:id/update",
            get(patients::update_patient_page).post(patients::update_patient),
        )
        .route(
            "/patient-management/patient/:id/assessments",
            post(patients::record_assessment),
        )
        .route(
            "/patient-management/patient/:id/emergency-contact/add",
            post(patients::add_emergency_contact),
        )
        .route(
            "/patient-management/patient/:id/emergency-contact/:cid/update",
            post(patients::update_emergency_contact),
        )
        .route(
            "/patient-management/patient/:id/emergency-contact/:cid/delete",
            post(patients::delete_emergency_contact),
        )
        .route_layer(middleware::from_fn_with_state(
            (state.guard_ctx(), DOCTOR_ONLY),
            require_role,
        ));

    let super_admin = Router::new()
        .route(
            "/register-patient",
            get(patients::register_patient_page).post(patients::register_patient),
        )
        .route("/patient-management/patient/:id/delete", post(patients::delete_patient))
        .route("/users-management", get(users::users_management))
        .route("/deactivate-user/:id", post(users::deactivate_user))
        .route("/activate-user/:id", post(users::activate_user))
        .route_layer(middleware::from_fn_with_state(
            (state.guard_ctx(), SUPER_ADMIN_ONLY),
            require_role,
        ));

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(Any);

    Router::new()
        .merge(public)
        .merge(health_professionals)
        .merge(doctor_or_nurse)
        .merge(doctor_only)
        .merge(super_admin)
        .with_state(state)
        .layer(cors)
}

/// Opens both stores, runs the idempotent startup seeding and the
/// orphan sweep, then builds the application state.
pub async fn bootstrap(config: &ServerConfig) -> Result<AppState, AnyhowError> {
    let relational = SledRelationalStore::open(&config.relational_data_dir)
        .context("Failed to open relational store")?;
    let documents = SledDocumentStore::open(&config.documents_data_dir)
        .context("Failed to open document store")?;

    store::seed::ensure_roles(&relational)
        .await
        .context("Failed to seed roles")?;
    let admin_hash = security::hash_password(&config.admin_password)
        .map_err(|e| anyhow::anyhow!("Failed to hash bootstrap admin password: {e}"))?;
    store::seed::ensure_super_admin(
        &relational,
        &config.admin_employee_id,
        &config.admin_email,
        admin_hash,
    )
    .await
    .context("Failed to seed super admin")?;
    if let Some(roster) = &config.employee_roster {
        store::seed::import_roster(&relational, roster)
            .await
            .context("Failed to import employee roster")?;
    }

    let report = store::sweep_orphans(&relational, &documents)
        .await
        .context("Orphan sweep failed")?;
    if report.orphaned_assessments > 0 || report.orphaned_contacts > 0 {
        warn!(
            assessments = report.orphaned_assessments,
            contacts = report.orphaned_contacts,
            "removed orphaned documents at startup"
        );
    }

    Ok(AppState {
        identity: Arc::new(relational.clone()),
        patients: Arc::new(relational),
        documents: Arc::new(documents),
        sessions: SessionSigner::new(config.session_secret.as_bytes(), config.session_ttl_secs),
    })
}

// Main function to start the REST API server
pub async fn start_server(
    config: ServerConfig,
    shutdown_rx: oneshot::Receiver<()>,
) -> Result<(), AnyhowError> {
    let state = bootstrap(&config).await?;
    let app = app(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid bind address")?;
    info!(%addr, "REST API server listening");

    let listener = TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind to address: {}", addr))?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
            info!("Received shutdown signal");
        })
        .await
        .context("REST API server failed to start or run")?;

    info!("REST API server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query, State};
    use axum::http::header;
    use axum::Form;
    use models::{AssessmentDraft, ContactDraft, Employee, RoleKind};

    fn test_state() -> AppState {
        let relational = SledRelationalStore::temporary().unwrap();
        let documents = SledDocumentStore::temporary().unwrap();
        AppState {
            identity: Arc::new(relational.clone()),
            patients: Arc::new(relational),
            documents: Arc::new(documents),
            sessions: SessionSigner::new(b"test-secret-which-is-32-bytes-long!!", 3600),
        }
    }

    async fn provision(state: &AppState, employee_id: &str, email: &str, role: RoleKind) {
        state
            .identity
            .upsert_employee(Employee::new(employee_id, "Test", "User", email, role))
            .await
            .unwrap();
        security::register(state.identity.as_ref(), employee_id, email, "Abcdef1!")
            .await
            .unwrap();
    }

    fn location(response: &Response) -> &str {
        response.headers().get(header::LOCATION).unwrap().to_str().unwrap()
    }

    use crate::auth::{LoginForm, RegisterForm};
    use crate::patients::PatientForm;

    fn patient_form(email: &str) -> PatientForm {
        PatientForm {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: email.into(),
            date_of_birth: "1990-06-15".into(),
            gender: "female".into(),
        }
    }

    #[tokio::test]
    async fn should_login_and_land_by_role() {
        let state = test_state();
        provision(&state, "SA0001", "root@x.com", RoleKind::SuperAdmin).await;
        let response = auth::login(
            State(state.clone()),
            Form(LoginForm { email: "root@x.com".into(), password: "Abcdef1!".into() }),
        )
        .await
        .unwrap();
        assert!(response.status().is_redirection());
        assert_eq!(location(&response), "/users-management");
        let cookie = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
        let token = cookie.strip_prefix("session=").unwrap().split(';').next().unwrap();
        assert_eq!(state.sessions.verify(token), Some(1));

        provision(&state, "DOC001", "doc@x.com", RoleKind::Doctor).await;
        let response = auth::login(
            State(state.clone()),
            Form(LoginForm { email: "doc@x.com".into(), password: "Abcdef1!".into() }),
        )
        .await
        .unwrap();
        assert_eq!(location(&response), "/patient-management");
    }

    #[tokio::test]
    async fn should_reject_bad_credentials_with_generic_message() {
        let state = test_state();
        provision(&state, "DOC001", "doc@x.com", RoleKind::Doctor).await;
        let wrong = auth::login(
            State(state.clone()),
            Form(LoginForm { email: "doc@x.com".into(), password: "Wrong123!".into() }),
        )
        .await
        .unwrap();
        let unknown = auth::login(
            State(state.clone()),
            Form(LoginForm { email: "ghost@x.com".into(), password: "Abcdef1!".into() }),
        )
        .await
        .unwrap();
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn should_block_deactivated_user_with_distinct_status() {
        let state = test_state();
        provision(&state, "DOC001", "doc@x.com", RoleKind::Doctor).await;
        let user = state.identity.user_by_email("doc@x.com").await.unwrap().unwrap();
        state.identity.set_user_active(user.id, false).await.unwrap();
        let response = auth::login(
            State(state.clone()),
            Form(LoginForm { email: "doc@x.com".into(), password: "Abcdef1!".into() }),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn should_register_once_then_report_taken_email() {
        let state = test_state();
        state
            .identity
            .upsert_employee(Employee::new("ABC123", "Jo", "Doe", "a@x.com", RoleKind::Nurse))
            .await
            .unwrap();
        let form = || RegisterForm {
            employee_id: "ABC123".into(),
            email: "a@x.com".into(),
            password: "Abcdef1!".into(),
        };
        let first = auth::register(State(state.clone()), Form(form())).await.unwrap();
        assert!(first.status().is_redirection());
        let second = auth::register(State(state.clone()), Form(form())).await.unwrap();
        assert_eq!(second.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn should_cascade_patient_delete_across_stores() {
        let state = test_state();
        patients::register_patient(State(state.clone()), Form(patient_form("p@x.com")))
            .await
            .unwrap();
        let patient = state.patients.list_patients(1, 10).await.unwrap().items.remove(0);

        let draft = AssessmentDraft {
            work_type: "private".into(),
            ever_married: "yes".into(),
            residence_type: "urban".into(),
            avg_glucose_level: 120.0,
            hypertensiv_status: "1".into(),
            bmi: 25.0,
            smoking_status: "smokes".into(),
            stroke_status: Some("0".into()),
        };
        let recorded = patients::record_assessment(
            State(state.clone()),
            Path(patient.id),
            Form(draft),
        )
        .await
        .unwrap();
        assert!(recorded.status().is_redirection());
        assert_eq!(state.documents.assessments_for(patient.id).await.unwrap().len(), 1);

        let deleted = patients::delete_patient(State(state.clone()), Path(patient.id))
            .await
            .unwrap();
        assert_eq!(location(&deleted), "/patient-management?notice=patient-deleted");
        assert!(state.patients.patient_by_id(patient.id).await.unwrap().is_none());
        assert!(state.documents.assessments_for(patient.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_reject_out_of_range_assessment() {
        let state = test_state();
        patients::register_patient(State(state.clone()), Form(patient_form("p@x.com")))
            .await
            .unwrap();
        let patient = state.patients.list_patients(1, 10).await.unwrap().items.remove(0);
        let draft = AssessmentDraft {
            work_type: "private".into(),
            ever_married: "yes".into(),
            residence_type: "urban".into(),
            avg_glucose_level: 500.0,
            hypertensiv_status: "0".into(),
            bmi: 25.0,
            smoking_status: "smokes".into(),
            stroke_status: None,
        };
        let response = patients::record_assessment(State(state.clone()), Path(patient.id), Form(draft))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(state.documents.assessments_for(patient.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_redirect_when_assessing_missing_patient() {
        let state = test_state();
        let response = patients::record_assessment(
            State(state.clone()),
            Path(404),
            Form(AssessmentDraft::default()),
        )
        .await
        .unwrap();
        assert_eq!(location(&response), "/patient-management?error=patient-not-found");
    }

    #[tokio::test]
    async fn should_cap_emergency_contacts_at_two() {
        let state = test_state();
        patients::register_patient(State(state.clone()), Form(patient_form("p@x.com")))
            .await
            .unwrap();
        let patient = state.patients.list_patients(1, 10).await.unwrap().items.remove(0);
        let draft = |phone: &str| ContactDraft {
            first_name: "Kin".into(),
            last_name: "Folk".into(),
            phone: phone.into(),
            relationship: "spouse".into(),
        };
        for phone in ["+1555000001", "+1555000002"] {
            let ok = patients::add_emergency_contact(
                State(state.clone()),
                Path(patient.id),
                Form(draft(phone)),
            )
            .await
            .unwrap();
            assert!(ok.status().is_redirection());
        }
        let third = patients::add_emergency_contact(
            State(state.clone()),
            Path(patient.id),
            Form(draft("+1555000003")),
        )
        .await
        .unwrap();
        assert_eq!(third.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(state.documents.contacts_for(patient.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn should_refuse_to_deactivate_super_admin() {
        let state = test_state();
        provision(&state, "SA0001", "root@x.com", RoleKind::SuperAdmin).await;
        provision(&state, "DOC001", "doc@x.com", RoleKind::Doctor).await;
        let admin = state.identity.user_by_email("root@x.com").await.unwrap().unwrap();
        let doctor = state.identity.user_by_email("doc@x.com").await.unwrap().unwrap();

        let refused = users::deactivate_user(State(state.clone()), Path(admin.id)).await.unwrap();
        assert_eq!(location(&refused), "/users-management?error=cannot-modify-super-admin");

        let done = users::deactivate_user(State(state.clone()), Path(doctor.id)).await.unwrap();
        assert_eq!(location(&done), "/users-management?notice=user-deactivated");
        assert!(!state.identity.user_by_id(doctor.id).await.unwrap().unwrap().active);
    }

    #[tokio::test]
    async fn should_paginate_patient_listing() {
        let state = test_state();
        for i in 0..12 {
            patients::register_patient(
                State(state.clone()),
                Form(patient_form(&format!("p{i}@x.com"))),
            )
            .await
            .unwrap();
        }
        let body = patients::patient_management(
            State(state.clone()),
            Query(patients::PageQuery { page: None }),
        )
        .await
        .unwrap();
        let value = body.0;
        assert_eq!(value["patients"]["items"].as_array().unwrap().len(), PER_PAGE);
        assert_eq!(value["patients"]["total"], 12);
        let second = patients::patient_management(
            State(state.clone()),
            Query(patients::PageQuery { page: Some(2) }),
        )
        .await
        .unwrap();
        assert_eq!(second.0["patients"]["items"].as_array().unwrap().len(), 2);
    }
}
