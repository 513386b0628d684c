// rest_api/src/auth.rs
//
// Login, registration and logout. Successful logins set the session
// cookie and land the actor on the view their role calls for; failures
// echo the submitted input back so the form can be retried.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::{Form, Json};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use security::session::clearing_cookie;
use security::{authenticate, landing_route, register as run_registration, resolve_identity, AuthError};

use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub employee_id: String,
    pub email: String,
    pub password: String,
}

pub async fn login_page() -> Json<serde_json::Value> {
    Json(json!({ "page": "login" }))
}

pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, ApiError> {
    let email = form.email.trim();
    let password = form.password.trim();

    match authenticate(state.identity.as_ref(), email, password).await {
        Ok(user) => {
            let identity = resolve_identity(state.identity.as_ref(), user.id).await?;
            let token = state.sessions.issue(user.id).map_err(ApiError::from)?;
            info!(user_id = user.id, "login successful");
            Ok((
                AppendHeaders([(header::SET_COOKIE, state.sessions.session_cookie(&token))]),
                Redirect::to(landing_route(identity.as_ref())),
            )
                .into_response())
        }
        Err(AuthError::InvalidCredentials) => Ok((
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "status": "error",
                "message": AuthError::InvalidCredentials.to_string(),
                "email": email,
            })),
        )
            .into_response()),
        Err(AuthError::AccountInactive) => Ok((
            StatusCode::FORBIDDEN,
            Json(json!({
                "status": "error",
                "message": AuthError::AccountInactive.to_string(),
            })),
        )
            .into_response()),
        Err(other) => Err(other.into()),
    }
}

pub async fn register_page() -> Json<serde_json::Value> {
    Json(json!({ "page": "register" }))
}

pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, ApiError> {
    match run_registration(
        state.identity.as_ref(),
        &form.employee_id,
        &form.email,
        form.password.trim(),
    )
    .await
    {
        Ok(_) => Ok(Redirect::to("/?notice=registration-successful").into_response()),
        // Validation failures keep the submitted id and email so the
        // form can be re-rendered with them; the password is never
        // echoed back.
        Err(security::RegistrationError::Invalid(reason)) => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "status": "error",
                "message": reason.to_string(),
                "form_data": {
                    "employee_id": form.employee_id.trim(),
                    "email": form.email.trim(),
                },
            })),
        )
            .into_response()),
        Err(other) => Err(other.into()),
    }
}

pub async fn logout() -> Response {
    (
        AppendHeaders([(header::SET_COOKIE, clearing_cookie())]),
        Redirect::to("/?notice=logged-out"),
    )
        .into_response()
}
