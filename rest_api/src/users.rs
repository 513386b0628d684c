// rest_api/src/users.rs
//
// User management for super admins: the paginated credential roster
// joined to employee names and roles, plus soft activate/deactivate.
// Password hashes never appear in any payload.

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

use models::{Page, RoleKind, User};
use security::accounts::{set_user_active, AccountError};

use crate::patients::PageQuery;
use crate::{ApiError, AppState, PER_PAGE};

#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: u64,
    pub employee_id: String,
    pub name: Option<String>,
    pub email: String,
    pub role: Option<RoleKind>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

async fn view_of(state: &AppState, user: User) -> Result<UserView, ApiError> {
    let employee = state.identity.employee_by_id(&user.employee_id).await?;
    Ok(UserView {
        id: user.id,
        employee_id: user.employee_id,
        name: employee
            .as_ref()
            .map(|e| format!("{} {}", e.first_name, e.last_name)),
        email: user.email,
        role: employee.map(|e| e.role),
        active: user.active,
        created_at: user.created_at,
    })
}

pub async fn users_management(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let page = state
        .identity
        .list_users(query.page.unwrap_or(1), PER_PAGE)
        .await?;
    let total_users = state.identity.user_count().await?;

    let mut views = Vec::with_capacity(page.items.len());
    for user in page.items {
        views.push(view_of(&state, user).await?);
    }
    let users = Page {
        items: views,
        page: page.page,
        per_page: page.per_page,
        total: page.total,
    };

    Ok(Json(json!({
        "overview": [{
            "label": "Total Users",
            "value": total_users,
            "description": "Total registered users in the system",
        }],
        "users": users,
    })))
}

pub async fn deactivate_user(
    State(state): State<AppState>,
    Path(user_id): Path<u64>,
) -> Result<Response, ApiError> {
    toggle(state, user_id, false).await
}

pub async fn activate_user(
    State(state): State<AppState>,
    Path(user_id): Path<u64>,
) -> Result<Response, ApiError> {
    toggle(state, user_id, true).await
}

async fn toggle(state: AppState, user_id: u64, active: bool) -> Result<Response, ApiError> {
    let notice = if active { "user-activated" } else { "user-deactivated" };
    match set_user_active(state.identity.as_ref(), user_id, active).await {
        Ok(_) => Ok(Redirect::to(&format!("/users-management?notice={notice}")).into_response()),
        Err(AccountError::SuperAdminImmutable) => Ok(Redirect::to(
            "/users-management?error=cannot-modify-super-admin",
        )
        .into_response()),
        Err(AccountError::NotFound) => {
            Ok(Redirect::to("/users-management?error=user-not-found").into_response())
        }
        Err(other) => Err(other.into()),
    }
}
