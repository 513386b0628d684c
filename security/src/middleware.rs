// security/src/middleware.rs
//
// The authorization guard: one middleware function parameterized by the
// role set a route group requires. Identity is re-resolved from the
// store on every pass, and every ambiguous outcome (no cookie, bad
// token, unresolvable user, role outside the set) takes the same path:
// session cleared, back to login.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use tracing::debug;

use models::RoleKind;
use store::IdentityStore;

use crate::identity::{resolve_identity, Identity};
use crate::session::{self, SessionSigner};

pub const HEALTH_PROFESSIONALS: &[RoleKind] =
    &[RoleKind::SuperAdmin, RoleKind::Doctor, RoleKind::Nurse];
pub const SUPER_ADMIN_ONLY: &[RoleKind] = &[RoleKind::SuperAdmin];
pub const DOCTOR_OR_NURSE: &[RoleKind] = &[RoleKind::Doctor, RoleKind::Nurse];
pub const DOCTOR_ONLY: &[RoleKind] = &[RoleKind::Doctor];

/// Everything the guard needs to resolve a request's identity.
#[derive(Clone)]
pub struct GuardContext {
    pub identity: Arc<dyn IdentityStore>,
    pub sessions: SessionSigner,
}

/// True when the resolved identity may pass a gate requiring `allowed`.
pub fn permits(identity: Option<&Identity>, allowed: &[RoleKind]) -> bool {
    identity.is_some_and(|identity| allowed.contains(&identity.role()))
}

/// Route middleware. Attach with
/// `middleware::from_fn_with_state((guard_ctx, DOCTOR_ONLY), require_role)`.
/// On success the resolved `Identity` is inserted into request
/// extensions for the handler.
pub async fn require_role(
    State((ctx, allowed)): State<(GuardContext, &'static [RoleKind])>,
    mut req: Request,
    next: Next,
) -> Response {
    let identity = resolve_from_request(&ctx, req.headers()).await;
    if !permits(identity.as_ref(), allowed) {
        debug!(path = %req.uri().path(), "access denied, clearing session");
        return deny();
    }
    if let Some(identity) = identity {
        req.extensions_mut().insert(identity);
    }
    next.run(req).await
}

async fn resolve_from_request(ctx: &GuardContext, headers: &HeaderMap) -> Option<Identity> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    let token = session::token_from_cookie_header(cookie_header)?;
    let user_id = ctx.sessions.verify(token)?;
    resolve_identity(ctx.identity.as_ref(), user_id).await.ok().flatten()
}

/// Fail-closed exit: clear all session state and send the actor back to
/// the login view with an access-denied signal.
pub fn deny() -> Response {
    (
        AppendHeaders([(header::SET_COOKIE, session::clearing_cookie())]),
        Redirect::to("/?error=access-denied"),
    )
        .into_response()
}
