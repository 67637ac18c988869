//! Request-scoped identity context.
//!
//! The gate inserts one `RequestContext` into the request's extension map
//! immediately before dispatch. The map is owned by the request and dropped
//! with it on every exit path (success, early return, panic downstream), so
//! a bound principal can never bleed into a later request handled by the
//! same worker.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;

use super::principal::Principal;

#[derive(Debug, Clone)]
pub struct RequestContext {
    /// The principal bound to the session this request belongs to. Absent on
    /// bypass routes.
    pub principal: Option<Arc<Principal>>,
    /// Session identifier the principal was bound under.
    pub session_id: Option<String>,
}

/// Extractor handing handlers the principal bound to the current request.
///
/// Rejects with 401 when the gate did not bind one, which can only happen on
/// routes mounted outside the gate or on bypassed assets.
#[derive(Debug, Clone)]
pub struct CurrentPrincipal(pub Arc<Principal>);

impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .and_then(|ctx| ctx.principal.clone())
            .map(CurrentPrincipal)
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}
