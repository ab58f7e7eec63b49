//! Caller identity asserted by the upstream gateway.
//!
//! `x-user-id` carries the user's UUID and `x-user-role: admin` grants admin
//! rights. Reads accept anonymous callers; writes extract [`RequireActor`].

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::domain::types::{Actor, UserRole};

use super::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Optional caller; malformed identity headers are rejected, not ignored.
#[derive(Debug, Clone, Copy)]
pub struct Viewer(pub Option<Actor>);

impl Viewer {
    pub fn user_id(&self) -> Option<Uuid> {
        self.0.map(|actor| actor.id)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RequireActor(pub Actor);

pub fn actor_from_headers(headers: &HeaderMap) -> Result<Option<Actor>, ApiError> {
    let Some(raw) = headers.get(USER_ID_HEADER) else {
        return Ok(None);
    };

    let id = raw
        .to_str()
        .ok()
        .map(str::trim)
        .and_then(|value| Uuid::parse_str(value).ok())
        .ok_or_else(|| {
            ApiError::unauthorized(Some(format!("`{USER_ID_HEADER}` must be a UUID")))
        })?;

    let role = headers
        .get(USER_ROLE_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(UserRole::parse)
        .unwrap_or_default();

    Ok(Some(Actor { id, role }))
}

impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        actor_from_headers(&parts.headers).map(Viewer)
    }
}

impl<S> FromRequestParts<S> for RequireActor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        actor_from_headers(&parts.headers)?
            .map(RequireActor)
            .ok_or_else(|| {
                ApiError::unauthorized(Some(format!("missing `{USER_ID_HEADER}` header")))
            })
    }
}
