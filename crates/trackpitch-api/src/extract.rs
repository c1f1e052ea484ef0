//! Actor-context extraction from gateway headers.
//!
//! Authentication happens at the edge; by the time a request reaches this
//! service the gateway has stamped the caller's identity onto
//! `x-user-id` / `x-user-role` headers. `x-correlation-id` is optional
//! and minted fresh when absent.

use axum::Json;
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use trackpitch_core::actor::{ActorContext, ActorRole};
use uuid::Uuid;

use crate::error::ErrorBody;

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the authenticated user role.
pub const USER_ROLE_HEADER: &str = "x-user-role";
/// Header carrying the request correlation id.
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Extractor wrapper around [`ActorContext`].
#[derive(Debug, Clone, Copy)]
pub struct Actor(pub ActorContext);

fn header_str<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorBody>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor_id = header_str(parts, USER_ID_HEADER)
            .and_then(|raw| Uuid::parse_str(raw).ok())
            .ok_or((
                StatusCode::UNAUTHORIZED,
                Json(ErrorBody {
                    error: "unauthenticated",
                    message: format!("missing or invalid {USER_ID_HEADER} header"),
                }),
            ))?;

        let role = header_str(parts, USER_ROLE_HEADER)
            .map_or(ActorRole::Unknown, ActorRole::parse);

        let correlation_id = header_str(parts, CORRELATION_ID_HEADER)
            .and_then(|raw| Uuid::parse_str(raw).ok())
            .unwrap_or_else(Uuid::new_v4);

        Ok(Self(ActorContext::new(actor_id, role, correlation_id)))
    }
}
