//! Caller identity.
//!
//! Tokens are verified upstream; the gateway in front of this service forwards the
//! verified user id in `x-user-id` (and optionally `x-user-email`).

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::errors::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: String,
    pub email: Option<String>,
}

fn header(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = header(parts, USER_ID_HEADER).ok_or(AppError::Unauthorized)?;
        Ok(Caller {
            id,
            email: header(parts, USER_EMAIL_HEADER),
        })
    }
}
