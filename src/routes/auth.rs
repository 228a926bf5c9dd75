use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{dao::models::Actor, error::AppError};

/// Header carrying the signed-in user's identity provider uid.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the signed-in user's email.
pub const USER_EMAIL_HEADER: &str = "x-user-email";

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_owned)
        };

        match (header(USER_ID_HEADER), header(USER_EMAIL_HEADER)) {
            (Some(id), Some(email)) => Ok(Actor { id, email }),
            _ => Err(AppError::Unauthorized("sign-in required".into())),
        }
    }
}
