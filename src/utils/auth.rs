use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::utils::error::AppError;

/// Header carrying the caller's identity, set by the authenticating gateway
/// in front of this service. Token verification happens upstream; this
/// service only consumes the resolved user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller. Rejects the request with 401 when the identity
/// header is missing or not a UUID.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Auth(format!("Missing {} header", USER_ID_HEADER)))?;

        let user_id = Uuid::parse_str(raw)
            .map_err(|_| AppError::Auth(format!("Invalid {} header", USER_ID_HEADER)))?;

        Ok(CurrentUser(user_id))
    }
}
