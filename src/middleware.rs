use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::database::AppState;
use crate::error::{AppError, AppResult};

/// Header naming the user on whose behalf a request is made
pub const ACTING_USER_HEADER: &str = "x-user-id";

/// Middleware to check for Authorization header
///
/// When an API key is configured, every request must carry it verbatim in the
/// `Authorization` header. Without a configured key the check is skipped.
pub async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    if let Some(api_key) = state.config.api_key.as_deref() {
        let presented = headers
            .get("Authorization")
            .and_then(|value| value.to_str().ok());

        if presented != Some(api_key) {
            return Err(AppError::Unauthorized(
                "Invalid or missing authorization header".to_string(),
            )
            .into_response());
        }
    }

    Ok(next.run(request).await)
}

/// The user named by the `X-User-Id` header, if any
///
/// Identity is established upstream; this only reads the result. Whether a
/// missing identity is acceptable is up to the operation.
#[derive(Debug, Clone, Default)]
pub struct ActingUser(pub Option<String>);

impl ActingUser {
    pub fn id(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Fails unless the acting user is `owner_id`
    pub fn authorize(&self, owner_id: &str) -> AppResult<()> {
        authorize_owner(self.id(), owner_id)
    }
}

impl<S> FromRequestParts<S> for ActingUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(ACTING_USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        Ok(Self(user))
    }
}

/// A user may only change their own map
pub fn authorize_owner(acting_user_id: Option<&str>, owner_id: &str) -> AppResult<()> {
    match acting_user_id {
        None => Err(AppError::Unauthorized(format!(
            "missing {} header",
            ACTING_USER_HEADER
        ))),
        Some(acting) if acting != owner_id => Err(AppError::Unauthorized(
            "you can only change your own map".to_string(),
        )),
        Some(_) => Ok(()),
    }
}
