// AuthUser extractor - the authenticated subject as seen by handlers

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Subject of a verified bearer token, placed in request extensions by
/// [`auth_middleware`](super::auth_middleware::auth_middleware).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
}

impl AuthUser {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }

    /// The single ownership check used by every owner-scoped mutation.
    pub fn ensure_owner(&self, owner_id: Uuid) -> AppResult<()> {
        if self.user_id != owner_id {
            tracing::warn!(
                requester = %self.user_id,
                owner = %owner_id,
                "Rejected mutation of a resource owned by another user"
            );
            return Err(AppError::Forbidden("User not authorized".to_string()));
        }
        Ok(())
    }
}

// Route without the middleware layer => no extension => 401, never a panic.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let user = parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or_else(|| AppError::Unauthorized("No token, authorization denied".to_string()));

        async move { user }
    }
}
