// Token verification middleware
// Verifies the bearer token and injects the authenticated subject into request extensions

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use super::auth_extractor::AuthUser;
use crate::{
    error::{AppError, AppResult},
    infrastructure::security::SecurityService,
};

/// Legacy header some clients still send instead of `Authorization: Bearer`.
pub const LEGACY_TOKEN_HEADER: &str = "x-auth-token";

/// Trait for application state that can verify tokens
pub trait HasSecurityService {
    fn security(&self) -> &SecurityService;
}

/// Rejects the request with 401 unless it carries a valid, unexpired token.
pub async fn auth_middleware<T>(
    State(app_state): State<T>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError>
where
    T: HasSecurityService + Clone + Send + Sync + 'static,
{
    let token = extract_token(request.headers())?;
    let user_id = app_state.security().validate_token(&token)?;

    request.extensions_mut().insert(AuthUser::new(user_id));

    Ok(next.run(request).await)
}

/// Pull the raw token out of `Authorization: Bearer <t>` or `x-auth-token`.
pub fn extract_token(headers: &HeaderMap) -> AppResult<String> {
    if let Some(auth_header) = headers.get(AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::invalid_token())?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .or_else(|| auth_str.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(AppError::invalid_token)?;
        return Ok(token.to_string());
    }

    if let Some(legacy) = headers.get(LEGACY_TOKEN_HEADER) {
        let token = legacy
            .to_str()
            .map(str::trim)
            .map_err(|_| AppError::invalid_token())?;
        if !token.is_empty() {
            return Ok(token.to_string());
        }
    }

    Err(AppError::Unauthorized(
        "No token, authorization denied".to_string(),
    ))
}
