use axum::{extract::State, Json};

use super::extract::JsonBody;
use crate::{
    app_state::AppState,
    error::AppResult,
    infrastructure::AuthUser,
    models::{LoginRequest, TokenResponse, User},
};

/// POST /api/auth
pub async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    Ok(Json(state.accounts.login(request).await?))
}

/// GET /api/auth
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<User>> {
    Ok(Json(state.accounts.current_user(auth).await?))
}
