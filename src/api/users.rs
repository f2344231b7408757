use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use super::extract::JsonBody;
use crate::{
    app_state::AppState,
    error::AppResult,
    infrastructure::AuthUser,
    models::{RegisterRequest, TokenResponse, User},
    validation::parse_id,
};

const USER_NOT_FOUND: &str = "User not found";

/// POST /api/users
pub async fn register(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> AppResult<Json<TokenResponse>> {
    Ok(Json(state.accounts.register(request).await?))
}

/// GET /api/users
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<User>>> {
    Ok(Json(state.accounts.list_users().await?))
}

/// GET /api/users/{id}
pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<User>> {
    let id = parse_id(&id, USER_NOT_FOUND)?;
    Ok(Json(state.accounts.get_user(id).await?))
}

/// DELETE /api/users/{id}
pub async fn delete_one(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let id = parse_id(&id, USER_NOT_FOUND)?;
    state.accounts.delete_account(auth, id).await?;
    Ok(Json(json!({ "msg": "User deleted" })))
}
