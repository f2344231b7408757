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
    models::{EducationRequest, ExperienceRequest, Profile, ProfileRequest},
    validation::parse_id,
};

/// GET /api/profile
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Profile>>> {
    Ok(Json(state.profiles.list().await?))
}

/// POST /api/profile
pub async fn upsert(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(request): JsonBody<ProfileRequest>,
) -> AppResult<Json<Profile>> {
    Ok(Json(state.profiles.upsert(auth, request).await?))
}

/// DELETE /api/profile - removes posts, profile and account
pub async fn delete_account(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Value>> {
    state.accounts.delete_account(auth, auth.user_id).await?;
    Ok(Json(json!({ "msg": "User deleted" })))
}

/// GET /api/profile/me
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<Profile>> {
    Ok(Json(state.profiles.me(auth).await?))
}

/// GET /api/profile/user/{user_id}
pub async fn by_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<Profile>> {
    let user_id = parse_id(&user_id, "Profile not found")?;
    Ok(Json(state.profiles.by_user(user_id).await?))
}

/// PUT /api/profile/experience
pub async fn add_experience(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(request): JsonBody<ExperienceRequest>,
) -> AppResult<Json<Profile>> {
    Ok(Json(state.profiles.add_experience(auth, request).await?))
}

/// DELETE /api/profile/experience/{exp_id}
pub async fn remove_experience(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(exp_id): Path<String>,
) -> AppResult<Json<Profile>> {
    let exp_id = parse_id(&exp_id, "Experience not found")?;
    Ok(Json(state.profiles.remove_experience(auth, exp_id).await?))
}

/// PUT /api/profile/education
pub async fn add_education(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(request): JsonBody<EducationRequest>,
) -> AppResult<Json<Profile>> {
    Ok(Json(state.profiles.add_education(auth, request).await?))
}

/// DELETE /api/profile/education/{edu_id}
pub async fn remove_education(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(edu_id): Path<String>,
) -> AppResult<Json<Profile>> {
    let edu_id = parse_id(&edu_id, "Education not found")?;
    Ok(Json(state.profiles.remove_education(auth, edu_id).await?))
}

/// GET /api/profile/github/{username}
pub async fn github_repos(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<Json<Value>> {
    Ok(Json(state.github.latest_repos(&username).await?))
}
