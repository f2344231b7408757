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
    models::{Comment, Like, Post, TextRequest},
    services::post_service::POST_NOT_FOUND,
    validation::parse_id,
};

/// GET /api/posts
pub async fn list(State(state): State<AppState>, _auth: AuthUser) -> AppResult<Json<Vec<Post>>> {
    Ok(Json(state.posts.list().await?))
}

/// POST /api/posts
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(request): JsonBody<TextRequest>,
) -> AppResult<Json<Post>> {
    Ok(Json(state.posts.create(auth, request).await?))
}

/// GET /api/posts/{id}
pub async fn get_one(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Post>> {
    let id = parse_id(&id, POST_NOT_FOUND)?;
    Ok(Json(state.posts.get(id).await?))
}

/// DELETE /api/posts/{id}
pub async fn delete_one(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let id = parse_id(&id, POST_NOT_FOUND)?;
    state.posts.delete(auth, id).await?;
    Ok(Json(json!({ "msg": "Post removed" })))
}

/// PUT /api/posts/like/{id}
pub async fn like(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<Like>>> {
    let id = parse_id(&id, POST_NOT_FOUND)?;
    Ok(Json(state.posts.like(auth, id).await?))
}

/// PUT /api/posts/unlike/{id}
pub async fn unlike(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<Like>>> {
    let id = parse_id(&id, POST_NOT_FOUND)?;
    Ok(Json(state.posts.unlike(auth, id).await?))
}

/// POST /api/posts/comment/{id}
pub async fn comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<TextRequest>,
) -> AppResult<Json<Vec<Comment>>> {
    let id = parse_id(&id, POST_NOT_FOUND)?;
    Ok(Json(state.posts.comment(auth, id, request).await?))
}

/// DELETE /api/posts/comment/{id}/{comment_id}
pub async fn delete_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, comment_id)): Path<(String, String)>,
) -> AppResult<Json<Vec<Comment>>> {
    let id = parse_id(&id, POST_NOT_FOUND)?;
    let comment_id = parse_id(&comment_id, "Comment does not exist")?;
    Ok(Json(state.posts.delete_comment(auth, id, comment_id).await?))
}
