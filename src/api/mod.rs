// REST API - routes for users, auth, profiles and posts

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{app_state::AppState, infrastructure::auth_middleware};

pub mod auth;
pub mod extract;
pub mod posts;
pub mod profile;
pub mod users;

/// Routes under `/api`. Private routes sit behind the token middleware;
/// public and private routes may share a path with different methods.
pub fn create_api_router(state: AppState) -> Router<AppState> {
    let require_auth = middleware::from_fn_with_state(state, auth_middleware::<AppState>);

    let public = Router::new()
        .route("/users", post(users::register).get(users::list))
        .route("/users/{id}", get(users::get_one))
        .route("/auth", post(auth::login))
        .route("/profile", get(profile::list))
        .route("/profile/user/{user_id}", get(profile::by_user))
        .route("/profile/github/{username}", get(profile::github_repos));

    let private = Router::new()
        .route("/users/{id}", delete(users::delete_one))
        .route("/auth", get(auth::me))
        .route(
            "/profile",
            post(profile::upsert).delete(profile::delete_account),
        )
        .route("/profile/me", get(profile::me))
        .route("/profile/experience", put(profile::add_experience))
        .route(
            "/profile/experience/{exp_id}",
            delete(profile::remove_experience),
        )
        .route("/profile/education", put(profile::add_education))
        .route(
            "/profile/education/{edu_id}",
            delete(profile::remove_education),
        )
        .route("/posts", get(posts::list).post(posts::create))
        .route("/posts/{id}", get(posts::get_one).delete(posts::delete_one))
        .route("/posts/like/{id}", put(posts::like))
        .route("/posts/unlike/{id}", put(posts::unlike))
        .route("/posts/comment/{id}", post(posts::comment))
        .route(
            "/posts/comment/{id}/{comment_id}",
            delete(posts::delete_comment),
        )
        .route_layer(require_auth);

    public.merge(private)
}

/// The complete application: API, health check, CORS and request tracing.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .nest("/api", create_api_router(state.clone()))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
