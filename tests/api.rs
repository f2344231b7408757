use std::{sync::Arc, time::Duration};

use axum::{
    body::Body,
    extract::Path,
    http::{Request, StatusCode},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower::ServiceExt;

use devconnect::{
    create_app,
    infrastructure::{Claims, SecurityConfig, SecurityService, SqliteDatabase},
    AppState, Config,
};

struct TestApp {
    router: Router,
    state: AppState,
}

impl TestApp {
    async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    async fn with_config(config: Config) -> Self {
        let store = Arc::new(SqliteDatabase::new_in_memory().await.unwrap());
        let state = AppState::with_store(config, store).unwrap();
        Self {
            router: create_app(state.clone()),
            state,
        }
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.dispatch(request).await
    }

    async fn dispatch(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn register(&self, name: &str, email: &str) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/api/users",
                None,
                Some(json!({ "name": name, "email": email, "password": "secret1" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    async fn user_id(&self, token: &str) -> String {
        let (_, me) = self.send("GET", "/api/auth", Some(token), None).await;
        me["id"].as_str().unwrap().to_string()
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.auth.jwt_secret = "integration-secret".to_string();
    config
}

#[tokio::test]
async fn registering_twice_is_a_conflict() {
    let app = TestApp::new().await;
    let body = json!({ "name": "A", "email": "a@x.com", "password": "secret1" });

    let (status, first) = app.send("POST", "/api/users", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(first["token"].as_str().is_some_and(|t| !t.is_empty()));

    let (status, second) = app.send("POST", "/api/users", None, Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(second, json!({ "errors": [{ "msg": "User already exist" }] }));
}

#[tokio::test]
async fn registration_reports_all_field_errors() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send(
            "POST",
            "/api/users",
            None,
            Some(json!({ "email": "nope", "password": "123" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let params: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["param"].as_str().unwrap())
        .collect();
    assert_eq!(params, vec!["name", "email", "password"]);
}

#[tokio::test]
async fn malformed_json_is_a_validation_error() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/users")
        .header("content-type", "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let (status, body) = app.dispatch(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn login_returns_a_token_for_the_current_user() {
    let app = TestApp::new().await;
    app.register("Ada", "ada@example.com").await;

    let (status, body) = app
        .send(
            "POST",
            "/api/auth",
            None,
            Some(json!({ "email": "ada@example.com", "password": "secret1" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap();

    let (status, me) = app.send("GET", "/api/auth", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["name"], "Ada");
    assert_eq!(me["email"], "ada@example.com");
    assert!(me["avatar"].as_str().unwrap().contains("gravatar.com"));
    assert!(me.get("password_hash").is_none());
    assert!(me.get("password").is_none());
}

#[tokio::test]
async fn login_errors_do_not_reveal_which_part_was_wrong() {
    let app = TestApp::new().await;
    app.register("Ada", "ada@example.com").await;

    let (s1, wrong_password) = app
        .send(
            "POST",
            "/api/auth",
            None,
            Some(json!({ "email": "ada@example.com", "password": "nope-nope" })),
        )
        .await;
    let (s2, unknown_email) = app
        .send(
            "POST",
            "/api/auth",
            None,
            Some(json!({ "email": "bob@example.com", "password": "secret1" })),
        )
        .await;

    assert_eq!(s1, StatusCode::BAD_REQUEST);
    assert_eq!(s1, s2);
    assert_eq!(wrong_password, unknown_email);
    assert_eq!(
        wrong_password,
        json!({ "errors": [{ "msg": "Invalid Credentials" }] })
    );
}

#[tokio::test]
async fn middleware_rejects_missing_expired_and_tampered_tokens() {
    let app = TestApp::new().await;
    let token = app.register("Ada", "ada@example.com").await;

    let (status, body) = app.send("GET", "/api/posts", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["msg"], "No token, authorization denied");

    let user_id = app.user_id(&token).await;
    let forger = SecurityService::new(SecurityConfig {
        jwt_secret: "some-other-secret".to_string(),
        jwt_expiry: Duration::from_secs(3600),
    })
    .unwrap();
    let forged = forger.issue_token(user_id.parse().unwrap()).unwrap();
    let (status, body) = app.send("GET", "/api/posts", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["msg"], "Token is not valid");

    let now = Utc::now().timestamp();
    let expired = app
        .state
        .security
        .sign(&Claims {
            sub: user_id,
            iat: now - 7200,
            exp: now - 3600,
        })
        .unwrap();
    let (status, _) = app.send("GET", "/api/posts", Some(&expired), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send("GET", "/api/posts", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let legacy = Request::builder()
        .method("GET")
        .uri("/api/auth")
        .header("x-auth-token", token.as_str())
        .body(Body::empty())
        .unwrap();
    let (status, me) = app.dispatch(legacy).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["name"], "Ada");
}

#[tokio::test]
async fn post_lifecycle() {
    let app = TestApp::new().await;
    let ada = app.register("Ada", "ada@example.com").await;
    let bob = app.register("Bob", "bob@example.com").await;

    let (status, first) = app
        .send("POST", "/api/posts", Some(&ada), Some(json!({ "text": "first" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["name"], "Ada");
    let (_, second) = app
        .send("POST", "/api/posts", Some(&ada), Some(json!({ "text": "second" })))
        .await;

    let (_, posts) = app.send("GET", "/api/posts", Some(&bob), None).await;
    let texts: Vec<&str> = posts
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, vec!["second", "first"]);

    let id = first["id"].as_str().unwrap();

    // likes
    let like_uri = format!("/api/posts/like/{}", id);
    let (status, likes) = app.send("PUT", &like_uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(likes.as_array().unwrap().len(), 1);
    let (status, likes) = app.send("PUT", &like_uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(likes.as_array().unwrap().len(), 1);

    let unlike_uri = format!("/api/posts/unlike/{}", id);
    let (status, body) = app.send("PUT", &unlike_uri, Some(&ada), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["msg"], "Post has not yet been liked");
    let (status, likes) = app.send("PUT", &unlike_uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(likes.as_array().unwrap().is_empty());

    // comments
    let comment_uri = format!("/api/posts/comment/{}", id);
    let (status, comments) = app
        .send("POST", &comment_uri, Some(&bob), Some(json!({ "text": "nice" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(comments[0]["name"], "Bob");
    let comment_id = comments[0]["id"].as_str().unwrap();
    let delete_comment_uri = format!("/api/posts/comment/{}/{}", id, comment_id);
    let (status, _) = app.send("DELETE", &delete_comment_uri, Some(&ada), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, comments) = app
        .send("DELETE", &delete_comment_uri, Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(comments.as_array().unwrap().is_empty());

    // deletion
    let post_uri = format!("/api/posts/{}", id);
    let (status, body) = app.send("DELETE", &post_uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["msg"], "User not authorized");

    let (status, body) = app.send("DELETE", &post_uri, Some(&ada), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], "Post removed");

    let (status, _) = app.send("GET", &post_uri, Some(&ada), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, posts) = app.send("GET", "/api/posts", Some(&ada), None).await;
    assert_eq!(posts.as_array().unwrap().len(), 1);
    assert_eq!(posts[0]["id"], second["id"]);
}

#[tokio::test]
async fn malformed_post_id_is_not_found() {
    let app = TestApp::new().await;
    let ada = app.register("Ada", "ada@example.com").await;
    let (status, body) = app.send("GET", "/api/posts/12345", Some(&ada), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["msg"], "Post not found");
}

#[tokio::test]
async fn profile_upsert_and_sub_lists() {
    let app = TestApp::new().await;
    let ada = app.register("Ada", "ada@example.com").await;
    let ada_id = app.user_id(&ada).await;

    let (status, _) = app.send("GET", "/api/profile/me", Some(&ada), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, created) = app
        .send(
            "POST",
            "/api/profile",
            Some(&ada),
            Some(json!({ "status": "Developer", "skills": "rust, sql", "twitter": "@ada" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["skills"], json!(["rust", "sql"]));
    assert_eq!(created["social"]["twitter"], "@ada");

    let (_, updated) = app
        .send(
            "POST",
            "/api/profile",
            Some(&ada),
            Some(json!({ "status": "Lead", "skills": "rust", "company": "Acme" })),
        )
        .await;
    assert_eq!(updated["id"], created["id"]);
    assert_eq!(updated["status"], "Lead");

    let (status, profiles) = app.send("GET", "/api/profile", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profiles.as_array().unwrap().len(), 1);
    assert_eq!(profiles[0]["user"]["name"], "Ada");

    let (status, by_user) = app
        .send("GET", &format!("/api/profile/user/{}", ada_id), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_user["company"], "Acme");
    let (status, _) = app.send("GET", "/api/profile/user/not-an-id", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // experience
    let (status, body) = app
        .send("PUT", "/api/profile/experience", Some(&ada), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"].as_array().unwrap().len(), 3);

    for title in ["Engineer", "Staff Engineer"] {
        let (status, _) = app
            .send(
                "PUT",
                "/api/profile/experience",
                Some(&ada),
                Some(json!({ "title": title, "company": "Acme", "from": "2019-01-01" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }
    let (_, me) = app.send("GET", "/api/profile/me", Some(&ada), None).await;
    assert_eq!(me["experience"][0]["title"], "Staff Engineer");
    let older = me["experience"][1]["id"].as_str().unwrap().to_string();

    let (status, after) = app
        .send(
            "DELETE",
            &format!("/api/profile/experience/{}", older),
            Some(&ada),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let remaining = after["experience"].as_array().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0]["title"], "Staff Engineer");

    // education
    let (status, with_edu) = app
        .send(
            "PUT",
            "/api/profile/education",
            Some(&ada),
            Some(json!({
                "school": "MIT", "degree": "BSc", "fieldofstudy": "CS",
                "from": "2010-09-01", "to": "2014-06-01"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let edu_id = with_edu["education"][0]["id"].as_str().unwrap();
    let (status, without_edu) = app
        .send(
            "DELETE",
            &format!("/api/profile/education/{}", edu_id),
            Some(&ada),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(without_edu["education"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn deleting_the_account_cascades() {
    let app = TestApp::new().await;
    let ada = app.register("Ada", "ada@example.com").await;
    let bob = app.register("Bob", "bob@example.com").await;
    let ada_id = app.user_id(&ada).await;

    app.send(
        "POST",
        "/api/profile",
        Some(&ada),
        Some(json!({ "status": "Developer", "skills": "rust" })),
    )
    .await;
    app.send("POST", "/api/posts", Some(&ada), Some(json!({ "text": "hello" })))
        .await;
    app.send("POST", "/api/posts", Some(&bob), Some(json!({ "text": "hi" })))
        .await;

    let (status, _) = app
        .send("DELETE", &format!("/api/users/{}", ada_id), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.send("DELETE", "/api/profile", Some(&ada), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], "User deleted");

    let (_, posts) = app.send("GET", "/api/posts", Some(&bob), None).await;
    assert_eq!(posts.as_array().unwrap().len(), 1);
    assert_eq!(posts[0]["name"], "Bob");

    let (_, profiles) = app.send("GET", "/api/profile", None, None).await;
    assert!(profiles.as_array().unwrap().is_empty());

    let (status, _) = app
        .send("GET", &format!("/api/users/{}", ada_id), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The token outlived its account.
    let (status, _) = app.send("GET", "/api/auth", Some(&ada), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .send("POST", "/api/posts", Some(&ada), Some(json!({ "text": "ghost" })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["msg"], "Token is not valid");

    let bob_post = posts[0]["id"].as_str().unwrap();
    let (status, _) = app
        .send(
            "POST",
            &format!("/api/posts/comment/{}", bob_post),
            Some(&ada),
            Some(json!({ "text": "boo" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(
            "POST",
            "/api/profile",
            Some(&ada),
            Some(json!({ "status": "Developer", "skills": "rust" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn users_are_listed_without_password_hashes() {
    let app = TestApp::new().await;
    app.register("Ada", "ada@example.com").await;
    let (status, users) = app.send("GET", "/api/users", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 1);
    assert!(users[0].get("password_hash").is_none());
}

#[tokio::test]
async fn github_repos_are_proxied() {
    async fn repos(Path(name): Path<String>) -> Result<Json<Value>, StatusCode> {
        if name == "octocat" {
            Ok(Json(json!([{ "name": "hello-world" }, { "name": "spoon-knife" }])))
        } else {
            Err(StatusCode::NOT_FOUND)
        }
    }

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let fake_github = Router::new().route("/users/{name}/repos", get(repos));
    tokio::spawn(async move {
        axum::serve(listener, fake_github).await.unwrap();
    });

    let mut config = test_config();
    config.github.api_base = format!("http://{}", addr);
    let app = TestApp::with_config(config).await;

    let (status, body) = app
        .send("GET", "/api/profile/github/octocat", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "hello-world");

    let (status, body) = app.send("GET", "/api/profile/github/ghost", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["msg"], "No Github profile found");
}

#[tokio::test]
async fn health_check() {
    let app = TestApp::new().await;
    let (status, body) = app.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
