use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::GithubConfig;
use crate::error::{AppError, AppResult};

const NOT_FOUND: &str = "No Github profile found";
const REPO_COUNT: u8 = 5;

// GitHub logins: alphanumerics and single inner hyphens, at most 39 chars.
static USERNAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9]|-[A-Za-z0-9]){0,38}$").expect("username pattern compiles")
});

/// Looks up a user's most recently created public repositories.
#[derive(Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    config: GithubConfig,
}

impl GithubClient {
    pub fn new(config: GithubConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("devconnect/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::ConfigurationError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    pub fn repos_url(&self, username: &str) -> String {
        format!(
            "{}/users/{}/repos?per_page={}&sort=created&direction=desc",
            self.config.api_base.trim_end_matches('/'),
            username,
            REPO_COUNT
        )
    }

    /// Returns GitHub's JSON untouched. Any non-200 answer, unreachable API,
    /// or invalid login maps to `AppError::Upstream`.
    pub async fn latest_repos(&self, username: &str) -> AppResult<Value> {
        if !USERNAME_RE.is_match(username) {
            return Err(AppError::Upstream(NOT_FOUND.to_string()));
        }

        let mut request = self
            .http
            .get(self.repos_url(username))
            .header("accept", "application/vnd.github+json");
        if let (Some(id), Some(secret)) = (&self.config.client_id, &self.config.client_secret) {
            request = request.basic_auth(id, Some(secret));
        }

        let response = request.send().await.map_err(|e| {
            warn!("GitHub request for {} failed: {}", username, e);
            AppError::Upstream(NOT_FOUND.to_string())
        })?;

        if response.status() != reqwest::StatusCode::OK {
            info!("GitHub returned {} for {}", response.status(), username);
            return Err(AppError::Upstream(NOT_FOUND.to_string()));
        }

        response.json::<Value>().await.map_err(|e| {
            warn!("Undecodable GitHub response for {}: {}", username, e);
            AppError::Upstream(NOT_FOUND.to_string())
        })
    }
}
