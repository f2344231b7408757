use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, time::Duration};

use crate::error::{AppError, AppResult};

pub const DEFAULT_TOKEN_TTL_SECS: u64 = 360_000;
/// Longest accepted token lifetime: ten years.
pub const MAX_TOKEN_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub github: GithubConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    pub api_base: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            github: GithubConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:data/devconnect.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
        }
    }
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            client_id: None,
            client_secret: None,
            timeout_secs: 10,
        }
    }
}

impl AuthConfig {
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }
}

impl Config {
    /// Loads the JSON file named by `DEVCONNECT_CONFIG` (if any), then
    /// applies environment overrides on top.
    pub fn load() -> AppResult<Self> {
        let config = match env::var("DEVCONNECT_CONFIG") {
            Ok(path) if !path.is_empty() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        let config = config.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            AppError::ConfigurationError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> AppResult<Self> {
        serde_json::from_str(raw)
            .map_err(|e| AppError::ConfigurationError(format!("Invalid config file: {}", e)))
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = env::var("DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(host) = env::var("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = env::var("SERVER_PORT").ok().and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Ok(secret) = env::var("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(ttl) = env::var("TOKEN_TTL_SECS").ok().and_then(|t| t.parse().ok()) {
            self.auth.token_ttl_secs = ttl;
        }
        if let Ok(id) = env::var("GITHUB_CLIENT_ID") {
            self.github.client_id = Some(id);
        }
        if let Ok(secret) = env::var("GITHUB_SECRET") {
            self.github.client_secret = Some(secret);
        }
        if let Ok(base) = env::var("GITHUB_API_BASE") {
            self.github.api_base = base;
        }
        self
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(AppError::ConfigurationError(
                "auth.jwt_secret (or JWT_SECRET) must be set".to_string(),
            ));
        }
        if self.auth.token_ttl_secs == 0 || self.auth.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(AppError::ConfigurationError(format!(
                "auth.token_ttl_secs must be between 1 and {}",
                MAX_TOKEN_TTL_SECS
            )));
        }
        Ok(())
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let config = Config::from_json(r#"{ "auth": { "jwt_secret": "s3cret" } }"#).unwrap();
        assert_eq!(config.auth.jwt_secret, "s3cret");
        assert_eq!(config.auth.token_ttl_secs, DEFAULT_TOKEN_TTL_SECS);
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.github.api_base, "https://api.github.com");
        config.validate().unwrap();
    }

    #[test]
    fn missing_secret_is_rejected() {
        let err = Config::default().validate().unwrap_err();
        assert!(matches!(err, AppError::ConfigurationError(_)));
    }

    #[test]
    fn token_ttl_must_be_bounded() {
        let mut config = Config::default();
        config.auth.jwt_secret = "k".to_string();

        config.auth.token_ttl_secs = 0;
        assert!(matches!(config.validate(), Err(AppError::ConfigurationError(_))));

        config.auth.token_ttl_secs = u64::MAX;
        assert!(matches!(config.validate(), Err(AppError::ConfigurationError(_))));

        config.auth.token_ttl_secs = MAX_TOKEN_TTL_SECS + 1;
        assert!(config.validate().is_err());

        config.auth.token_ttl_secs = MAX_TOKEN_TTL_SECS;
        config.validate().unwrap();
    }

    #[test]
    fn reads_config_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("default.json");
        fs::write(
            &path,
            r#"{ "server": { "port": 8080 }, "auth": { "jwt_secret": "k", "token_ttl_secs": 60 } }"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.server_address(), "0.0.0.0:8080");
        assert_eq!(config.auth.token_ttl(), Duration::from_secs(60));
    }

    #[test]
    fn malformed_file_is_a_configuration_error() {
        assert!(matches!(
            Config::from_json("{ not json"),
            Err(AppError::ConfigurationError(_))
        ));
    }
}
