// Password hashing and bearer-token signing

use std::time::Duration;

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::{AppError, AppResult};

/// JWT claims carried by every bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (user ID)
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry: Duration,
}

impl From<&AuthConfig> for SecurityConfig {
    fn from(auth: &AuthConfig) -> Self {
        Self {
            jwt_secret: auth.jwt_secret.clone(),
            jwt_expiry: auth.token_ttl(),
        }
    }
}

/// Hashes passwords and issues/verifies signed, time-limited tokens.
pub struct SecurityService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    /// Verified against when the email is unknown, so a failed login costs
    /// the same whether or not the account exists.
    dummy_hash: String,
    config: SecurityConfig,
}

impl SecurityService {
    pub fn new(config: SecurityConfig) -> AppResult<Self> {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let dummy_hash = hash_with_random_salt("devconnect-dummy-password")?;

        Ok(Self {
            encoding_key,
            decoding_key,
            validation,
            dummy_hash,
            config,
        })
    }

    /// Hash password securely using Argon2 with a fresh random salt
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        hash_with_random_salt(password)
    }

    /// Constant-time comparison of `password` against a stored PHC hash.
    pub fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Burns the same work as a real verification; always false.
    pub fn verify_against_dummy(&self, password: &str) -> bool {
        let _ = self.verify_password(password, &self.dummy_hash);
        false
    }

    #[instrument(skip(self))]
    pub fn issue_token(&self, user_id: Uuid) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = i64::try_from(self.config.jwt_expiry.as_secs())
            .ok()
            .and_then(|ttl| now.checked_add(ttl))
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "Token lifetime of {}s is out of range",
                    self.config.jwt_expiry.as_secs()
                ))
            })?;
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now,
            exp,
        };
        self.sign(&claims)
    }

    pub fn sign(&self, claims: &Claims) -> AppResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Verifies signature and expiry and returns the subject.
    pub fn validate_token(&self, token: &str) -> AppResult<Uuid> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!("Rejected token: {}", e);
                AppError::invalid_token()
            })?;

        Uuid::parse_str(&token_data.claims.sub)
            .map_err(|_| AppError::invalid_token())
    }

}

fn hash_with_random_salt(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;

    Ok(password_hash.to_string())
}
