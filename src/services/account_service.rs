// AccountService - registration, login and account lifecycle

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    infrastructure::{AuthUser, SecurityService, SocialStore},
    models::{
        gravatar_url, normalize_email, LoginRequest, RegisterRequest, TokenResponse, User,
        UserRecord,
    },
    validation::Validator,
};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn SocialStore>,
    security: Arc<SecurityService>,
}

impl AccountService {
    pub fn new(store: Arc<dyn SocialStore>, security: Arc<SecurityService>) -> Self {
        Self { store, security }
    }

    #[instrument(skip(self, request))]
    pub async fn register(&self, request: RegisterRequest) -> AppResult<TokenResponse> {
        let mut v = Validator::new();
        let name = v.required("name", request.name.as_deref(), "Name is required");
        let email = v.email(
            "email",
            request.email.as_deref(),
            "Please include a valid email",
        );
        let password = v.min_length(
            "password",
            request.password.as_deref(),
            MIN_PASSWORD_LEN,
            "Please enter a password with 6 or more characters",
        );
        let (name, email, password) = v.finish(|| Some((name?, email?, password?)))?;
        let email = normalize_email(&email);

        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("User already exist".to_string()));
        }

        let user = UserRecord {
            id: Uuid::new_v4(),
            name,
            avatar: gravatar_url(&email),
            email,
            password_hash: self.security.hash_password(&password)?,
            date: Utc::now(),
        };
        // Racing registrations are caught by the unique email index.
        self.store.insert_user(&user).await?;

        info!(user_id = %user.id, "User registered");
        Ok(TokenResponse {
            token: self.security.issue_token(user.id)?,
        })
    }

    /// Unknown email and wrong password fail identically.
    #[instrument(skip(self, request))]
    pub async fn login(&self, request: LoginRequest) -> AppResult<TokenResponse> {
        let mut v = Validator::new();
        let email = v.email(
            "email",
            request.email.as_deref(),
            "Please include a valid email",
        );
        let password = v.exists("password", request.password.as_deref(), "Password is required");
        let (email, password) = v.finish(|| Some((email?, password?)))?;

        let user = match self.store.find_user_by_email(&normalize_email(&email)).await? {
            Some(user) => user,
            None => {
                self.security.verify_against_dummy(&password);
                return Err(AppError::InvalidCredentials);
            }
        };

        if !self.security.verify_password(&password, &user.password_hash)? {
            return Err(AppError::InvalidCredentials);
        }

        info!(user_id = %user.id, "User logged in");
        Ok(TokenResponse {
            token: self.security.issue_token(user.id)?,
        })
    }

    /// The account behind a verified token. A token that outlived its
    /// account is no longer a valid credential.
    pub async fn current_user(&self, auth: AuthUser) -> AppResult<User> {
        self.store
            .find_user(auth.user_id)
            .await?
            .map(User::from)
            .ok_or_else(AppError::invalid_token)
    }

    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        Ok(self
            .store
            .list_users()
            .await?
            .into_iter()
            .map(User::from)
            .collect())
    }

    pub async fn get_user(&self, id: Uuid) -> AppResult<User> {
        self.store
            .find_user(id)
            .await?
            .map(User::from)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Removes the account's posts, then its profile, then the account itself.
    #[instrument(skip(self))]
    pub async fn delete_account(&self, auth: AuthUser, user_id: Uuid) -> AppResult<()> {
        auth.ensure_owner(user_id)?;

        if self.store.find_user(user_id).await?.is_none() {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let posts = self.store.delete_posts_by_user(user_id).await?;
        let had_profile = self.store.delete_profile_by_user(user_id).await?;
        self.store.delete_user(user_id).await?;

        info!(%user_id, posts, had_profile, "Account deleted");
        Ok(())
    }
}
