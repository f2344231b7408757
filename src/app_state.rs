use std::sync::Arc;

use crate::{
    config::Config,
    error::AppResult,
    infrastructure::{
        GithubClient, HasSecurityService, SecurityConfig, SecurityService, SocialStore,
        SqliteDatabase,
    },
    services::{AccountService, PostService, ProfileService},
};

#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub profiles: ProfileService,
    pub posts: PostService,
    pub github: GithubClient,
    pub security: Arc<SecurityService>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        // Initialize database
        let database =
            SqliteDatabase::connect(&config.database.url, config.database.max_connections).await?;
        Self::with_store(config, Arc::new(database))
    }

    /// Wire services around an already-open store.
    pub fn with_store(config: Config, store: Arc<dyn SocialStore>) -> AppResult<Self> {
        config.validate()?;
        let security = Arc::new(SecurityService::new(SecurityConfig::from(&config.auth))?);
        let github = GithubClient::new(config.github.clone())?;

        Ok(Self {
            accounts: AccountService::new(store.clone(), security.clone()),
            profiles: ProfileService::new(store.clone()),
            posts: PostService::new(store),
            github,
            security,
        })
    }
}

impl HasSecurityService for AppState {
    fn security(&self) -> &SecurityService {
        &self.security
    }
}
