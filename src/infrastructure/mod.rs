// Core infrastructure modules
pub mod database;              // Store interface
pub mod sqlite_database;       // SQLite-backed store
pub mod security;              // Password hashing and tokens
pub mod middleware;            // Token verification middleware
pub mod github;                // GitHub repository lookups

// Re-export core infrastructure components
pub use database::SocialStore;
pub use github::GithubClient;
pub use middleware::{auth_middleware, AuthUser, HasSecurityService};
pub use security::{Claims, SecurityConfig, SecurityService};
pub use sqlite_database::SqliteDatabase;
