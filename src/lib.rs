// DevConnect - social network REST API

// HTTP routes and handlers
pub mod api;

// Application wiring and configuration
pub mod app_state;
pub mod config;

// Infrastructure - store, security, middleware, outbound clients
pub mod infrastructure;

// Documents and request payloads
pub mod models;

// Business operations behind the routes
pub mod services;

// Common utilities
pub mod error;
pub mod validation;

// Re-exports for convenience
pub use api::create_app;
pub use app_state::AppState;
pub use config::Config;
pub use error::{AppError, AppResult};
