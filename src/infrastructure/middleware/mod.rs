// Authentication middleware and the extractor handlers use to read its result

pub mod auth_extractor;
pub mod auth_middleware;

pub use auth_extractor::AuthUser;
pub use auth_middleware::{auth_middleware, extract_token, HasSecurityService};
