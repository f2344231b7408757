pub mod account_service;
pub mod post_service;
pub mod profile_service;

pub use account_service::AccountService;
pub use post_service::PostService;
pub use profile_service::ProfileService;
