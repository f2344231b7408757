// Store interface - collections of users, profiles and posts
// Each write replaces a whole document; there are no cross-document transactions.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Post, Profile, UserRecord};

/// Persistence seam for every service. Implementations map driver failures
/// to `AppError::DatabaseError`.
#[async_trait]
pub trait SocialStore: Send + Sync {
    // Users
    /// Fails with `AppError::Conflict` when the email is already taken.
    async fn insert_user(&self, user: &UserRecord) -> AppResult<()>;
    async fn find_user(&self, id: Uuid) -> AppResult<Option<UserRecord>>;
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserRecord>>;
    async fn list_users(&self) -> AppResult<Vec<UserRecord>>;
    async fn delete_user(&self, id: Uuid) -> AppResult<bool>;

    // Profiles - one per user
    async fn find_profile_by_user(&self, user_id: Uuid) -> AppResult<Option<Profile>>;
    async fn list_profiles(&self) -> AppResult<Vec<Profile>>;
    /// Inserts, or replaces the profile already owned by the same user.
    async fn save_profile(&self, profile: &Profile) -> AppResult<()>;
    async fn delete_profile_by_user(&self, user_id: Uuid) -> AppResult<bool>;

    // Posts
    async fn insert_post(&self, post: &Post) -> AppResult<()>;
    async fn find_post(&self, id: Uuid) -> AppResult<Option<Post>>;
    /// Newest first.
    async fn list_posts(&self) -> AppResult<Vec<Post>>;
    /// Fails with `AppError::NotFound` when the post no longer exists.
    async fn update_post(&self, post: &Post) -> AppResult<()>;
    async fn delete_post(&self, id: Uuid) -> AppResult<bool>;
    async fn delete_posts_by_user(&self, user_id: Uuid) -> AppResult<u64>;
}
