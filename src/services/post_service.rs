// PostService - posts with likes and comments

use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    infrastructure::{AuthUser, SocialStore},
    models::{Comment, Like, Post, TextRequest, UserRecord},
    validation::Validator,
};

pub const POST_NOT_FOUND: &str = "Post not found";

#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn SocialStore>,
}

impl PostService {
    pub fn new(store: Arc<dyn SocialStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, request))]
    pub async fn create(&self, auth: AuthUser, request: TextRequest) -> AppResult<Post> {
        let text = validate_text(request)?;
        let author = self.author(auth).await?;

        let post = Post::new(&author, text);
        self.store.insert_post(&post).await?;
        info!(post_id = %post.id, user_id = %author.id, "Post created");
        Ok(post)
    }

    pub async fn list(&self) -> AppResult<Vec<Post>> {
        self.store.list_posts().await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Post> {
        self.store
            .find_post(id)
            .await?
            .ok_or_else(|| AppError::NotFound(POST_NOT_FOUND.to_string()))
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, auth: AuthUser, id: Uuid) -> AppResult<()> {
        let post = self.get(id).await?;
        auth.ensure_owner(post.user)?;

        if !self.store.delete_post(id).await? {
            return Err(AppError::NotFound(POST_NOT_FOUND.to_string()));
        }
        info!(post_id = %id, "Post removed");
        Ok(())
    }

    /// Liking twice is a no-op; the current likes are returned either way.
    #[instrument(skip(self))]
    pub async fn like(&self, auth: AuthUser, id: Uuid) -> AppResult<Vec<Like>> {
        let mut post = self.get(id).await?;
        if post.like(auth.user_id) {
            self.store.update_post(&post).await?;
        }
        Ok(post.likes)
    }

    #[instrument(skip(self))]
    pub async fn unlike(&self, auth: AuthUser, id: Uuid) -> AppResult<Vec<Like>> {
        let mut post = self.get(id).await?;
        if !post.unlike(auth.user_id) {
            return Err(AppError::BadRequest(
                "Post has not yet been liked".to_string(),
            ));
        }
        self.store.update_post(&post).await?;
        Ok(post.likes)
    }

    #[instrument(skip(self, request))]
    pub async fn comment(
        &self,
        auth: AuthUser,
        id: Uuid,
        request: TextRequest,
    ) -> AppResult<Vec<Comment>> {
        let text = validate_text(request)?;
        let author = self.author(auth).await?;
        let mut post = self.get(id).await?;

        post.add_comment(&author, text);
        self.store.update_post(&post).await?;
        Ok(post.comments)
    }

    /// Only the comment's author may remove it.
    #[instrument(skip(self))]
    pub async fn delete_comment(
        &self,
        auth: AuthUser,
        id: Uuid,
        comment_id: Uuid,
    ) -> AppResult<Vec<Comment>> {
        let mut post = self.get(id).await?;
        let comment = post
            .find_comment(comment_id)
            .ok_or_else(|| AppError::NotFound("Comment does not exist".to_string()))?;
        auth.ensure_owner(comment.user)?;

        post.remove_comment(comment_id);
        self.store.update_post(&post).await?;
        Ok(post.comments)
    }

    /// Name/avatar snapshots need the live account behind the token.
    async fn author(&self, auth: AuthUser) -> AppResult<UserRecord> {
        self.store
            .find_user(auth.user_id)
            .await?
            .ok_or_else(AppError::invalid_token)
    }
}

fn validate_text(request: TextRequest) -> AppResult<String> {
    let mut v = Validator::new();
    let text = v.required("text", request.text.as_deref(), "Text is required");
    v.finish(|| text)
}
