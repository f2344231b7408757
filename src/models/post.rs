use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub user: Uuid,
    pub text: String,
    pub name: String,
    pub avatar: String,
    #[serde(default)]
    pub likes: Vec<Like>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Like {
    pub user: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub user: Uuid,
    pub text: String,
    pub name: String,
    pub avatar: String,
    pub date: DateTime<Utc>,
}

impl Post {
    /// New post carrying a snapshot of the author's name and avatar.
    pub fn new(author: &UserRecord, text: String) -> Self {
        Post {
            id: Uuid::new_v4(),
            user: author.id,
            text,
            name: author.name.clone(),
            avatar: author.avatar.clone(),
            likes: Vec::new(),
            comments: Vec::new(),
            date: Utc::now(),
        }
    }

    pub fn is_liked_by(&self, user_id: Uuid) -> bool {
        self.likes.iter().any(|like| like.user == user_id)
    }

    /// Returns false (and leaves the likes untouched) if already liked.
    pub fn like(&mut self, user_id: Uuid) -> bool {
        if self.is_liked_by(user_id) {
            return false;
        }
        self.likes.insert(0, Like { user: user_id });
        true
    }

    /// Returns false if the user had not liked the post.
    pub fn unlike(&mut self, user_id: Uuid) -> bool {
        let before = self.likes.len();
        self.likes.retain(|like| like.user != user_id);
        self.likes.len() != before
    }

    pub fn add_comment(&mut self, author: &UserRecord, text: String) -> &Comment {
        self.comments.insert(
            0,
            Comment {
                id: Uuid::new_v4(),
                user: author.id,
                text,
                name: author.name.clone(),
                avatar: author.avatar.clone(),
                date: Utc::now(),
            },
        );
        &self.comments[0]
    }

    pub fn find_comment(&self, comment_id: Uuid) -> Option<&Comment> {
        self.comments.iter().find(|comment| comment.id == comment_id)
    }

    pub fn remove_comment(&mut self, comment_id: Uuid) -> bool {
        let before = self.comments.len();
        self.comments.retain(|comment| comment.id != comment_id);
        self.comments.len() != before
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextRequest {
    pub text: Option<String>,
}
