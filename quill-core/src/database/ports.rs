use async_trait::async_trait;

use crate::auth::UserLookup;
use crate::domain::{NewUser, PostInput, PostQuery, PostResponse, User};
use crate::error::Result;

// User storage; every user store can serve identity lookups
#[async_trait]
pub trait UsersRepository: UserLookup {
    /// Duplicate emails fail with `CoreError::Conflict`.
    async fn create_user(&self, user: NewUser) -> Result<User>;
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
}

// Post storage; reads return posts joined with their owner
#[async_trait]
pub trait PostsRepository: Send + Sync {
    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<PostResponse>>;
    async fn list_posts_by_owner(&self, user_id: i64) -> Result<Vec<PostResponse>>;
    async fn create_post(&self, user_id: i64, input: PostInput) -> Result<PostResponse>;
    async fn get_post(&self, id: i64) -> Result<Option<PostResponse>>;
    /// `None` when the post disappeared before the update ran.
    async fn update_post(&self, id: i64, input: PostInput) -> Result<Option<PostResponse>>;
    /// `false` when there was nothing to delete.
    async fn delete_post(&self, id: i64) -> Result<bool>;
}
