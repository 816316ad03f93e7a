use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::UserResponse;
use crate::auth::Owned;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Stored post. `user_id` is set once at creation and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub user_id: i64,
}

impl Owned for Post {
    fn owner_id(&self) -> i64 {
        self.user_id
    }
}

/// Body of create and update requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostInput {
    pub title: String,
    pub content: String,
    #[serde(default = "default_published")]
    pub published: bool,
}

fn default_published() -> bool {
    true
}

/// A post together with the public view of its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub user_id: i64,
    pub user: UserResponse,
}

impl PostResponse {
    pub fn new(post: Post, owner: UserResponse) -> Self {
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            published: post.published,
            created_at: post.created_at,
            user_id: post.user_id,
            user: owner,
        }
    }
}

impl Owned for PostResponse {
    fn owner_id(&self) -> i64 {
        self.user_id
    }
}

/// Listing parameters: title substring search with limit/offset paging.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PostQuery {
    pub limit: i64,
    pub skip: i64,
    pub search: String,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            skip: 0,
            search: String::new(),
        }
    }
}

impl PostQuery {
    /// Clamp paging values into the range the stores accept.
    pub fn normalized(&self) -> Self {
        Self {
            limit: self.limit.clamp(0, MAX_PAGE_SIZE),
            skip: self.skip.max(0),
            search: self.search.clone(),
        }
    }
}
