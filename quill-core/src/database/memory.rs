use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use super::ports::{PostsRepository, UsersRepository};
use crate::auth::UserLookup;
use crate::domain::{NewUser, Post, PostInput, PostQuery, PostResponse, User, UserResponse};
use crate::error::{CoreError, Result};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    posts: BTreeMap<i64, Post>,
    next_user_id: i64,
    next_post_id: i64,
}

impl Tables {
    fn with_owner(&self, post: &Post) -> Result<PostResponse> {
        let owner = self
            .users
            .get(&post.user_id)
            .map(UserResponse::from)
            .ok_or_else(|| CoreError::Database(format!("post {} has no owner", post.id)))?;
        Ok(PostResponse::new(post.clone(), owner))
    }
}

/// Process-local store with the same semantics as the Postgres adapter.
///
/// Used by tests and by `--in-memory` development runs; contents vanish with
/// the process.
#[derive(Debug, Default)]
pub struct InMemoryDatabase {
    tables: RwLock<Tables>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a user and, like the foreign-key cascade, all of their posts.
    pub fn delete_user(&self, id: i64) -> bool {
        let mut tables = self.tables.write();
        let removed = tables.users.remove(&id).is_some();
        if removed {
            tables.posts.retain(|_, post| post.user_id != id);
        }
        removed
    }
}

#[async_trait]
impl UserLookup for InMemoryDatabase {
    async fn lookup_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.get_user_by_id(id).await
    }
}

#[async_trait]
impl UsersRepository for InMemoryDatabase {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut tables = self.tables.write();
        if tables.users.values().any(|existing| existing.email == user.email) {
            return Err(CoreError::Conflict(format!(
                "email {} is already registered",
                user.email
            )));
        }

        tables.next_user_id += 1;
        let record = User {
            id: tables.next_user_id,
            email: user.email,
            full_name: user.full_name,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        tables.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        Ok(self.tables.read().users.get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .tables
            .read()
            .users
            .values()
            .find(|user| user.email == email)
            .cloned())
    }
}

#[async_trait]
impl PostsRepository for InMemoryDatabase {
    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<PostResponse>> {
        let query = query.normalized();
        let tables = self.tables.read();
        tables
            .posts
            .values()
            .filter(|post| post.title.contains(&query.search))
            .skip(query.skip as usize)
            .take(query.limit as usize)
            .map(|post| tables.with_owner(post))
            .collect()
    }

    async fn list_posts_by_owner(&self, user_id: i64) -> Result<Vec<PostResponse>> {
        let tables = self.tables.read();
        tables
            .posts
            .values()
            .filter(|post| post.user_id == user_id)
            .map(|post| tables.with_owner(post))
            .collect()
    }

    async fn create_post(&self, user_id: i64, input: PostInput) -> Result<PostResponse> {
        let mut tables = self.tables.write();
        if !tables.users.contains_key(&user_id) {
            return Err(CoreError::NotFound(format!("user with id {user_id}")));
        }

        tables.next_post_id += 1;
        let post = Post {
            id: tables.next_post_id,
            title: input.title,
            content: input.content,
            published: input.published,
            created_at: Utc::now(),
            user_id,
        };
        tables.posts.insert(post.id, post.clone());
        tables.with_owner(&post)
    }

    async fn get_post(&self, id: i64) -> Result<Option<PostResponse>> {
        let tables = self.tables.read();
        tables
            .posts
            .get(&id)
            .map(|post| tables.with_owner(post))
            .transpose()
    }

    async fn update_post(&self, id: i64, input: PostInput) -> Result<Option<PostResponse>> {
        let mut tables = self.tables.write();
        let Some(post) = tables.posts.get_mut(&id) else {
            return Ok(None);
        };
        post.title = input.title;
        post.content = input.content;
        post.published = input.published;
        let post = post.clone();
        tables.with_owner(&post).map(Some)
    }

    async fn delete_post(&self, id: i64) -> Result<bool> {
        Ok(self.tables.write().posts.remove(&id).is_some())
    }
}
