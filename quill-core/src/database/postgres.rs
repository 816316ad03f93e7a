use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::info;

use super::ports::{PostsRepository, UsersRepository};
use crate::MIGRATOR;
use crate::auth::UserLookup;
use crate::domain::{NewUser, Post, PostInput, PostQuery, PostResponse, User, UserResponse};
use crate::error::{CoreError, Result};

const POST_COLUMNS: &str = r#"
    p.id, p.title, p.content, p.published, p.created_at, p.user_id,
    u.email AS owner_email, u.created_at AS owner_created_at
"#;

#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: i64,
    title: String,
    content: String,
    published: bool,
    created_at: DateTime<Utc>,
    user_id: i64,
    owner_email: String,
    owner_created_at: DateTime<Utc>,
}

impl From<PostRow> for PostResponse {
    fn from(row: PostRow) -> Self {
        let owner = UserResponse {
            id: row.user_id,
            email: row.owner_email,
            created_at: row.owner_created_at,
        };
        let post = Post {
            id: row.id,
            title: row.title,
            content: row.content,
            published: row.published,
            created_at: row.created_at,
            user_id: row.user_id,
        };
        PostResponse::new(post, owner)
    }
}

/// PostgreSQL-backed users and posts.
#[derive(Clone, Debug)]
pub struct PostgresDatabase {
    pool: PgPool,
}

impl PostgresDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await
            .map_err(|e| CoreError::Database(format!("Failed to connect to PostgreSQL: {}", e)))?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| CoreError::Database(format!("Failed to apply migrations: {}", e)))?;
        info!("Database migrations applied");
        Ok(())
    }
}

#[async_trait]
impl UserLookup for PostgresDatabase {
    async fn lookup_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.get_user_by_id(id).await
    }
}

#[async_trait]
impl UsersRepository for PostgresDatabase {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, full_name, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, full_name, password_hash, created_at
            "#,
        )
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match CoreError::from(e) {
            CoreError::Conflict(_) => {
                CoreError::Conflict(format!("email {} is already registered", user.email))
            }
            other => other,
        })?;

        Ok(created)
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, full_name, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, full_name, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

#[async_trait]
impl PostsRepository for PostgresDatabase {
    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<PostResponse>> {
        let query = query.normalized();
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts p
            JOIN users u ON u.id = p.user_id
            WHERE strpos(p.title, $1) > 0
            ORDER BY p.id
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(&query.search)
        .bind(query.limit)
        .bind(query.skip)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PostResponse::from).collect())
    }

    async fn list_posts_by_owner(&self, user_id: i64) -> Result<Vec<PostResponse>> {
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts p
            JOIN users u ON u.id = p.user_id
            WHERE p.user_id = $1
            ORDER BY p.id
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PostResponse::from).collect())
    }

    async fn create_post(&self, user_id: i64, input: PostInput) -> Result<PostResponse> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            WITH p AS (
                INSERT INTO posts (title, content, published, user_id)
                VALUES ($1, $2, $3, $4)
                RETURNING id, title, content, published, created_at, user_id
            )
            SELECT {POST_COLUMNS}
            FROM p
            JOIN users u ON u.id = p.user_id
            "#
        ))
        .bind(&input.title)
        .bind(&input.content)
        .bind(input.published)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn get_post(&self, id: i64) -> Result<Option<PostResponse>> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts p
            JOIN users u ON u.id = p.user_id
            WHERE p.id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(PostResponse::from))
    }

    async fn update_post(&self, id: i64, input: PostInput) -> Result<Option<PostResponse>> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            WITH p AS (
                UPDATE posts
                SET title = $2, content = $3, published = $4
                WHERE id = $1
                RETURNING id, title, content, published, created_at, user_id
            )
            SELECT {POST_COLUMNS}
            FROM p
            JOIN users u ON u.id = p.user_id
            "#
        ))
        .bind(id)
        .bind(&input.title)
        .bind(&input.content)
        .bind(input.published)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(PostResponse::from))
    }

    async fn delete_post(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
