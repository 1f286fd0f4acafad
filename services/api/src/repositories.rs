//! Repositories for database operations
//!
//! Handlers talk to the traits; the `Pg*` types are the PostgreSQL-backed
//! implementations wired up in `main`.

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{NewUser, User, Video};

pub mod video;

pub use video::{PgVideoRepository, VideoRepository};

/// Persistence of user accounts and their ordered video lists
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user; a duplicate email yields [`DatabaseError::Conflict`]
    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User>;

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>>;

    /// The oldest account with this first name
    async fn find_by_firstname(&self, firstname: &str) -> DatabaseResult<Option<User>>;

    async fn list(&self) -> DatabaseResult<Vec<User>>;

    /// Record that the account has completed a login
    async fn mark_logged_in(&self, id: Uuid) -> DatabaseResult<()>;

    /// Returns `false` when no such user exists
    async fn update_bio(&self, id: Uuid, bio: Option<&str>) -> DatabaseResult<bool>;

    /// Returns `false` when no such user exists
    async fn update_profile_picture(&self, id: Uuid, url: &str) -> DatabaseResult<bool>;

    /// Append a video to the end of the user's list; `false` when no such user
    async fn append_video(&self, user_id: Uuid, video_id: Uuid) -> DatabaseResult<bool>;

    /// The user's videos in upload order
    async fn videos_of(&self, user_id: Uuid) -> DatabaseResult<Vec<Video>>;

    async fn is_healthy(&self) -> bool;
}

/// PostgreSQL user repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, firstname, lastname, email, mobile, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, firstname, lastname, email, mobile, password_hash, bio,
                      profile_picture, email_registered, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.firstname)
        .bind(&new_user.lastname)
        .bind(&new_user.email)
        .bind(&new_user.mobile)
        .bind(&new_user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, firstname, lastname, email, mobile, password_hash, bio,
                   profile_picture, email_registered, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)
    }

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, firstname, lastname, email, mobile, password_hash, bio,
                   profile_picture, email_registered, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)
    }

    async fn find_by_firstname(&self, firstname: &str) -> DatabaseResult<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, firstname, lastname, email, mobile, password_hash, bio,
                   profile_picture, email_registered, created_at, updated_at
            FROM users
            WHERE firstname = $1
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(firstname)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)
    }

    async fn list(&self) -> DatabaseResult<Vec<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, firstname, lastname, email, mobile, password_hash, bio,
                   profile_picture, email_registered, created_at, updated_at
            FROM users
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)
    }

    async fn mark_logged_in(&self, id: Uuid) -> DatabaseResult<()> {
        sqlx::query(
            "UPDATE users SET email_registered = TRUE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(())
    }

    async fn update_bio(&self, id: Uuid, bio: Option<&str>) -> DatabaseResult<bool> {
        let result = sqlx::query("UPDATE users SET bio = $1, updated_at = NOW() WHERE id = $2")
            .bind(bio)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_profile_picture(&self, id: Uuid, url: &str) -> DatabaseResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET profile_picture = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(url)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected() > 0)
    }

    async fn append_video(&self, user_id: Uuid, video_id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_videos (user_id, video_id)
            SELECT $1, $2
            WHERE EXISTS (SELECT 1 FROM users WHERE id = $1)
            "#,
        )
        .bind(user_id)
        .bind(video_id)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        Ok(result.rows_affected() > 0)
    }

    async fn videos_of(&self, user_id: Uuid) -> DatabaseResult<Vec<Video>> {
        sqlx::query_as::<_, Video>(
            r#"
            SELECT v.id, v.video_url, v.title, v.description, v.thumbnail_url, v.created_at
            FROM user_videos uv
            JOIN videos v ON v.id = uv.video_id
            WHERE uv.user_id = $1
            ORDER BY uv.position
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)
    }

    async fn is_healthy(&self) -> bool {
        common::database::health_check(&self.pool).await
    }
}
