//! SQLite repository adapter.
#![allow(clippy::collapsible_if)]

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

use donate_types::{
    CreatePostRequest, DonateRepository, NewCredential, NewUser, PaymentCredential, Post, PostId,
    RepoError, UpdatePostRequest, UpdateUserRequest, User, UserId,
};

use crate::types::{
    CREDENTIAL_COLUMNS, DbCredential, DbPost, DbUser, POST_COLUMNS, USER_COLUMNS,
    map_write_error,
};

const MIGRATIONS: [&str; 3] = [
    include_str!("../migrations/0001_create_users.sql"),
    include_str!("../migrations/0002_create_posts.sql"),
    include_str!("../migrations/0003_create_payment_credentials.sql"),
];

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Repository
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite repository implementation.
pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    /// Creates a new SQLite repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let in_memory = database_url.contains(":memory:");

        // Ensure on-disk SQLite target directory exists.
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            let path = path.split('?').next().unwrap_or(path);
            if !in_memory {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every in-memory connection is its own database.
        let max_connections = if in_memory { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let repo = Self { pool };
        repo.create_schema().await?;
        Ok(repo)
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates the database schema (idempotent).
    pub async fn create_schema(&self) -> Result<(), RepoError> {
        for ddl in MIGRATIONS {
            sqlx::query(ddl)
                .execute(&self.pool)
                .await
                .map_err(|e| RepoError::Database(e.to_string()))?;
        }
        Ok(())
    }
}

fn now_str() -> String {
    chrono::Utc::now().to_rfc3339()
}

// ─────────────────────────────────────────────────────────────────────────────
// Repository implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl DonateRepository for SqliteRepo {
    async fn create_user(&self, user: NewUser) -> Result<User, RepoError> {
        let now = now_str();

        sqlx::query(
            r#"INSERT INTO users (id, email, password_hash, first_name, last_name, picture, role, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.picture)
        .bind(user.role.as_str())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "This email is already in use"))?;

        self.get_user(user.id).await?.ok_or(RepoError::NotFound)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepoError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let row: Option<DbUser> = sqlx::query_as(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbUser::into_domain).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
        let row: Option<DbUser> = sqlx::query_as(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbUser::into_domain).transpose()
    }

    async fn list_users(&self) -> Result<Vec<User>, RepoError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC");
        let rows: Vec<DbUser> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbUser::into_domain).collect()
    }

    async fn update_user(&self, id: UserId, patch: UpdateUserRequest) -> Result<bool, RepoError> {
        let result = sqlx::query(
            r#"UPDATE users SET
                   first_name = COALESCE(?, first_name),
                   last_name = COALESCE(?, last_name),
                   picture = COALESCE(?, picture),
                   role = COALESCE(?, role),
                   birthday = COALESCE(?, birthday),
                   city = COALESCE(?, city),
                   country = COALESCE(?, country),
                   updated_at = ?
               WHERE id = ?"#,
        )
        .bind(patch.first_name)
        .bind(patch.last_name)
        .bind(patch.picture)
        .bind(patch.role.map(|r| r.as_str()))
        .bind(patch.birthday.map(|d| d.format("%Y-%m-%d").to_string()))
        .bind(patch.city)
        .bind(patch.country)
        .bind(now_str())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_post(&self, owner: UserId, req: CreatePostRequest) -> Result<Post, RepoError> {
        let now = now_str();

        let id: i64 = sqlx::query_scalar(
            r#"INSERT INTO posts (title, content, goal, user_id, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?) RETURNING id"#,
        )
        .bind(&req.title)
        .bind(&req.content)
        .bind(&req.goal)
        .bind(owner.to_string())
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        self.get_post(PostId::new(id)).await?.ok_or(RepoError::NotFound)
    }

    async fn get_post(&self, id: PostId) -> Result<Option<Post>, RepoError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?");
        let row: Option<DbPost> = sqlx::query_as(&sql)
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbPost::into_domain).transpose()
    }

    async fn list_posts_for_user(&self, owner: UserId) -> Result<Vec<Post>, RepoError> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE user_id = ? ORDER BY created_at DESC, id DESC"
        );
        let rows: Vec<DbPost> = sqlx::query_as(&sql)
            .bind(owner.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbPost::into_domain).collect()
    }

    async fn update_post(&self, id: PostId, patch: UpdatePostRequest) -> Result<bool, RepoError> {
        let result = sqlx::query(
            r#"UPDATE posts SET
                   title = COALESCE(?, title),
                   content = COALESCE(?, content),
                   goal = COALESCE(?, goal),
                   updated_at = ?
               WHERE id = ?"#,
        )
        .bind(patch.title)
        .bind(patch.content)
        .bind(patch.goal)
        .bind(now_str())
        .bind(id.as_i64())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_post(&self, id: PostId) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_credential(&self, cred: NewCredential) -> Result<PaymentCredential, RepoError> {
        sqlx::query(
            r#"INSERT INTO payment_credentials (user_id, merchant_account, encrypted_secret)
               VALUES (?, ?, ?)"#,
        )
        .bind(cred.user_id.to_string())
        .bind(&cred.merchant_account)
        .bind(&cred.encrypted_secret)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Payment information already exists for this user"))?;

        self.find_credential_by_user(cred.user_id)
            .await?
            .ok_or(RepoError::NotFound)
    }

    async fn find_credential_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<PaymentCredential>, RepoError> {
        let sql = format!("SELECT {CREDENTIAL_COLUMNS} FROM payment_credentials WHERE user_id = ?");
        let row: Option<DbCredential> = sqlx::query_as(&sql)
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbCredential::into_domain).transpose()
    }

    async fn delete_credential_by_user(&self, user_id: UserId) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM payment_credentials WHERE user_id = ?")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
