//! PostgreSQL repository adapter.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use donate_types::{
    CreatePostRequest, DonateRepository, NewCredential, NewUser, PaymentCredential, Post, PostId,
    RepoError, UpdatePostRequest, UpdateUserRequest, User, UserId,
};

use crate::types::{
    CREDENTIAL_COLUMNS, DbCredential, DbPost, DbUser, POST_COLUMNS, USER_COLUMNS,
    map_write_error,
};

// ─────────────────────────────────────────────────────────────────────────────
// PostgreSQL Repository
// ─────────────────────────────────────────────────────────────────────────────

/// PostgreSQL repository.
pub struct PostgresRepo {
    pool: PgPool,
}

/// Executes SQL statements from a migration file, splitting by semicolons.
async fn execute_migration(pool: &PgPool, sql: &str, name: &str) -> Result<(), anyhow::Error> {
    for statement in sql.split(';') {
        let stmt = statement.trim();
        if !stmt.is_empty() {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .map_err(|e| anyhow::anyhow!("Migration {} failed: {}", name, e))?;
        }
    }
    Ok(())
}

/// Runs all database migrations.
async fn run_migrations(pool: &PgPool) -> Result<(), anyhow::Error> {
    execute_migration(
        pool,
        include_str!("../migrations/0001_create_users_pg.sql"),
        "0001",
    )
    .await?;

    execute_migration(
        pool,
        include_str!("../migrations/0002_create_posts_pg.sql"),
        "0002",
    )
    .await?;

    execute_migration(
        pool,
        include_str!("../migrations/0003_create_payment_credentials_pg.sql"),
        "0003",
    )
    .await?;

    Ok(())
}

impl PostgresRepo {
    /// Creates a new PostgreSQL repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Repository implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl DonateRepository for PostgresRepo {
    async fn create_user(&self, user: NewUser) -> Result<User, RepoError> {
        let now = Utc::now();
        let sql = format!(
            r#"INSERT INTO users (id, email, password_hash, first_name, last_name, picture, role, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
               RETURNING {USER_COLUMNS}"#
        );

        let row: DbUser = sqlx::query_as(&sql)
            .bind(user.id.into_uuid())
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.picture)
            .bind(user.role.as_str())
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_write_error(e, "This email is already in use"))?;

        row.into_domain()
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepoError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row: Option<DbUser> = sqlx::query_as(&sql)
            .bind(id.into_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbUser::into_domain).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
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
                   first_name = COALESCE($1, first_name),
                   last_name = COALESCE($2, last_name),
                   picture = COALESCE($3, picture),
                   role = COALESCE($4, role),
                   birthday = COALESCE($5, birthday),
                   city = COALESCE($6, city),
                   country = COALESCE($7, country),
                   updated_at = $8
               WHERE id = $9"#,
        )
        .bind(patch.first_name)
        .bind(patch.last_name)
        .bind(patch.picture)
        .bind(patch.role.map(|r| r.as_str()))
        .bind(patch.birthday)
        .bind(patch.city)
        .bind(patch.country)
        .bind(Utc::now())
        .bind(id.into_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_post(&self, owner: UserId, req: CreatePostRequest) -> Result<Post, RepoError> {
        let now = Utc::now();
        let sql = format!(
            r#"INSERT INTO posts (title, content, goal, user_id, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $5)
               RETURNING {POST_COLUMNS}"#
        );

        let row: DbPost = sqlx::query_as(&sql)
            .bind(&req.title)
            .bind(&req.content)
            .bind(&req.goal)
            .bind(owner.into_uuid())
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        row.into_domain()
    }

    async fn get_post(&self, id: PostId) -> Result<Option<Post>, RepoError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
        let row: Option<DbPost> = sqlx::query_as(&sql)
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbPost::into_domain).transpose()
    }

    async fn list_posts_for_user(&self, owner: UserId) -> Result<Vec<Post>, RepoError> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        );
        let rows: Vec<DbPost> = sqlx::query_as(&sql)
            .bind(owner.into_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbPost::into_domain).collect()
    }

    async fn update_post(&self, id: PostId, patch: UpdatePostRequest) -> Result<bool, RepoError> {
        let result = sqlx::query(
            r#"UPDATE posts SET
                   title = COALESCE($1, title),
                   content = COALESCE($2, content),
                   goal = COALESCE($3, goal),
                   updated_at = $4
               WHERE id = $5"#,
        )
        .bind(patch.title)
        .bind(patch.content)
        .bind(patch.goal)
        .bind(Utc::now())
        .bind(id.as_i64())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_post(&self, id: PostId) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_credential(&self, cred: NewCredential) -> Result<PaymentCredential, RepoError> {
        let sql = format!(
            r#"INSERT INTO payment_credentials (user_id, merchant_account, encrypted_secret)
               VALUES ($1, $2, $3)
               RETURNING {CREDENTIAL_COLUMNS}"#
        );

        let row: DbCredential = sqlx::query_as(&sql)
            .bind(cred.user_id.into_uuid())
            .bind(&cred.merchant_account)
            .bind(&cred.encrypted_secret)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_write_error(e, "Payment information already exists for this user"))?;

        row.into_domain()
    }

    async fn find_credential_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<PaymentCredential>, RepoError> {
        let sql = format!("SELECT {CREDENTIAL_COLUMNS} FROM payment_credentials WHERE user_id = $1");
        let row: Option<DbCredential> = sqlx::query_as(&sql)
            .bind(user_id.into_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbCredential::into_domain).transpose()
    }

    async fn delete_credential_by_user(&self, user_id: UserId) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM payment_credentials WHERE user_id = $1")
            .bind(user_id.into_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
