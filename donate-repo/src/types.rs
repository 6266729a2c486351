//! Shared database types with feature-gated fields for SQLite and PostgreSQL.

use sqlx::FromRow;

use donate_types::{
    CredentialId, PaymentCredential, Post, PostId, RepoError, User, UserId, UserRole,
};

// ─────────────────────────────────────────────────────────────────────────────
// Feature-gated imports
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(not(feature = "sqlite"))]
use chrono::{DateTime, NaiveDate, Utc};
#[cfg(not(feature = "sqlite"))]
use uuid::Uuid;

// ─────────────────────────────────────────────────────────────────────────────
// Database row structs (derive FromRow for automatic mapping)
// ─────────────────────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, picture, role, \
     birthday, city, country, created_at, updated_at";

pub const POST_COLUMNS: &str = "id, title, content, goal, user_id, created_at, updated_at";

pub const CREDENTIAL_COLUMNS: &str = "id, user_id, merchant_account, encrypted_secret";

/// User row from database.
#[derive(FromRow)]
pub struct DbUser {
    #[cfg(not(feature = "sqlite"))]
    pub id: Uuid,
    #[cfg(feature = "sqlite")]
    pub id: String,

    pub email: String,
    pub password_hash: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub picture: Option<String>,
    pub role: String,

    #[cfg(not(feature = "sqlite"))]
    pub birthday: Option<NaiveDate>,
    #[cfg(feature = "sqlite")]
    pub birthday: Option<String>,

    pub city: Option<String>,
    pub country: Option<String>,

    #[cfg(not(feature = "sqlite"))]
    pub created_at: DateTime<Utc>,
    #[cfg(feature = "sqlite")]
    pub created_at: String,

    #[cfg(not(feature = "sqlite"))]
    pub updated_at: DateTime<Utc>,
    #[cfg(feature = "sqlite")]
    pub updated_at: String,
}

/// Post row from database.
#[derive(FromRow)]
pub struct DbPost {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub goal: String,

    #[cfg(not(feature = "sqlite"))]
    pub user_id: Uuid,
    #[cfg(feature = "sqlite")]
    pub user_id: String,

    #[cfg(not(feature = "sqlite"))]
    pub created_at: DateTime<Utc>,
    #[cfg(feature = "sqlite")]
    pub created_at: String,

    #[cfg(not(feature = "sqlite"))]
    pub updated_at: DateTime<Utc>,
    #[cfg(feature = "sqlite")]
    pub updated_at: String,
}

/// Merchant credential row from database.
#[derive(FromRow)]
pub struct DbCredential {
    pub id: i64,

    #[cfg(not(feature = "sqlite"))]
    pub user_id: Uuid,
    #[cfg(feature = "sqlite")]
    pub user_id: String,

    pub merchant_account: String,
    pub encrypted_secret: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Parsing helpers
// ─────────────────────────────────────────────────────────────────────────────

pub fn parse_role(s: &str) -> Result<UserRole, RepoError> {
    s.parse()
        .map_err(|_| RepoError::Database(format!("Unknown user role: {}", s)))
}

#[cfg(feature = "sqlite")]
pub fn parse_user_id(s: &str) -> Result<UserId, RepoError> {
    uuid::Uuid::parse_str(s)
        .map(UserId::from_uuid)
        .map_err(|e| RepoError::Database(e.to_string()))
}

#[cfg(feature = "sqlite")]
pub fn parse_timestamp(s: &str) -> Result<chrono::DateTime<chrono::Utc>, RepoError> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| RepoError::Database(e.to_string()))
}

#[cfg(feature = "sqlite")]
pub fn parse_date(s: &str) -> Result<chrono::NaiveDate, RepoError> {
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| RepoError::Database(e.to_string()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Domain conversion (feature-gated implementations)
// ─────────────────────────────────────────────────────────────────────────────

impl DbUser {
    /// Convert database row to domain User.
    pub fn into_domain(self) -> Result<User, RepoError> {
        let role = parse_role(&self.role)?;

        #[cfg(not(feature = "sqlite"))]
        let (id, birthday, created_at, updated_at) = (
            UserId::from_uuid(self.id),
            self.birthday,
            self.created_at,
            self.updated_at,
        );

        #[cfg(feature = "sqlite")]
        let (id, birthday, created_at, updated_at) = (
            parse_user_id(&self.id)?,
            self.birthday.as_deref().map(parse_date).transpose()?,
            parse_timestamp(&self.created_at)?,
            parse_timestamp(&self.updated_at)?,
        );

        Ok(User {
            id,
            email: self.email,
            password_hash: self.password_hash,
            first_name: self.first_name,
            last_name: self.last_name,
            picture: self.picture,
            role,
            birthday,
            city: self.city,
            country: self.country,
            created_at,
            updated_at,
        })
    }
}

impl DbPost {
    /// Convert database row to domain Post.
    pub fn into_domain(self) -> Result<Post, RepoError> {
        #[cfg(not(feature = "sqlite"))]
        let (user_id, created_at, updated_at) = (
            UserId::from_uuid(self.user_id),
            self.created_at,
            self.updated_at,
        );

        #[cfg(feature = "sqlite")]
        let (user_id, created_at, updated_at) = (
            parse_user_id(&self.user_id)?,
            parse_timestamp(&self.created_at)?,
            parse_timestamp(&self.updated_at)?,
        );

        Ok(Post {
            id: PostId::new(self.id),
            title: self.title,
            content: self.content,
            goal: self.goal,
            user_id,
            created_at,
            updated_at,
        })
    }
}

impl DbCredential {
    /// Convert database row to domain PaymentCredential.
    pub fn into_domain(self) -> Result<PaymentCredential, RepoError> {
        #[cfg(not(feature = "sqlite"))]
        let user_id = UserId::from_uuid(self.user_id);

        #[cfg(feature = "sqlite")]
        let user_id = parse_user_id(&self.user_id)?;

        Ok(PaymentCredential {
            id: CredentialId::new(self.id),
            user_id,
            merchant_account: self.merchant_account,
            encrypted_secret: self.encrypted_secret,
        })
    }
}

/// Maps a driver error, turning unique-constraint violations into `Conflict`.
pub fn map_write_error(err: sqlx::Error, conflict: &str) -> RepoError {
    match err.as_database_error() {
        Some(db) if db.is_unique_violation() => RepoError::Conflict(conflict.to_string()),
        _ => {
            tracing::warn!(error = %err, "write failed");
            RepoError::Database(err.to_string())
        }
    }
}
