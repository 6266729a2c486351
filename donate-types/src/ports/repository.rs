//! Repository port trait.
//!
//! This is the primary port in our hexagonal architecture.
//! Adapters (Postgres, SQLite) implement this trait.

use crate::domain::{NewCredential, NewUser, PaymentCredential, Post, PostId, User, UserId};
use crate::dto::{CreatePostRequest, UpdatePostRequest, UpdateUserRequest};
use crate::error::RepoError;

/// The repository port for users, posts and merchant credentials.
///
/// Unique constraints (user email, one credential per user) are enforced by
/// the store and reported as `RepoError::Conflict`.
#[async_trait::async_trait]
pub trait DonateRepository: Send + Sync + 'static {
    // ─────────────────────────────────────────────────────────────────────────────
    // User Operations
    // ─────────────────────────────────────────────────────────────────────────────

    /// Inserts a user. Duplicate email is a conflict.
    async fn create_user(&self, user: NewUser) -> Result<User, RepoError>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepoError>;

    /// Looks a user up by normalized email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    async fn list_users(&self) -> Result<Vec<User>, RepoError>;

    /// Applies the provided fields. Returns `false` when the user does not exist.
    async fn update_user(&self, id: UserId, patch: UpdateUserRequest) -> Result<bool, RepoError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Post Operations
    // ─────────────────────────────────────────────────────────────────────────────

    async fn create_post(&self, owner: UserId, req: CreatePostRequest) -> Result<Post, RepoError>;

    async fn get_post(&self, id: PostId) -> Result<Option<Post>, RepoError>;

    /// Posts owned by a user, newest first.
    async fn list_posts_for_user(&self, owner: UserId) -> Result<Vec<Post>, RepoError>;

    /// Applies the provided fields. Returns `false` when the post does not exist.
    async fn update_post(&self, id: PostId, patch: UpdatePostRequest) -> Result<bool, RepoError>;

    async fn delete_post(&self, id: PostId) -> Result<bool, RepoError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Merchant Credentials
    // ─────────────────────────────────────────────────────────────────────────────

    /// Stores a credential. A second credential for the same user is a conflict.
    async fn create_credential(&self, cred: NewCredential) -> Result<PaymentCredential, RepoError>;

    async fn find_credential_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<PaymentCredential>, RepoError>;

    async fn delete_credential_by_user(&self, user_id: UserId) -> Result<bool, RepoError>;
}
