//! User profiles.

use donate_types::{
    AppError, DonateRepository, PaymentGateway, UpdateUserRequest, User, UserId, UserProfile,
};

use super::DonateService;

impl<R: DonateRepository, G: PaymentGateway> DonateService<R, G> {
    /// Lists all users without their password hashes.
    pub async fn list_users(&self) -> Result<Vec<UserProfile>, AppError> {
        let users = self.repo.list_users().await?;
        Ok(users.into_iter().map(UserProfile::from).collect())
    }

    /// Gets a user by ID.
    pub async fn get_user(&self, id: UserId) -> Result<User, AppError> {
        self.repo
            .get_user(id)
            .await
            .map_err(Into::into)
            .and_then(|opt| opt.ok_or_else(|| AppError::NotFound(format!("User with ID {id} not found"))))
    }

    pub async fn get_profile(&self, id: UserId) -> Result<UserProfile, AppError> {
        self.get_user(id).await.map(UserProfile::from)
    }

    /// Applies a partial update to the caller's own profile and returns the
    /// persisted result.
    pub async fn update_user(
        &self,
        caller: UserId,
        id: UserId,
        patch: UpdateUserRequest,
    ) -> Result<UserProfile, AppError> {
        if caller != id {
            return Err(AppError::Forbidden(
                "You do not have permission to update this user.".into(),
            ));
        }

        if !self.repo.update_user(id, patch).await? {
            return Err(AppError::NotFound(format!("User with ID {id} not found")));
        }

        self.get_profile(id).await
    }
}
