//! Fundraising posts.

use donate_types::domain::post::require_text;
use donate_types::{
    AppError, CreatePostRequest, DonateRepository, PaymentGateway, Post, PostId,
    UpdatePostRequest, UserId,
};

use super::DonateService;

impl<R: DonateRepository, G: PaymentGateway> DonateService<R, G> {
    /// Publishes a post owned by `owner`.
    pub async fn create_post(&self, owner: UserId, req: CreatePostRequest) -> Result<Post, AppError> {
        require_text("title", &req.title)?;
        require_text("content", &req.content)?;
        require_text("goal", &req.goal)?;

        let post = self.repo.create_post(owner, req).await?;
        tracing::info!(post_id = %post.id, owner = %owner, "post created");
        Ok(post)
    }

    /// Gets a post by ID.
    pub async fn get_post(&self, id: PostId) -> Result<Post, AppError> {
        self.repo
            .get_post(id)
            .await
            .map_err(Into::into)
            .and_then(|opt| opt.ok_or_else(|| AppError::NotFound(format!("Post with ID {id} not found"))))
    }

    /// Lists a user's posts, newest first.
    pub async fn list_posts_for_user(&self, owner: UserId) -> Result<Vec<Post>, AppError> {
        // Verify user exists first
        let _ = self.get_user(owner).await?;

        self.repo
            .list_posts_for_user(owner)
            .await
            .map_err(Into::into)
    }

    /// Applies a partial update to a post the caller owns, then re-reads it.
    pub async fn update_post(
        &self,
        caller: UserId,
        id: PostId,
        patch: UpdatePostRequest,
    ) -> Result<Post, AppError> {
        for (field, value) in [
            ("title", &patch.title),
            ("content", &patch.content),
            ("goal", &patch.goal),
        ] {
            if let Some(value) = value {
                require_text(field, value)?;
            }
        }

        self.owned_post(caller, id).await?;

        if !self.repo.update_post(id, patch).await? {
            return Err(AppError::NotFound(format!("Post with ID {id} not found")));
        }
        self.get_post(id).await
    }

    /// Deletes a post the caller owns.
    pub async fn delete_post(&self, caller: UserId, id: PostId) -> Result<(), AppError> {
        self.owned_post(caller, id).await?;

        if !self.repo.delete_post(id).await? {
            return Err(AppError::NotFound(format!("Post with ID {id} not found")));
        }
        tracing::info!(post_id = %id, "post deleted");
        Ok(())
    }

    async fn owned_post(&self, caller: UserId, id: PostId) -> Result<Post, AppError> {
        let post = self.get_post(id).await?;
        if !post.is_owned_by(caller) {
            return Err(AppError::Forbidden(
                "You do not have permission to access this post.".into(),
            ));
        }
        Ok(post)
    }
}
