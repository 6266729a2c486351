//! Merchant credentials, purchases and transaction lists.
//!
//! Every gateway call follows the same shape: resolve the caller's
//! credentials into a fresh [`SigningContext`], build and sign the request
//! with it, drop it, then send. Nothing about a purchase outlives the call.

use chrono::Utc;
use donate_types::{
    AppError, DateRange, DomainError, DonateRepository, MessageResponse, NewCredential,
    PaymentGateway, PurchaseRequest, PurchaseResponse, SaveCredentialsRequest,
    TransactionListRequest, UserId,
};
use wayforpay::{SigningContext, build_purchase_form, transaction_list_query};

use super::DonateService;

const PURCHASE_FAILED: &str = "Failed to send payment request";
const TRANSACTION_LIST_FAILED: &str = "Failed to send transaction list request";

impl<R: DonateRepository, G: PaymentGateway> DonateService<R, G> {
    /// Stores the caller's merchant credentials with the secret encrypted.
    pub async fn save_credentials(
        &self,
        user_id: UserId,
        req: SaveCredentialsRequest,
    ) -> Result<MessageResponse, AppError> {
        let merchant_account = req.merchant_account.trim().to_string();
        if merchant_account.is_empty() {
            return Err(DomainError::ValidationError("Merchant account cannot be empty".into()).into());
        }
        if req.merchant_secret.is_empty() {
            return Err(DomainError::ValidationError("Merchant secret cannot be empty".into()).into());
        }

        if self.repo.find_credential_by_user(user_id).await?.is_some() {
            return Err(AppError::Conflict(
                "Payment information already exists for this user.".into(),
            ));
        }

        let encrypted_secret = self
            .cipher
            .encrypt(&req.merchant_secret)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        self.repo
            .create_credential(NewCredential {
                user_id,
                merchant_account,
                encrypted_secret,
            })
            .await?;

        tracing::info!(user_id = %user_id, "merchant credentials saved");
        Ok(MessageResponse {
            message: "Save data for WayForPay".into(),
        })
    }

    /// Deletes the credentials of `target`. Only the owner may do this.
    pub async fn delete_credentials(&self, caller: UserId, target: UserId) -> Result<(), AppError> {
        let credential = self
            .repo
            .find_credential_by_user(target)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("User with ID {target} has no payment details"))
            })?;

        if !credential.is_owned_by(caller) {
            return Err(AppError::Forbidden(
                "You do not have permission to access payment details.".into(),
            ));
        }

        if !self.repo.delete_credential_by_user(target).await? {
            return Err(AppError::NotFound(format!(
                "User with ID {target} has no payment details"
            )));
        }

        tracing::info!(user_id = %target, "merchant credentials deleted");
        Ok(())
    }

    /// Loads and decrypts a user's credentials into a new signing context.
    ///
    /// A missing record is `NotFound`; a secret that cannot be decrypted or
    /// decrypts to nothing is `Forbidden`.
    pub async fn prepare_credentials(&self, user_id: UserId) -> Result<SigningContext, AppError> {
        let credential = self
            .repo
            .find_credential_by_user(user_id)
            .await?
            .ok_or_else(|| {
                tracing::warn!(user_id = %user_id, "no merchant credentials on file");
                AppError::NotFound(format!("User with ID {user_id} has no payment details"))
            })?;

        let secret = match self.cipher.decrypt(&credential.encrypted_secret) {
            Ok(secret) if !secret.is_empty() => secret,
            Ok(_) => {
                tracing::warn!(user_id = %user_id, "merchant secret is empty");
                return Err(forbidden_credentials());
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "merchant secret could not be decrypted");
                return Err(forbidden_credentials());
            }
        };

        Ok(SigningContext::new(credential.merchant_account, secret.as_str()))
    }

    /// Signs a purchase with the caller's credentials and submits it.
    pub async fn create_purchase(
        &self,
        user_id: UserId,
        req: PurchaseRequest,
    ) -> Result<PurchaseResponse, AppError> {
        if !req.amount.is_finite() || req.amount <= 0.0 {
            return Err(DomainError::InvalidAmount.into());
        }
        if req.product_name.joined().trim().is_empty() {
            return Err(DomainError::ValidationError("Product name cannot be empty".into()).into());
        }

        let form = {
            let mut ctx = self.prepare_credentials(user_id).await?;
            build_purchase_form(
                &mut ctx,
                &self.merchant,
                &req.product_name,
                req.amount,
                &req.extra,
                Utc::now(),
            )
            .map_err(|e| AppError::Internal(e.to_string()))?
        };

        let redirect_url = self.gateway.submit_purchase(form).await.map_err(|e| {
            tracing::error!(user_id = %user_id, error = %e, "purchase request failed");
            AppError::Upstream(PURCHASE_FAILED.into())
        })?;

        Ok(PurchaseResponse { redirect_url })
    }

    /// Fetches the caller's transactions for a window of at most 31 days.
    ///
    /// The window is validated before any credential lookup or network call.
    pub async fn transaction_list(
        &self,
        user_id: UserId,
        req: TransactionListRequest,
    ) -> Result<Vec<serde_json::Value>, AppError> {
        let range = DateRange::new(req.date_begin, req.date_end)?;

        let query = {
            let ctx = self.prepare_credentials(user_id).await?;
            transaction_list_query(&ctx, range)
        };

        self.gateway.list_transactions(query).await.map_err(|e| {
            tracing::error!(user_id = %user_id, error = %e, "transaction list request failed");
            AppError::Upstream(TRANSACTION_LIST_FAILED.into())
        })
    }
}

fn forbidden_credentials() -> AppError {
    AppError::Forbidden("You do not have permission to access payment details.".into())
}
