//! Registration, login and token checks.

use donate_repo::security::{hash_password, verify_password};
use donate_types::domain::user::normalize_email;
use donate_types::{
    AppError, DonateRepository, LoginRequest, NewUser, OAuthProfile, PaymentGateway,
    RegisterRequest, RepoError, User, UserId,
};

use super::DonateService;
use super::tokens::{TokenError, TokenKind, TokenPair};

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const EMAIL_IN_USE: &str = "This email is already in use";

/// A signed-in user and the tokens to hand back as cookies.
#[derive(Debug, Clone)]
pub struct AuthOutcome {
    pub user_id: UserId,
    pub tokens: TokenPair,
}

impl<R: DonateRepository, G: PaymentGateway> DonateService<R, G> {
    /// Registers a local account and signs it in.
    pub async fn register(&self, req: RegisterRequest) -> Result<AuthOutcome, AppError> {
        if req.password != req.repeat_password {
            return Err(AppError::BadRequest("Invalid repeat password".into()));
        }
        if req.password.is_empty() {
            return Err(AppError::BadRequest("Password cannot be empty".into()));
        }

        let email = normalize_email(&req.email);
        if self.repo.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::BadRequest(EMAIL_IN_USE.into()));
        }

        let password_hash = hash_password_blocking(req.password).await?;
        let new_user = NewUser::new(&email, Some(password_hash))?
            .with_names(req.first_name, req.last_name)
            .with_role(req.role.unwrap_or_default());

        let user = self.repo.create_user(new_user).await.map_err(|e| match e {
            RepoError::Conflict(_) => AppError::BadRequest(EMAIL_IN_USE.into()),
            e => e.into(),
        })?;

        tracing::info!(user_id = %user.id, "user registered");
        self.sign_in(&user)
    }

    /// Checks email and password. Every failure gives the same message.
    pub async fn login(&self, req: LoginRequest) -> Result<AuthOutcome, AppError> {
        let user = self
            .repo
            .find_user_by_email(&normalize_email(&req.email))
            .await?
            .ok_or_else(|| AppError::BadRequest(INVALID_CREDENTIALS.into()))?;

        let Some(stored_hash) = user.password_hash.clone() else {
            return Err(AppError::BadRequest(INVALID_CREDENTIALS.into()));
        };

        if !verify_password_blocking(req.password, stored_hash).await? {
            return Err(AppError::BadRequest(INVALID_CREDENTIALS.into()));
        }

        self.sign_in(&user)
    }

    /// Finds or creates the user behind an OAuth profile and signs them in.
    pub async fn oauth_sign_in(&self, profile: OAuthProfile) -> Result<AuthOutcome, AppError> {
        let email = normalize_email(&profile.email);
        let user = match self.repo.find_user_by_email(&email).await? {
            Some(user) => user,
            None => {
                let new_user = NewUser::new(&email, None)?
                    .with_names(profile.first_name, profile.last_name)
                    .with_picture(profile.picture);
                match self.repo.create_user(new_user).await {
                    Ok(user) => {
                        tracing::info!(user_id = %user.id, "user created from oauth profile");
                        user
                    }
                    // Lost a race with a concurrent sign-in for the same email.
                    Err(RepoError::Conflict(_)) => self
                        .repo
                        .find_user_by_email(&email)
                        .await?
                        .ok_or_else(|| AppError::Internal("user vanished after conflict".into()))?,
                    Err(e) => return Err(e.into()),
                }
            }
        };

        self.sign_in(&user)
    }

    /// Exchanges a refresh token for a new pair.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthOutcome, AppError> {
        let user = self.resolve_token(refresh_token, TokenKind::Refresh).await?;
        self.sign_in(&user)
    }

    /// Resolves an access token to an existing user.
    pub async fn authenticate(&self, access_token: &str) -> Result<User, AppError> {
        self.resolve_token(access_token, TokenKind::Access).await
    }

    async fn resolve_token(&self, token: &str, kind: TokenKind) -> Result<User, AppError> {
        let claims = self.tokens.validate(token, kind).map_err(|e| {
            tracing::debug!(error = %e, "token rejected");
            match e {
                TokenError::Expired => AppError::Unauthorized("Token has expired".into()),
                _ => AppError::Unauthorized("Invalid token".into()),
            }
        })?;

        self.repo
            .get_user(claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Unknown user".into()))
    }

    fn sign_in(&self, user: &User) -> Result<AuthOutcome, AppError> {
        let tokens = self
            .tokens
            .issue_pair(user.id, &user.email)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(AuthOutcome {
            user_id: user.id,
            tokens,
        })
    }
}

async fn hash_password_blocking(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(|e| AppError::Internal(e.to_string()))
}

async fn verify_password_blocking(password: String, stored_hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))
}
