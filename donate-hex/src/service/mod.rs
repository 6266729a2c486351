//! Donation Application Service
//!
//! Orchestrates domain operations through the repository and gateway ports.
//! Contains NO infrastructure logic - pure business orchestration.
//!
//! Operations are grouped by concern:
//! - `auth` - registration, login, OAuth sign-in, token checks
//! - `users` - profiles
//! - `posts` - fundraising campaigns
//! - `payments` - merchant credentials, purchases, transaction lists

mod auth;
mod payments;
mod posts;
mod tokens;
mod users;

pub use auth::AuthOutcome;
pub use tokens::{Claims, TokenConfig, TokenError, TokenIssuer, TokenKind, TokenPair};

use donate_repo::security::SecretCipher;
use donate_types::{DonateRepository, PaymentGateway};
use wayforpay::MerchantSettings;

/// Configuration the service needs besides its adapters.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub tokens: TokenConfig,
    pub merchant: MerchantSettings,
}

/// Application service for the donation platform.
///
/// Generic over the repository and gateway - adapters are injected at
/// compile time. It holds no per-request state: signing data for a purchase
/// lives in a `SigningContext` owned by the request.
pub struct DonateService<R: DonateRepository, G: PaymentGateway> {
    repo: R,
    gateway: G,
    cipher: SecretCipher,
    tokens: TokenIssuer,
    merchant: MerchantSettings,
}

impl<R: DonateRepository, G: PaymentGateway> DonateService<R, G> {
    pub fn new(repo: R, gateway: G, cipher: SecretCipher, config: ServiceConfig) -> Self {
        Self {
            repo,
            gateway,
            cipher,
            tokens: TokenIssuer::new(config.tokens),
            merchant: config.merchant,
        }
    }

    /// Returns a reference to the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }
}
