//! OAuth identity provider port.

use crate::domain::OAuthProfile;
use crate::ports::GatewayError;

#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    /// Consent page the browser is redirected to.
    fn authorize_url(&self) -> String;

    /// Exchanges an authorization code for the user's profile.
    async fn exchange_code(&self, code: &str) -> Result<OAuthProfile, GatewayError>;
}
