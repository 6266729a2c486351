//! Google OAuth 2.0 identity provider.
//!
//! Authorization code flow: the browser is sent to the consent page, Google
//! calls back with a code, and the code is exchanged for an access token that
//! reads the user's OpenID profile.

use std::time::Duration;

use donate_types::{GatewayError, IdentityProvider, OAuthProfile};
use reqwest::Url;
use serde::Deserialize;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";
const SCOPES: &str = "openid email profile";

/// OAuth client registration.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Must match a redirect URI registered for the client.
    pub callback_url: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    email: Option<String>,
    given_name: Option<String>,
    family_name: Option<String>,
    picture: Option<String>,
}

pub struct GoogleIdentityProvider {
    http: reqwest::Client,
    config: GoogleConfig,
    authorize_url: String,
    token_url: String,
    userinfo_url: String,
}

impl GoogleIdentityProvider {
    pub fn new(config: GoogleConfig) -> Result<Self, GatewayError> {
        Self::with_endpoints(config, AUTHORIZE_URL, TOKEN_URL, USERINFO_URL)
    }

    /// Same as [`new`](Self::new) with the Google endpoints replaced.
    pub fn with_endpoints(
        config: GoogleConfig,
        authorize_endpoint: &str,
        token_url: &str,
        userinfo_url: &str,
    ) -> Result<Self, GatewayError> {
        let authorize_url = Url::parse_with_params(
            authorize_endpoint,
            &[
                ("client_id", config.client_id.as_str()),
                ("redirect_uri", config.callback_url.as_str()),
                ("response_type", "code"),
                ("scope", SCOPES),
            ],
        )
        .map_err(|e| GatewayError::InvalidResponse(format!("bad authorize endpoint: {e}")))?
        .to_string();

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            config,
            authorize_url,
            token_url: token_url.to_string(),
            userinfo_url: userinfo_url.to_string(),
        })
    }

    async fn fetch_access_token(&self, code: &str) -> Result<String, GatewayError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.callback_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GatewayError::Status(response.status().as_u16()));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        Ok(token.access_token)
    }
}

#[async_trait::async_trait]
impl IdentityProvider for GoogleIdentityProvider {
    fn authorize_url(&self) -> String {
        self.authorize_url.clone()
    }

    #[tracing::instrument(skip_all)]
    async fn exchange_code(&self, code: &str) -> Result<OAuthProfile, GatewayError> {
        let access_token = self.fetch_access_token(code).await?;

        let response = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GatewayError::Status(response.status().as_u16()));
        }

        let info: UserInfo = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        let email = info
            .email
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| GatewayError::InvalidResponse("profile has no email".into()))?;

        tracing::debug!("google profile fetched");
        Ok(OAuthProfile {
            email,
            first_name: info.given_name,
            last_name: info.family_name,
            picture: info.picture,
        })
    }
}
