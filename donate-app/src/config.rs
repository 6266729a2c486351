//! Configuration loading from environment.

use std::{env, str::FromStr, time::Duration};

use anyhow::Context;

/// AES-256 needs exactly this many key bytes.
const ENCRYPTION_KEY_LEN: usize = 32;

/// Google OAuth client settings. All three variables must be present.
pub struct GoogleOAuth {
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
}

/// WayForPay endpoints and the URLs the gateway sends payers back to.
pub struct WayforpayConfig {
    pub payment_url: String,
    pub transaction_list_url: String,
    pub merchant_domain_name: String,
    pub approved_url: String,
    pub declined_url: String,
    pub approved_redirect_url: String,
    pub declined_redirect_url: String,
    pub timeout: Duration,
}

/// Application configuration.
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub encryption_key: Vec<u8>,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,
    pub cookie_secure: bool,
    pub rate_limit_per_minute: u32,
    pub wayforpay: WayforpayConfig,
    pub google: Option<GoogleOAuth>,
    pub oauth_redirect_url: Option<String>,
}

fn required(name: &str) -> anyhow::Result<String> {
    env::var(name).map_err(|_| anyhow::anyhow!("{name} environment variable is required"))
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} has an invalid value: {raw}")),
        None => Ok(default),
    }
}

fn encryption_key(raw: String) -> anyhow::Result<Vec<u8>> {
    let key = raw.into_bytes();
    anyhow::ensure!(
        key.len() == ENCRYPTION_KEY_LEN,
        "ENCRYPTION_KEY must be exactly {ENCRYPTION_KEY_LEN} bytes, got {}",
        key.len()
    );
    Ok(key)
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let port = parsed_or("PORT", 3000)?;
        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;
        let encryption_key = encryption_key(required("ENCRYPTION_KEY")?)?;

        let wayforpay = WayforpayConfig {
            payment_url: optional("WAYFORPAY_PAYMENT_URL")
                .unwrap_or_else(|| "https://secure.wayforpay.com/pay".to_string()),
            transaction_list_url: optional("WAYFORPAY_TRANSACTION_LIST_URL")
                .unwrap_or_else(|| "https://api.wayforpay.com/api".to_string()),
            merchant_domain_name: required("WAYFORPAY_MERCHANT_DOMAIN_NAME")?,
            approved_url: required("WAYFORPAY_APPROVED_URL")?,
            declined_url: required("WAYFORPAY_DECLINED_URL")?,
            approved_redirect_url: required("WAYFORPAY_APPROVED_REDIRECT_URL")?,
            declined_redirect_url: required("WAYFORPAY_DECLINED_REDIRECT_URL")?,
            timeout: Duration::from_secs(parsed_or("WAYFORPAY_TIMEOUT_SECS", 30)?),
        };

        let google = match (
            optional("GOOGLE_CLIENT_ID"),
            optional("GOOGLE_CLIENT_SECRET"),
            optional("GOOGLE_CALLBACK_URL"),
        ) {
            (Some(client_id), Some(client_secret), Some(callback_url)) => Some(GoogleOAuth {
                client_id,
                client_secret,
                callback_url,
            }),
            (None, None, None) => None,
            _ => anyhow::bail!(
                "GOOGLE_CLIENT_ID, GOOGLE_CLIENT_SECRET and GOOGLE_CALLBACK_URL must be set together"
            ),
        };

        Ok(Self {
            port,
            database_url,
            jwt_secret,
            encryption_key,
            access_token_ttl_minutes: parsed_or("ACCESS_TOKEN_TTL_MINUTES", 30)?,
            refresh_token_ttl_days: parsed_or("REFRESH_TOKEN_TTL_DAYS", 30)?,
            cookie_secure: parsed_or("COOKIE_SECURE", false)?,
            rate_limit_per_minute: parsed_or("RATE_LIMIT_PER_MINUTE", 100)?,
            wayforpay,
            google,
            oauth_redirect_url: optional("OAUTH_REDIRECT_URL"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encryption_key_length() {
        assert!(encryption_key("0123456789abcdef0123456789abcdef".into()).is_ok());
        assert!(encryption_key("too-short".into()).is_err());
    }
}
