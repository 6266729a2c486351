//! JWT access and refresh tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use donate_types::UserId;

/// Token settings.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// HS256 signing secret.
    pub secret: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production".to_string(),
            access_ttl_minutes: 30,
            refresh_ttl_days: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub email: String,
    pub kind: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to encode token: {0}")]
    Encoding(String),

    #[error("token has expired")]
    Expired,

    #[error("invalid token")]
    Invalid,

    #[error("unexpected token kind")]
    WrongKind,
}

/// An issued access/refresh pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct TokenIssuer {
    config: TokenConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("access_ttl_minutes", &self.config.access_ttl_minutes)
            .field("refresh_ttl_days", &self.config.refresh_ttl_days)
            .field("secret", &"[hidden]")
            .finish()
    }
}

impl TokenIssuer {
    pub fn new(config: TokenConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    fn issue(
        &self,
        user_id: UserId,
        email: &str,
        kind: TokenKind,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            kind,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    pub fn issue_pair(&self, user_id: UserId, email: &str) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue(
                user_id,
                email,
                TokenKind::Access,
                Duration::minutes(self.config.access_ttl_minutes),
            )?,
            refresh_token: self.issue(
                user_id,
                email,
                TokenKind::Refresh,
                Duration::days(self.config.refresh_ttl_days),
            )?,
        })
    }

    /// Decodes a token and checks its signature, expiry and kind.
    pub fn validate(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })?;

        if claims.kind != expected {
            return Err(TokenError::WrongKind);
        }
        Ok(claims)
    }

    /// Access token lifetime in seconds.
    pub fn access_max_age(&self) -> i64 {
        self.config.access_ttl_minutes * 60
    }

    /// Refresh token lifetime in seconds.
    pub fn refresh_max_age(&self) -> i64 {
        self.config.refresh_ttl_days * 24 * 60 * 60
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(TokenConfig {
            secret: "test-secret-key-for-testing".to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn test_issue_and_validate_access_token() {
        let issuer = issuer();
        let user_id = UserId::new();

        let pair = issuer.issue_pair(user_id, "alice@example.com").unwrap();
        let claims = issuer.validate(&pair.access_token, TokenKind::Access).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let issuer = issuer();
        let pair = issuer.issue_pair(UserId::new(), "a@example.com").unwrap();

        assert!(matches!(
            issuer.validate(&pair.refresh_token, TokenKind::Access),
            Err(TokenError::WrongKind)
        ));
        assert!(issuer.validate(&pair.refresh_token, TokenKind::Refresh).is_ok());
    }

    #[test]
    fn test_token_from_other_secret_is_invalid() {
        let other = TokenIssuer::new(TokenConfig {
            secret: "another-secret".to_string(),
            ..Default::default()
        });
        let pair = other.issue_pair(UserId::new(), "a@example.com").unwrap();

        assert!(matches!(
            issuer().validate(&pair.access_token, TokenKind::Access),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_expired_token() {
        let issuer = TokenIssuer::new(TokenConfig {
            secret: "test-secret-key-for-testing".to_string(),
            access_ttl_minutes: -5,
            refresh_ttl_days: 30,
        });
        let pair = issuer.issue_pair(UserId::new(), "a@example.com").unwrap();

        assert!(matches!(
            issuer.validate(&pair.access_token, TokenKind::Access),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_max_ages() {
        let issuer = issuer();
        assert_eq!(issuer.access_max_age(), 1800);
        assert_eq!(issuer.refresh_max_age(), 2_592_000);
    }
}
