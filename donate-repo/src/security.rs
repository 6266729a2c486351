//! Password hashing and reversible encryption of merchant secrets.

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, KeyInit, OsRng, rand_core::RngCore},
};
use argon2::{
    Argon2, PasswordHash,
    password_hash::{PasswordHasher, PasswordVerifier, SaltString},
};
use zeroize::Zeroizing;

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

#[derive(Debug, thiserror::Error)]
pub enum SecurityError {
    #[error("encryption key must be exactly {KEY_LEN} bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("failed to hash password: {0}")]
    Hashing(String),

    #[error("encryption failed")]
    Encryption,

    #[error("malformed ciphertext")]
    MalformedCiphertext,

    #[error("decryption failed")]
    Decryption,
}

// ─────────────────────────────────────────────────────────────────────────────
// Passwords
// ─────────────────────────────────────────────────────────────────────────────

/// Hashes a password with Argon2id into a PHC string.
pub fn hash_password(password: &str) -> Result<String, SecurityError> {
    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| SecurityError::Hashing(e.to_string()))
}

/// Verifies a password against a stored PHC hash. A malformed hash never matches.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

// ─────────────────────────────────────────────────────────────────────────────
// Merchant secrets
// ─────────────────────────────────────────────────────────────────────────────

/// AES-256-GCM cipher for merchant secrets at rest.
///
/// Stored format is `hex(nonce) ":" hex(ciphertext || tag)` with a fresh
/// random nonce per encryption.
#[derive(Clone)]
pub struct SecretCipher {
    cipher: Aes256Gcm,
}

impl SecretCipher {
    /// Uses `key` verbatim as the AES-256 key.
    pub fn new(key: &[u8]) -> Result<Self, SecurityError> {
        if key.len() != KEY_LEN {
            return Err(SecurityError::InvalidKeyLength(key.len()));
        }
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
        Ok(Self { cipher })
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, SecurityError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| SecurityError::Encryption)?;

        Ok(format!(
            "{}:{}",
            hex::encode(nonce_bytes),
            hex::encode(ciphertext)
        ))
    }

    pub fn decrypt(&self, stored: &str) -> Result<Zeroizing<String>, SecurityError> {
        let (nonce_hex, ciphertext_hex) = stored
            .split_once(':')
            .ok_or(SecurityError::MalformedCiphertext)?;
        let nonce_bytes =
            hex::decode(nonce_hex).map_err(|_| SecurityError::MalformedCiphertext)?;
        if nonce_bytes.len() != NONCE_LEN {
            return Err(SecurityError::MalformedCiphertext);
        }
        let ciphertext =
            hex::decode(ciphertext_hex).map_err(|_| SecurityError::MalformedCiphertext)?;

        let plaintext = Zeroizing::new(
            self.cipher
                .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_slice())
                .map_err(|_| SecurityError::Decryption)?,
        );

        String::from_utf8(plaintext.to_vec())
            .map(Zeroizing::new)
            .map_err(|_| SecurityError::Decryption)
    }
}

impl std::fmt::Debug for SecretCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretCipher([REDACTED])")
    }
}
