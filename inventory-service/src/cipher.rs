//! Symmetric encryption of individual secret strings.
//!
//! AES-256-GCM with a fresh 96-bit nonce per call. The stored form is the
//! standard base64 encoding of `nonce || ciphertext`, so a value can be kept
//! in any string field of a document.

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose, Engine as _};
use rand::RngCore;
use secrecy::{ExposeSecret, Secret};
use std::fmt;
use thiserror::Error;
use zeroize::{Zeroize, Zeroizing};

/// AES-256 key length in bytes.
pub const KEY_SIZE: usize = 32;

/// AES-GCM nonce length in bytes.
pub const NONCE_SIZE: usize = 12;

#[derive(Debug, Error)]
pub enum CipherError {
    #[error("encryption key is not configured")]
    KeyUnavailable,

    #[error("invalid encryption key: {0}")]
    InvalidKey(String),

    #[error("malformed ciphertext: {0}")]
    Malformed(String),

    #[error("secret encryption failed")]
    Encryption,

    #[error("secret decryption failed")]
    Decryption,
}

/// Stateless encrypt/decrypt of one secret value.
#[derive(Clone)]
pub struct SecretCipher {
    key: Option<Zeroizing<[u8; KEY_SIZE]>>,
}

impl fmt::Debug for SecretCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretCipher")
            .field("key_configured", &self.key.is_some())
            .finish()
    }
}

impl SecretCipher {
    pub fn new(key: [u8; KEY_SIZE]) -> Self {
        Self {
            key: Some(Zeroizing::new(key)),
        }
    }

    /// A cipher with no key; every operation fails with `KeyUnavailable`.
    pub fn unavailable() -> Self {
        Self { key: None }
    }

    /// Build from a base64-encoded 32-byte key.
    pub fn from_base64(encoded: &str) -> Result<Self, CipherError> {
        let mut raw = general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| CipherError::InvalidKey(e.to_string()))?;

        if raw.len() != KEY_SIZE {
            let actual = raw.len();
            raw.zeroize();
            return Err(CipherError::InvalidKey(format!(
                "expected {} bytes, got {}",
                KEY_SIZE, actual
            )));
        }

        let mut key = Zeroizing::new([0u8; KEY_SIZE]);
        key.copy_from_slice(&raw);
        raw.zeroize();
        Ok(Self { key: Some(key) })
    }

    pub fn from_config(key: Option<&Secret<String>>) -> Result<Self, CipherError> {
        match key {
            Some(key) => Self::from_base64(key.expose_secret()),
            None => {
                tracing::warn!("No credential encryption key configured; secret fields cannot be stored or read");
                Ok(Self::unavailable())
            }
        }
    }

    /// Generate a random key, e.g. for provisioning a new deployment.
    pub fn generate_key() -> Zeroizing<[u8; KEY_SIZE]> {
        let mut key = Zeroizing::new([0u8; KEY_SIZE]);
        OsRng.fill_bytes(key.as_mut());
        key
    }

    pub fn is_available(&self) -> bool {
        self.key.is_some()
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let cipher = self.cipher()?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|_| CipherError::Encryption)?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);

        Ok(general_purpose::STANDARD.encode(sealed))
    }

    pub fn decrypt(&self, sealed: &str) -> Result<Zeroizing<String>, CipherError> {
        let cipher = self.cipher()?;

        let data = general_purpose::STANDARD
            .decode(sealed)
            .map_err(|e| CipherError::Malformed(e.to_string()))?;

        if data.len() <= NONCE_SIZE {
            return Err(CipherError::Malformed(format!(
                "expected more than {} bytes, got {}",
                NONCE_SIZE,
                data.len()
            )));
        }

        let (nonce, ciphertext) = data.split_at(NONCE_SIZE);
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CipherError::Decryption)?;

        String::from_utf8(plaintext).map(Zeroizing::new).map_err(|e| {
            e.into_bytes().zeroize();
            CipherError::Malformed("plaintext is not valid UTF-8".to_string())
        })
    }

    fn cipher(&self) -> Result<Aes256Gcm, CipherError> {
        let key = self.key.as_ref().ok_or(CipherError::KeyUnavailable)?;
        Ok(Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_slice())))
    }
}
