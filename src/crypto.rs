//! Visit-location encryption with AES-256-GCM.
//!
//! When a location encryption key is configured, the coordinate payload
//! attached to visit records is sealed before it reaches the database.
//!
//! Format: base64(nonce_12bytes || ciphertext || tag_16bytes)

use std::fmt;

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use base64::Engine;
use zeroize::Zeroize;

use crate::error::GatewayError;

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// Symmetric key for visit-location payloads (32 bytes, AES-256-GCM).
#[derive(Clone)]
pub struct LocationCrypto {
    key: [u8; KEY_LEN],
}

impl Drop for LocationCrypto {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl fmt::Debug for LocationCrypto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationCrypto").finish_non_exhaustive()
    }
}

impl LocationCrypto {
    /// Decodes a base64 key from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] when the value is not
    /// valid base64 or does not decode to exactly 32 bytes.
    pub fn from_base64(encoded: &str) -> Result<Self, GatewayError> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|_| {
                GatewayError::InvalidRequest("location key is not valid base64".to_string())
            })?;
        if bytes.len() != KEY_LEN {
            return Err(GatewayError::InvalidRequest(format!(
                "location key wrong length: {} (expected {KEY_LEN})",
                bytes.len()
            )));
        }
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(&bytes);
        Ok(Self { key })
    }

    /// Encrypts plaintext to `base64(nonce || ciphertext || tag)`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] on cipher failure.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String, GatewayError> {
        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|_| GatewayError::Internal("invalid encryption key".to_string()))?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| GatewayError::Internal("encryption failed".to_string()))?;

        let mut payload = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        payload.extend_from_slice(&nonce_bytes);
        payload.extend_from_slice(&ciphertext);
        Ok(base64::engine::general_purpose::STANDARD.encode(payload))
    }

    /// Decrypts a payload produced by [`Self::encrypt`].
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] on malformed input and
    /// [`GatewayError::Internal`] when the key is wrong or the payload
    /// was tampered with.
    pub fn decrypt(&self, encoded: &str) -> Result<Vec<u8>, GatewayError> {
        let data = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|_| GatewayError::InvalidRequest("payload is not valid base64".to_string()))?;

        // 16-byte GCM tag follows the ciphertext.
        if data.len() < NONCE_LEN + 16 {
            return Err(GatewayError::InvalidRequest(
                "ciphertext too short".to_string(),
            ));
        }

        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|_| GatewayError::Internal("invalid encryption key".to_string()))?;
        let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        cipher.decrypt(nonce, ciphertext).map_err(|_| {
            GatewayError::Internal("decryption failed (wrong key or tampered data)".to_string())
        })
    }
}
