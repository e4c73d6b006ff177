//! Encryption of OAuth tokens at rest

use crate::AppError;
use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose, Engine as _};

const NONCE_LEN: usize = 12;

/// AES-256-GCM encryption for access and refresh tokens stored in the database.
/// Output is base64(nonce || ciphertext).
#[derive(Clone)]
pub struct EncryptionService {
    cipher: Aes256Gcm,
}

impl EncryptionService {
    /// Create the service from a raw 32-byte key (tests use this directly).
    pub fn from_key_bytes(key_bytes: &[u8]) -> Result<Self, AppError> {
        if key_bytes.len() != 32 {
            return Err(AppError::Internal(
                "Encryption key must be 32 bytes (256 bits)".to_string(),
            ));
        }
        let key = Key::<Aes256Gcm>::from_slice(key_bytes);
        Ok(Self {
            cipher: Aes256Gcm::new(key),
        })
    }

    /// Create the service from a base64-encoded 32-byte key, as found in `ENCRYPTION_KEY`
    pub fn from_base64_key(encoded: &str) -> Result<Self, AppError> {
        let key_bytes = general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| AppError::Internal(format!("Failed to decode encryption key: {}", e)))?;

        Self::from_key_bytes(&key_bytes)
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, AppError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| AppError::Internal(format!("Encryption failed: {}", e)))?;

        let mut combined = nonce.to_vec();
        combined.extend_from_slice(&ciphertext);
        Ok(general_purpose::STANDARD.encode(&combined))
    }

    pub fn decrypt(&self, encrypted: &str) -> Result<String, AppError> {
        let combined = general_purpose::STANDARD
            .decode(encrypted)
            .map_err(|e| AppError::Internal(format!("Failed to decode encrypted data: {}", e)))?;

        if combined.len() < NONCE_LEN {
            return Err(AppError::Internal("Encrypted data too short".to_string()));
        }

        let (nonce, ciphertext) = combined.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| AppError::Internal(format!("Decryption failed: {}", e)))?;

        String::from_utf8(plaintext)
            .map_err(|e| AppError::Internal(format!("Invalid UTF-8 in decrypted data: {}", e)))
    }

    /// Encrypt an optional token (refresh tokens are not issued by every provider)
    pub fn encrypt_optional(&self, plaintext: Option<&str>) -> Result<Option<String>, AppError> {
        plaintext.map(|value| self.encrypt(value)).transpose()
    }

    pub fn decrypt_optional(&self, encrypted: Option<&str>) -> Result<Option<String>, AppError> {
        match encrypted {
            Some(value) if !value.is_empty() => self.decrypt(value).map(Some),
            _ => Ok(None),
        }
    }
}
