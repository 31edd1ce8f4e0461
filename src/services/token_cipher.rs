//! AES-256-GCM encryption for stored GitHub tokens.
//!
//! The encrypt/decrypt boundary for personal access tokens: handlers and the
//! sync job pass `SecretString`s through this adapter, and only ciphertext
//! ever reaches the database. The owning user's id is bound as AAD so a
//! ciphertext cannot be replayed onto another user's row.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, NONCE_LEN, Nonce, UnboundKey};
use ring::rand::{SecureRandom, SystemRandom};
use secrecy::{ExposeSecret, SecretString};

use crate::error::{AppError, AppResult};

/// Token encryption service.
#[derive(Clone)]
pub struct TokenCipher {
    key_bytes: [u8; 32],
}

impl TokenCipher {
    /// Create a cipher from a hex-encoded 32-byte key.
    pub fn from_hex_key(key_hex: &str) -> AppResult<Self> {
        let decoded = hex::decode(key_hex)
            .map_err(|e| AppError::Crypto(format!("Invalid token key hex: {}", e)))?;

        let key_bytes: [u8; 32] = decoded
            .try_into()
            .map_err(|_| AppError::Crypto("Token key must be exactly 32 bytes".to_string()))?;

        Ok(Self { key_bytes })
    }

    fn sealing_key(&self) -> AppResult<LessSafeKey> {
        let unbound = UnboundKey::new(&AES_256_GCM, &self.key_bytes)
            .map_err(|_| AppError::Crypto("Failed to build AES key".to_string()))?;
        Ok(LessSafeKey::new(unbound))
    }

    /// Encrypt a plaintext token. Returns base64(nonce || ciphertext || tag).
    pub fn encrypt(&self, plaintext: &SecretString, aad: &[u8]) -> AppResult<String> {
        let key = self.sealing_key()?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        SystemRandom::new()
            .fill(&mut nonce_bytes)
            .map_err(|_| AppError::Crypto("Failed to generate nonce".to_string()))?;
        let nonce = Nonce::assume_unique_for_key(nonce_bytes);

        let mut in_out = plaintext.expose_secret().as_bytes().to_vec();
        key.seal_in_place_append_tag(nonce, Aad::from(aad), &mut in_out)
            .map_err(|_| AppError::Crypto("Encryption failed".to_string()))?;

        let mut combined = nonce_bytes.to_vec();
        combined.extend_from_slice(&in_out);
        Ok(BASE64.encode(combined))
    }

    /// Decrypt a stored ciphertext back into a secret.
    pub fn decrypt(&self, ciphertext_b64: &str, aad: &[u8]) -> AppResult<SecretString> {
        let combined = BASE64
            .decode(ciphertext_b64)
            .map_err(|e| AppError::Crypto(format!("Base64 decode failed: {}", e)))?;

        if combined.len() <= NONCE_LEN {
            return Err(AppError::Crypto("Ciphertext too short".to_string()));
        }

        let (nonce_bytes, sealed) = combined.split_at(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
            .map_err(|_| AppError::Crypto("Invalid nonce".to_string()))?;

        let key = self.sealing_key()?;
        let mut in_out = sealed.to_vec();
        let plaintext = key
            .open_in_place(nonce, Aad::from(aad), &mut in_out)
            .map_err(|_| AppError::Crypto("Decryption failed".to_string()))?;

        let token = String::from_utf8(plaintext.to_vec())
            .map_err(|_| AppError::Crypto("Decrypted token is not valid UTF-8".to_string()))?;

        Ok(SecretString::from(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> TokenCipher {
        TokenCipher::from_hex_key(
            "8f3a2b1c4d5e6f708192a3b4c5d6e7f808192a3b4c5d6e7f808192a3b4c5d6e7",
        )
        .unwrap()
    }

    #[test]
    fn test_round_trip() {
        let c = cipher();
        let token = SecretString::from("ghp_example_token_value".to_string());

        let ciphertext = c.encrypt(&token, b"user-1").unwrap();
        let decrypted = c.decrypt(&ciphertext, b"user-1").unwrap();

        assert_eq!(decrypted.expose_secret(), "ghp_example_token_value");
        // Ciphertext never contains the plaintext
        assert!(!ciphertext.contains("ghp_example"));
    }

    #[test]
    fn test_unique_nonces() {
        let c = cipher();
        let token = SecretString::from("same-token".to_string());

        let a = c.encrypt(&token, b"u").unwrap();
        let b = c.encrypt(&token, b"u").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_aad_fails() {
        let c = cipher();
        let token = SecretString::from("ghp_abc".to_string());

        let ciphertext = c.encrypt(&token, b"user-1").unwrap();
        assert!(c.decrypt(&ciphertext, b"user-2").is_err());
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let c = cipher();
        let token = SecretString::from("ghp_abc".to_string());

        let ciphertext = c.encrypt(&token, b"user-1").unwrap();
        let mut bytes = BASE64.decode(&ciphertext).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        let tampered = BASE64.encode(bytes);

        assert!(c.decrypt(&tampered, b"user-1").is_err());
    }

    #[test]
    fn test_invalid_key_rejected() {
        assert!(TokenCipher::from_hex_key("deadbeef").is_err());
        assert!(TokenCipher::from_hex_key("zz").is_err());
    }
}
