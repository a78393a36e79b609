//! Cryptographic utilities for the OAuth session cookie.
//!
//! Session state is sealed with AES-256-GCM authenticated encryption so the
//! browser can carry it without being able to read or alter it.

use aes_gcm::{
    aead::{generic_array::typenum::U12, Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use log::debug;
use sha2::{Digest, Sha256};

/// The length of the nonce in bytes (96 bits for AES-GCM)
const NONCE_LENGTH: usize = 12;

/// AES-256-GCM cipher keyed from the application secret key.
#[derive(Clone)]
pub struct SessionCipher {
    key: [u8; 32],
}

impl std::fmt::Debug for SessionCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCipher").finish_non_exhaustive()
    }
}

impl SessionCipher {
    /// Derives a 32-byte key from an arbitrary-length secret using SHA-256.
    pub fn from_secret(secret: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(secret.as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(&hasher.finalize());
        SessionCipher { key }
    }

    /// Encrypts `plaintext`.
    ///
    /// The output format is: hex(nonce (12 bytes) || ciphertext || auth_tag)
    pub fn seal(&self, plaintext: &str) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let cipher = Aes256Gcm::new_from_slice(&self.key)?;

        // Generate a random nonce
        let mut nonce_bytes = [0u8; NONCE_LENGTH];
        getrandom::getrandom(&mut nonce_bytes)
            .map_err(|e| format!("Failed to generate random nonce: {}", e))?;
        let nonce: Nonce<U12> = nonce_bytes.into();

        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| format!("Encryption failed: {}", e))?;

        let mut result = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
        result.extend_from_slice(&nonce_bytes);
        result.extend_from_slice(&ciphertext);

        debug!("Session sealed successfully");
        Ok(hex::encode(result))
    }

    /// Decrypts a value produced by [`SessionCipher::seal`].
    ///
    /// Fails if the value is not hex, is truncated, was sealed under a different
    /// key, or has been tampered with.
    pub fn open(&self, sealed_hex: &str) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let cipher = Aes256Gcm::new_from_slice(&self.key)?;

        let sealed =
            hex::decode(sealed_hex).map_err(|e| format!("Invalid hex in session value: {}", e))?;

        if sealed.len() < NONCE_LENGTH {
            return Err("Session value is too short".into());
        }

        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LENGTH);
        let nonce_array: [u8; NONCE_LENGTH] =
            nonce_bytes.try_into().map_err(|_| "Invalid nonce length")?;
        let nonce: Nonce<U12> = nonce_array.into();

        let plaintext = cipher
            .decrypt(&nonce, ciphertext)
            .map_err(|_| "Decryption failed - wrong key or corrupted data")?;

        let value = String::from_utf8(plaintext)
            .map_err(|e| format!("Decrypted session is not valid UTF-8: {}", e))?;

        debug!("Session opened successfully");
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_roundtrip() {
        let cipher = SessionCipher::from_secret("development-secret");

        let original = r#"{"code_verifier":"abc","state":"xyz"}"#;
        let sealed = cipher.seal(original).unwrap();

        assert_ne!(sealed, original);
        assert_eq!(cipher.open(&sealed).unwrap(), original);
    }

    #[test]
    fn test_different_seals_produce_different_output() {
        let cipher = SessionCipher::from_secret("development-secret");

        let sealed1 = cipher.seal("payload").unwrap();
        let sealed2 = cipher.seal("payload").unwrap();

        // Due to random nonce, same plaintext should produce different ciphertext
        assert_ne!(sealed1, sealed2);
        assert_eq!(cipher.open(&sealed1).unwrap(), "payload");
        assert_eq!(cipher.open(&sealed2).unwrap(), "payload");
    }

    #[test]
    fn test_open_rejects_other_key_and_tampering() {
        let cipher = SessionCipher::from_secret("first");
        let other = SessionCipher::from_secret("second");

        let sealed = cipher.seal("payload").unwrap();
        assert!(other.open(&sealed).is_err());

        let mut tampered = sealed.into_bytes();
        let last = tampered.len() - 1;
        tampered[last] = if tampered[last] == b'0' { b'1' } else { b'0' };
        assert!(cipher.open(&String::from_utf8(tampered).unwrap()).is_err());

        assert!(cipher.open("not-hex").is_err());
        assert!(cipher.open("00ff").is_err());
    }
}
