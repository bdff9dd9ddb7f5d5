//! Identity token obfuscation using ChaCha20-Poly1305.
//!
//! The key is derived from material that lives next to the artifact (the
//! application secret and install path). Anyone with read access to the host's
//! files can recompute it, so this hides the token from casual inspection and
//! nothing more. The authority only ever sees the plaintext identity.

use crate::error::{IdentityError, IdentityResult};
use crate::strategy::AppSecret;
use base64::{engine::general_purpose::STANDARD, Engine};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use keeper_types::UniqueId;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::path::Path;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the derived key in bytes.
pub const KEY_SIZE: usize = 32;

/// Size of nonce in bytes (96 bits for ChaCha20-Poly1305).
pub const NONCE_SIZE: usize = 12;

/// Size of authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

const KEY_CONTEXT: &[u8] = b"keeper-identity:";

/// Key derived from local material, zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    bytes: [u8; KEY_SIZE],
}

impl DerivedKey {
    /// Derives the key from the application secret (if any) and install root.
    #[must_use]
    pub fn from_local_material(secret: Option<&AppSecret>, project_root: &Path) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(KEY_CONTEXT);
        if let Some(secret) = secret {
            hasher.update(secret.expose().as_bytes());
        }
        hasher.update(project_root.to_string_lossy().as_bytes());
        Self {
            bytes: hasher.finalize().into(),
        }
    }

    fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Seals and opens identity tokens stored in shared configuration files.
#[derive(Debug, Clone)]
pub struct TokenCipher {
    key: DerivedKey,
}

impl TokenCipher {
    /// Creates a cipher bound to the given key.
    #[must_use]
    pub fn new(key: DerivedKey) -> Self {
        Self { key }
    }

    /// Encrypts an identity into `base64(nonce || ciphertext)`.
    pub fn seal(&self, id: &UniqueId) -> IdentityResult<String> {
        let cipher = ChaCha20Poly1305::new(self.key.as_bytes().into());

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, id.as_str().as_bytes())
            .map_err(|e| IdentityError::Encryption(e.to_string()))?;

        let mut bytes = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        bytes.extend_from_slice(&nonce_bytes);
        bytes.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(&bytes))
    }

    /// Decrypts a token produced by [`TokenCipher::seal`].
    pub fn open(&self, token: &str) -> IdentityResult<UniqueId> {
        let bytes = STANDARD
            .decode(token.trim())
            .map_err(|e| IdentityError::Decryption(format!("invalid base64: {e}")))?;

        if bytes.len() < NONCE_SIZE + TAG_SIZE {
            return Err(IdentityError::Decryption("data too short".to_string()));
        }

        let cipher = ChaCha20Poly1305::new(self.key.as_bytes().into());
        let nonce = Nonce::from_slice(&bytes[..NONCE_SIZE]);
        let plaintext = cipher.decrypt(nonce, &bytes[NONCE_SIZE..]).map_err(|_| {
            IdentityError::Decryption("wrong key or tampered data".to_string())
        })?;

        let text = String::from_utf8(plaintext)
            .map_err(|e| IdentityError::Decryption(format!("invalid UTF-8: {e}")))?;
        Ok(UniqueId::parse(&text)?)
    }
}
