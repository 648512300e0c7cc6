//! Key material: the envelope key, HKDF sub-keys, random tokens

use fg_core::{ForgeguardError, ForgeguardResult};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::KEY_SIZE;

/// HKDF info label for the HMAC signing key.
const SIGNING_DOMAIN: &[u8] = b"forgeguard-hmac-signing";

/// HKDF info label for the deterministic data-lookup key.
const LOOKUP_DOMAIN: &[u8] = b"forgeguard-data-lookup";

/// A 256-bit AES-GCM envelope key. Zeroized on drop.
#[derive(Clone)]
pub struct EncryptionKey {
    bytes: [u8; KEY_SIZE],
}

impl EncryptionKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Build a key from an arbitrary slice; anything but 32 bytes is rejected.
    pub fn from_slice(bytes: &[u8]) -> ForgeguardResult<Self> {
        let bytes: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| {
            ForgeguardError::Encryption(format!(
                "key must be {KEY_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self { bytes })
    }

    /// Parse the 64-character hex form used in configuration.
    pub fn from_hex(hex_key: &str) -> ForgeguardResult<Self> {
        let mut decoded = hex::decode(hex_key.trim())
            .map_err(|_| ForgeguardError::Config("encryption key is not valid hex".into()))?;
        let key = Self::from_slice(&decoded)
            .map_err(|_| ForgeguardError::Config(format!("encryption key must be {KEY_SIZE} bytes")));
        decoded.zeroize();
        key
    }

    /// Generate a random key (for provisioning new deployments).
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self::from_bytes(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl Drop for EncryptionKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Derive the HMAC signing key from the envelope key via HKDF-SHA256.
pub fn derive_signing_key(key: &EncryptionKey) -> ForgeguardResult<[u8; KEY_SIZE]> {
    hkdf_derive(key.as_bytes(), SIGNING_DOMAIN)
}

/// Derive the data-lookup hashing key from the envelope key via HKDF-SHA256.
pub fn derive_lookup_key(key: &EncryptionKey) -> ForgeguardResult<[u8; KEY_SIZE]> {
    hkdf_derive(key.as_bytes(), LOOKUP_DOMAIN)
}

/// HKDF-SHA256 key derivation with a domain-specific info string.
fn hkdf_derive(ikm: &[u8; KEY_SIZE], info: &[u8]) -> ForgeguardResult<[u8; KEY_SIZE]> {
    let hkdf = Hkdf::<Sha256>::new(None, ikm);
    let mut okm = [0u8; KEY_SIZE];
    hkdf.expand(info, &mut okm)
        .map_err(|e| ForgeguardError::Encryption(format!("HKDF expand failed: {e}")))?;
    Ok(okm)
}

/// Random hex string of `num_bytes` bytes of entropy (reset links, CSRF tokens).
pub fn generate_secure_token(num_bytes: usize) -> String {
    let mut bytes = vec![0u8; num_bytes];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
