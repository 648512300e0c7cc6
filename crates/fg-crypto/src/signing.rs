//! HMAC-SHA256 signatures and deterministic lookup hashes
//!
//! Both keys are HKDF-derived from the envelope key (see `keys`), so the one
//! configured secret never feeds two primitives directly.

use fg_core::ForgeguardResult;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::keys::{derive_lookup_key, derive_signing_key, EncryptionKey};
use crate::KEY_SIZE;

type HmacSha256 = Hmac<Sha256>;

/// Keyed signing and hashing over arbitrary string data.
#[derive(Clone)]
pub struct Signer {
    signing_key: [u8; KEY_SIZE],
    lookup_key: [u8; KEY_SIZE],
}

impl Signer {
    pub fn new(key: &EncryptionKey) -> ForgeguardResult<Self> {
        Ok(Self {
            signing_key: derive_signing_key(key)?,
            lookup_key: derive_lookup_key(key)?,
        })
    }

    /// Hex HMAC-SHA256 of `data` under the signing key.
    pub fn create_signature(&self, data: &str) -> String {
        hex::encode(hmac_sha256(&self.signing_key, data.as_bytes()))
    }

    /// Recompute the signature and compare in constant time.
    ///
    /// Any mismatch, including a length mismatch or non-hex input, is `false`.
    pub fn verify_signature(&self, data: &str, signature: &str) -> bool {
        let expected = self.create_signature(data);
        constant_time_compare(&expected, signature)
    }

    /// Deterministic, unsalted keyed digest for equality lookups
    /// (e.g. finding a record by phone number without storing it in clear).
    /// Not for passwords.
    pub fn hash_sensitive_data(&self, data: &str) -> String {
        hex::encode(hmac_sha256(&self.lookup_key, data.as_bytes()))
    }
}

impl Drop for Signer {
    fn drop(&mut self) {
        self.signing_key.zeroize();
        self.lookup_key.zeroize();
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("signing_key", &"[REDACTED]")
            .field("lookup_key", &"[REDACTED]")
            .finish()
    }
}

pub(crate) fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC key size is always valid");
    mac.update(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

/// Verify an HMAC-SHA256 tag; the comparison inside `verify_slice` is
/// constant-time and rejects wrong-length tags.
pub(crate) fn verify_hmac_sha256(key: &[u8], data: &[u8], tag: &[u8]) -> bool {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC key size is always valid");
    mac.update(data);
    mac.verify_slice(tag).is_ok()
}

/// Constant-time string comparison.
///
/// Both inputs are padded to the longer length with different fill bytes, so
/// the time taken does not depend on where the first difference is.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    let max_len = std::cmp::max(a.len(), b.len());

    let mut a_padded = vec![0u8; max_len];
    let mut b_padded = vec![0xFFu8; max_len];
    a_padded[..a.len()].copy_from_slice(a.as_bytes());
    b_padded[..b.len()].copy_from_slice(b.as_bytes());

    let lengths_equal = a.len().ct_eq(&b.len());
    let contents_equal = a_padded.ct_eq(&b_padded);

    (lengths_equal & contents_equal).into()
}
