//! AES-256-GCM string envelopes
//!
//! Envelope format (text):
//! ```text
//! hex(iv) ":" hex(tag) ":" hex(ciphertext)
//! iv  = 16 random bytes, fresh per call, passed as the GCM nonce
//! tag = 16-byte GCM authentication tag
//! AAD = "forgeguard-envelope-v1"
//! ```
//!
//! The AAD label separates these ciphertexts from any other use of the same
//! key. An empty plaintext produces an empty ciphertext segment.

use aes_gcm::{
    aead::{consts::U16, AeadInPlace, KeyInit},
    aes::Aes256,
    AesGcm, Nonce, Tag,
};
use fg_core::{ForgeguardError, ForgeguardResult};
use rand::RngCore;

use crate::keys::EncryptionKey;
use crate::{IV_SIZE, TAG_SIZE};

/// AES-256-GCM with a 128-bit nonce.
type Aes256Gcm16 = AesGcm<Aes256, U16>;

const ENVELOPE_AAD: &[u8] = b"forgeguard-envelope-v1";

/// Encrypt `plaintext` under a 32-byte key and return the hex envelope.
pub fn encrypt(plaintext: &str, key: &[u8]) -> ForgeguardResult<String> {
    let key = EncryptionKey::from_slice(key)?;
    encrypt_with(&key, plaintext)
}

/// Decrypt a hex envelope under a 32-byte key.
pub fn decrypt(envelope: &str, key: &[u8]) -> ForgeguardResult<String> {
    let key = EncryptionKey::from_slice(key)?;
    decrypt_with(&key, envelope)
}

/// Encrypt with an already-validated key.
pub fn encrypt_with(key: &EncryptionKey, plaintext: &str) -> ForgeguardResult<String> {
    let cipher = Aes256Gcm16::new(key.as_bytes().into());

    let mut iv = [0u8; IV_SIZE];
    rand::thread_rng().fill_bytes(&mut iv);
    let nonce = Nonce::<U16>::from_slice(&iv);

    let mut buffer = plaintext.as_bytes().to_vec();
    let tag = cipher
        .encrypt_in_place_detached(nonce, ENVELOPE_AAD, &mut buffer)
        .map_err(|e| ForgeguardError::Encryption(format!("AES-256-GCM encrypt: {e}")))?;

    Ok(format!(
        "{}:{}:{}",
        hex::encode(iv),
        hex::encode(tag),
        hex::encode(&buffer)
    ))
}

/// Decrypt with an already-validated key.
///
/// The tag is verified before any plaintext byte is returned; on failure the
/// working buffer is discarded.
pub fn decrypt_with(key: &EncryptionKey, envelope: &str) -> ForgeguardResult<String> {
    let parts = EnvelopeParts::parse(envelope)?;

    let cipher = Aes256Gcm16::new(key.as_bytes().into());
    let nonce = Nonce::<U16>::from_slice(&parts.iv);
    let tag = Tag::<U16>::from_slice(&parts.tag);

    let mut buffer = parts.ciphertext;
    cipher
        .decrypt_in_place_detached(nonce, ENVELOPE_AAD, &mut buffer, tag)
        .map_err(|_| ForgeguardError::Authentication)?;

    String::from_utf8(buffer)
        .map_err(|_| ForgeguardError::InvalidEnvelope("decrypted payload is not UTF-8".into()))
}

/// Decoded envelope segments.
#[derive(Debug)]
struct EnvelopeParts {
    iv: [u8; IV_SIZE],
    tag: [u8; TAG_SIZE],
    ciphertext: Vec<u8>,
}

impl EnvelopeParts {
    fn parse(envelope: &str) -> ForgeguardResult<Self> {
        let segments: Vec<&str> = envelope.split(':').collect();
        let [iv_hex, tag_hex, ct_hex] = segments.as_slice() else {
            return Err(ForgeguardError::InvalidEnvelope(format!(
                "expected 3 segments, got {}",
                segments.len()
            )));
        };

        let iv = decode_fixed::<IV_SIZE>(iv_hex, "iv")?;
        let tag = decode_fixed::<TAG_SIZE>(tag_hex, "tag")?;
        let ciphertext = hex::decode(ct_hex)
            .map_err(|_| ForgeguardError::InvalidEnvelope("ciphertext is not valid hex".into()))?;

        Ok(Self {
            iv,
            tag,
            ciphertext,
        })
    }
}

fn decode_fixed<const N: usize>(segment: &str, name: &str) -> ForgeguardResult<[u8; N]> {
    let bytes = hex::decode(segment)
        .map_err(|_| ForgeguardError::InvalidEnvelope(format!("{name} is not valid hex")))?;
    bytes.as_slice().try_into().map_err(|_| {
        ForgeguardError::InvalidEnvelope(format!(
            "{name} must be {N} bytes, got {}",
            bytes.len()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KEY_SIZE;
    use proptest::prelude::*;

    fn key_a() -> [u8; KEY_SIZE] {
        [0xA5u8; KEY_SIZE]
    }

    fn key_b() -> [u8; KEY_SIZE] {
        [0x5Au8; KEY_SIZE]
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let envelope = encrypt("quotation #4411: KES 1,250,000", &key_a()).unwrap();
        let decrypted = decrypt(&envelope, &key_a()).unwrap();
        assert_eq!(decrypted, "quotation #4411: KES 1,250,000");
    }

    #[test]
    fn test_encrypt_decrypt_empty() {
        let envelope = encrypt("", &key_a()).unwrap();
        assert!(envelope.ends_with(':'), "empty plaintext has empty ciphertext segment");
        assert_eq!(decrypt(&envelope, &key_a()).unwrap(), "");
    }

    #[test]
    fn test_envelope_shape() {
        let envelope = encrypt("hello", &key_a()).unwrap();
        let segments: Vec<&str> = envelope.split(':').collect();

        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].len(), IV_SIZE * 2);
        assert_eq!(segments[1].len(), TAG_SIZE * 2);
        assert_eq!(segments[2].len(), "hello".len() * 2);
    }

    #[test]
    fn test_fresh_iv_per_call() {
        let e1 = encrypt("same plaintext", &key_a()).unwrap();
        let e2 = encrypt("same plaintext", &key_a()).unwrap();
        assert_ne!(e1, e2);

        let iv1 = e1.split(':').next().unwrap();
        let iv2 = e2.split(':').next().unwrap();
        assert_ne!(iv1, iv2);
    }

    #[test]
    fn test_wrong_key_fails_authentication() {
        let envelope = encrypt("secret", &key_a()).unwrap();
        let err = decrypt(&envelope, &key_b()).unwrap_err();
        assert!(matches!(err, ForgeguardError::Authentication));
    }

    #[test]
    fn test_bad_key_length() {
        let err = encrypt("x", &[0u8; 16]).unwrap_err();
        assert!(matches!(err, ForgeguardError::Encryption(_)));
    }

    #[test]
    fn test_segment_count() {
        for bad in ["", "abc", "aa:bb", "aa:bb:cc:dd"] {
            let err = decrypt(bad, &key_a()).unwrap_err();
            assert!(matches!(err, ForgeguardError::InvalidEnvelope(_)), "{bad:?}");
        }
    }

    #[test]
    fn test_malformed_hex() {
        let envelope = encrypt("secret", &key_a()).unwrap();
        let segments: Vec<&str> = envelope.split(':').collect();

        let bad_ct = format!("{}:{}:zz", segments[0], segments[1]);
        assert!(matches!(
            decrypt(&bad_ct, &key_a()).unwrap_err(),
            ForgeguardError::InvalidEnvelope(_)
        ));

        let short_iv = format!("00ff:{}:{}", segments[1], segments[2]);
        assert!(matches!(
            decrypt(&short_iv, &key_a()).unwrap_err(),
            ForgeguardError::InvalidEnvelope(_)
        ));

        let short_tag = format!("{}:00ff:{}", segments[0], segments[2]);
        assert!(matches!(
            decrypt(&short_tag, &key_a()).unwrap_err(),
            ForgeguardError::InvalidEnvelope(_)
        ));
    }

    /// Flip one hex digit at `pos` into a different valid hex digit.
    fn flip_hex_char(s: &str, pos: usize) -> String {
        let mut chars: Vec<char> = s.chars().collect();
        chars[pos] = if chars[pos] == '0' { '1' } else { '0' };
        chars.into_iter().collect()
    }

    #[test]
    fn test_tampered_tag_and_ciphertext() {
        let envelope = encrypt("invoice total: 98,000", &key_a()).unwrap();
        let iv_len = IV_SIZE * 2 + 1;

        for pos in iv_len..envelope.len() {
            if envelope.as_bytes()[pos] == b':' {
                continue;
            }
            let tampered = flip_hex_char(&envelope, pos);
            let err = decrypt(&tampered, &key_a()).unwrap_err();
            assert!(
                matches!(err, ForgeguardError::Authentication),
                "tamper at {pos} must fail authentication, got {err:?}"
            );
        }
    }

    #[test]
    fn test_tampered_iv() {
        let envelope = encrypt("secret", &key_a()).unwrap();
        let tampered = flip_hex_char(&envelope, 0);
        assert!(matches!(
            decrypt(&tampered, &key_a()).unwrap_err(),
            ForgeguardError::Authentication
        ));
    }

    #[test]
    fn test_error_does_not_leak_plaintext() {
        let envelope = encrypt("super-secret-plaintext", &key_a()).unwrap();
        let err = decrypt(&envelope, &key_b()).unwrap_err();
        assert!(!err.to_string().contains("super-secret"));
    }

    proptest! {
        #[test]
        fn encrypt_decrypt_roundtrip(s in any::<String>(), key in any::<[u8; 32]>()) {
            let envelope = encrypt(&s, &key).unwrap();
            prop_assert_eq!(decrypt(&envelope, &key).unwrap(), s);
        }

        #[test]
        fn roundtrip_with_colons(s in "[a-z:é漢]{0,64}") {
            let envelope = encrypt(&s, &key_a()).unwrap();
            prop_assert_eq!(envelope.split(':').count(), 3);
            prop_assert_eq!(decrypt(&envelope, &key_a()).unwrap(), s);
        }
    }
}
