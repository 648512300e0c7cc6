//! fg-crypto: keyed primitives for forgeguard
//!
//! ```text
//! Encryption Key (256-bit, from config as hex)
//!   ├── Envelope AEAD: AES-256-GCM (iv=random 128-bit, AAD="forgeguard-envelope-v1")
//!   ├── Signing Key  (HKDF, domain="forgeguard-hmac-signing")  → HMAC-SHA256 signatures
//!   └── Lookup Key   (HKDF, domain="forgeguard-data-lookup")   → deterministic data hashes
//!
//! Access Secret  ──→ HS256 access tokens   (default lifetime 7d)
//! Refresh Secret ──→ HS256 refresh tokens  (default lifetime 30d)
//!
//! Passwords: Argon2id PHC strings, memory = 2^cost KiB
//! ```

pub mod context;
pub mod envelope;
pub mod keys;
pub mod password;
pub mod signing;
pub mod token;

pub use context::SecurityContext;
pub use envelope::{decrypt, encrypt};
pub use keys::{generate_secure_token, EncryptionKey};
pub use password::{PasswordHashing, DEFAULT_PASSWORD_COST};
pub use signing::{constant_time_compare, Signer};
pub use token::{
    decode_token, extract_bearer_token, Clock, ManualClock, SystemClock, TokenClaims,
    TokenManager, TokenPair, TokenPayload, TokenType,
};

/// Size of an encryption key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of an envelope IV (128-bit)
pub const IV_SIZE: usize = 16;

/// Size of a GCM authentication tag
pub const TAG_SIZE: usize = 16;
