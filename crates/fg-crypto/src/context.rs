//! One owned bundle of every keyed component, built once at startup.

use fg_core::config::ForgeguardConfig;
use fg_core::{ForgeguardError, ForgeguardResult};
use secrecy::ExposeSecret;

use crate::envelope;
use crate::keys::EncryptionKey;
use crate::password::PasswordHashing;
use crate::signing::Signer;
use crate::token::TokenManager;

/// Holds the envelope key, signer, password hasher and token manager.
///
/// Immutable after construction; share it behind an `Arc` across handlers.
#[derive(Debug)]
pub struct SecurityContext {
    key: EncryptionKey,
    signer: Signer,
    passwords: PasswordHashing,
    tokens: TokenManager,
}

impl SecurityContext {
    /// Validate `config` and build every component. Any error is fatal.
    pub fn from_config(config: &ForgeguardConfig) -> ForgeguardResult<Self> {
        config.validate()?;

        let key_hex = config
            .crypto
            .encryption_key
            .as_ref()
            .ok_or_else(|| ForgeguardError::Config("crypto.encryption_key is not set".into()))?;
        let key = EncryptionKey::from_hex(key_hex.expose_secret())?;

        let ctx = Self {
            signer: Signer::new(&key)?,
            passwords: PasswordHashing::new(config.crypto.password_cost)?,
            tokens: TokenManager::new(&config.tokens)?,
            key,
        };

        tracing::info!(
            password_cost = ctx.passwords.cost(),
            access_ttl_secs = ctx.tokens.access_ttl_secs(),
            refresh_ttl_secs = ctx.tokens.refresh_ttl_secs(),
            "security context ready"
        );
        Ok(ctx)
    }

    pub fn encrypt(&self, plaintext: &str) -> ForgeguardResult<String> {
        envelope::encrypt_with(&self.key, plaintext)
    }

    pub fn decrypt(&self, envelope: &str) -> ForgeguardResult<String> {
        envelope::decrypt_with(&self.key, envelope)
    }

    pub fn hash_password(&self, password: &str) -> ForgeguardResult<String> {
        self.passwords.hash_password(password)
    }

    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        self.passwords.verify_password(password, hash)
    }

    pub fn hash_sensitive_data(&self, data: &str) -> String {
        self.signer.hash_sensitive_data(data)
    }

    pub fn create_signature(&self, data: &str) -> String {
        self.signer.create_signature(data)
    }

    pub fn verify_signature(&self, data: &str, signature: &str) -> bool {
        self.signer.verify_signature(data, signature)
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }
}
