use std::path::Path;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use subtle::ConstantTimeEq;

use crate::duration::parse_duration_secs;
use crate::error::{ForgeguardError, ForgeguardResult};

/// Minimum length of a token signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Accepted range for the password hashing cost factor.
pub const PASSWORD_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=20;

pub const ENV_ENCRYPTION_KEY: &str = "FORGEGUARD_ENCRYPTION_KEY";
pub const ENV_ACCESS_SECRET: &str = "FORGEGUARD_ACCESS_SECRET";
pub const ENV_REFRESH_SECRET: &str = "FORGEGUARD_REFRESH_SECRET";
pub const ENV_ACCESS_TTL: &str = "FORGEGUARD_ACCESS_TTL";
pub const ENV_REFRESH_TTL: &str = "FORGEGUARD_REFRESH_TTL";

/// Top-level configuration (loaded from forgeguard.toml)
///
/// Built once at process start and handed to component constructors.
/// Nothing below this layer reads the environment.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ForgeguardConfig {
    pub crypto: CryptoConfig,
    pub tokens: TokenConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// AES-256-GCM key as 64 hex characters
    pub encryption_key: Option<SecretString>,
    /// Password hashing cost factor (Argon2id memory = 2^cost KiB, default: 12)
    pub password_cost: u32,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            encryption_key: None,
            password_cost: 12,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// HS256 secret for access tokens (at least 32 bytes)
    pub access_secret: Option<SecretString>,
    /// HS256 secret for refresh tokens (at least 32 bytes, distinct from access)
    pub refresh_secret: Option<SecretString>,
    /// Access token lifetime (default: 7d)
    pub access_ttl: String,
    /// Refresh token lifetime (default: 30d)
    pub refresh_ttl: String,
    /// `iss` claim stamped on and required from every token
    pub issuer: String,
    /// `aud` claim stamped on and required from every token
    pub audience: String,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            access_secret: None,
            refresh_secret: None,
            access_ttl: "7d".into(),
            refresh_ttl: "30d".into(),
            issuer: "forgeguard".into(),
            audience: "forgeguard-clients".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl ForgeguardConfig {
    pub fn from_toml_str(content: &str) -> ForgeguardResult<Self> {
        toml::from_str(content).map_err(|e| ForgeguardError::Config(format!("parsing config: {e}")))
    }

    /// Read a TOML config file. A missing file yields defaults (secrets unset),
    /// which `validate` will then reject.
    pub fn load(path: &Path) -> ForgeguardResult<Self> {
        if !path.exists() {
            tracing::warn!("config file not found: {}  (using defaults)", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            ForgeguardError::Config(format!("reading config {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Overlay secrets and lifetimes from the environment.
    ///
    /// `lookup` is `std::env::var(..).ok()` in production and a map in tests.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_ENCRYPTION_KEY) {
            self.crypto.encryption_key = Some(SecretString::from(v));
        }
        if let Some(v) = lookup(ENV_ACCESS_SECRET) {
            self.tokens.access_secret = Some(SecretString::from(v));
        }
        if let Some(v) = lookup(ENV_REFRESH_SECRET) {
            self.tokens.refresh_secret = Some(SecretString::from(v));
        }
        if let Some(v) = lookup(ENV_ACCESS_TTL) {
            self.tokens.access_ttl = v;
        }
        if let Some(v) = lookup(ENV_REFRESH_TTL) {
            self.tokens.refresh_ttl = v;
        }
    }

    /// Reject missing or undersized secrets and unparsable settings.
    ///
    /// Any error here is fatal: the process should not start.
    pub fn validate(&self) -> ForgeguardResult<()> {
        self.crypto.validate()?;
        self.tokens.validate()?;
        Ok(())
    }
}

impl CryptoConfig {
    pub fn validate(&self) -> ForgeguardResult<()> {
        let key = self
            .encryption_key
            .as_ref()
            .ok_or_else(|| ForgeguardError::Config("crypto.encryption_key is not set".into()))?;

        let decoded = hex::decode(key.expose_secret().trim()).map_err(|_| {
            ForgeguardError::Config("crypto.encryption_key must be hex-encoded".into())
        })?;
        if decoded.len() != 32 {
            return Err(ForgeguardError::Config(format!(
                "crypto.encryption_key must decode to 32 bytes, got {}",
                decoded.len()
            )));
        }

        if !PASSWORD_COST_RANGE.contains(&self.password_cost) {
            return Err(ForgeguardError::Config(format!(
                "crypto.password_cost must be within {}..={}, got {}",
                PASSWORD_COST_RANGE.start(),
                PASSWORD_COST_RANGE.end(),
                self.password_cost
            )));
        }
        Ok(())
    }
}

impl TokenConfig {
    pub fn validate(&self) -> ForgeguardResult<()> {
        let access = require_secret(self.access_secret.as_ref(), "tokens.access_secret")?;
        let refresh = require_secret(self.refresh_secret.as_ref(), "tokens.refresh_secret")?;
        if bool::from(access.as_bytes().ct_eq(refresh.as_bytes())) {
            return Err(ForgeguardError::Config(
                "tokens.access_secret and tokens.refresh_secret must differ".into(),
            ));
        }

        let access_secs = ttl_secs("tokens.access_ttl", &self.access_ttl)?;
        let refresh_secs = ttl_secs("tokens.refresh_ttl", &self.refresh_ttl)?;
        if access_secs >= refresh_secs {
            return Err(ForgeguardError::Config(format!(
                "tokens.access_ttl ({}) must be shorter than tokens.refresh_ttl ({})",
                self.access_ttl, self.refresh_ttl
            )));
        }
        Ok(())
    }
}

fn ttl_secs(name: &str, ttl: &str) -> ForgeguardResult<u64> {
    let secs =
        parse_duration_secs(ttl).map_err(|e| ForgeguardError::Config(format!("{name}: {e}")))?;
    if secs == 0 {
        return Err(ForgeguardError::Config(format!("{name} must be non-zero")));
    }
    Ok(secs)
}

fn require_secret<'a>(
    secret: Option<&'a SecretString>,
    name: &str,
) -> ForgeguardResult<&'a str> {
    let value = secret
        .map(|s| s.expose_secret())
        .ok_or_else(|| ForgeguardError::Config(format!("{name} is not set")))?;
    if value.len() < MIN_SECRET_LEN {
        return Err(ForgeguardError::Config(format!(
            "{name} must be at least {MIN_SECRET_LEN} bytes, got {}",
            value.len()
        )));
    }
    Ok(value)
}
