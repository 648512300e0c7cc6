//! Signed, expiring, typed bearer tokens (HS256 compact JWS)
//!
//! Token format:
//! ```text
//! base64url(header) "." base64url(claims) "." base64url(HMAC-SHA256)
//! header = {"alg":"HS256","typ":"JWT"}
//! claims = {sub, email, role, sessionId?, tokenType, jti, iat, exp, iss, aud}
//! ```
//!
//! Access and refresh tokens are signed with different secrets. Lifecycle per
//! token: `Issued -> Valid -> {Expired | Rejected}`; there is no in-process
//! revocation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use fg_core::config::TokenConfig;
use fg_core::duration::parse_duration_secs;
use fg_core::{ForgeguardError, ForgeguardResult};
use secrecy::{ExposeSecret, SecretSlice};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::signing::{hmac_sha256, verify_hmac_sha256};

const HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;
const ALGORITHM: &str = "HS256";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied identity to embed in a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPayload {
    pub subject_id: String,
    pub email: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Everything a token carries: the payload plus the stamped fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    #[serde(rename = "sub")]
    pub subject_id: String,
    pub email: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub token_type: TokenType,
    pub jti: String,
    pub iat: u64,
    pub exp: u64,
    pub iss: String,
    pub aud: String,
}

impl TokenClaims {
    pub fn payload(&self) -> TokenPayload {
        TokenPayload {
            subject_id: self.subject_id.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
            session_id: self.session_id.clone(),
        }
    }
}

/// Result of a login or refresh: both tokens and their lifetimes in seconds.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    pub refresh_expires_in: u64,
}

#[derive(Deserialize)]
struct Header {
    alg: String,
}

/// Source of "now" in unix seconds.
pub trait Clock: Send + Sync {
    fn now_unix(&self) -> u64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// A clock that only moves when told to, for simulating expiry.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(now: u64) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_unix(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Issues and verifies access/refresh tokens.
///
/// Constructed once from validated configuration; cheap to share behind an
/// `Arc`.
pub struct TokenManager {
    access_secret: SecretSlice<u8>,
    refresh_secret: SecretSlice<u8>,
    access_ttl_secs: u64,
    refresh_ttl_secs: u64,
    issuer: String,
    audience: String,
    clock: Arc<dyn Clock>,
}

impl TokenManager {
    /// Fails with a config error if either secret is missing, shorter than 32
    /// bytes, or the two are equal, or if a lifetime string does not parse.
    pub fn new(config: &TokenConfig) -> ForgeguardResult<Self> {
        config.validate()?;

        let secret = |s: Option<&secrecy::SecretString>, name: &str| {
            s.map(|s| SecretSlice::from(s.expose_secret().as_bytes().to_vec()))
                .ok_or_else(|| ForgeguardError::Config(format!("{name} is not set")))
        };

        Ok(Self {
            access_secret: secret(config.access_secret.as_ref(), "tokens.access_secret")?,
            refresh_secret: secret(config.refresh_secret.as_ref(), "tokens.refresh_secret")?,
            access_ttl_secs: parse_duration_secs(&config.access_ttl)?,
            refresh_ttl_secs: parse_duration_secs(&config.refresh_ttl)?,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn access_ttl_secs(&self) -> u64 {
        self.access_ttl_secs
    }

    pub fn refresh_ttl_secs(&self) -> u64 {
        self.refresh_ttl_secs
    }

    pub fn issue_access_token(&self, payload: &TokenPayload) -> ForgeguardResult<String> {
        self.issue(payload, TokenType::Access)
    }

    pub fn issue_refresh_token(&self, payload: &TokenPayload) -> ForgeguardResult<String> {
        self.issue(payload, TokenType::Refresh)
    }

    pub fn issue_token_pair(&self, payload: &TokenPayload) -> ForgeguardResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.issue_access_token(payload)?,
            refresh_token: self.issue_refresh_token(payload)?,
            expires_in: self.access_ttl_secs,
            refresh_expires_in: self.refresh_ttl_secs,
        })
    }

    pub fn verify_access_token(&self, token: &str) -> ForgeguardResult<TokenClaims> {
        self.verify(token, TokenType::Access)
    }

    pub fn verify_refresh_token(&self, token: &str) -> ForgeguardResult<TokenClaims> {
        self.verify(token, TokenType::Refresh)
    }

    /// Best-effort expiry check on the unverified `exp` claim.
    ///
    /// Malformed tokens and tokens without `exp` count as expired.
    pub fn is_token_expired(&self, token: &str) -> bool {
        #[derive(Deserialize)]
        struct Expiry {
            exp: Option<u64>,
        }

        let Some(segments) = split_token(token) else {
            return true;
        };
        match decode_json::<Expiry>(segments.claims) {
            Some(Expiry { exp: Some(exp) }) => self.clock.now_unix() >= exp,
            _ => true,
        }
    }

    fn secret(&self, token_type: TokenType) -> &[u8] {
        match token_type {
            TokenType::Access => self.access_secret.expose_secret(),
            TokenType::Refresh => self.refresh_secret.expose_secret(),
        }
    }

    fn ttl_secs(&self, token_type: TokenType) -> u64 {
        match token_type {
            TokenType::Access => self.access_ttl_secs,
            TokenType::Refresh => self.refresh_ttl_secs,
        }
    }

    fn issue(&self, payload: &TokenPayload, token_type: TokenType) -> ForgeguardResult<String> {
        let iat = self.clock.now_unix();
        let claims = TokenClaims {
            subject_id: payload.subject_id.clone(),
            email: payload.email.clone(),
            role: payload.role.clone(),
            session_id: payload.session_id.clone(),
            token_type,
            jti: Uuid::new_v4().to_string(),
            iat,
            exp: iat.saturating_add(self.ttl_secs(token_type)),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };

        let claims_json = serde_json::to_vec(&claims).map_err(anyhow::Error::from)?;
        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(HEADER),
            URL_SAFE_NO_PAD.encode(claims_json)
        );
        let signature = hmac_sha256(self.secret(token_type), signing_input.as_bytes());

        tracing::debug!(jti = %claims.jti, %token_type, exp = claims.exp, "issued token");
        Ok(format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(signature)))
    }

    /// Signature, then expiry, then issuer/audience, then type.
    ///
    /// The signature is checked under the secret of the token's *declared*
    /// type, so a genuine refresh token presented as an access token is a
    /// type mismatch while a forged one is a bad signature.
    fn verify(&self, token: &str, expected: TokenType) -> ForgeguardResult<TokenClaims> {
        let segments = split_token(token)
            .ok_or_else(|| ForgeguardError::MalformedToken("expected 3 segments".into()))?;

        let header: Header = decode_json(segments.header)
            .ok_or_else(|| ForgeguardError::MalformedToken("unreadable header".into()))?;
        if header.alg != ALGORITHM {
            tracing::debug!(alg = %header.alg, "rejected token with unexpected algorithm");
            return Err(ForgeguardError::InvalidSignature);
        }

        let claims: TokenClaims = decode_json(segments.claims)
            .ok_or_else(|| ForgeguardError::MalformedToken("unreadable claims".into()))?;

        let signature = URL_SAFE_NO_PAD
            .decode(segments.signature)
            .map_err(|_| ForgeguardError::InvalidSignature)?;
        if !verify_hmac_sha256(
            self.secret(claims.token_type),
            segments.signing_input.as_bytes(),
            &signature,
        ) {
            tracing::debug!("rejected token with bad signature");
            return Err(ForgeguardError::InvalidSignature);
        }

        if self.clock.now_unix() >= claims.exp {
            tracing::debug!(jti = %claims.jti, "rejected expired token");
            return Err(ForgeguardError::TokenExpired);
        }
        if claims.iss != self.issuer {
            return Err(ForgeguardError::InvalidClaim("iss"));
        }
        if claims.aud != self.audience {
            return Err(ForgeguardError::InvalidClaim("aud"));
        }

        if claims.token_type != expected {
            tracing::debug!(jti = %claims.jti, %expected, actual = %claims.token_type, "rejected token of wrong type");
            return Err(ForgeguardError::WrongTokenType {
                expected: expected.as_str(),
                actual: claims.token_type.as_str(),
            });
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("access_secret", &"[REDACTED]")
            .field("refresh_secret", &"[REDACTED]")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish()
    }
}

/// Unverified decode for diagnostics. Never fails; `None` on malformed input.
pub fn decode_token(token: &str) -> Option<TokenClaims> {
    decode_json(split_token(token)?.claims)
}

/// Parse an `Authorization` header of the exact form `Bearer <token>`.
pub fn extract_bearer_token(header: Option<&str>) -> Option<&str> {
    let token = header?.strip_prefix("Bearer ")?;
    if token.is_empty() || token.contains(char::is_whitespace) {
        return None;
    }
    Some(token)
}

struct TokenSegments<'a> {
    header: &'a str,
    claims: &'a str,
    signature: &'a str,
    signing_input: &'a str,
}

fn split_token(token: &str) -> Option<TokenSegments<'_>> {
    let (signing_input, signature) = token.rsplit_once('.')?;
    let (header, claims) = signing_input.split_once('.')?;
    if claims.contains('.') {
        return None;
    }
    Some(TokenSegments {
        header,
        claims,
        signature,
        signing_input,
    })
}

fn decode_json<T: serde::de::DeserializeOwned>(segment: &str) -> Option<T> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).ok()?;
    serde_json::from_slice(&bytes).ok()
}
