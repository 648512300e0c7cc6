use thiserror::Error;

pub type ForgeguardResult<T> = Result<T, ForgeguardError>;

/// Coarse classification of a [`ForgeguardError`].
///
/// Callers map kinds to user-facing behavior (for example every
/// `AuthenticationFailure` becomes a generic "invalid request").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    MalformedInput,
    AuthenticationFailure,
    Expired,
    TypeMismatch,
    Validation,
    Internal,
}

/// Error messages carry the failure kind and non-sensitive context only.
/// Plaintext, key material and decoded secrets never appear here.
#[derive(Debug, Error)]
pub enum ForgeguardError {
    #[error("config error: {0}")]
    Config(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),

    #[error("authentication failed: invalid key or corrupted data")]
    Authentication,

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("invalid duration format: {0:?} (expected <integer><s|m|h|d|w>)")]
    InvalidDurationFormat(String),

    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token has expired")]
    TokenExpired,

    #[error("token claim mismatch: {0}")]
    InvalidClaim(&'static str),

    #[error("wrong token type: expected {expected}, got {actual}")]
    WrongTokenType {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("invalid email address")]
    InvalidEmail,

    #[error("invalid phone number format")]
    InvalidPhoneFormat,

    #[error("malformed compressed data: {0}")]
    MalformedCompressed(String),

    #[error("compression failed: {0}")]
    Compression(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ForgeguardError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Configuration,
            Self::InvalidEnvelope(_)
            | Self::InvalidDurationFormat(_)
            | Self::MalformedToken(_)
            | Self::MalformedCompressed(_) => ErrorKind::MalformedInput,
            Self::Authentication | Self::InvalidSignature | Self::InvalidClaim(_) => {
                ErrorKind::AuthenticationFailure
            }
            Self::TokenExpired => ErrorKind::Expired,
            Self::WrongTokenType { .. } => ErrorKind::TypeMismatch,
            Self::InvalidEmail | Self::InvalidPhoneFormat => ErrorKind::Validation,
            Self::Encryption(_)
            | Self::Hashing(_)
            | Self::Compression(_)
            | Self::Other(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            ForgeguardError::Config("missing".into()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            ForgeguardError::InvalidEnvelope("bad hex".into()).kind(),
            ErrorKind::MalformedInput
        );
        assert_eq!(
            ForgeguardError::Authentication.kind(),
            ErrorKind::AuthenticationFailure
        );
        assert_eq!(ForgeguardError::TokenExpired.kind(), ErrorKind::Expired);
        assert_eq!(
            ForgeguardError::WrongTokenType {
                expected: "access",
                actual: "refresh"
            }
            .kind(),
            ErrorKind::TypeMismatch
        );
        assert_eq!(ForgeguardError::InvalidEmail.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_authentication_message_is_uniform() {
        // Same message whether the key was wrong or the data was tampered with
        let msg = ForgeguardError::Authentication.to_string();
        assert_eq!(msg, "authentication failed: invalid key or corrupted data");
    }
}
