//! Password hashing: Argon2id PHC strings with a single cost knob

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use fg_core::config::PASSWORD_COST_RANGE;
use fg_core::{ForgeguardError, ForgeguardResult};
use rand::RngCore;

/// Default cost factor.
pub const DEFAULT_PASSWORD_COST: u32 = 12;

/// Argon2id iterations, independent of the cost factor.
const TIME_COST: u32 = 3;

/// Salted, cost-parameterized password hashing.
///
/// The cost factor `c` selects `2^c` KiB of Argon2id memory (12 → 4 MiB).
/// Verification reads parameters back out of the stored PHC string, so
/// raising the cost does not invalidate existing hashes.
#[derive(Clone)]
pub struct PasswordHashing {
    argon2: Argon2<'static>,
    cost: u32,
}

impl PasswordHashing {
    pub fn new(cost: u32) -> ForgeguardResult<Self> {
        if !PASSWORD_COST_RANGE.contains(&cost) {
            return Err(ForgeguardError::Config(format!(
                "password cost {cost} outside {}..={}",
                PASSWORD_COST_RANGE.start(),
                PASSWORD_COST_RANGE.end()
            )));
        }
        let mem_cost_kib = 1u32 << cost;
        let params = Params::new(mem_cost_kib, TIME_COST, 1, None)
            .map_err(|e| ForgeguardError::Config(format!("invalid Argon2id params: {e}")))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            cost,
        })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a password with a fresh random salt.
    pub fn hash_password(&self, password: &str) -> ForgeguardResult<String> {
        let mut salt_bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut salt_bytes);
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| ForgeguardError::Hashing(format!("salt encoding: {e}")))?;

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ForgeguardError::Hashing(e.to_string()))
    }

    /// Check a password against a stored hash.
    ///
    /// A wrong password is `false`, not an error. An unparsable stored hash is
    /// also `false`.
    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "stored password hash is malformed");
                return false;
            }
        };
        self.argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

impl std::fmt::Debug for PasswordHashing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHashing")
            .field("cost", &self.cost)
            .finish()
    }
}
