//! fg-core: shared building blocks for forgeguard
//!
//! - `config`: TOML configuration schema, env overlay, startup validation
//! - `error`: the error taxonomy every forgeguard crate returns
//! - `duration`: `7d` / `15m` style lifetime parsing
//! - `sanitize`: email, phone and free-text input hygiene

pub mod config;
pub mod duration;
pub mod error;
pub mod sanitize;

pub use error::{ErrorKind, ForgeguardError, ForgeguardResult};
