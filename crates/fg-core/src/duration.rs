//! Token lifetime strings: `<integer><unit>` with unit one of `s m h d w`.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ForgeguardError, ForgeguardResult};

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)([smhdw])$").expect("duration pattern is valid")
});

/// Parse a lifetime string such as `"15m"` or `"7d"` into whole seconds.
pub fn parse_duration_secs(input: &str) -> ForgeguardResult<u64> {
    let caps = DURATION_RE
        .captures(input)
        .ok_or_else(|| ForgeguardError::InvalidDurationFormat(input.to_string()))?;

    let value: u64 = caps[1]
        .parse()
        .map_err(|_| ForgeguardError::InvalidDurationFormat(input.to_string()))?;

    let multiplier = match &caps[2] {
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        "w" => 7 * 24 * 60 * 60,
        _ => unreachable!("regex only admits s|m|h|d|w"),
    };

    value
        .checked_mul(multiplier)
        .ok_or_else(|| ForgeguardError::InvalidDurationFormat(input.to_string()))
}
