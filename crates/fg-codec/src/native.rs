//! zstd: the preferred compression path

use std::io::Read;

use fg_core::{ForgeguardError, ForgeguardResult};

/// Default zstd level. Text payloads are small; higher levels buy little.
pub const DEFAULT_LEVEL: i32 = 3;

pub fn compress(data: &[u8], level: i32) -> ForgeguardResult<Vec<u8>> {
    zstd::encode_all(data, level).map_err(|e| ForgeguardError::Compression(format!("zstd: {e}")))
}

/// Decompress zstd frames, refusing output larger than `max_len`.
pub fn decompress(data: &[u8], max_len: usize) -> ForgeguardResult<Vec<u8>> {
    let malformed = |e: std::io::Error| ForgeguardError::MalformedCompressed(format!("zstd: {e}"));

    let decoder = zstd::stream::read::Decoder::new(data).map_err(malformed)?;
    let mut out = Vec::new();
    decoder
        .take(max_len as u64 + 1)
        .read_to_end(&mut out)
        .map_err(malformed)?;

    if out.len() > max_len {
        return Err(ForgeguardError::MalformedCompressed(format!(
            "zstd: output exceeds {max_len} bytes"
        )));
    }
    Ok(out)
}
