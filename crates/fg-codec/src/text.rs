//! Storage-safe compressed strings
//!
//! Encoded form: one scheme character followed by standard base64 of the
//! compressed bytes.
//! ```text
//! "z" base64(zstd frame)                  native path
//! "r" base64(character run-length text)   fallback for text
//! "b" base64(byte run-length stream)      fallback for non-UTF-8 bytes
//! ```
//! Each scheme is decoded only by its own decoder.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use fg_core::{ForgeguardError, ForgeguardResult};

use crate::{native, rle};

/// Upper bound on decompressed output (64 MiB).
pub const MAX_DECOMPRESSED_LEN: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Zstd,
    /// Runs of identical characters; input must be UTF-8
    RunLength,
    /// Runs of identical bytes
    ByteRunLength,
}

impl Scheme {
    fn tag(self) -> char {
        match self {
            Scheme::Zstd => 'z',
            Scheme::RunLength => 'r',
            Scheme::ByteRunLength => 'b',
        }
    }

    fn from_tag(tag: char) -> Option<Self> {
        match tag {
            'z' => Some(Scheme::Zstd),
            'r' => Some(Scheme::RunLength),
            'b' => Some(Scheme::ByteRunLength),
            _ => None,
        }
    }
}

/// Compress text, preferring zstd and falling back to run-length encoding.
pub fn compress(text: &str) -> String {
    compress_bytes(text.as_bytes())
}

/// Decompress the output of [`compress`] or [`compress_with`].
///
/// Corrupted input is an error; partial output is never returned.
pub fn decompress(encoded: &str) -> ForgeguardResult<String> {
    let bytes = decompress_bytes(encoded)?;
    String::from_utf8(bytes)
        .map_err(|_| ForgeguardError::MalformedCompressed("decoded text is not UTF-8".into()))
}

/// Compress text with a specific scheme, skipping the fallback.
pub fn compress_with(text: &str, scheme: Scheme) -> ForgeguardResult<String> {
    let compressed = match scheme {
        Scheme::Zstd => native::compress(text.as_bytes(), native::DEFAULT_LEVEL)?,
        Scheme::RunLength => rle::encode_text(text).into_bytes(),
        Scheme::ByteRunLength => rle::encode(text.as_bytes()),
    };
    Ok(encode(scheme, &compressed))
}

/// Compress arbitrary bytes. The fallback uses character runs when the data
/// is UTF-8 text and byte runs otherwise.
pub fn compress_bytes(data: &[u8]) -> String {
    match native::compress(data, native::DEFAULT_LEVEL) {
        Ok(compressed) => encode(Scheme::Zstd, &compressed),
        Err(e) => {
            tracing::warn!(error = %e, "zstd compression failed, using run-length fallback");
            match std::str::from_utf8(data) {
                Ok(text) => encode(Scheme::RunLength, rle::encode_text(text).as_bytes()),
                Err(_) => encode(Scheme::ByteRunLength, &rle::encode(data)),
            }
        }
    }
}

/// Compress bytes with a specific scheme. [`Scheme::RunLength`] requires
/// UTF-8 input.
pub fn compress_bytes_with(data: &[u8], scheme: Scheme) -> ForgeguardResult<String> {
    match scheme {
        Scheme::RunLength => {
            let text = std::str::from_utf8(data).map_err(|_| {
                ForgeguardError::Compression("character run-length needs UTF-8 input".into())
            })?;
            compress_with(text, scheme)
        }
        Scheme::Zstd => Ok(encode(scheme, &native::compress(data, native::DEFAULT_LEVEL)?)),
        Scheme::ByteRunLength => Ok(encode(scheme, &rle::encode(data))),
    }
}

pub fn decompress_bytes(encoded: &str) -> ForgeguardResult<Vec<u8>> {
    let mut chars = encoded.chars();
    let Some(tag) = chars.next() else {
        return Ok(Vec::new());
    };
    let scheme = Scheme::from_tag(tag)
        .ok_or_else(|| ForgeguardError::MalformedCompressed("unknown scheme tag".into()))?;

    let body = STANDARD
        .decode(chars.as_str())
        .map_err(|e| ForgeguardError::MalformedCompressed(format!("base64: {e}")))?;

    match scheme {
        Scheme::Zstd => native::decompress(&body, MAX_DECOMPRESSED_LEN),
        Scheme::ByteRunLength => rle::decode(&body, MAX_DECOMPRESSED_LEN),
        Scheme::RunLength => {
            let text = std::str::from_utf8(&body).map_err(|_| {
                ForgeguardError::MalformedCompressed("run-length text is not UTF-8".into())
            })?;
            rle::decode_text(text, MAX_DECOMPRESSED_LEN).map(String::into_bytes)
        }
    }
}

/// Which scheme produced `encoded`, if it is recognizable at all.
pub fn scheme_of(encoded: &str) -> Option<Scheme> {
    encoded.chars().next().and_then(Scheme::from_tag)
}

fn encode(scheme: Scheme, compressed: &[u8]) -> String {
    let mut out = String::with_capacity(1 + compressed.len().div_ceil(3) * 4);
    out.push(scheme.tag());
    STANDARD.encode_string(compressed, &mut out);
    out
}
