//! fg-codec: compression for text fields and uploaded files
//!
//! # Overview
//! - `native`: zstd frames, the preferred path
//! - `rle`: run-length fallback with an unambiguous escape format
//! - `text`: scheme-tagged base64 strings safe to store in text columns
//! - `file`: upload records with sizes and ratio, plus size formatting

pub mod file;
pub mod native;
pub mod rle;
pub mod text;

pub use file::{compress_file, decompress_file, format_file_size, CompressedFile};
pub use text::{
    compress, compress_bytes, compress_bytes_with, compress_with, decompress, decompress_bytes,
    scheme_of, Scheme,
};
