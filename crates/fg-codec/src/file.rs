//! Compressed upload records
//!
//! The record keeps the storage-safe encoded string alongside the sizes an
//! upload UI wants to show.

use serde::{Deserialize, Serialize};

use fg_core::ForgeguardResult;

use crate::text;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressedFile {
    /// Scheme-tagged base64, as produced by [`text::compress_bytes`]
    pub data: String,
    pub original_size: u64,
    /// Length of `data` as stored
    pub compressed_size: u64,
    /// Percentage saved; negative when encoding expanded the file
    pub compression_ratio: f64,
    pub mime_type: String,
    pub filename: String,
}

pub fn compress_file(bytes: &[u8], filename: &str, mime_type: &str) -> CompressedFile {
    let data = text::compress_bytes(bytes);
    let original_size = bytes.len() as u64;
    let compressed_size = data.len() as u64;

    tracing::debug!(
        filename,
        original_size,
        compressed_size,
        "compressed file"
    );

    CompressedFile {
        data,
        original_size,
        compressed_size,
        compression_ratio: compression_ratio(original_size, compressed_size),
        mime_type: mime_type.to_string(),
        filename: filename.to_string(),
    }
}

/// Recover the original bytes from a record.
pub fn decompress_file(record: &CompressedFile) -> ForgeguardResult<Vec<u8>> {
    text::decompress_bytes(&record.data)
}

fn compression_ratio(original: u64, compressed: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (1.0 - compressed as f64 / original as f64) * 100.0
}

const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// Human-readable size with 1024-based units, e.g. `1.5 KB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", (value * 100.0).round() / 100.0);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_roundtrip() {
        let drawing = "LAYER A-WALL\nLINE 0 0 100 0\n".repeat(50);
        let record = compress_file(drawing.as_bytes(), "plan.dxf", "image/vnd.dxf");

        assert_eq!(record.original_size, drawing.len() as u64);
        assert_eq!(record.compressed_size, record.data.len() as u64);
        assert!(record.compression_ratio > 50.0);
        assert_eq!(record.filename, "plan.dxf");
        assert_eq!(decompress_file(&record).unwrap(), drawing.as_bytes());
    }

    #[test]
    fn test_binary_roundtrip() {
        let bytes: Vec<u8> = (0..=255u8).cycle().take(2048).collect();
        let record = compress_file(&bytes, "blob.bin", "application/octet-stream");
        assert_eq!(decompress_file(&record).unwrap(), bytes);
    }

    #[test]
    fn test_empty_file() {
        let record = compress_file(b"", "empty.txt", "text/plain");
        assert_eq!(record.original_size, 0);
        assert_eq!(record.compression_ratio, 0.0);
        assert!(decompress_file(&record).unwrap().is_empty());
    }

    #[test]
    fn test_ratio_negative_on_expansion() {
        let record = compress_file(b"xyz", "tiny.txt", "text/plain");
        assert!(record.compression_ratio < 0.0);
    }

    #[test]
    fn test_json_field_names() {
        let record = compress_file(b"hello", "a.txt", "text/plain");
        let json = serde_json::to_value(&record).unwrap();
        for key in [
            "data",
            "originalSize",
            "compressedSize",
            "compressionRatio",
            "mimeType",
            "filename",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        let back: CompressedFile = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_tampered_record_fails() {
        let mut record = compress_file(b"some report text", "r.txt", "text/plain");
        record.data = "q@@@".into();
        assert!(decompress_file(&record).is_err());
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1_048_576), "1 MB");
        assert_eq!(format_file_size(5 * 1024 * 1024 * 1024 + 1024 * 1024 * 256), "5.25 GB");
        assert_eq!(format_file_size(3 * 1024u64.pow(4)), "3 TB");
        assert_eq!(format_file_size(2048 * 1024u64.pow(4)), "2048 TB");
    }
}
