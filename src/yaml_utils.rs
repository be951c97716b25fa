//! YAML utilities for the session metadata document
//!
//! The producer's YAML is not always clean:
//! - Control characters that break YAML parsers
//! - Trailing NUL padding when the document is shorter than its slot
//!
//! This module provides low-level YAML cleaning without parsing.

/// Strip control characters that break YAML parsers.
///
/// Keeps `\n`, `\r` and `\t`; everything else below 0x20 is dropped.
pub fn preprocess_metadata_yaml(yaml: &str) -> String {
    yaml.chars()
        .filter(|ch| !matches!(ch, '\x00'..='\x08' | '\x0B'..='\x0C' | '\x0E'..='\x1F'))
        .collect()
}

/// Extract the document text from raw region bytes.
///
/// Stops at the first NUL. Bytes that are not valid UTF-8 are replaced rather
/// than rejected, since driver and team names are not guaranteed to be UTF-8.
pub fn extract_document(data: &[u8]) -> String {
    let len = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    String::from_utf8_lossy(&data[..len]).into_owned()
}
