//! Metadata boundary scanning
//!
//! The region opens with a header line followed by the YAML session document,
//! which ends with a line holding only `...`. The descriptor table follows.
//! Scanning walks the document one line at a time, the same way a buffered
//! line reader would, and places the boundary a fixed padding past the start
//! of the terminator line, or at the end of that line when it is longer.

use tracing::{debug, trace};

use super::{METADATA_TERMINATOR, TERMINATOR_PADDING};
use crate::region::RegionView;
use crate::{Result, TelemetryError};

/// Location of the metadata document inside the region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataBoundary {
    /// Length of the header line, including its newline. The document starts here.
    pub header_len: usize,
    /// Offset of the terminator line. The document body is `header_len..document_end`.
    pub document_end: usize,
    /// First byte after the metadata block.
    pub offset: usize,
}

impl MetadataBoundary {
    /// Byte range of the document body, terminator excluded.
    pub fn document_range(&self) -> std::ops::Range<usize> {
        self.header_len..self.document_end
    }
}

/// Find where the metadata document ends and the descriptor table begins.
///
/// Fails with [`TelemetryError::MalformedRegion`] when no terminator line is
/// found before the end of the region, or when the resulting boundary does
/// not lie strictly inside the region.
pub fn scan_boundary<S: AsRef<[u8]>>(region: &RegionView<S>) -> Result<MetadataBoundary> {
    let bytes = region.as_bytes();

    let header_len = line_len(bytes);
    if header_len == bytes.len() {
        return Err(TelemetryError::malformed_region(
            "Metadata boundary scan",
            "Header line is not newline-terminated",
        ));
    }

    let mut cursor = header_len;
    while cursor < bytes.len() {
        let len = line_len(&bytes[cursor..]);
        let line = &bytes[cursor..cursor + len];

        if line.trim_ascii() == METADATA_TERMINATOR {
            // A padded or CRLF terminator line is longer than the fixed padding.
            let offset = cursor + len.max(TERMINATOR_PADDING);
            if offset >= bytes.len() {
                return Err(TelemetryError::malformed_region(
                    "Metadata boundary scan",
                    format!(
                        "Boundary {} is not inside region of {} bytes",
                        offset,
                        bytes.len()
                    ),
                ));
            }

            debug!(header_len, document_end = cursor, boundary = offset, "Found metadata boundary");
            return Ok(MetadataBoundary { header_len, document_end: cursor, offset });
        }

        trace!(line_start = cursor, line_len = len, "Skipping metadata line");
        cursor += len;
    }

    Err(TelemetryError::malformed_region(
        "Metadata boundary scan",
        format!("No '...' terminator found in {} byte region", bytes.len()),
    ))
}

/// Length of the first line in `bytes`, including its newline when present.
fn line_len(bytes: &[u8]) -> usize {
    bytes.iter().position(|&b| b == b'\n').map_or(bytes.len(), |pos| pos + 1)
}
