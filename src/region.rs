//! Bounds-checked view over the shared telemetry region.
//!
//! The region is a fixed-size byte block written by an external producer.
//! [`RegionView`] owns whatever backs it (a live Windows mapping, a dump read
//! from disk, or a synthetic buffer in tests) and validates every offset
//! against the region length before reading.

use std::path::Path;
use tracing::{debug, trace};

use crate::{Result, TelemetryError, Value, VariableType};

/// Marker byte at offset 0 while the producer is active.
pub const ALIVE_MARKER: u8 = 0x01;

/// Size of the producer's mapping.
pub const DEFAULT_REGION_SIZE: usize = 798_720;

/// Read-only view over a shared region.
///
/// Any `AsRef<[u8]>` can back a view. Reads borrow straight from the backing
/// bytes; the view never copies the region.
#[derive(Debug, Clone)]
pub struct RegionView<S> {
    source: S,
}

impl<S: AsRef<[u8]>> RegionView<S> {
    /// Wrap a region source.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// The raw region bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.source.as_ref()
    }

    /// Total region size in bytes.
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Whether the region has no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    /// Read `length` bytes starting at `offset`.
    ///
    /// Fails with [`TelemetryError::OutOfBounds`] when the range does not fit
    /// inside the region.
    pub fn read_bytes(&self, offset: usize, length: usize) -> Result<&[u8]> {
        let bytes = self.as_bytes();
        offset
            .checked_add(length)
            .and_then(|end| bytes.get(offset..end))
            .ok_or_else(|| TelemetryError::out_of_bounds(offset, length, bytes.len()))
    }

    /// Read a little-endian `i32` header field.
    pub fn read_i32(&self, offset: usize) -> Result<i32> {
        let bytes = self.read_bytes(offset, 4)?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read and decode one scalar of `var_type` at `offset`.
    pub fn read_scalar(&self, offset: usize, var_type: VariableType) -> Result<Value> {
        trace!(offset, ?var_type, "Reading scalar from region");
        Value::decode(var_type, self.read_bytes(offset, var_type.size())?)
    }

    /// Whether the alive sentinel is present.
    pub fn is_live(&self) -> bool {
        self.as_bytes().first() == Some(&ALIVE_MARKER)
    }

    /// Borrow the backing source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Give back the backing source.
    pub fn into_inner(self) -> S {
        self.source
    }
}

/// Load a region dump captured from a live mapping.
pub fn read_dump<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let bytes =
        std::fs::read(path).map_err(|e| TelemetryError::file_error(path.to_path_buf(), e))?;
    debug!(path = %path.display(), len = bytes.len(), "Loaded region dump");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn sentinel_controls_liveness() {
        assert!(RegionView::new(vec![ALIVE_MARKER, 0, 0]).is_live());
        assert!(!RegionView::new(vec![0u8, 0, 0]).is_live());
        assert!(!RegionView::new(vec![2u8]).is_live());
        assert!(!RegionView::new(Vec::<u8>::new()).is_live());
    }

    #[test]
    fn reads_little_endian_header_fields() {
        let mut bytes = vec![0u8; 64];
        bytes[28..32].copy_from_slice(&1234i32.to_le_bytes());
        let region = RegionView::new(bytes);
        assert_eq!(region.read_i32(28).unwrap(), 1234);
    }

    #[test]
    fn read_scalar_decodes_at_offset() {
        let mut bytes = vec![0u8; 32];
        bytes[8..16].copy_from_slice(&(-3.25f64).to_le_bytes());
        let region = RegionView::new(bytes.as_slice());
        assert_eq!(region.read_scalar(8, VariableType::Float64).unwrap(), Value::Float64(-3.25));
    }

    #[test]
    fn overflowing_offsets_are_out_of_bounds() {
        let region = RegionView::new(vec![0u8; 16]);
        let err = region.read_bytes(usize::MAX, 2).unwrap_err();
        assert!(matches!(err, TelemetryError::OutOfBounds { region_len: 16, .. }));
    }

    #[test]
    fn missing_dump_reports_path() {
        let err = read_dump("definitely/not/here.bin").unwrap_err();
        assert!(matches!(err, TelemetryError::File { .. }));
        assert!(err.to_string().contains("here.bin"));
    }

    proptest! {
        #[test]
        fn prop_read_bytes_respects_region_length(
            len in 0usize..256,
            offset in 0usize..300,
            length in 0usize..300,
        ) {
            let region = RegionView::new(vec![0xAAu8; len]);
            let result = region.read_bytes(offset, length);
            if offset + length <= len {
                prop_assert_eq!(result.unwrap().len(), length);
            } else {
                let is_out_of_bounds = matches!(result, Err(TelemetryError::OutOfBounds { .. }));
                prop_assert!(is_out_of_bounds);
            }
        }
    }
}
