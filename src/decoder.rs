//! Live value decoding against a resolved layout.
//!
//! A variable's bytes live at `base[i] + offset` in each of the three buffer
//! replicas. The decoder walks the replicas in the order chosen by the
//! [`BufferPolicy`] and decodes the first slice that is not entirely zero.
//! When every slice is zero it returns [`Sample::Unknown`].
//!
//! This is a heuristic stand-in for a proper freshness check. It never blocks
//! the producer, but it can return a replica that is one tick stale, and a
//! value whose encoding is all zero bytes (an `Int32` of 0, a `Bool` of
//! false) is indistinguishable from an empty replica and reads as `Unknown`.

use tracing::trace;

use crate::config::BufferPolicy;
use crate::layout::{BUFFER_COUNT, SessionLayout, newest_first, tick_counts};
use crate::region::RegionView;
use crate::{Result, Sample, TelemetryError, Value};

/// Decodes variables from the live buffer replicas.
#[derive(Debug, Clone, Copy)]
pub struct ValueDecoder<'a> {
    layout: &'a SessionLayout,
    policy: BufferPolicy,
}

impl<'a> ValueDecoder<'a> {
    pub fn new(layout: &'a SessionLayout, policy: BufferPolicy) -> Self {
        Self { layout, policy }
    }

    /// Decode `name` from the first non-zero replica.
    ///
    /// Fails with [`TelemetryError::UnknownVariable`] when `name` has no
    /// offset entry.
    pub fn decode<S: AsRef<[u8]>>(&self, region: &RegionView<S>, name: &str) -> Result<Sample> {
        let (descriptor, offset) = self.layout.locate(name)?;
        let width = descriptor.var_type.size();
        let bases = self.layout.buffers().bases();

        for replica in self.replica_order(region)? {
            let start = bases[replica].checked_add(offset).ok_or_else(|| {
                TelemetryError::malformed_region(
                    "Value decode",
                    format!("Offset of '{}' overflows in buffer {}", name, replica),
                )
            })?;

            let bytes = region.read_bytes(start, width)?;
            if bytes.iter().any(|&b| b != 0) {
                trace!(name, replica, start, "Decoded value from buffer replica");
                return Value::decode(descriptor.var_type, bytes).map(Sample::Value);
            }
        }

        trace!(name, "All buffer replicas zero-filled");
        Ok(Sample::Unknown)
    }

    fn replica_order<S: AsRef<[u8]>>(&self, region: &RegionView<S>) -> Result<[usize; BUFFER_COUNT]> {
        match self.policy {
            BufferPolicy::FirstNonZero => Ok([0, 1, 2]),
            BufferPolicy::LatestTick => Ok(newest_first(tick_counts(region)?)),
        }
    }
}
