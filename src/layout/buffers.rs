//! Buffer replica resolution
//!
//! The producer keeps three replicas of the live value block. Header slot `i`
//! (16 bytes at `48 + i*16`) holds the replica's tick counter followed by its
//! absolute base offset.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{BUFFER_COUNT, BUFFER_SLOT_OFFSET, BUFFER_SLOT_STRIDE};
use crate::region::RegionView;
use crate::{Result, TelemetryError};

/// Base offsets of the three buffer replicas, in header order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferSet {
    bases: [usize; BUFFER_COUNT],
}

impl BufferSet {
    /// Read the replica base offsets from the header.
    ///
    /// A base of 0 is a valid offset. Negative bases cannot address the
    /// region and are rejected.
    pub fn resolve<S: AsRef<[u8]>>(region: &RegionView<S>) -> Result<Self> {
        let mut bases = [0usize; BUFFER_COUNT];
        for (i, base) in bases.iter_mut().enumerate() {
            let slot = BUFFER_SLOT_OFFSET + i * BUFFER_SLOT_STRIDE;
            let raw = region.read_i32(slot + 4)?;
            *base = usize::try_from(raw).map_err(|_| {
                TelemetryError::malformed_region(
                    "Buffer set",
                    format!("Buffer {} has negative base offset {}", i, raw),
                )
            })?;
        }

        debug!(?bases, "Resolved buffer replicas");
        Ok(Self { bases })
    }

    /// Construct from known base offsets.
    pub fn from_bases(bases: [usize; BUFFER_COUNT]) -> Self {
        Self { bases }
    }

    /// Replica base offsets in header order.
    pub fn bases(&self) -> [usize; BUFFER_COUNT] {
        self.bases
    }

    /// Base offset of replica `index`.
    pub fn base(&self, index: usize) -> Option<usize> {
        self.bases.get(index).copied()
    }
}

/// Read the live tick counters of the three replicas.
pub fn tick_counts<S: AsRef<[u8]>>(region: &RegionView<S>) -> Result<[i32; BUFFER_COUNT]> {
    let mut ticks = [0i32; BUFFER_COUNT];
    for (i, tick) in ticks.iter_mut().enumerate() {
        *tick = region.read_i32(BUFFER_SLOT_OFFSET + i * BUFFER_SLOT_STRIDE)?;
    }
    Ok(ticks)
}

/// Compare tick counters in u32 space with wraparound using half-range rule.
/// Returns true if `a` is considered newer than `b`.
pub fn tick_after_u32(a: u32, b: u32) -> bool {
    if a == b {
        return false;
    }
    a.wrapping_sub(b) < 0x8000_0000
}

/// Replica indices ordered newest first by tick counter.
///
/// Ties keep header order.
pub fn newest_first(ticks: [i32; BUFFER_COUNT]) -> [usize; BUFFER_COUNT] {
    let mut latest = 0;
    for i in 1..BUFFER_COUNT {
        if tick_after_u32(ticks[i] as u32, ticks[latest] as u32) {
            latest = i;
        }
    }

    let newest = ticks[latest] as u32;
    let mut order = [0, 1, 2];
    order.sort_by_key(|&i| newest.wrapping_sub(ticks[i] as u32));
    order
}
