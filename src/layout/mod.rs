//! Region layout discovery.
//!
//! The producer publishes one fixed-size region:
//!
//! ```text
//! 0        header line (alive sentinel at byte 0, binary header fields)
//!          YAML session document, ended by a `...` line
//! boundary zero padding
//!          descriptor table (144-byte records, empty name terminates)
//!          ...
//! base[i]  buffer replica i (values at base[i] + variable offset)
//! ```
//!
//! All integers are little-endian `i32`. The layout is resolved once per
//! session into a [`SessionLayout`]; live values are read against it on every
//! query.

mod boundary;
mod buffers;
mod descriptors;
mod offsets;

pub use boundary::{MetadataBoundary, scan_boundary};
pub use buffers::{BufferSet, newest_first, tick_after_u32, tick_counts};
pub use descriptors::{
    DescriptorTable, find_table_start, parse_descriptor_table, parse_descriptors,
};
pub use offsets::VariableOffsetTable;

use std::collections::HashMap;
use tracing::info;

use crate::region::RegionView;
use crate::{Result, TelemetryError, VariableDescriptor};

/// Header offset of the variable table pointer.
pub const VAR_TABLE_POINTER_OFFSET: usize = 28;
/// Header offset of the first buffer slot (tick counter, then base offset).
pub const BUFFER_SLOT_OFFSET: usize = 48;
/// Stride between buffer slots.
pub const BUFFER_SLOT_STRIDE: usize = 16;
/// Number of buffer replicas.
pub const BUFFER_COUNT: usize = 3;

/// Size of one descriptor record.
pub const VAR_HEADER_SIZE: usize = 144;
pub const NAME_FIELD_OFFSET: usize = 16;
pub const NAME_FIELD_LEN: usize = 32;
pub const DESC_FIELD_OFFSET: usize = 48;
pub const DESC_FIELD_LEN: usize = 64;
pub const UNIT_FIELD_OFFSET: usize = 112;
pub const UNIT_FIELD_LEN: usize = 32;

/// Trimmed content of the line that ends the metadata document.
pub const METADATA_TERMINATOR: &[u8] = b"...";
/// Distance from the start of the terminator line to the boundary.
pub const TERMINATOR_PADDING: usize = 4;

/// Static structure of a session, resolved once and immutable afterwards.
#[derive(Debug, Clone)]
pub struct SessionLayout {
    boundary: MetadataBoundary,
    table_start: usize,
    descriptors: Vec<VariableDescriptor>,
    by_name: HashMap<String, usize>,
    buffers: BufferSet,
    offsets: VariableOffsetTable,
}

impl SessionLayout {
    /// Resolve boundary, descriptors, buffer replicas and value offsets.
    pub fn resolve<S: AsRef<[u8]>>(region: &RegionView<S>) -> Result<Self> {
        let boundary = scan_boundary(region)?;
        let table = parse_descriptor_table(region, boundary.offset)?;
        let buffers = BufferSet::resolve(region)?;
        let offsets = VariableOffsetTable::resolve(region, &table.descriptors)?;

        let by_name = table
            .descriptors
            .iter()
            .map(|descriptor| (descriptor.name.clone(), descriptor.index))
            .collect();

        info!(
            boundary = boundary.offset,
            table_start = table.start,
            num_vars = table.descriptors.len(),
            buffers = ?buffers.bases(),
            "Resolved session layout"
        );

        Ok(Self {
            boundary,
            table_start: table.start,
            descriptors: table.descriptors,
            by_name,
            buffers,
            offsets,
        })
    }

    /// Metadata document location.
    pub fn boundary(&self) -> MetadataBoundary {
        self.boundary
    }

    /// Offset of the first descriptor record.
    pub fn table_start(&self) -> usize {
        self.table_start
    }

    /// All descriptors in table order.
    pub fn descriptors(&self) -> &[VariableDescriptor] {
        &self.descriptors
    }

    /// Descriptor for `name`.
    pub fn descriptor(&self, name: &str) -> Option<&VariableDescriptor> {
        self.by_name.get(name).map(|&index| &self.descriptors[index])
    }

    /// Buffer replica bases.
    pub fn buffers(&self) -> &BufferSet {
        &self.buffers
    }

    /// Per-variable value offsets.
    pub fn offsets(&self) -> &VariableOffsetTable {
        &self.offsets
    }

    /// Descriptor and value offset for `name`, or `UnknownVariable`.
    pub fn locate(&self, name: &str) -> Result<(&VariableDescriptor, usize)> {
        let offset = self.offsets.get(name).ok_or_else(|| TelemetryError::unknown_variable(name))?;
        let descriptor = self.descriptor(name).ok_or_else(|| TelemetryError::unknown_variable(name))?;
        Ok((descriptor, offset))
    }
}
