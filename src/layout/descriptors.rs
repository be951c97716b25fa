//! Descriptor table parsing
//!
//! Each variable is declared by a fixed 144-byte record:
//!
//! ```text
//! offset  size  field
//!      0     4  type code (little-endian i32, see VariableType)
//!      4     4  value offset within a buffer replica
//!      8     4  element count
//!     12     4  padding
//!     16    32  name, null-terminated
//!     48    64  description, null-terminated
//!    112    32  units, null-terminated
//! ```
//!
//! Records follow one another with no gaps. A record with an empty name ends
//! the table.

use std::collections::HashSet;
use tracing::{debug, trace, warn};

use super::{
    DESC_FIELD_LEN, DESC_FIELD_OFFSET, NAME_FIELD_LEN, NAME_FIELD_OFFSET, UNIT_FIELD_LEN,
    UNIT_FIELD_OFFSET, VAR_HEADER_SIZE, VAR_TABLE_POINTER_OFFSET,
};
use crate::region::RegionView;
use crate::{Result, TelemetryError, VariableDescriptor, VariableType};

/// Parsed descriptor table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorTable {
    /// Offset of the first record.
    pub start: usize,
    /// Descriptors in record order.
    pub descriptors: Vec<VariableDescriptor>,
}

/// Parse the descriptor table that follows the metadata boundary.
pub fn parse_descriptor_table<S: AsRef<[u8]>>(
    region: &RegionView<S>,
    boundary: usize,
) -> Result<DescriptorTable> {
    let start = find_table_start(region, boundary)?;
    let descriptors = parse_descriptors(region, start)?;

    debug!(start, count = descriptors.len(), "Parsed descriptor table");
    Ok(DescriptorTable { start, descriptors })
}

/// Skip the zero padding after the boundary to find the first record.
///
/// The first non-zero byte marks the table start. A record whose type code
/// is `Char` (0) begins with zero bytes itself, so when the header's table
/// pointer lies between the boundary and that first non-zero byte, and only
/// zeros separate them, the pointer is taken as the start instead.
pub fn find_table_start<S: AsRef<[u8]>>(region: &RegionView<S>, boundary: usize) -> Result<usize> {
    let bytes = region.as_bytes();
    let first_non_zero = bytes
        .get(boundary..)
        .and_then(|rest| rest.iter().position(|&b| b != 0))
        .map(|pos| boundary + pos)
        .ok_or_else(|| {
            TelemetryError::malformed_region(
                "Descriptor table scan",
                format!("No descriptor records after boundary {}", boundary),
            )
        })?;

    let pointer = usize::try_from(region.read_i32(VAR_TABLE_POINTER_OFFSET)?).ok();
    match pointer {
        Some(ptr) if ptr == first_non_zero => Ok(first_non_zero),
        Some(ptr) if (boundary..first_non_zero).contains(&ptr) => {
            debug!(pointer = ptr, first_non_zero, "Table begins with zero bytes, using header pointer");
            Ok(ptr)
        }
        _ => {
            warn!(
                pointer = ?pointer,
                first_non_zero,
                "Header table pointer disagrees with scanned table start"
            );
            Ok(first_non_zero)
        }
    }
}

/// Read records from `start` until the empty-name terminator.
pub fn parse_descriptors<S: AsRef<[u8]>>(
    region: &RegionView<S>,
    start: usize,
) -> Result<Vec<VariableDescriptor>> {
    let mut descriptors = Vec::new();
    let mut seen = HashSet::new();

    loop {
        let index = descriptors.len();
        let record_offset = start + index * VAR_HEADER_SIZE;
        let record = region.read_bytes(record_offset, VAR_HEADER_SIZE).map_err(|_| {
            TelemetryError::malformed_region(
                "Descriptor table",
                format!(
                    "Record {} at offset {} runs past the end of the region without a terminator",
                    index, record_offset
                ),
            )
        })?;

        let name = c_string_to_string(field(record, NAME_FIELD_OFFSET, NAME_FIELD_LEN));
        if name.is_empty() {
            trace!(index, record_offset, "Reached descriptor table terminator");
            break;
        }

        let code = i32::from_le_bytes([record[0], record[1], record[2], record[3]]);
        let var_type = VariableType::from_code(code).ok_or_else(|| {
            TelemetryError::malformed_region(
                "Descriptor table",
                format!("Variable '{}' has unknown type code {}", name, code),
            )
        })?;

        if !seen.insert(name.clone()) {
            return Err(TelemetryError::malformed_region(
                "Descriptor table",
                format!("Duplicate variable name '{}'", name),
            ));
        }

        trace!(index, %name, ?var_type, "Parsed descriptor record");
        descriptors.push(VariableDescriptor {
            name,
            var_type,
            index,
            description: c_string_to_string(field(record, DESC_FIELD_OFFSET, DESC_FIELD_LEN)),
            units: c_string_to_string(field(record, UNIT_FIELD_OFFSET, UNIT_FIELD_LEN)),
        });
    }

    Ok(descriptors)
}

fn field(record: &[u8], offset: usize, len: usize) -> &[u8] {
    &record[offset..offset + len]
}

/// Convert a fixed-size C string field to a Rust `String`.
fn c_string_to_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
