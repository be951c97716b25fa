//! Per-variable value offsets
//!
//! Header offset 28 points at the table holding each variable's value offset.
//! Entry `i` sits at `table_base + i*144 + 4`, the offset field of record `i`.

use std::collections::HashMap;
use tracing::{debug, trace};

use super::{VAR_HEADER_SIZE, VAR_TABLE_POINTER_OFFSET};
use crate::region::RegionView;
use crate::{Result, TelemetryError, VariableDescriptor};

/// Byte offset of each variable's value relative to a buffer base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableOffsetTable {
    table_base: usize,
    offsets: HashMap<String, usize>,
}

impl VariableOffsetTable {
    /// Resolve the value offset of every descriptor.
    pub fn resolve<S: AsRef<[u8]>>(
        region: &RegionView<S>,
        descriptors: &[VariableDescriptor],
    ) -> Result<Self> {
        let raw_base = region.read_i32(VAR_TABLE_POINTER_OFFSET)?;
        let table_base = usize::try_from(raw_base).map_err(|_| {
            TelemetryError::malformed_region(
                "Variable offset table",
                format!("Negative table pointer {}", raw_base),
            )
        })?;

        let mut offsets = HashMap::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let entry = table_base + descriptor.index * VAR_HEADER_SIZE + 4;
            let raw = region.read_i32(entry)?;
            let offset = usize::try_from(raw).map_err(|_| {
                TelemetryError::malformed_region(
                    "Variable offset table",
                    format!("Variable '{}' has negative offset {}", descriptor.name, raw),
                )
            })?;

            trace!(name = %descriptor.name, offset, "Resolved variable offset");
            offsets.insert(descriptor.name.clone(), offset);
        }

        debug!(table_base, count = offsets.len(), "Resolved variable offset table");
        Ok(Self { table_base, offsets })
    }

    /// Offset of `name` within each buffer replica.
    pub fn get(&self, name: &str) -> Option<usize> {
        self.offsets.get(name).copied()
    }

    /// Whether `name` has an offset entry.
    pub fn contains(&self, name: &str) -> bool {
        self.offsets.contains_key(name)
    }

    /// Base of the offset table in the region.
    pub fn table_base(&self) -> usize {
        self.table_base
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VariableType;
    use crate::layout::parse_descriptor_table;
    use crate::test_utils::RegionBuilder;

    #[test]
    fn offsets_follow_the_header_pointer() {
        let built = RegionBuilder::new()
            .variable("SessionTime", VariableType::Float64, 0)
            .variable("Speed", VariableType::Float32, 100)
            .variable("Gear", VariableType::Int32, 104)
            .build();
        let region = RegionView::new(built.bytes);
        let table = parse_descriptor_table(&region, built.boundary).unwrap();

        let offsets = VariableOffsetTable::resolve(&region, &table.descriptors).unwrap();
        assert_eq!(offsets.table_base(), built.table_start);
        assert_eq!(offsets.len(), 3);
        assert_eq!(offsets.get("SessionTime"), Some(0));
        assert_eq!(offsets.get("Speed"), Some(100));
        assert_eq!(offsets.get("Gear"), Some(104));
        assert_eq!(offsets.get("RPM"), None);
    }

    #[test]
    fn negative_value_offset_is_malformed() {
        let built = RegionBuilder::new().variable("Speed", VariableType::Float32, 0).build();
        let mut bytes = built.bytes;
        let entry = built.table_start + 4;
        bytes[entry..entry + 4].copy_from_slice(&(-8i32).to_le_bytes());
        let region = RegionView::new(bytes);

        let descriptors = vec![VariableDescriptor {
            name: "Speed".to_string(),
            var_type: VariableType::Float32,
            index: 0,
            description: String::new(),
            units: String::new(),
        }];
        let err = VariableOffsetTable::resolve(&region, &descriptors).unwrap_err();
        assert!(matches!(err, TelemetryError::MalformedRegion { .. }));
    }

    #[test]
    fn pointer_past_region_end_is_out_of_bounds() {
        let mut bytes = vec![0u8; 64];
        bytes[28..32].copy_from_slice(&4096i32.to_le_bytes());
        let region = RegionView::new(bytes);
        let descriptors = vec![VariableDescriptor {
            name: "RPM".to_string(),
            var_type: VariableType::Float32,
            index: 0,
            description: String::new(),
            units: String::new(),
        }];

        let err = VariableOffsetTable::resolve(&region, &descriptors).unwrap_err();
        assert!(matches!(err, TelemetryError::OutOfBounds { .. }));
    }
}
