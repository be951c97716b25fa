//! Test utilities for synthesizing shared regions
//!
//! [`RegionBuilder`] lays out a region the way the producer does: a header
//! line carrying the alive sentinel and binary header fields, the YAML
//! document with its `...` terminator, the descriptor table, and three buffer
//! replicas. Tests and benchmarks use it instead of captured dumps.

use crate::layout::{
    BUFFER_COUNT, BUFFER_SLOT_OFFSET, BUFFER_SLOT_STRIDE, DESC_FIELD_LEN, DESC_FIELD_OFFSET,
    NAME_FIELD_LEN, NAME_FIELD_OFFSET, UNIT_FIELD_LEN, UNIT_FIELD_OFFSET, VAR_HEADER_SIZE,
    VAR_TABLE_POINTER_OFFSET,
};
use crate::region::ALIVE_MARKER;
use crate::{Value, VariableType};

/// Length of the synthetic header line, newline included.
pub const HEADER_LINE_LEN: usize = 112;

/// Default synthetic region size.
pub const DEFAULT_BUILDER_SIZE: usize = 0x8000;

/// Default replica bases, one 4 KiB block each.
pub const DEFAULT_BUFFER_BASES: [usize; BUFFER_COUNT] = [0x4000, 0x5000, 0x6000];

#[derive(Debug, Clone)]
struct DeclaredVar {
    name: String,
    type_code: i32,
    offset: usize,
    units: String,
    description: String,
}

/// Builder for well-formed synthetic regions.
#[derive(Debug, Clone)]
pub struct RegionBuilder {
    size: usize,
    alive: bool,
    metadata: String,
    variables: Vec<DeclaredVar>,
    values: Vec<(usize, String, Value)>,
    buffer_bases: [usize; BUFFER_COUNT],
    ticks: [i32; BUFFER_COUNT],
    table_gap: usize,
    terminator: String,
}

/// A built region plus the offsets the builder chose.
#[derive(Debug, Clone)]
pub struct BuiltRegion {
    pub bytes: Vec<u8>,
    pub boundary: usize,
    pub table_start: usize,
    pub buffer_bases: [usize; BUFFER_COUNT],
}

impl Default for RegionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegionBuilder {
    pub fn new() -> Self {
        Self {
            size: DEFAULT_BUILDER_SIZE,
            alive: true,
            metadata: String::new(),
            variables: Vec::new(),
            values: Vec::new(),
            buffer_bases: DEFAULT_BUFFER_BASES,
            ticks: [0; BUFFER_COUNT],
            table_gap: 12,
            terminator: "...\n".to_string(),
        }
    }

    pub fn size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    pub fn alive(mut self, alive: bool) -> Self {
        self.alive = alive;
        self
    }

    /// Document body, without the `...` terminator.
    pub fn metadata(mut self, yaml: &str) -> Self {
        self.metadata = yaml.to_string();
        if !self.metadata.is_empty() && !self.metadata.ends_with('\n') {
            self.metadata.push('\n');
        }
        self
    }

    pub fn variable(self, name: impl Into<String>, var_type: VariableType, offset: usize) -> Self {
        self.raw_variable(name, var_type.code(), offset)
    }

    /// Declare a variable with an arbitrary type code.
    pub fn raw_variable(mut self, name: impl Into<String>, type_code: i32, offset: usize) -> Self {
        self.variables.push(DeclaredVar {
            name: name.into(),
            type_code,
            offset,
            units: String::new(),
            description: String::new(),
        });
        self
    }

    /// Set units and description of the most recently declared variable.
    pub fn described(mut self, units: &str, description: &str) -> Self {
        if let Some(last) = self.variables.last_mut() {
            last.units = units.to_string();
            last.description = description.to_string();
        }
        self
    }

    /// Write `value` into replica `replica` at the variable's offset.
    pub fn value(mut self, replica: usize, name: &str, value: Value) -> Self {
        self.values.push((replica, name.to_string(), value));
        self
    }

    pub fn ticks(mut self, ticks: [i32; BUFFER_COUNT]) -> Self {
        self.ticks = ticks;
        self
    }

    pub fn buffer_bases(mut self, bases: [usize; BUFFER_COUNT]) -> Self {
        self.buffer_bases = bases;
        self
    }

    /// Zero bytes between the boundary and the first record.
    pub fn table_gap(mut self, gap: usize) -> Self {
        self.table_gap = gap;
        self
    }

    /// Line that ends the document, newline included.
    pub fn terminator(mut self, line: &str) -> Self {
        self.terminator = line.to_string();
        self
    }

    pub fn build(&self) -> BuiltRegion {
        let mut bytes = vec![0u8; self.size];
        bytes[0] = if self.alive { ALIVE_MARKER } else { 0 };
        bytes[HEADER_LINE_LEN - 1] = b'\n';

        let mut document = self.metadata.clone().into_bytes();
        document.extend_from_slice(self.terminator.as_bytes());
        bytes[HEADER_LINE_LEN..HEADER_LINE_LEN + document.len()].copy_from_slice(&document);
        let boundary = HEADER_LINE_LEN + document.len();

        // Header fields share the header line; keep newline bytes out of them.
        let mut table_start = boundary + self.table_gap;
        while (table_start as i32).to_le_bytes().contains(&b'\n') {
            table_start += 1;
        }

        write_i32(&mut bytes, VAR_TABLE_POINTER_OFFSET, table_start as i32);
        for i in 0..BUFFER_COUNT {
            let slot = BUFFER_SLOT_OFFSET + i * BUFFER_SLOT_STRIDE;
            write_i32(&mut bytes, slot, self.ticks[i]);
            write_i32(&mut bytes, slot + 4, self.buffer_bases[i] as i32);
        }
        assert!(
            !bytes[..HEADER_LINE_LEN - 1].contains(&b'\n'),
            "header fields must not contain a newline byte"
        );

        let table_end = table_start + (self.variables.len() + 1) * VAR_HEADER_SIZE;
        assert!(
            table_end <= self.buffer_bases.iter().copied().min().unwrap_or(self.size),
            "descriptor table overlaps buffer replicas"
        );

        for (i, var) in self.variables.iter().enumerate() {
            let at = table_start + i * VAR_HEADER_SIZE;
            write_record(&mut bytes, at, var.type_code, var.offset, &var.name);
            write_str(&mut bytes, at + DESC_FIELD_OFFSET, DESC_FIELD_LEN, &var.description);
            write_str(&mut bytes, at + UNIT_FIELD_OFFSET, UNIT_FIELD_LEN, &var.units);
        }

        for (replica, name, value) in &self.values {
            let var = self
                .variables
                .iter()
                .find(|v| &v.name == name)
                .unwrap_or_else(|| panic!("value for undeclared variable '{}'", name));
            let at = self.buffer_bases[*replica] + var.offset;
            let encoded = value.to_le_bytes();
            bytes[at..at + encoded.len()].copy_from_slice(&encoded);
        }

        BuiltRegion { bytes, boundary, table_start, buffer_bases: self.buffer_bases }
    }
}

/// Write one descriptor record: type code, value offset, count of 1, name.
pub fn write_record(bytes: &mut [u8], at: usize, type_code: i32, offset: usize, name: &str) {
    write_i32(bytes, at, type_code);
    write_i32(bytes, at + 4, offset as i32);
    write_i32(bytes, at + 8, 1);
    write_str(bytes, at + NAME_FIELD_OFFSET, NAME_FIELD_LEN, name);
}

fn write_i32(bytes: &mut [u8], at: usize, value: i32) {
    bytes[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

fn write_str(bytes: &mut [u8], at: usize, field_len: usize, value: &str) {
    let len = value.len().min(field_len);
    bytes[at..at + len].copy_from_slice(&value.as_bytes()[..len]);
}
