//! # Session Metadata
//!
//! The textual block at the start of the region is a YAML document describing
//! the session (track, drivers, weather, ...). It is parsed as a generic tree;
//! no schema is imposed on its contents.
//!
//! ```rust
//! use simview::MetadataDocument;
//!
//! let doc = MetadataDocument::parse("Driver:\n  Name: Foo\n", true).unwrap();
//! assert_eq!(doc.get_path("Driver.Name").and_then(|v| v.as_str()), Some("Foo"));
//! ```

use serde_yaml_ng::{Mapping, Value as YamlValue};
use tracing::debug;

use crate::layout::MetadataBoundary;
use crate::region::RegionView;
use crate::yaml_utils::{extract_document, preprocess_metadata_yaml};
use crate::{Result, TelemetryError};

/// Parsed session metadata: a mapping from string keys to YAML values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataDocument {
    root: Mapping,
}

impl MetadataDocument {
    /// Parse YAML text into a document.
    ///
    /// An empty document yields an empty mapping. Any other top-level value
    /// that is not a mapping fails with [`TelemetryError::MalformedMetadata`].
    pub fn parse(text: &str, preprocess: bool) -> Result<Self> {
        let cleaned;
        let text = if preprocess {
            cleaned = preprocess_metadata_yaml(text);
            cleaned.as_str()
        } else {
            text
        };

        match serde_yaml_ng::from_str::<YamlValue>(text)? {
            YamlValue::Mapping(root) => {
                debug!(keys = root.len(), "Parsed metadata document");
                Ok(Self { root })
            }
            YamlValue::Null => Ok(Self::default()),
            other => Err(TelemetryError::malformed_metadata(format!(
                "Top level must be a mapping, found {}",
                yaml_kind(&other)
            ))),
        }
    }

    /// Parse the document body out of a region.
    pub fn from_region<S: AsRef<[u8]>>(
        region: &RegionView<S>,
        boundary: &MetadataBoundary,
        preprocess: bool,
    ) -> Result<Self> {
        let range = boundary.document_range();
        let body = region.read_bytes(range.start, range.len())?;
        Self::parse(&extract_document(body), preprocess)
    }

    /// Top-level value for `key`.
    pub fn get(&self, key: &str) -> Option<&YamlValue> {
        self.root.get(key)
    }

    /// Value at a dotted path such as `DriverInfo.Drivers.0.UserName`.
    ///
    /// Segments index mappings by key; numeric segments also index sequences.
    pub fn get_path(&self, path: &str) -> Option<&YamlValue> {
        let mut segments = path.split('.');
        let mut current = self.root.get(segments.next()?)?;

        for segment in segments {
            current = match current {
                YamlValue::Mapping(map) => map.get(segment)?,
                YamlValue::Sequence(seq) => seq.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }

        Some(current)
    }

    /// Top-level keys in document order.
    pub fn keys(&self) -> Vec<String> {
        self.root.keys().filter_map(|k| k.as_str().map(str::to_owned)).collect()
    }

    /// Whether the document has a top-level `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.root.contains_key(key)
    }

    /// The underlying mapping.
    pub fn as_mapping(&self) -> &Mapping {
        &self.root
    }

    /// Give back the underlying mapping.
    pub fn into_mapping(self) -> Mapping {
        self.root
    }
}

fn yaml_kind(value: &YamlValue) -> &'static str {
    match value {
        YamlValue::Null => "null",
        YamlValue::Bool(_) => "a boolean",
        YamlValue::Number(_) => "a number",
        YamlValue::String(_) => "a string",
        YamlValue::Sequence(_) => "a sequence",
        YamlValue::Mapping(_) => "a mapping",
        YamlValue::Tagged(_) => "a tagged value",
    }
}
