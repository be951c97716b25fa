//! Two-phase session over a shared region.
//!
//! [`Session::open`] resolves the static layout (metadata boundary,
//! descriptors, buffer replicas, value offsets) once. Every read afterwards
//! checks the alive sentinel and then decodes live bytes against that
//! immutable layout. When the producer restarts, offsets may move; call
//! [`Session::reload`] to resolve the layout again.

use serde_yaml_ng::Value as YamlValue;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::SessionOptions;
use crate::decoder::ValueDecoder;
use crate::layout::SessionLayout;
use crate::metadata::MetadataDocument;
use crate::region::RegionView;
use crate::{Result, Sample, TelemetryError, VariableDescriptor};

/// Result of a unified [`Session::get`] lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// A telemetry variable read from the live buffers.
    Variable(Sample),
    /// A top-level metadata value.
    Metadata(YamlValue),
}

/// Decoder session bound to one region and one resolved layout.
#[derive(Debug)]
pub struct Session<S> {
    region: RegionView<S>,
    layout: Arc<SessionLayout>,
    options: SessionOptions,
}

impl<S: AsRef<[u8]>> Session<S> {
    /// Open a session with default options.
    pub fn open(source: S) -> Result<Self> {
        Self::open_with(source, SessionOptions::default())
    }

    /// Open a session, resolving all static layout state up front.
    ///
    /// Fails with `Disconnected` when the alive sentinel is absent and with
    /// `MalformedRegion` when the layout cannot be resolved.
    pub fn open_with(source: S, options: SessionOptions) -> Result<Self> {
        let region = RegionView::new(source);

        if let Some(expected) = options.expected_size {
            if region.len() != expected {
                return Err(TelemetryError::malformed_region(
                    "Session open",
                    format!("Region is {} bytes, expected {}", region.len(), expected),
                ));
            }
        }

        if !region.is_live() {
            warn!("Alive sentinel absent, producer not running");
            return Err(TelemetryError::Disconnected);
        }

        let layout = Arc::new(SessionLayout::resolve(&region)?);
        info!(
            region_len = region.len(),
            num_vars = layout.descriptors().len(),
            policy = ?options.buffer_policy,
            "Opened telemetry session"
        );

        Ok(Self { region, layout, options })
    }

    /// Discard the resolved layout and resolve it again.
    ///
    /// On failure the previous layout is kept.
    pub fn reload(&mut self) -> Result<()> {
        self.ensure_live()?;
        let layout = SessionLayout::resolve(&self.region)?;
        info!(num_vars = layout.descriptors().len(), "Reloaded session layout");
        self.layout = Arc::new(layout);
        Ok(())
    }

    /// Whether the producer's alive sentinel is present.
    pub fn is_connected(&self) -> bool {
        self.region.is_live()
    }

    fn ensure_live(&self) -> Result<()> {
        if self.region.is_live() {
            Ok(())
        } else {
            debug!("Read rejected, producer disconnected");
            Err(TelemetryError::Disconnected)
        }
    }

    /// Variable names in descriptor table order.
    pub fn variable_names(&self) -> Result<Vec<String>> {
        self.ensure_live()?;
        Ok(self.layout.descriptors().iter().map(|d| d.name.clone()).collect())
    }

    /// All descriptors in table order.
    ///
    /// Reads the resolved layout only, so it does not check the sentinel.
    pub fn descriptors(&self) -> &[VariableDescriptor] {
        self.layout.descriptors()
    }

    /// Descriptor for `name`.
    pub fn descriptor(&self, name: &str) -> Option<&VariableDescriptor> {
        self.layout.descriptor(name)
    }

    /// Read one variable from the live buffer replicas.
    ///
    /// Returns [`Sample::Unknown`] when every replica is zero-filled for this
    /// variable. See [`ValueDecoder`] for the limits of that heuristic.
    pub fn read_variable(&self, name: &str) -> Result<Sample> {
        self.ensure_live()?;
        ValueDecoder::new(&self.layout, self.options.buffer_policy).decode(&self.region, name)
    }

    /// Read every variable once.
    pub fn snapshot(&self) -> Result<BTreeMap<String, Sample>> {
        self.ensure_live()?;
        let decoder = ValueDecoder::new(&self.layout, self.options.buffer_policy);
        let mut samples = BTreeMap::new();
        for descriptor in self.layout.descriptors() {
            let sample = decoder.decode(&self.region, &descriptor.name)?;
            samples.insert(descriptor.name.clone(), sample);
        }
        Ok(samples)
    }

    /// Parse the metadata document. Not cached.
    pub fn metadata(&self) -> Result<MetadataDocument> {
        self.ensure_live()?;
        MetadataDocument::from_region(
            &self.region,
            &self.layout.boundary(),
            self.options.preprocess_metadata,
        )
    }

    /// Look up `key` as a variable first, then as a top-level metadata key.
    ///
    /// A key found in neither fails with `UnknownVariable`.
    pub fn get(&self, key: &str) -> Result<Entry> {
        if self.layout.offsets().contains(key) {
            return self.read_variable(key).map(Entry::Variable);
        }

        self.metadata()?
            .get(key)
            .cloned()
            .map(Entry::Metadata)
            .ok_or_else(|| TelemetryError::unknown_variable(key))
    }

    /// Sorted union of top-level metadata keys and variable names.
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut keys = self.metadata()?.keys();
        keys.extend(self.variable_names()?);
        keys.sort();
        keys.dedup();
        Ok(keys)
    }

    /// The resolved static layout.
    pub fn layout(&self) -> &Arc<SessionLayout> {
        &self.layout
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// The underlying region view.
    pub fn region(&self) -> &RegionView<S> {
        &self.region
    }

    /// Close the session and give back the region source.
    pub fn into_inner(self) -> S {
        self.region.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BufferPolicy;
    use crate::test_utils::RegionBuilder;
    use crate::{Value, VariableType};
    use std::collections::HashSet;

    fn speed_region() -> RegionBuilder {
        RegionBuilder::new()
            .metadata("Driver:\n  Name: Foo\nWeekendInfo:\n  TrackID: 163\n")
            .variable("SessionTime", VariableType::Float64, 0)
            .variable("Speed", VariableType::Float32, 100)
            .variable("Gear", VariableType::Int32, 104)
            .variable("OnPitRoad", VariableType::Bool, 108)
            .value(0, "SessionTime", Value::Float64(1234.5))
            .value(1, "Speed", Value::Float32(44.5))
            .value(2, "Gear", Value::Int32(-1))
    }

    #[test]
    fn speed_scenario_reads_middle_replica() {
        let session = Session::open(speed_region().build().bytes).unwrap();
        assert!(session.is_connected());
        assert_eq!(session.read_variable("Speed").unwrap(), Sample::Value(Value::Float32(44.5)));
        assert_eq!(session.read_variable("Gear").unwrap(), Sample::Value(Value::Int32(-1)));
        assert_eq!(session.read_variable("OnPitRoad").unwrap(), Sample::Unknown);
    }

    #[test]
    fn dead_sentinel_refuses_to_open() {
        let bytes = speed_region().alive(false).build().bytes;
        let err = Session::open(bytes).unwrap_err();
        assert!(matches!(err, TelemetryError::Disconnected));
    }

    #[test]
    fn producer_exit_disconnects_reads() {
        let mut session = Session::open(speed_region().build().bytes).unwrap();
        let mut bytes = session.region.as_bytes().to_vec();
        bytes[0] = 0;
        session.region = RegionView::new(bytes);

        assert!(!session.is_connected());
        assert!(matches!(session.read_variable("Speed"), Err(TelemetryError::Disconnected)));
        assert!(matches!(session.metadata(), Err(TelemetryError::Disconnected)));
        assert!(matches!(session.snapshot(), Err(TelemetryError::Disconnected)));
        assert!(matches!(session.variable_names(), Err(TelemetryError::Disconnected)));
        assert!(matches!(session.reload(), Err(TelemetryError::Disconnected)));
    }

    #[test]
    fn variable_names_are_unique_and_complete() {
        let session = Session::open(speed_region().build().bytes).unwrap();
        let names = session.variable_names().unwrap();
        let unique: HashSet<_> = names.iter().collect();

        assert_eq!(names.len(), session.descriptors().len());
        assert_eq!(unique.len(), names.len());
        assert_eq!(names, ["SessionTime", "Speed", "Gear", "OnPitRoad"]);
    }

    #[test]
    fn metadata_parses_document_body() {
        let session = Session::open(speed_region().build().bytes).unwrap();
        let doc = session.metadata().unwrap();
        assert_eq!(doc.get_path("Driver.Name").and_then(YamlValue::as_str), Some("Foo"));
        assert_eq!(doc.keys(), ["Driver", "WeekendInfo"]);
    }

    #[test]
    fn get_prefers_variables_then_metadata() {
        let session = Session::open(speed_region().build().bytes).unwrap();

        assert_eq!(
            session.get("Speed").unwrap(),
            Entry::Variable(Sample::Value(Value::Float32(44.5)))
        );
        match session.get("Driver").unwrap() {
            Entry::Metadata(value) => {
                assert_eq!(value.get("Name").and_then(YamlValue::as_str), Some("Foo"));
            }
            other => panic!("expected metadata entry, got {:?}", other),
        }
        assert!(matches!(session.get("Nope"), Err(TelemetryError::UnknownVariable { .. })));
    }

    #[test]
    fn keys_merge_metadata_and_variables_sorted() {
        let session = Session::open(speed_region().build().bytes).unwrap();
        assert_eq!(
            session.keys().unwrap(),
            ["Driver", "Gear", "OnPitRoad", "SessionTime", "Speed", "WeekendInfo"]
        );
    }

    #[test]
    fn snapshot_reads_every_variable() {
        let session = Session::open(speed_region().build().bytes).unwrap();
        let snapshot = session.snapshot().unwrap();

        assert_eq!(snapshot.len(), 4);
        assert_eq!(snapshot["SessionTime"], Sample::Value(Value::Float64(1234.5)));
        assert_eq!(snapshot["OnPitRoad"], Sample::Unknown);
    }

    #[test]
    fn reload_picks_up_moved_offsets() {
        let mut session = Session::open(speed_region().build().bytes).unwrap();
        assert_eq!(session.layout().offsets().get("Speed"), Some(100));

        let restarted = RegionBuilder::new()
            .variable("Speed", VariableType::Float32, 200)
            .value(0, "Speed", Value::Float32(12.0))
            .build();
        session.region = RegionView::new(restarted.bytes);
        session.reload().unwrap();

        assert_eq!(session.layout().offsets().get("Speed"), Some(200));
        assert_eq!(session.variable_names().unwrap(), ["Speed"]);
        assert_eq!(session.read_variable("Speed").unwrap(), Sample::Value(Value::Float32(12.0)));
    }

    #[test]
    fn failed_reload_keeps_previous_layout() {
        let mut session = Session::open(speed_region().build().bytes).unwrap();
        let mut broken = vec![0u8; 256];
        broken[0] = crate::region::ALIVE_MARKER;
        session.region = RegionView::new(broken);

        assert!(matches!(session.reload(), Err(TelemetryError::MalformedRegion { .. })));
        assert_eq!(session.descriptors().len(), 4);
    }

    #[test]
    fn padded_terminator_lines_keep_the_variable_table() {
        for terminator in ["...\n", "...\r\n", "  ...  \n"] {
            let built = speed_region().terminator(terminator).build();
            let session = Session::open(built.bytes).unwrap();

            assert_eq!(session.variable_names().unwrap().len(), 4);
            assert_eq!(
                session.read_variable("Speed").unwrap(),
                Sample::Value(Value::Float32(44.5))
            );
            assert_eq!(session.layout().table_start(), built.table_start);
        }
    }

    #[test]
    fn expected_size_is_enforced() {
        let built = speed_region().build();
        let len = built.bytes.len();

        let options = SessionOptions::default().with_expected_size(len + 1);
        let err = Session::open_with(built.bytes.clone(), options).unwrap_err();
        assert!(matches!(err, TelemetryError::MalformedRegion { .. }));

        let options = SessionOptions::default().with_expected_size(len);
        assert!(Session::open_with(built.bytes, options).is_ok());
    }

    #[test]
    fn latest_tick_policy_is_honoured() {
        let built = RegionBuilder::new()
            .variable("RPM", VariableType::Float32, 0)
            .value(0, "RPM", Value::Float32(4000.0))
            .value(1, "RPM", Value::Float32(5000.0))
            .ticks([41, 42, 40])
            .build();

        let first = Session::open(built.bytes.clone()).unwrap();
        assert_eq!(first.read_variable("RPM").unwrap(), Sample::Value(Value::Float32(4000.0)));

        let options = SessionOptions::default().with_buffer_policy(BufferPolicy::LatestTick);
        let latest = Session::open_with(built.bytes, options).unwrap();
        assert_eq!(latest.read_variable("RPM").unwrap(), Sample::Value(Value::Float32(5000.0)));
    }

    #[test]
    fn session_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Session<Vec<u8>>>();
    }
}
