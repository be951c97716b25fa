//! Error types for shared memory decoding.
//!
//! Every fallible operation in the crate returns [`TelemetryError`]. The
//! variants map onto the failure classes of a read-only region decoder:
//!
//! - **Disconnected**: the alive sentinel is absent, the producer is not running
//! - **MalformedRegion**: the binary layout violates a structural invariant
//! - **UnknownVariable**: a name is not present in the variable offset table
//! - **MalformedMetadata**: the textual session document failed to parse
//! - **OutOfBounds**: a read would run past the end of the region
//!
//! A transient "no valid sample" state is *not* an error; it is reported as
//! [`Sample::Unknown`](crate::Sample::Unknown).
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use simview::TelemetryError;
//!
//! let error = TelemetryError::Disconnected;
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

#[cfg(windows)]
use windows_core as core;

/// Result type alias for decoder operations.
pub type Result<T, E = TelemetryError> = std::result::Result<T, E>;

/// Main error type for decoder operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TelemetryError {
    #[error("Producer is not running: alive sentinel absent")]
    Disconnected,

    #[error("Malformed region in {context}: {details}")]
    MalformedRegion { context: String, details: String },

    #[error("Variable '{name}' not found in telemetry data")]
    UnknownVariable { name: String },

    #[error("Malformed metadata document: {details}")]
    MalformedMetadata {
        details: String,
        #[source]
        source: Option<serde_yaml_ng::Error>,
    },

    #[error("Read of {length} bytes at offset {offset:#x} exceeds region of {region_len} bytes")]
    OutOfBounds { offset: usize, length: usize, region_len: usize },

    #[error("Type conversion error: {details}")]
    TypeConversion { details: String },

    #[error("Region dump error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{feature} is only available on {required_platform}")]
    UnsupportedPlatform { feature: String, required_platform: String },

    #[error("Windows API error: {operation}")]
    #[cfg(windows)]
    WindowsApi {
        operation: String,
        #[source]
        source: core::Error,
    },
}

impl TelemetryError {
    /// Returns whether this error is potentially recoverable through retry.
    ///
    /// A disconnected producer may come back; a malformed region will not
    /// become well-formed without a new session.
    pub fn is_retryable(&self) -> bool {
        match self {
            TelemetryError::Disconnected => true,
            TelemetryError::File { .. } => true,
            TelemetryError::MalformedRegion { .. } => false,
            TelemetryError::UnknownVariable { .. } => false,
            TelemetryError::MalformedMetadata { .. } => false,
            TelemetryError::OutOfBounds { .. } => false,
            TelemetryError::TypeConversion { .. } => false,
            TelemetryError::UnsupportedPlatform { .. } => false,
            #[cfg(windows)]
            TelemetryError::WindowsApi { .. } => true,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            TelemetryError::Disconnected => vec![
                "Ensure the simulator is running",
                "Wait for the producer to publish the alive marker",
                "Reopen the session once the producer is back",
            ],
            TelemetryError::MalformedRegion { .. } => vec![
                "Verify the producer version matches the expected layout",
                "Reopen the session in case the producer restarted mid-read",
                "Capture a region dump for offline inspection",
            ],
            TelemetryError::UnknownVariable { .. } => vec![
                "Check variable name spelling",
                "List available names with variable_names()",
            ],
            TelemetryError::MalformedMetadata { .. } => vec![
                "Enable metadata preprocessing",
                "Check the session document for invalid YAML",
            ],
            TelemetryError::OutOfBounds { .. } => vec![
                "Check the region size matches the producer's mapping",
                "Reload the session layout after a producer restart",
            ],
            TelemetryError::TypeConversion { .. } => vec![
                "Check data type compatibility",
                "Verify expected vs actual data types",
            ],
            TelemetryError::File { .. } => vec![
                "Check the dump file exists and is readable",
                "Check file permissions",
            ],
            TelemetryError::UnsupportedPlatform { .. } => vec![
                "Decode a region dump with SimView::open_dump instead",
                "Check documentation for platform requirements",
            ],
            #[cfg(windows)]
            TelemetryError::WindowsApi { .. } => vec![
                "Ensure the simulator is running",
                "Check Windows permissions for shared memory access",
            ],
        }
    }

    /// Helper constructor for layout violations.
    pub fn malformed_region(context: impl Into<String>, details: impl Into<String>) -> Self {
        TelemetryError::MalformedRegion { context: context.into(), details: details.into() }
    }

    /// Helper constructor for metadata parse failures without an underlying YAML error.
    pub fn malformed_metadata(details: impl Into<String>) -> Self {
        TelemetryError::MalformedMetadata { details: details.into(), source: None }
    }

    /// Helper constructor for unknown variable lookups.
    pub fn unknown_variable(name: impl Into<String>) -> Self {
        TelemetryError::UnknownVariable { name: name.into() }
    }

    /// Helper constructor for out-of-bounds reads.
    pub fn out_of_bounds(offset: usize, length: usize, region_len: usize) -> Self {
        TelemetryError::OutOfBounds { offset, length, region_len }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        TelemetryError::File { path, source }
    }

    /// Helper constructor for Windows API errors.
    #[cfg(windows)]
    pub fn windows_api_error(operation: impl Into<String>, source: core::Error) -> Self {
        TelemetryError::WindowsApi { operation: operation.into(), source }
    }

    /// Helper constructor for unsupported platform errors.
    pub fn unsupported_platform(
        feature: impl Into<String>,
        required_platform: impl Into<String>,
    ) -> Self {
        TelemetryError::UnsupportedPlatform {
            feature: feature.into(),
            required_platform: required_platform.into(),
        }
    }
}

impl From<serde_yaml_ng::Error> for TelemetryError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        TelemetryError::MalformedMetadata { details: err.to_string(), source: Some(err) }
    }
}

#[cfg(windows)]
impl From<core::Error> for TelemetryError {
    fn from(err: core::Error) -> Self {
        TelemetryError::WindowsApi {
            operation: "Unknown Windows operation".to_string(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn error_messages_carry_their_context(
            context in "[a-zA-Z ]{1,20}",
            details in ".*",
            name in "\\w+",
            offset in 0usize..0x10000usize,
            length in 1usize..16usize,
        ) {
            let malformed = TelemetryError::malformed_region(context.clone(), details.clone());
            let unknown = TelemetryError::unknown_variable(name.clone());
            let bounds = TelemetryError::out_of_bounds(offset, length, 64);

            let msg = malformed.to_string();
            prop_assert!(msg.contains(&context));
            prop_assert!(msg.contains(&details));
            prop_assert!(unknown.to_string().contains(&name));
            let offset_hex = format!("{:#x}", offset);
            prop_assert!(bounds.to_string().contains(&offset_hex));
        }
    }

    #[test]
    fn error_traits_validation() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<TelemetryError>();

        let error = TelemetryError::Disconnected;
        let _: &dyn std::error::Error = &error;
    }

    #[test]
    fn retry_classification() {
        assert!(TelemetryError::Disconnected.is_retryable());
        assert!(!TelemetryError::malformed_region("header", "bad").is_retryable());
        assert!(!TelemetryError::unknown_variable("Speed").is_retryable());
        assert!(!TelemetryError::malformed_metadata("bad yaml").is_retryable());

        for error in [
            TelemetryError::Disconnected,
            TelemetryError::malformed_region("header", "bad"),
            TelemetryError::out_of_bounds(0, 4, 2),
        ] {
            let suggestions = error.recovery_suggestions();
            assert!(!suggestions.is_empty());
            assert!(suggestions.iter().all(|s| s.len() > 5));
        }
    }

    #[test]
    fn yaml_errors_keep_their_source() {
        let yaml_err = serde_yaml_ng::from_str::<serde_yaml_ng::Value>("a: [1, 2")
            .expect_err("unterminated flow sequence must fail");
        let error: TelemetryError = yaml_err.into();
        assert!(matches!(error, TelemetryError::MalformedMetadata { source: Some(_), .. }));
        assert!(std::error::Error::source(&error).is_some());
    }
}
