//! Read-only decoder for a simulator's shared-memory telemetry region.
//!
//! A running simulator publishes a fixed-size memory region containing a YAML
//! session document, a table of variable descriptors, and three replicas of a
//! live value buffer. SimView locates those structures inside the raw bytes
//! and exposes them as a keyed view: telemetry variables by name, session
//! metadata as a parsed YAML tree.
//!
//! # Features
//!
//! - **Two-phase sessions**: static layout resolved once, live bytes decoded per read
//! - **Liveness checks**: every read fails fast once the producer exits
//! - **Any byte source**: a live Windows mapping, a dump on disk, or a test buffer
//!
//! # Example (region dump)
//!
//! ```rust,no_run
//! use simview::{Sample, SimView};
//!
//! fn main() -> simview::Result<()> {
//!     let session = SimView::open_dump("capture.bin")?;
//!
//!     if let Sample::Value(speed) = session.read_variable("Speed")? {
//!         println!("Speed: {}", speed);
//!     }
//!
//!     let metadata = session.metadata()?;
//!     println!("Track: {:?}", metadata.get_path("WeekendInfo.TrackName"));
//!     Ok(())
//! }
//! ```

// Core types and error handling
pub mod config;
mod error;
pub mod region;
pub mod types;
mod yaml_utils;

#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;

// Region decoding
pub mod decoder;
pub mod layout;
pub mod metadata;
pub mod session;

// Platform-specific modules
#[cfg(windows)]
pub mod windows;

// Core exports
pub use config::{BufferPolicy, SessionOptions};
pub use error::*;
pub use types::*;

// Decoding exports
pub use decoder::ValueDecoder;
pub use layout::SessionLayout;
pub use metadata::MetadataDocument;
pub use region::{RegionView, read_dump};
pub use session::{Entry, Session};

// Windows memory exports
#[cfg(windows)]
pub use windows::MappedRegion;

/// Entry point for opening telemetry sessions.
///
/// # Examples
///
/// ## Live Telemetry (Windows)
/// ```rust,no_run
/// use simview::SimView;
///
/// fn main() -> simview::Result<()> {
///     let session = SimView::connect()?;
///     println!("{} variables", session.variable_names()?.len());
///     Ok(())
/// }
/// ```
///
/// ## Region Dump (Cross-platform)
/// ```rust,no_run
/// use simview::SimView;
///
/// fn main() -> simview::Result<()> {
///     let session = SimView::open_dump("capture.bin")?;
///     println!("{:?}", session.keys()?);
///     Ok(())
/// }
/// ```
pub struct SimView;

impl SimView {
    /// Open a session over the live shared-memory region.
    ///
    /// # Platform
    ///
    /// Only available on Windows, where the producer runs. On other platforms
    /// this returns an `UnsupportedPlatform` error.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Platform is not Windows
    /// - The producer has not created its mapping
    /// - The alive sentinel is absent
    /// - The region layout cannot be resolved
    #[cfg(windows)]
    pub fn connect() -> Result<Session<MappedRegion>> {
        Self::connect_with(SessionOptions::default())
    }

    /// Like [`SimView::connect`] with explicit options.
    #[cfg(windows)]
    pub fn connect_with(options: SessionOptions) -> Result<Session<MappedRegion>> {
        Session::open_with(MappedRegion::open_default()?, options)
    }

    /// Open a session over the live shared-memory region.
    ///
    /// Always fails off Windows.
    #[cfg(not(windows))]
    pub fn connect() -> Result<Session<Vec<u8>>> {
        Self::connect_with(SessionOptions::default())
    }

    /// Like [`SimView::connect`] with explicit options.
    #[cfg(not(windows))]
    pub fn connect_with(_options: SessionOptions) -> Result<Session<Vec<u8>>> {
        Err(TelemetryError::unsupported_platform("Live shared memory", "Windows"))
    }

    /// Open a session over a region dump on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the dump's sentinel is
    /// absent, or its layout cannot be resolved.
    pub fn open_dump<P: AsRef<std::path::Path>>(path: P) -> Result<Session<Vec<u8>>> {
        Self::open_dump_with(path, SessionOptions::default())
    }

    /// Like [`SimView::open_dump`] with explicit options.
    pub fn open_dump_with<P: AsRef<std::path::Path>>(
        path: P,
        options: SessionOptions,
    ) -> Result<Session<Vec<u8>>> {
        Session::open_with(read_dump(path)?, options)
    }
}
