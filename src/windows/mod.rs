//! Shared memory access on Windows
//!
//! The producer publishes its region as a named file mapping. This module
//! opens that mapping read-only and exposes it as a byte slice so it can back
//! a [`RegionView`](crate::RegionView) like any other source.
//!
//! # Usage
//!
//! ```rust,ignore
//! use simview::Session;
//! use simview::windows::MappedRegion;
//!
//! let session = Session::open(MappedRegion::open_default()?)?;
//! println!("{:?}", session.read_variable("Speed")?);
//! ```

mod mapping;

pub use mapping::{MappedRegion, TELEMETRY_MAPPING_NAME};
