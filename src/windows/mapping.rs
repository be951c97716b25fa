//! Read-only view of the producer's named file mapping.

use std::ptr::NonNull;
use tracing::{debug, trace};
use windows::Win32::Foundation::{CloseHandle, HANDLE};
use windows::Win32::System::Memory::{
    FILE_MAP_READ, MEMORY_MAPPED_VIEW_ADDRESS, MapViewOfFile, OpenFileMappingW, UnmapViewOfFile,
};
use windows::core::PCWSTR;

use crate::region::DEFAULT_REGION_SIZE;
use crate::{Result, TelemetryError};

/// Name of the producer's file mapping.
pub const TELEMETRY_MAPPING_NAME: &str = "Local\\IRSDKMemMapFileName";

/// A mapped view of the shared region.
///
/// The bytes are written concurrently by the producer. Readers see whatever
/// the producer has stored at the time of each read; nothing is locked.
pub struct MappedRegion {
    mapping: HANDLE,
    base: NonNull<u8>,
    len: usize,
}

impl MappedRegion {
    /// Open the default mapping at its default size.
    pub fn open_default() -> Result<Self> {
        Self::open(TELEMETRY_MAPPING_NAME, DEFAULT_REGION_SIZE)
    }

    /// Open mapping `name` and map its first `len` bytes.
    ///
    /// Fails with a retryable `WindowsApi` error when the producer has not
    /// created the mapping yet.
    pub fn open(name: &str, len: usize) -> Result<Self> {
        trace!(name, len, "Opening shared memory mapping");

        let mapping = unsafe {
            let wide_name = wide_string(name);
            OpenFileMappingW(FILE_MAP_READ.0, false, PCWSTR::from_raw(wide_name.as_ptr()))
                .map_err(|e| TelemetryError::windows_api_error("OpenFileMappingW", e))?
        };

        let view = unsafe { MapViewOfFile(mapping, FILE_MAP_READ, 0, 0, len) };
        let Some(base) = NonNull::new(view.Value as *mut u8) else {
            let win_err = windows::core::Error::from_thread();
            unsafe {
                let _ = CloseHandle(mapping);
            }
            return Err(TelemetryError::windows_api_error("MapViewOfFile", win_err));
        };

        debug!(name, len, "Mapped shared memory region");
        Ok(Self { mapping, base, len })
    }

    /// Size of the mapped view in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl AsRef<[u8]> for MappedRegion {
    fn as_ref(&self) -> &[u8] {
        // SAFETY: the view stays mapped for the lifetime of `self` and spans `len` bytes.
        unsafe { std::slice::from_raw_parts(self.base.as_ptr(), self.len) }
    }
}

impl std::fmt::Debug for MappedRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedRegion").field("base", &self.base).field("len", &self.len).finish()
    }
}

impl Drop for MappedRegion {
    fn drop(&mut self) {
        unsafe {
            let addr = MEMORY_MAPPED_VIEW_ADDRESS { Value: self.base.as_ptr() as *mut _ };
            let _ = UnmapViewOfFile(addr);
            let _ = CloseHandle(self.mapping);
        }
    }
}

// SAFETY: the struct holds a kernel handle and a pointer into a read-only view,
// both usable from any thread.
unsafe impl Send for MappedRegion {}
unsafe impl Sync for MappedRegion {}

fn wide_string(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Session;

    #[test]
    fn wide_string_is_nul_terminated() {
        let wide = wide_string("Local\\X");
        assert_eq!(wide.last(), Some(&0));
        assert_eq!(wide.len(), "Local\\X".len() + 1);
    }

    #[test]
    fn missing_mapping_is_retryable() {
        let err = MappedRegion::open("Local\\SimviewNoSuchMapping", 4096).unwrap_err();
        assert!(matches!(err, TelemetryError::WindowsApi { .. }));
        assert!(err.is_retryable());
    }

    #[test]
    #[ignore] // Requires the producer to be running
    fn live_mapping_opens_session() {
        let region = MappedRegion::open_default().unwrap();
        assert_eq!(region.len(), DEFAULT_REGION_SIZE);

        let session = Session::open(region).unwrap();
        assert!(!session.variable_names().unwrap().is_empty());
    }
}
