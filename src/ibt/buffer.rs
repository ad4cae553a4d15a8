//! Owned capture bytes.
//!
//! A capture is loaded whole at open time: either read into a heap buffer or,
//! with the `mmap` feature, mapped read-only. Either way the bytes are
//! immutable until the capture is closed.

use std::fs::File;
use std::io::Read;
use std::ops::Deref;
use std::path::Path;

#[cfg(feature = "mmap")]
use memmap2::Mmap;

use crate::{CaptureError, Result};

/// Immutable bytes of one open capture.
#[derive(Debug)]
pub enum CaptureBuffer {
    Owned(Vec<u8>),
    #[cfg(feature = "mmap")]
    Mapped(Mmap),
}

impl CaptureBuffer {
    /// Read the whole file into memory.
    pub fn read(path: &Path) -> Result<Self> {
        let mut file = File::open(path).map_err(|e| CaptureError::file_error(path, e))?;
        let mut data = Vec::new();
        file.read_to_end(&mut data).map_err(|e| CaptureError::file_error(path, e))?;
        Ok(CaptureBuffer::Owned(data))
    }

    /// Map the file read-only.
    ///
    /// The mapping assumes the simulator is no longer writing the capture.
    #[cfg(feature = "mmap")]
    pub fn map(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| CaptureError::file_error(path, e))?;
        // SAFETY: the map is read-only and capture files are not modified once written.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| CaptureError::file_error(path, e))?;
        Ok(CaptureBuffer::Mapped(mmap))
    }

    pub fn is_mapped(&self) -> bool {
        !matches!(self, CaptureBuffer::Owned(_))
    }
}

impl Deref for CaptureBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            CaptureBuffer::Owned(data) => data.as_slice(),
            #[cfg(feature = "mmap")]
            CaptureBuffer::Mapped(mmap) => &mmap[..],
        }
    }
}

impl From<Vec<u8>> for CaptureBuffer {
    fn from(data: Vec<u8>) -> Self {
        CaptureBuffer::Owned(data)
    }
}
