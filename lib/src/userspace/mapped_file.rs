// SPDX-License-Identifier: GPL-2.0 OR MIT

use core::fmt;
use std::error;

use std::fs;
use std::io;
use std::path::Path;

use memmap2::Mmap;
use tracing::debug;

/** Read only view of the whole content of a file.
 *
 * Empty files are not mapped, and view as an empty slice.
 */
#[derive(Debug)]
pub struct MappedFile {
    /// Mapped file, kept open for the lifetime of the mapping.
    _file: fs::File,

    /// Mapping, [`None`] for an empty file.
    mmap: Option<Mmap>,
}

impl MappedFile {
    /** Open and map the path.
     *
     * The file must not be truncated by another process while the mapping is
     * alive.
     *
     * # Errors
     *
     * Returns [`MappedFileOpenError`] in case of error.
     */
    pub fn open(path: &Path) -> Result<MappedFile, MappedFileOpenError> {
        ////////////////////////////////////
        // Open file.
        let file = match fs::OpenOptions::new().read(true).open(path) {
            Ok(v) => v,
            Err(e) => return Err(MappedFileOpenError::OpenError { err: e }),
        };

        ////////////////////////////////////
        // Get file size.
        let metadata = match file.metadata() {
            Ok(v) => v,
            Err(e) => return Err(MappedFileOpenError::MetadataError { err: e }),
        };

        let size = metadata.len();
        if usize::try_from(size).is_err() {
            return Err(MappedFileOpenError::TooLarge { size });
        }

        ////////////////////////////////////
        // Map file.
        let mmap = match size {
            0 => None,
            // SAFETY: Read only mapping of a file this process does not modify.
            _ => match unsafe { Mmap::map(&file) } {
                Ok(v) => Some(v),
                Err(e) => return Err(MappedFileOpenError::MappingError { err: e }),
            },
        };

        debug!(path = %path.display(), size, "mapped");

        ////////////////////////////////////
        // Success.
        Ok(MappedFile { _file: file, mmap })
    }

    /// Content of the file.
    pub fn as_bytes(&self) -> &[u8] {
        match &self.mmap {
            Some(mmap) => &mmap[..],
            None => &[],
        }
    }

    /// Size of the mapping in bytes.
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Is the file empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// [`MappedFile`] open error.
#[derive(Debug)]
pub enum MappedFileOpenError {
    /// File open error.
    OpenError {
        /// Error.
        err: io::Error,
    },

    /// File metadata query error.
    MetadataError {
        /// Error.
        err: io::Error,
    },

    /// File does not fit in the address space.
    TooLarge {
        /// Size.
        size: u64,
    },

    /// Memory mapping error.
    MappingError {
        /// Error.
        err: io::Error,
    },
}

impl fmt::Display for MappedFileOpenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappedFileOpenError::OpenError { err } => {
                write!(f, "Mapped File open error: [{err}]")
            }
            MappedFileOpenError::MetadataError { err } => {
                write!(f, "Mapped File metadata error: [{err}]")
            }
            MappedFileOpenError::TooLarge { size } => {
                write!(f, "Mapped File too large size:0x{size:016x}")
            }
            MappedFileOpenError::MappingError { err } => {
                write!(f, "Mapped File mapping error: [{err}]")
            }
        }
    }
}

impl error::Error for MappedFileOpenError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            MappedFileOpenError::OpenError { err } => Some(err),
            MappedFileOpenError::MetadataError { err } => Some(err),
            MappedFileOpenError::MappingError { err } => Some(err),
            _ => None,
        }
    }
}
