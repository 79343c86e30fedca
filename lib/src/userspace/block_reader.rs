// SPDX-License-Identifier: GPL-2.0 OR MIT

use core::fmt;
use std::error;

use std::fs;
use std::io;
use std::os::unix::fs::FileExt;
use std::path::Path;

use tracing::debug;

/// Sequential block reads from a file.
#[derive(Debug)]
pub struct BlockReader {
    /// File.
    file: fs::File,

    /// Size of file in bytes, when opened.
    size: u64,

    /// Offset of the next read.
    offset: u64,
}

impl BlockReader {
    /** Open the path for sequential reads.
     *
     * # Errors
     *
     * Returns [`BlockReaderOpenError`] in case of error.
     */
    pub fn open(path: &Path) -> Result<BlockReader, BlockReaderOpenError> {
        ////////////////////////////////////
        // Open file.
        let file = match fs::OpenOptions::new().read(true).open(path) {
            Ok(v) => v,
            Err(e) => return Err(BlockReaderOpenError::OpenError { err: e }),
        };

        ////////////////////////////////////
        // Get file size.
        let metadata = match file.metadata() {
            Ok(v) => v,
            Err(e) => return Err(BlockReaderOpenError::MetadataError { err: e }),
        };

        let size = metadata.len();
        debug!(path = %path.display(), size, "opened for block reads");

        ////////////////////////////////////
        // Success.
        Ok(BlockReader {
            file,
            size,
            offset: 0,
        })
    }

    /// Size of file in bytes, when opened.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Offset of the next read, which is the number of bytes read so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /** Read the next block into `data`.
     *
     * Short reads are retried, so `data` is filled completely unless end of
     * file is reached. Returns the number of bytes read, zero at end of file.
     *
     * # Errors
     *
     * Returns [`BlockReaderReadError`] in case of error.
     */
    pub fn read(&mut self, data: &mut [u8]) -> Result<usize, BlockReaderReadError> {
        let size = data.len();
        let mut done = 0;

        ////////////////////////////////
        // Read bytes, while handling short reads.
        while done < size {
            let read = match self.file.read_at(&mut data[done..], self.offset) {
                Ok(0) => break,
                Ok(v) => v,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(BlockReaderReadError::IoError {
                        err: e,
                        offset: self.offset,
                        size,
                    })
                }
            };

            done += read;
            self.offset += read as u64;
        }

        ////////////////////////////////
        // Success.
        Ok(done)
    }
}

/// [`BlockReader`] open error.
#[derive(Debug)]
pub enum BlockReaderOpenError {
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
}

impl fmt::Display for BlockReaderOpenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockReaderOpenError::OpenError { err } => {
                write!(f, "Block Reader open error: [{err}]")
            }
            BlockReaderOpenError::MetadataError { err } => {
                write!(f, "Block Reader metadata error: [{err}]")
            }
        }
    }
}

impl error::Error for BlockReaderOpenError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            BlockReaderOpenError::OpenError { err } => Some(err),
            BlockReaderOpenError::MetadataError { err } => Some(err),
        }
    }
}

/// [`BlockReader`] read error.
#[derive(Debug)]
pub enum BlockReaderReadError {
    /// I/O error.
    IoError {
        /// Error.
        err: io::Error,
        /// Offset in bytes.
        offset: u64,
        /// Size in bytes.
        size: usize,
    },
}

impl fmt::Display for BlockReaderReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockReaderReadError::IoError { err, offset, size } => {
                write!(
                    f,
                    "Block Reader read IO error at offset:0x{offset:016x} size:0x{size:016x}: [{err}]"
                )
            }
        }
    }
}

impl error::Error for BlockReaderReadError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            BlockReaderReadError::IoError {
                err,
                offset: _,
                size: _,
            } => Some(err),
        }
    }
}
