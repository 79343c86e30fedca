// SPDX-License-Identifier: GPL-2.0 OR MIT

use core::fmt;
use std::collections::TryReserveError;
use std::error;

use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};

use fletch::checksum::{fletcher128, fletcher64, ChecksumError, StripeSet};
use fletch::userspace::{
    BlockReader, BlockReaderOpenError, BlockReaderReadError, MappedFile, MappedFileOpenError,
};
use tracing::debug;

use crate::args::{Cli, Mode};
use crate::report::{write_header, Checksums, FileReport};

/// Exit code for usage errors.
const EXIT_USAGE: u8 = 2;

/// Exit code for file errors.
const EXIT_FAILURE: u8 = 1;

/// [`run`] error.
#[derive(Debug)]
pub enum RunError {
    /// Invalid stripe geometry.
    Usage {
        /// Error.
        err: ChecksumError,
    },

    /// Block buffer could not be allocated.
    Allocation {
        /// Size in bytes.
        size: usize,
        /// Error.
        err: TryReserveError,
    },

    /// File could not be opened or queried.
    FileOpen {
        /// Path.
        path: PathBuf,
        /// Error.
        err: io::Error,
    },

    /// File content could not be mapped.
    Mapping {
        /// Path.
        path: PathBuf,
        /// Error.
        err: MappedFileOpenError,
    },

    /// Block read failed.
    Read {
        /// Path.
        path: PathBuf,
        /// Error.
        err: BlockReaderReadError,
    },

    /// Stripe update failed.
    Checksum {
        /// Path.
        path: PathBuf,
        /// Error.
        err: ChecksumError,
    },

    /// Writing the report failed.
    Output {
        /// Error.
        err: io::Error,
    },

    /// Some files failed with `--keep-going`.
    Failed {
        /// Failed files.
        failed: usize,
        /// All files.
        total: usize,
    },
}

impl RunError {
    /// Process exit code for the error.
    pub fn exit_code(&self) -> u8 {
        match self {
            RunError::Usage { err: _ } => EXIT_USAGE,
            RunError::Allocation { size: _, err: _ } => EXIT_USAGE,
            _ => EXIT_FAILURE,
        }
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Usage { err } => write!(f, "usage error: [{err}]"),
            RunError::Allocation { size, err } => {
                write!(f, "cannot allocate block buffer of {size} bytes: [{err}]")
            }
            RunError::FileOpen { path, err } => {
                write!(f, "cannot open file {}: [{err}]", path.display())
            }
            RunError::Mapping { path, err } => {
                write!(f, "cannot map file {}: [{err}]", path.display())
            }
            RunError::Read { path, err } => {
                write!(f, "cannot read file {}: [{err}]", path.display())
            }
            RunError::Checksum { path, err } => {
                write!(f, "cannot checksum file {}: [{err}]", path.display())
            }
            RunError::Output { err } => write!(f, "cannot write output: [{err}]"),
            RunError::Failed { failed, total } => {
                write!(f, "{failed} of {total} files failed")
            }
        }
    }
}

impl error::Error for RunError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            RunError::Usage { err } => Some(err),
            RunError::Allocation { size: _, err } => Some(err),
            RunError::FileOpen { path: _, err } => Some(err),
            RunError::Mapping { path: _, err } => Some(err),
            RunError::Read { path: _, err } => Some(err),
            RunError::Checksum { path: _, err } => Some(err),
            RunError::Output { err } => Some(err),
            RunError::Failed {
                failed: _,
                total: _,
            } => None,
        }
    }
}

/// Open and map `path`, sorting open failures from mapping failures.
fn map_file(path: &Path) -> Result<MappedFile, RunError> {
    MappedFile::open(path).map_err(|err| match err {
        MappedFileOpenError::OpenError { err } | MappedFileOpenError::MetadataError { err } => {
            RunError::FileOpen {
                path: path.to_path_buf(),
                err,
            }
        }
        err => RunError::Mapping {
            path: path.to_path_buf(),
            err,
        },
    })
}

/// Checksum the whole mapped file.
pub fn checksum_mapped(path: &Path, mode: Mode) -> Result<FileReport, RunError> {
    let mapped = map_file(path)?;
    let data = mapped.as_bytes();

    let checksums = match mode {
        Mode::Fletcher64 => Checksums::Fletcher64(fletcher64(data)),
        Mode::Fletcher128 => Checksums::Fletcher128(fletcher128(data)),
        _ => Checksums::Whole {
            fletcher64: fletcher64(data),
            fletcher128: fletcher128(data),
        },
    };

    Ok(FileReport {
        path: path.to_path_buf(),
        size: data.len() as u64,
        checksums,
    })
}

/** Checksum the file with sequential block reads into stripes.
 *
 * `set` is reset first. `buffer` is one chunk, a multiple of the word size,
 * so only the last read may leave an unaligned tail.
 */
pub fn checksum_striped(
    path: &Path,
    set: &mut StripeSet,
    buffer: &mut [u8],
) -> Result<FileReport, RunError> {
    let mut reader = BlockReader::open(path).map_err(|err| match err {
        BlockReaderOpenError::OpenError { err } | BlockReaderOpenError::MetadataError { err } => {
            RunError::FileOpen {
                path: path.to_path_buf(),
                err,
            }
        }
    })?;

    set.reset();

    loop {
        let read = reader.read(buffer).map_err(|err| RunError::Read {
            path: path.to_path_buf(),
            err,
        })?;

        set.update(&buffer[0..read]).map_err(|err| RunError::Checksum {
            path: path.to_path_buf(),
            err,
        })?;

        // Short read is end of file.
        if read < buffer.len() {
            break;
        }
    }

    if reader.offset() != reader.size() {
        debug!(
            path = %path.display(),
            opened = reader.size(),
            read = reader.offset(),
            "size changed while reading"
        );
    }

    Ok(FileReport {
        path: path.to_path_buf(),
        size: reader.offset(),
        checksums: Checksums::Striped(set.stripes().to_vec()),
    })
}

/// Zeroed block buffer of `size` bytes.
fn allocate_buffer(size: usize) -> Result<Vec<u8>, RunError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(size)
        .map_err(|err| RunError::Allocation { size, err })?;
    buffer.resize(size, 0);

    Ok(buffer)
}

/** Checksum every file of `cli` and write one line per file to `out`.
 *
 * Errors stop the run, unless `--keep-going` is set. Then each failed file
 * is reported to `err` and the run ends with [`RunError::Failed`].
 *
 * # Errors
 *
 * Returns [`RunError`] in case of error.
 */
pub fn run<W: Write, E: Write>(cli: &Cli, out: &mut W, err: &mut E) -> Result<(), RunError> {
    let mode = cli.mode();

    // Block buffer and stripes are allocated once, and reused for each file.
    let mut striped = match mode {
        Mode::Striped => {
            let config = cli.stripe_config().map_err(|err| RunError::Usage { err })?;
            debug!(
                block_size = config.block_size(),
                stripes = config.stripes(),
                "striped mode"
            );
            let set = StripeSet::try_new(config)
                .map_err(|err| RunError::Usage { err })?;
            Some((set, allocate_buffer(config.chunk_size())?))
        }
        _ => None,
    };

    if cli.header {
        let stripes = match &striped {
            Some((set, _)) => set.config().stripes(),
            None => 0,
        };
        write_header(out, mode, stripes).map_err(|err| RunError::Output { err })?;
    }

    let mut failed = 0;

    for path in &cli.files {
        let result = match &mut striped {
            Some((set, buffer)) => checksum_striped(path, set, buffer),
            None => checksum_mapped(path, mode),
        };

        match result {
            Ok(report) => {
                debug!(path = %path.display(), size = report.size, "checksummed");
                report.write(out).map_err(|err| RunError::Output { err })?;
            }
            Err(e) if cli.keep_going => {
                debug!(path = %path.display(), "skipping: {e}");
                writeln!(err, "fletch: {e}").map_err(|err| RunError::Output { err })?;
                failed += 1;
            }
            Err(e) => return Err(e),
        }
    }

    out.flush().map_err(|err| RunError::Output { err })?;

    match failed {
        0 => Ok(()),
        _ => Err(RunError::Failed {
            failed,
            total: cli.files.len(),
        }),
    }
}
