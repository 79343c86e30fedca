// SPDX-License-Identifier: GPL-2.0 OR MIT

use std::io;
use std::io::Write;
use std::path::PathBuf;

use fletch::checksum::{Checksum128, Checksum64};

use crate::args::Mode;

/// Hex digits of a [`Checksum64`].
const CHECKSUM_64_WIDTH: usize = 16;

/// Hex digits of a [`Checksum128`].
const CHECKSUM_128_WIDTH: usize = 32;

/// Checksums of one file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Checksums {
    /// Both checksums of the whole file.
    Whole {
        /// Fletcher-64.
        fletcher64: Checksum64,
        /// Fletcher-128.
        fletcher128: Checksum128,
    },

    /// Fletcher-64 of the whole file.
    Fletcher64(Checksum64),

    /// Fletcher-128 of the whole file.
    Fletcher128(Checksum128),

    /// One Fletcher-128 per stripe.
    Striped(Vec<Checksum128>),
}

/// One output line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileReport {
    /// Path as given on the command line.
    pub path: PathBuf,

    /// Bytes checksummed.
    pub size: u64,

    /// Checksums.
    pub checksums: Checksums,
}

impl FileReport {
    /** Write the report line.
     *
     * ```text
     * <checksums> <size> <path>
     * ```
     *
     * Checksums and size are fixed width lower case hex.
     */
    pub fn write<W: Write>(&self, out: &mut W) -> io::Result<()> {
        match &self.checksums {
            Checksums::Whole {
                fletcher64,
                fletcher128,
            } => write!(out, "{fletcher64} {fletcher128}")?,
            Checksums::Fletcher64(c) => write!(out, "{c}")?,
            Checksums::Fletcher128(c) => write!(out, "{c}")?,
            Checksums::Striped(stripes) => {
                for c in stripes {
                    write!(out, "{c}")?;
                }
            }
        }

        writeln!(out, " {:016x} {}", self.size, self.path.display())
    }
}

/** Write the column header for `mode`.
 *
 * `stripes` is only used by [`Mode::Striped`].
 */
pub fn write_header<W: Write>(out: &mut W, mode: Mode, stripes: usize) -> io::Result<()> {
    match mode {
        Mode::Whole => write!(
            out,
            "{:<w64$} {:<w128$}",
            "fletcher-64",
            "fletcher-128",
            w64 = CHECKSUM_64_WIDTH,
            w128 = CHECKSUM_128_WIDTH
        )?,
        Mode::Fletcher64 => write!(out, "{:<w$}", "fletcher-64", w = CHECKSUM_64_WIDTH)?,
        Mode::Fletcher128 => write!(out, "{:<w$}", "fletcher-128", w = CHECKSUM_128_WIDTH)?,
        Mode::Striped => {
            let label = format!("fletcher-128 x{stripes}");
            write!(out, "{:<w$}", label, w = CHECKSUM_128_WIDTH * stripes)?
        }
    }

    writeln!(out, " {:<16} {}", "bytes", "file")
}
