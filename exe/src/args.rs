// SPDX-License-Identifier: GPL-2.0 OR MIT

use clap::{Parser, ValueEnum};
use fletch::checksum::{ChecksumError, StripeConfig};
use std::path::PathBuf;

/// Default stripe block size in bytes.
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Default stripe count.
pub const DEFAULT_STRIPES: usize = 8;

/// Checksums to compute for each file.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum Mode {
    /// Fletcher-64 and Fletcher-128 of the mapped file
    Whole,

    /// Fletcher-64 of the mapped file
    Fletcher64,

    /// Fletcher-128 of the mapped file
    Fletcher128,

    /// Striped Fletcher-128 using block reads
    Striped,
}

/// Compute Fletcher-64 and Fletcher-128 checksums of files
#[derive(Parser, Debug)]
#[command(name = "fletch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Files to checksum
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Stripe block size in bytes, rounded down to a multiple of 8
    #[arg(short = 'b', long)]
    pub block_size: Option<usize>,

    /// Stripe count
    #[arg(short = 's', long)]
    pub stripes: Option<usize>,

    /// Checksums to compute [default: striped with -b or -s, else whole]
    #[arg(short = 'm', long, value_enum)]
    pub mode: Option<Mode>,

    /// Print a column header
    #[arg(long)]
    pub header: bool,

    /// Report unreadable files and continue with the rest
    #[arg(short = 'k', long)]
    pub keep_going: bool,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Selected mode, striped if stripe geometry was given.
    pub fn mode(&self) -> Mode {
        match self.mode {
            Some(mode) => mode,
            None if self.block_size.is_some() || self.stripes.is_some() => Mode::Striped,
            None => Mode::Whole,
        }
    }

    /** Stripe geometry from `-b` and `-s`.
     *
     * # Errors
     *
     * Returns [`ChecksumError`] for an invalid geometry.
     */
    pub fn stripe_config(&self) -> Result<StripeConfig, ChecksumError> {
        StripeConfig::new(
            self.block_size.unwrap_or(DEFAULT_BLOCK_SIZE),
            self.stripes.unwrap_or(DEFAULT_STRIPES),
        )
    }
}
