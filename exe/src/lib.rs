// SPDX-License-Identifier: GPL-2.0 OR MIT

//! Fletcher checksum command line tool.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Command line arguments.
pub mod args;

/// Output formatting.
pub mod report;

/// Per file checksum drivers.
pub mod run;

pub use args::{Cli, Mode};
pub use report::{Checksums, FileReport};
pub use run::{run, RunError};
