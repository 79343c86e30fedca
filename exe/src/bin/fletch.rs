// SPDX-License-Identifier: GPL-2.0 OR MIT

use std::io;
use std::io::BufWriter;
use std::process::ExitCode;

use fletch_exe_lib::{run, Cli};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "FLETCH_LOG";

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse_args();

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match run(&cli, &mut out, &mut io::stderr()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("fletch: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
