//! antsrun CLI entrypoint.
//!
//! Provides a thin wrapper over the `cli` module: parse args, run the
//! antsApplyTransforms smoke test, and exit 0 on success or 1 otherwise.
//! For programmatic use, prefer the library API (`antsrun::api`).

use std::process::ExitCode;

use clap::Parser;

mod cli;

fn main() -> ExitCode {
    let args = cli::CliArgs::parse();
    if cli::run(args) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
