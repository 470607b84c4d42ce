//! Command Line Interface (CLI) layer for antsrun.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! and the orchestration logic (`runner`) for the smoke-test flow: tool
//! environment setup, cache clear, input checks, task configuration,
//! execution, and output verification.
//!
//! If you are embedding antsrun into another application, prefer using
//! the high-level `antsrun::api` module instead of calling the CLI code.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
