//! Handles Command Line Interface (CLI) related functionalities.
//!
//! Defines the `clap` commands, one per pipeline stage plus `run` and `facts`, and the
//! `App` that wires configuration, staging snapshots and the warehouse behind them.

mod commands;

pub use commands::*;
