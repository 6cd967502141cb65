//! Command-line front end.
//!
//! A thin consumer of the orchestrator library: parse arguments, resolve the
//! effective configuration, connect to the wallet-backed endpoint, run one
//! action, render the outcome.

pub mod commands;
pub mod config;
pub mod output;

pub use commands::*;
pub use config::*;
pub use output::*;
