//! CLI module for the admin API
//!
//! Provides command-line interface for:
//! - serve: Load configuration and serve HTTP
//! - check-config: Validate configuration and exit

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check_config, run, run_command, serve, ConfigSummary};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_json, write_json_to};
