//! CLI argument definitions using clap
//!
//! Commands:
//! - assessor-admin serve [--config <path>] [--memory] [--port <port>]
//! - assessor-admin check-config [--config <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Admin API for the assessor's office
#[derive(Parser, Debug)]
#[command(name = "assessor-admin")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the admin API
    Serve {
        /// Path to a JSON configuration file; environment variables override it
        #[arg(long)]
        config: Option<PathBuf>,

        /// Serve seeded in-process data instead of the hosted database
        #[arg(long)]
        memory: bool,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Validate configuration and print a summary without secrets
    CheckConfig {
        /// Path to a JSON configuration file; environment variables override it
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_memory() {
        let cli = Cli::try_parse_from(["assessor-admin", "serve", "--memory", "--port", "9000"])
            .unwrap();
        match cli.command {
            Command::Serve {
                config,
                memory,
                port,
            } => {
                assert!(config.is_none());
                assert!(memory);
                assert_eq!(port, Some(9000));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_check_config() {
        let cli =
            Cli::try_parse_from(["assessor-admin", "check-config", "--config", "admin.json"])
                .unwrap();
        assert!(matches!(
            cli.command,
            Command::CheckConfig { config: Some(ref p) } if p == &PathBuf::from("admin.json")
        ));
    }
}
