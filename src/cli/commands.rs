//! CLI command implementations
//!
//! `serve` loads configuration, builds the gateway tiers and runs the HTTP server on a
//! tokio runtime. `check-config` performs the same validation and exits.

use std::path::Path;

use serde::Serialize;

use crate::config::AppConfig;
use crate::http_server::{AppState, HttpServer};
use crate::observability::{log_event, log_event_with_fields, Event, Logger};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::write_json;

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve {
            config,
            memory,
            port,
        } => serve(config.as_deref(), memory, port),
        Command::CheckConfig { config } => check_config(config.as_deref()),
    }
}

/// Load configuration and apply its log level; failures are logged as fatal
fn load_config(path: Option<&Path>) -> CliResult<AppConfig> {
    let result = AppConfig::load(path).and_then(|config| {
        let severity = config.log_severity()?;
        Logger::set_min_severity(severity);
        Ok(config)
    });

    result.map_err(|e| {
        let reason = e.to_string();
        log_event_with_fields(Event::ConfigInvalid, &[("reason", reason.as_str())]);
        CliError::from(e)
    })
}

/// Serve the admin API until interrupted
pub fn serve(config_path: Option<&Path>, memory: bool, port: Option<u16>) -> CliResult<()> {
    log_event(Event::BootStart);

    let mut config = load_config(config_path)?;
    if let Some(port) = port {
        config.server.port = port;
    }

    let state = if memory {
        AppState::demo()
    } else {
        let gateway = config.resolve_gateway().map_err(|e| {
            let reason = e.to_string();
            log_event_with_fields(Event::ConfigInvalid, &[("reason", reason.as_str())]);
            CliError::from(e)
        })?;
        AppState::connect(&gateway)
            .map_err(|e| CliError::boot_failed(format!("gateway setup failed: {e}")))?
    };

    log_event_with_fields(
        Event::ConfigLoaded,
        &[("mode", if memory { "memory" } else { "remote" })],
    );

    let server = HttpServer::new(config.server.clone(), state);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

/// What `check-config` reports; keys are only reported as present
#[derive(Debug, Serialize)]
pub struct ConfigSummary {
    pub listen: String,
    pub gateway_url: String,
    pub timeout_secs: u64,
    pub anon_key: &'static str,
    pub session_key: &'static str,
    pub log_level: String,
}

/// Validate configuration and print a summary
pub fn check_config(config_path: Option<&Path>) -> CliResult<()> {
    let config = load_config(config_path)?;
    let summary = summarize(&config)?;
    write_json(&summary)
}

fn summarize(config: &AppConfig) -> CliResult<ConfigSummary> {
    let gateway = config.resolve_gateway()?;
    Ok(ConfigSummary {
        listen: config.server.socket_addr(),
        gateway_url: gateway.url,
        timeout_secs: gateway.timeout.as_secs(),
        anon_key: "set",
        session_key: "set",
        log_level: config.log_level.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::errors::CliErrorCode;

    #[test]
    fn test_summary_hides_keys() {
        let mut config = AppConfig::default();
        config.gateway.url = Some("https://db.example.org".to_string());
        config.gateway.anon_key = Some("anon-secret".to_string());
        config.gateway.session_key = Some("session-secret".to_string());

        let summary = summarize(&config).unwrap();
        let text = serde_json::to_string(&summary).unwrap();
        assert!(!text.contains("secret"));
        assert_eq!(summary.listen, "0.0.0.0:8080");
        assert_eq!(summary.timeout_secs, 15);
    }

    #[test]
    fn test_summary_requires_gateway() {
        let err = summarize(&AppConfig::default()).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
    }

    #[test]
    fn test_missing_config_file_is_config_error() {
        let err = load_config(Some(Path::new("/nonexistent/admin.json"))).unwrap_err();
        assert_eq!(err.code_str(), "ADMIN_CLI_CONFIG_ERROR");
    }
}
