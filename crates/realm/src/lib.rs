//! # Realm Server - Main Entry Point
//!
//! Process bootstrap for the realm world server. This crate handles CLI
//! parsing, configuration loading, logging setup and the application
//! lifecycle; the networking lives in `game_server` and the simulation in
//! `realm_world`.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run with default configuration
//! realm
//!
//! # Specify custom configuration
//! realm --config production.toml
//!
//! # Override specific settings
//! realm --bind 0.0.0.0:8000 --map maps/world_server.json --log-level debug
//!
//! # JSON logging for production
//! realm --json-logs
//! ```
//!
//! ## Configuration
//!
//! The server loads configuration from a TOML file (default: `config.toml`).
//! If the file doesn't exist, a default configuration will be created.
//!
//! ## Signal Handling
//!
//! The server handles graceful shutdown on:
//! - SIGINT (Ctrl+C)
//! - SIGTERM (Unix systems)

use tracing::error;

pub mod app;
pub mod cli;
pub mod config;
pub mod logging;
pub mod signals;

use app::Application;
use cli::CliArgs;
use config::AppConfig;

/// Runs the realm server.
///
/// Handles the complete application lifecycle including:
/// 1. Command-line argument parsing
/// 2. Configuration loading and validation
/// 3. Logging system initialization
/// 4. Application creation and execution
///
/// # Exit Codes
///
/// * **0**: Successful execution and shutdown
/// * **1**: Error during startup, configuration, or runtime
///
/// Called from the binary's `#[tokio::main]`, so it must not start a runtime itself.
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Load configuration to get logging settings
    let config = AppConfig::load_from_file(&args.config_path)
        .await
        .unwrap_or_default();
    let mut logging = config.logging;
    if let Some(level) = &args.log_level {
        logging.level = level.clone();
    }

    if let Err(e) = logging::setup_logging(&logging, args.json_logs) {
        eprintln!("❌ Failed to setup logging: {e}");
        std::process::exit(1);
    }

    match Application::new(args).await {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("❌ Application error: {}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("❌ Failed to start application: {e}");
            std::process::exit(1);
        }
    }

    Ok(())
}

// Re-export main types for potential library usage
pub use config::{LoggingSettings, ServerSettings};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());

        let server_config = config
            .to_server_config()
            .expect("Default config should convert to ServerConfig");
        assert_eq!(server_config.max_connections, 1000);
        assert_eq!(server_config.world.updates_per_second, 50);
        assert_eq!(server_config.security.max_message_size, 16 * 1024);
    }

    #[tokio::test]
    async fn test_written_default_config_round_trips() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("realm.toml");

        let test_config = AppConfig::default();
        let toml_content = toml::to_string_pretty(&test_config)
            .expect("Failed to serialize default config to TOML");
        tokio::fs::write(&path, toml_content)
            .await
            .expect("Failed to write test config file");

        let loaded = AppConfig::load_from_file(&path).await.unwrap();
        assert!(loaded.validate().is_ok());
        assert_eq!(loaded.server.bind_address, test_config.server.bind_address);
        assert_eq!(loaded.world, test_config.world);
    }
}
