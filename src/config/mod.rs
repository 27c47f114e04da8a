//! Application configuration loaded from environment variables.
//!
//! All settings except the Discord token live here. The token is read in
//! `main` directly before use and never stored in [`AppConfig`]. Every value
//! has a default matching the original deployment, so a bare environment
//! still produces a working configuration.

use std::env;
use std::path::PathBuf;

use tracing::info;

use crate::errors::Result;

/// Runtime configuration shared by all bot commands.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the remote banking API (endpoints under `/api/...`).
    pub bank_api_base: String,
    /// Base URL of the Castle project-lookup API.
    pub castle_api_base: String,
    /// Base URL used to build user-facing Castle project links.
    pub castle_web_base: String,
    /// Path of the flat file mirroring session tokens (best-effort cache).
    pub session_file: PathBuf,
    /// Prefix accepted by the free-text command front-end.
    pub command_prefix: String,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Assembles the application configuration from the environment.
///
/// Missing variables fall back to defaults; this function only fails if a
/// provided value is unusable (currently: an empty command prefix, which
/// would make every message look like a command).
pub fn load_app_configuration() -> Result<AppConfig> {
    let config = AppConfig {
        bank_api_base: env_or("BANK_API_BASE", "https://bank.foxsrv.net"),
        castle_api_base: env_or("CASTLE_API_BASE", "https://api.castle.xyz"),
        castle_web_base: env_or("CASTLE_WEB_BASE", "https://castle.xyz"),
        session_file: PathBuf::from(env_or("SESSION_FILE", "./coin_sessions.json")),
        command_prefix: env_or("COMMAND_PREFIX", "!"),
    };

    if config.command_prefix.is_empty() {
        return Err(crate::errors::Error::Config(
            "COMMAND_PREFIX must not be empty".to_string(),
        ));
    }

    info!(
        bank = %config.bank_api_base,
        castle = %config.castle_api_base,
        "Configuration loaded"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_env_unset() {
        // Env vars are process-global; only assert on keys tests never set.
        let config = load_app_configuration().expect("defaults must load");
        assert!(config.bank_api_base.starts_with("https://"));
        assert!(!config.command_prefix.is_empty());
    }
}
