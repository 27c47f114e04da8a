//! Unified error types for the bot.
//!
//! Remote banking/project API failures are deliberately *not* represented
//! here: the remote services signal business errors inside response bodies,
//! so those outcomes travel as [`crate::api::ApiReply`] data that callers
//! inspect. This enum covers genuine faults of this process: configuration,
//! I/O, serialization, the Discord framework, and playback plumbing.

use thiserror::Error;

/// Top-level error type for the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Application configuration could not be assembled.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem failure (session mirror file, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required environment variable was missing or malformed.
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// A decimal coin amount could not be parsed.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// JSON (de)serialization failure for locally owned data.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Voice/queue engine failure (join, resolve, enqueue).
    #[error("Playback error: {0}")]
    Playback(String),

    /// Serenity/Poise framework error.
    #[error("Serenity/Poise framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Error::Framework(Box::new(value))
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
