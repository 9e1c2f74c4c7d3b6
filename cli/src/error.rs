//! CLI errors. `main` prints them to stderr and exits with status 1.

use quickread::{InitError, SettingsError};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("quickread: {0}")]
    Init(#[from] InitError),
    #[error("quickread: {0}")]
    Settings(#[from] SettingsError),
    #[error("quickread: {0}")]
    Io(#[from] std::io::Error),
    #[error("quickread: {0}")]
    Json(#[from] serde_json::Error),
    #[error("quickread: {0}")]
    InvalidArg(String),
    /// The task ended with a non-success outcome; its content was already printed.
    #[error("quickread: task ended: {0}")]
    TaskFailed(&'static str),
}
