// Error types shared by the remote and vision halves of the crate.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("{tool} is not installed (install with: {hint})")]
    ToolMissing { tool: &'static str, hint: &'static str },

    #[error("{program} exited with {status}")]
    CommandFailed { program: String, status: String },

    #[error("Local file not found: {0}")]
    LocalFileMissing(PathBuf),

    #[error("Image directory does not exist: {0}")]
    InputDirMissing(PathBuf),

    #[error("No images found in {0}")]
    NoImages(PathBuf),

    #[error("API key must not be empty")]
    EmptyApiKey,
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Error::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
