use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::forge::response::ErrorReport;

#[derive(Debug, Error)]
pub enum ForgeError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Non-2xx answer from Forge. Displays as `Forge error <status>: <detail>`.
    #[error("{0}")]
    BackendError(ErrorReport),

    /// Forge answered 2xx but sent no image where one was expected.
    #[error("{0}")]
    EmptyResult(String),

    #[error("Invalid base64 image data: {0}")]
    DecodeError(#[from] base64::DecodeError),

    #[error("File error on '{}': {source}", .path.display())]
    FileIoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Client error: {0}")]
    ClientError(String),

    #[error("Forge request timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("Request to Forge failed: {0}")]
    RequestError(String),

    #[error("Unexpected response from Forge: {0}")]
    ResponseError(String),

    #[error("Invalid arguments for '{tool}': {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

impl ForgeError {
    pub fn file_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ForgeError::FileIoError {
            path: path.into(),
            source,
        }
    }

    /// Local failures are the caller's to fix; everything else came from Forge or the wire.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ForgeError::DecodeError(_)
                | ForgeError::FileIoError { .. }
                | ForgeError::InvalidArguments { .. }
                | ForgeError::UnknownTool(_)
                | ForgeError::ConfigError(_)
                | ForgeError::ClientError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ForgeError>;
