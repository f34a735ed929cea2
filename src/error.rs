//! Stage errors

use thiserror::Error;

/// Stage result type
pub type Result<T> = std::result::Result<T, StageError>;

/// Errors surfaced by the stage
///
/// Scene content problems (bad body specs, unknown shapes) are never errors;
/// they are defaulted or dropped by the loader.
#[derive(Debug, Error)]
pub enum StageError {
    /// Operation attempted after the simulation was disposed
    #[error("simulation is disposed: {operation} is not allowed")]
    Disposed { operation: &'static str },

    #[error("compile request timed out after {timeout_ms} ms")]
    CompileTimeout { timeout_ms: u64 },

    #[error("compile request failed: {0}")]
    CompileTransport(String),

    #[error("compile service returned status {status}")]
    CompileStatus { status: u16 },

    #[error("invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StageError {
    /// Create a disposed-state error for the named operation
    pub fn disposed(operation: &'static str) -> Self {
        Self::Disposed { operation }
    }

    /// Whether this error is the terminal lifecycle signal
    pub fn is_disposed(&self) -> bool {
        matches!(self, Self::Disposed { .. })
    }
}

impl From<reqwest::Error> for StageError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::CompileStatus {
                status: status.as_u16(),
            };
        }
        Self::CompileTransport(err.to_string())
    }
}
