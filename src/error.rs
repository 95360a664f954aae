/// All errors the platform can surface to a caller.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed or incomplete game catalog. Fatal for the affected
    /// operation: a missing node is a configuration bug, not user error.
    #[error("catalog error: {0}")]
    Config(String),

    /// Teacher password mismatch. Recoverable: re-prompt.
    #[error("incorrect password")]
    Auth,

    /// Malformed user input (empty login fields, out-of-range score).
    /// Recoverable: re-prompt.
    #[error("{0}")]
    Validation(String),

    /// The requested game has not been unlocked yet.
    #[error("game {0} is still locked")]
    Locked(crate::catalog::GameId),
}

pub type Result<T> = std::result::Result<T, PlatformError>;
