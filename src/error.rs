use thiserror::Error;

/// Result type for Bravia operations
pub type Result<T> = std::result::Result<T, BraviaError>;

/// Errors that can occur when interacting with a Bravia television
#[derive(Error, Debug)]
pub enum BraviaError {
    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The TV answered with a non-success HTTP status
    #[error("Unable to perform call: {status}")]
    Status {
        /// Status the TV responded with
        status: reqwest::StatusCode,
    },

    /// No session cookie, or the TV rejected the one we had
    #[error("Not authenticated with TV")]
    NotAuthenticated,

    /// Pairing was attempted with a code the TV did not accept
    #[error("Unable to authenticate, the wrong code was probably entered")]
    PairingRejected,

    /// The TV reported a JSON-RPC level error
    #[error("Error, TV said: {error}")]
    Remote {
        /// Error payload exactly as the TV sent it
        error: serde_json::Value,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The remote command table has not been fetched yet
    #[error("Command list not loaded yet")]
    CommandsNotReady,

    /// The TV does not report a command under this name
    #[error("Unsupported command: {0}")]
    UnsupportedCommand(String),

    /// The device descriptor lacks a required control endpoint
    #[error("Device is missing required service: {0}")]
    MissingService(&'static str),

    /// Invalid or unexpected response shape from the TV
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Event channel closed, controller was destroyed
    #[error("Controller closed")]
    Closed,

    /// Event channel error
    #[error("Channel error: {0}")]
    ChannelError(String),
}
