use sonos_api::ApiError;
use thiserror::Error;

/// Errors raised inside the node server
///
/// None of these are fatal: command handlers and poll ticks log them and
/// carry on. They exist so the failure paths are explicit and testable.
#[derive(Debug, Error)]
pub enum NodeServerError {
    /// A call to a speaker failed
    #[error("Device error: {0}")]
    Api(#[from] ApiError),

    /// A setter command carried a value that is not an integer
    #[error("{command}: Invalid argument '{value}'")]
    InvalidArgument { command: String, value: String },

    /// A `sonos_<address>` custom parameter could not be used
    #[error("Invalid manual speaker {key}: {reason}")]
    InvalidManualSpeaker { key: String, reason: String },

    #[error("Unknown node: {0}")]
    UnknownNode(String),

    #[error("Unknown command '{command}' for node {address}")]
    UnknownCommand { address: String, command: String },

    /// Custom parameters were not a JSON object of strings
    #[error("Invalid custom parameters: {0}")]
    Params(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NodeServerError {
    /// Whether the underlying failure was an unreachable speaker
    pub fn is_connection_error(&self) -> bool {
        matches!(self, NodeServerError::Api(e) if e.is_connection_error())
    }
}

pub type Result<T> = std::result::Result<T, NodeServerError>;
