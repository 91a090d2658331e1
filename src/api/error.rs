use thiserror::Error;

use crate::shape::ShapeError;

pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please try again.";

/// Everything a backend call can fail with.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    #[error("transport failure: {0}")]
    Transport(String),
    /// Non-success status. `message` is the backend's `error` field when it
    /// sent one, otherwise the per-endpoint fallback.
    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("unreadable response body: {0}")]
    Decode(String),
    #[error(transparent)]
    Shape(#[from] ShapeError),
    #[error("{0}")]
    Validation(String),
}

impl ClientError {
    /// Inline message shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Transport(_) => NETWORK_ERROR_MESSAGE.to_string(),
            ClientError::Status { message, .. } => message.clone(),
            ClientError::Decode(detail) => format!("Unexpected response from backend ({})", detail),
            ClientError::Shape(err) => err.to_string(),
            ClientError::Validation(message) => message.clone(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::Transport(_) => "transport",
            ClientError::Status { .. } => "status",
            ClientError::Decode(_) => "decode",
            ClientError::Shape(_) => "shape",
            ClientError::Validation(_) => "validation",
        }
    }
}
