use std::path::PathBuf;

use shared::error::{ApiError, ErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {message}")]
    Status {
        status: u16,
        code: ErrorCode,
        message: String,
    },
    #[error("unexpected response payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("item {label} has no identifier")]
    MissingIdentifier { label: String },
    #[error("deletion is disabled for {endpoint}")]
    DeleteDisabled { endpoint: String },
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ClientError {
    pub fn from_status(status: u16, body: &str) -> Self {
        let ApiError { code, message } = ApiError::from_response(status, body);
        Self::Status {
            status,
            code,
            message,
        }
    }

    /// Text suitable for a transient notification.
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Status { code, .. } => Some(*code),
            Self::Http(err) => err.status().map(|s| ErrorCode::from_status(s.as_u16())),
            _ => None,
        }
    }

    /// Missing or rejected credentials.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self.code(),
            Some(ErrorCode::Unauthorized | ErrorCode::Forbidden)
        )
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
