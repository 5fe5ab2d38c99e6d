use thiserror::Error;

use crate::api::ApiError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreferencesError {
    #[error("Could not reach the server: {0}")]
    Network(String),

    #[error("Server rejected preferences ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid preferences response: {0}")]
    InvalidResponse(String),

    #[error("Unknown preference: {0}")]
    UnknownKey(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

impl From<ApiError> for PreferencesError {
    fn from(err: ApiError) -> Self {
        let status = err.status();
        match err {
            ApiError::NetworkError(message) => PreferencesError::Network(message),
            ApiError::InvalidResponse(message) => PreferencesError::InvalidResponse(message),
            ApiError::ServerError { status, message } | ApiError::Rejected { status, message } => {
                PreferencesError::Rejected { status, message }
            }
            ApiError::AccessDenied(message) | ApiError::NotFound(message) => {
                PreferencesError::Rejected {
                    status: status.unwrap_or_default(),
                    message,
                }
            }
            other => PreferencesError::Rejected {
                status: status.unwrap_or_default(),
                message: other.to_string(),
            },
        }
    }
}

impl PreferencesError {
    /// True when no response was received at all.
    pub fn is_network(&self) -> bool {
        matches!(self, PreferencesError::Network(_))
    }
}
