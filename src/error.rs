//! Error kinds for the ingest, analysis and configuration paths.

use thiserror::Error;

/// Message shown when a failure carries no text of its own.
pub const GENERIC_FAILURE: &str = "An unexpected error occurred";

/// Rejection of an uploaded file before any analysis is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    #[error("{0}")]
    InvalidInput(String),
}

/// Failure of a single analysis call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("API Key is missing. Please check your environment configuration.")]
    MissingCredential,
    #[error("No analysis generated.")]
    EmptyResponse,
    /// Network or protocol failure reported by the endpoint; the text is opaque.
    #[error("{0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{var} is not a valid socket address: {value}")]
    InvalidAddr { var: &'static str, value: String },
    #[error("{var} must be a positive integer, got {value}")]
    InvalidSize { var: &'static str, value: String },
}

/// Turn any error into the single line stored in a failed outcome.
pub fn failure_message(err: &dyn std::error::Error) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        GENERIC_FAILURE.to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_message_is_passed_through_raw() {
        let err = AnalysisError::Transport("network down".into());
        assert_eq!(failure_message(&err), "network down");
    }

    #[test]
    fn blank_message_falls_back_to_generic() {
        let err = AnalysisError::Transport("  ".into());
        assert_eq!(failure_message(&err), GENERIC_FAILURE);
    }

    #[test]
    fn missing_credential_has_readable_text() {
        let message = failure_message(&AnalysisError::MissingCredential);
        assert!(message.starts_with("API Key is missing"));
    }
}
