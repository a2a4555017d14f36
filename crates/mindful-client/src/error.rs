use mindful_core::ValidationErrors;
use mindful_store::StoreError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Api {
        message: String,
        status: Option<u16>,
        details: Option<serde_json::Value>,
    },

    /// Connection, TLS or timeout failure before a response arrived.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("No suitable refresh strategy found")]
    NoRefreshStrategy,

    #[error("not signed in")]
    NotAuthenticated,

    #[error("invalid response: {0}")]
    Decode(String),

    #[error("invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),

    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Display form of any client error: `{message, status?, details?}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ClientError {
    /// HTTP status associated with the failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => *status,
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    pub fn report(&self) -> ErrorReport {
        let message = match self {
            ClientError::Transport(e) if e.is_timeout() => "request timed out".to_string(),
            ClientError::Transport(e) if e.is_connect() => "could not reach the server".to_string(),
            other => other.to_string(),
        };
        let details = match self {
            ClientError::Api { details, .. } => details.clone(),
            ClientError::Validation(errors) => serde_json::to_value(&errors.errors).ok(),
            _ => None,
        };
        ErrorReport {
            message,
            status: self.status(),
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindful_core::{Field, FieldError};

    #[test]
    fn api_error_report_carries_status_and_details() {
        let err = ClientError::Api {
            message: "Invalid credentials".into(),
            status: Some(401),
            details: Some(serde_json::json!({"message": "Invalid credentials"})),
        };
        assert!(err.is_unauthorized());
        let report = err.report();
        assert_eq!(report.message, "Invalid credentials");
        assert_eq!(report.status, Some(401));
        assert!(report.details.is_some());
    }

    #[test]
    fn validation_report_lists_fields() {
        let err = ClientError::from(ValidationErrors::from(FieldError::new(
            Field::Email,
            "Enter a valid email address",
        )));
        let report = err.report();
        assert_eq!(report.status, None);
        assert_eq!(report.message, "email: Enter a valid email address");
        assert_eq!(
            report.details,
            Some(serde_json::json!([{"field": "email", "message": "Enter a valid email address"}]))
        );
    }

    #[test]
    fn refresh_exhaustion_message() {
        let report = ClientError::NoRefreshStrategy.report();
        assert_eq!(report.message, "No suitable refresh strategy found");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json, serde_json::json!({"message": "No suitable refresh strategy found"}));
    }
}
