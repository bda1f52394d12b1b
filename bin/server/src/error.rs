//! Domain error types for server operations.
//!
//! Errors carry the internal details for the log; the response only ever
//! shows a user-safe message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use delegated_auth_platform_access::SessionStoreError;
use rootcause::Report;
use std::fmt;

/// Session-related errors.
#[derive(Debug)]
pub enum SessionError {
    /// The session store could not be read or written.
    StoreUnavailable { details: String },
    /// The sign-in state could not be written to its cookie.
    AuthStateEncoding { details: String },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StoreUnavailable { details } => {
                write!(f, "session store unavailable: {}", details)
            }
            Self::AuthStateEncoding { details } => {
                write!(f, "failed to encode auth state: {}", details)
            }
        }
    }
}

impl std::error::Error for SessionError {}

impl From<Report<SessionStoreError>> for SessionError {
    fn from(report: Report<SessionStoreError>) -> Self {
        match report.current_context() {
            SessionStoreError::Unavailable { details } => Self::StoreUnavailable {
                details: details.clone(),
            },
        }
    }
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "session error");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
    }
}
