//! Error types for the platform-access crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `AuthenticationError`: token and correlation failures during sign-in
//! - `ClaimError`: a claim is present but its value cannot be interpreted
//! - `SessionStoreError`: the session backend failed
//!
//! A missing claim is not an error anywhere in this crate.

use std::fmt;

/// Errors from authentication operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    /// Token could not be decoded or validated.
    InvalidToken { reason: String },
    /// The callback did not match a login started by this browser.
    CorrelationFailed,
}

impl fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidToken { reason } => {
                write!(f, "invalid token: {reason}")
            }
            Self::CorrelationFailed => {
                write!(f, "Correlation failed.")
            }
        }
    }
}

impl std::error::Error for AuthenticationError {}

/// Errors from interpreting a claim value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimError {
    /// The claim value does not have the expected shape.
    Malformed { claim: String, reason: String },
}

impl fmt::Display for ClaimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed { claim, reason } => {
                write!(f, "malformed '{claim}' claim: {reason}")
            }
        }
    }
}

impl std::error::Error for ClaimError {}

/// Errors from the session store backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStoreError {
    /// The backend could not complete the operation.
    Unavailable { details: String },
}

impl fmt::Display for SessionStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { details } => {
                write!(f, "session store unavailable: {details}")
            }
        }
    }
}

impl std::error::Error for SessionStoreError {}
