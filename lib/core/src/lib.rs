//! Core types shared across the delegated-auth workspace.
//!
//! This crate provides the `Result` alias used at fallible boundaries and
//! the strongly-typed identifiers for browser sessions and requests.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ParseIdError, RequestId, SessionId};
