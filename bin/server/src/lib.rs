//! delegated-auth web server.
//!
//! Serves a small set of pages behind OIDC sign-in. The settings page
//! requires an additional authentication context and uses step-up
//! challenges to obtain it.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod pages;

#[cfg(test)]
pub(crate) mod testing;
