//! Authentication module for the delegated-auth server.
//!
//! This module provides:
//! - OIDC sign-in with the external identity provider, including step-up
//!   challenges that request an authentication context
//! - Session cookies backed by the session store
//! - Authentication and role extractors for Axum routes
//!
//! # Authorization Model
//!
//! Two independent checks guard pages:
//! - **Roles** come from the roles claim of the ID token and are fixed for
//!   the lifetime of the sign-in. Role policies are enforced by the
//!   `Require*` extractors.
//! - **Authentication contexts** (for example MFA) are checked on every
//!   request by the step-up engine. A page that needs one issues at most
//!   one challenge per cycle, then denies.

pub mod middleware;
pub mod oidc;
pub mod routes;
pub mod session;

use crate::config::{SessionConfig, StepUpConfig};
use delegated_auth_platform_access::{AuthContextRef, SessionStore, StepUpEngine};
use std::sync::Arc;

pub use middleware::{OptionalAuth, RequireAdmin, RequireAuth, RequireManager, RequireUser};
pub use oidc::OidcClient;
pub use routes::{callback, login, logout};

/// Shared application state.
pub struct AppState {
    /// OIDC client for authentication.
    pub oidc_client: OidcClient,
    /// Session storage.
    pub sessions: Arc<dyn SessionStore>,
    /// Step-up decision engine.
    pub step_up: StepUpEngine,
    /// Authentication context required by step-up protected pages.
    pub required_context: AuthContextRef,
    /// Session configuration.
    pub session_config: SessionConfig,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        oidc_client: OidcClient,
        sessions: Arc<dyn SessionStore>,
        session_config: SessionConfig,
        step_up_config: StepUpConfig,
    ) -> Self {
        Self {
            oidc_client,
            sessions,
            required_context: step_up_config.required_context(),
            step_up: StepUpEngine::new(step_up_config.targets),
            session_config,
        }
    }
}
