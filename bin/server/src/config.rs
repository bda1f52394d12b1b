//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables, e.g.
//! `OIDC__CLIENT_ID` or `STEP_UP__REQUIRED_CONTEXT`.
//!
//! See [`OidcConfig`](delegated_auth_platform_access::OidcConfig) for
//! provider configuration.

use delegated_auth_platform_access::{
    AuthContextRef, DEFAULT_MAX_SESSIONS, OidcConfig, RedirectTargets,
};
use serde::Deserialize;

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Session configuration.
    #[serde(default)]
    pub session: SessionConfig,

    /// Step-up configuration.
    #[serde(default)]
    pub step_up: StepUpConfig,

    /// OIDC authentication configuration.
    pub oidc: OidcConfig,
}

fn default_bind_address() -> String {
    "127.0.0.1:3000".to_string()
}

/// Session-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Minutes of inactivity after which a session is dropped.
    #[serde(default = "default_idle_timeout_minutes")]
    pub idle_timeout_minutes: i64,

    /// Interval between session cleanup runs, in seconds.
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,

    /// Most sessions held at once; sign-ins beyond it fail until sessions expire.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Defaults to true; set to false for local HTTP development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,
}

fn default_idle_timeout_minutes() -> i64 {
    10
}

fn default_cleanup_interval_seconds() -> u64 {
    300
}

fn default_max_sessions() -> usize {
    DEFAULT_MAX_SESSIONS
}

fn default_secure_cookies() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_minutes: default_idle_timeout_minutes(),
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
            max_sessions: default_max_sessions(),
            secure_cookies: default_secure_cookies(),
        }
    }
}

impl SessionConfig {
    /// Returns the idle timeout as a duration.
    #[must_use]
    pub fn idle_timeout(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.idle_timeout_minutes)
    }
}

/// Step-up authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StepUpConfig {
    /// Authentication context the settings page requires.
    #[serde(default = "default_required_context")]
    pub required_context: String,

    /// Where denials and failures are sent.
    #[serde(flatten)]
    pub targets: RedirectTargets,
}

fn default_required_context() -> String {
    "c1".to_string()
}

impl Default for StepUpConfig {
    fn default() -> Self {
        Self {
            required_context: default_required_context(),
            targets: RedirectTargets::default(),
        }
    }
}

impl StepUpConfig {
    /// Returns the required authentication context.
    #[must_use]
    pub fn required_context(&self) -> AuthContextRef {
        AuthContextRef::new(self.required_context.as_str())
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_config_has_correct_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.idle_timeout_minutes, 10);
        assert_eq!(config.idle_timeout(), chrono::Duration::minutes(10));
        assert_eq!(config.cleanup_interval_seconds, 300);
        assert_eq!(config.max_sessions, 10_000);
        assert!(config.secure_cookies);
    }

    #[test]
    fn step_up_config_has_correct_defaults() {
        let config = StepUpConfig::default();
        assert_eq!(config.required_context().as_str(), "c1");
        assert_eq!(config.targets.access_denied_path, "/AccessDenied");
        assert_eq!(config.targets.error_path, "/Error");
    }

    #[test]
    fn server_config_deserializes_with_defaults() {
        let json = r#"{
            "oidc": {
                "issuer_url": "https://login.example.com/tenant/v2.0",
                "client_id": "client",
                "client_secret": "secret",
                "redirect_uri": "http://localhost:3000/auth/callback"
            },
            "step_up": { "required_context": "c2", "error_path": "/Oops" }
        }"#;

        let config: ServerConfig = serde_json::from_str(json).expect("deserialize");

        assert_eq!(config.bind_address, "127.0.0.1:3000");
        assert_eq!(config.step_up.required_context, "c2");
        assert_eq!(config.step_up.targets.error_path, "/Oops");
        assert_eq!(config.step_up.targets.root_path, "/");
        assert_eq!(config.session.idle_timeout_minutes, 10);
        assert_eq!(config.session.max_sessions, 10_000);
    }
}
