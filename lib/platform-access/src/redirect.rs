//! Redirect destinations used by step-up and failure handling.

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

/// Application paths the browser is sent to outside the happy path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectTargets {
    /// Application root.
    #[serde(default = "default_root_path")]
    pub root_path: String,
    /// Page explaining why access was denied; receives `reason`.
    #[serde(default = "default_access_denied_path")]
    pub access_denied_path: String,
    /// Generic error page; receives `message`.
    #[serde(default = "default_error_path")]
    pub error_path: String,
}

fn default_root_path() -> String {
    "/".to_string()
}

fn default_access_denied_path() -> String {
    "/AccessDenied".to_string()
}

fn default_error_path() -> String {
    "/Error".to_string()
}

impl Default for RedirectTargets {
    fn default() -> Self {
        Self {
            root_path: default_root_path(),
            access_denied_path: default_access_denied_path(),
            error_path: default_error_path(),
        }
    }
}

impl RedirectTargets {
    /// The access-denied page carrying `reason`.
    #[must_use]
    pub fn access_denied(&self, reason: &str) -> String {
        with_query(&self.access_denied_path, "reason", reason)
    }

    /// The error page carrying `message`.
    #[must_use]
    pub fn error(&self, message: &str) -> String {
        with_query(&self.error_path, "message", message)
    }
}

/// Appends a single URL-escaped query parameter to `path`.
#[must_use]
pub fn with_query(path: &str, name: &str, value: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair(name, value)
        .finish();
    format!("{path}?{query}")
}

/// Returns `target` if it is a path on this application, otherwise `/`.
///
/// Return URLs arrive from the query string and cookies; only local
/// absolute paths are honoured.
#[must_use]
pub fn local_path_or_root(target: Option<&str>) -> String {
    match target {
        Some(t) if t.starts_with('/') && !t.starts_with("//") && !t.starts_with("/\\") => {
            t.to_string()
        }
        _ => default_root_path(),
    }
}
