//! Hooks run by the protocol layer around provider round trips.
//!
//! Outbound, [`on_redirect_to_identity_provider`] fills in the
//! authorization request from the challenge properties. Inbound,
//! [`on_remote_failure`] and [`on_authentication_failed`] turn a failure
//! into a redirect. Every inbound failure is handled here; none falls
//! through to a default error page.

use std::collections::BTreeMap;

use crate::challenge::{ACR_VALUES_PROPERTY, AuthProperties, CLAIMS_PROPERTY};
use crate::redirect::RedirectTargets;

/// Marker text of a state/correlation mismatch on the callback.
pub const CORRELATION_FAILED: &str = "Correlation failed";

const DEFAULT_FAILURE_MESSAGE: &str = "Authentication failed";

/// The authorization request about to be sent to the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtocolMessage {
    scope: String,
    parameters: BTreeMap<String, String>,
}

impl ProtocolMessage {
    /// Creates a message requesting `scope` (space separated).
    #[must_use]
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// Returns the requested scope.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Replaces the requested scope.
    pub fn set_scope(&mut self, scope: impl Into<String>) {
        self.scope = scope.into();
    }

    /// Sets an extra request parameter.
    pub fn set_parameter(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.parameters.insert(name.into(), value.into());
    }

    /// Returns an extra request parameter.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }

    /// Iterates the extra request parameters in name order.
    pub fn parameters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.parameters
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

/// Prepares the outbound authorization request.
///
/// Forces the configured scope and forwards the `acr_values` and `claims`
/// challenge properties as request parameters when present.
pub fn on_redirect_to_identity_provider(
    message: &mut ProtocolMessage,
    properties: &AuthProperties,
    scope: &str,
) {
    message.set_scope(scope);

    if let Some(acr_values) = properties.get(ACR_VALUES_PROPERTY) {
        tracing::debug!(acr_values, "requesting authentication context");
        message.set_parameter(ACR_VALUES_PROPERTY, acr_values);
    }

    if let Some(claims) = properties.get(CLAIMS_PROPERTY) {
        message.set_parameter(CLAIMS_PROPERTY, claims);
    }
}

/// Where the browser goes after an inbound failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureRedirect {
    /// Benign correlation artifact; back to the application root.
    Root,
    /// Generic error page with the failure message.
    Error { message: String },
}

impl FailureRedirect {
    /// Resolves the redirect location.
    #[must_use]
    pub fn location(&self, targets: &RedirectTargets) -> String {
        match self {
            Self::Root => targets.root_path.clone(),
            Self::Error { message } => targets.error(message),
        }
    }
}

/// Classifies a failure reported on the provider callback.
///
/// Correlation failures happen when a round trip (for example a password
/// change) returns without the state this browser started with; they are
/// dropped silently. Anything else goes to the error page.
#[must_use]
pub fn on_remote_failure(failure: Option<&str>) -> FailureRedirect {
    match failure {
        Some(message) if message.contains(CORRELATION_FAILED) => {
            tracing::warn!(failure = message, "correlation failed, returning to root");
            FailureRedirect::Root
        }
        Some(message) => {
            tracing::error!(failure = message, "remote authentication failure");
            FailureRedirect::Error {
                message: message.to_string(),
            }
        }
        None => {
            tracing::error!("remote authentication failure without a message");
            FailureRedirect::Error {
                message: DEFAULT_FAILURE_MESSAGE.to_string(),
            }
        }
    }
}

/// Handles a failure while validating the provider's response.
#[must_use]
pub fn on_authentication_failed(message: &str) -> FailureRedirect {
    tracing::error!(failure = message, "authentication failed");
    FailureRedirect::Error {
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::build_challenge;
    use crate::claims::AuthContextRef;

    const SCOPE: &str = "openid profile email offline_access";

    #[test]
    fn outbound_forwards_step_up_properties() {
        let challenge = build_challenge(&AuthContextRef::new("c1"), "/Settings");
        let mut message = ProtocolMessage::new("openid");

        on_redirect_to_identity_provider(&mut message, challenge.properties(), SCOPE);

        assert_eq!(message.scope(), SCOPE);
        assert_eq!(message.parameter("acr_values"), Some("c1"));
        assert_eq!(message.parameter("claims"), challenge.claims());
    }

    #[test]
    fn outbound_plain_sign_in_adds_no_parameters() {
        let mut message = ProtocolMessage::new("openid");

        on_redirect_to_identity_provider(&mut message, &AuthProperties::new(), SCOPE);

        assert_eq!(message.scope(), SCOPE);
        assert_eq!(message.parameters().count(), 0);
    }

    #[test]
    fn outbound_acr_values_without_claims() {
        let mut properties = AuthProperties::new();
        properties.insert("acr_values", "c2");
        let mut message = ProtocolMessage::default();

        on_redirect_to_identity_provider(&mut message, &properties, SCOPE);

        assert_eq!(
            message.parameters().collect::<Vec<_>>(),
            vec![("acr_values", "c2")]
        );
    }

    #[test]
    fn correlation_failure_goes_to_root() {
        let redirect = on_remote_failure(Some("Correlation failed: state cookie not found"));
        assert_eq!(redirect, FailureRedirect::Root);
        assert_eq!(redirect.location(&RedirectTargets::default()), "/");
    }

    #[test]
    fn other_remote_failure_goes_to_error_page() {
        let redirect = on_remote_failure(Some("invalid_grant"));
        assert_eq!(
            redirect.location(&RedirectTargets::default()),
            "/Error?message=invalid_grant"
        );
    }

    #[test]
    fn remote_failure_without_message_uses_default() {
        let redirect = on_remote_failure(None);
        assert_eq!(
            redirect.location(&RedirectTargets::default()),
            "/Error?message=Authentication+failed"
        );
    }

    #[test]
    fn authentication_failed_always_goes_to_error_page() {
        let redirect = on_authentication_failed("Correlation failed.");
        assert_eq!(
            redirect,
            FailureRedirect::Error {
                message: "Correlation failed.".to_string()
            }
        );
        assert!(
            redirect
                .location(&RedirectTargets::default())
                .starts_with("/Error?message=Correlation+failed.")
        );
    }
}
