//! Step-up challenge construction.
//!
//! A challenge is what the protocol layer needs to send the browser back to
//! the provider: a property bag carrying the claims request and the raw
//! authentication context value, plus the path to return to afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::claims::AuthContextRef;
use crate::principal::claim_types;

/// Property bag key holding the serialized claims request.
pub const CLAIMS_PROPERTY: &str = "claims";

/// Property bag key holding the raw authentication context value.
pub const ACR_VALUES_PROPERTY: &str = "acr_values";

/// Requirement on a single claim inside a claims request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRequirement {
    /// Whether the claim is essential to the request.
    pub essential: bool,
    /// The value the claim must carry.
    pub value: String,
}

/// An OIDC claims request parameter.
///
/// Only the `id_token` member is modelled; each entry names a claim and
/// the requirement placed on it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsRequest {
    /// Requirements on claims in the ID token.
    pub id_token: BTreeMap<String, ClaimRequirement>,
}

impl ClaimsRequest {
    /// Requests that the ID token carry `required` in the `acrs` claim.
    #[must_use]
    pub fn essential_auth_context(required: &AuthContextRef) -> Self {
        let mut id_token = BTreeMap::new();
        id_token.insert(
            claim_types::ACRS.to_string(),
            ClaimRequirement {
                essential: true,
                value: required.as_str().to_string(),
            },
        );
        Self { id_token }
    }
}

impl fmt::Display for ClaimsRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// Named properties attached to an outbound authentication request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthProperties {
    items: BTreeMap<String, String>,
}

impl AuthProperties {
    /// Creates an empty property bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a property.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.items.insert(key.into(), value.into());
    }

    /// Returns a property value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(String::as_str)
    }

    /// Returns true if no properties are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A request to send the browser to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeRequest {
    redirect_uri: String,
    properties: AuthProperties,
}

impl ChallengeRequest {
    /// A plain sign-in challenge with no extra requirements.
    #[must_use]
    pub fn sign_in(redirect_uri: impl Into<String>) -> Self {
        Self {
            redirect_uri: redirect_uri.into(),
            properties: AuthProperties::new(),
        }
    }

    /// Where the browser returns after re-authenticating.
    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Properties for the protocol layer.
    #[must_use]
    pub fn properties(&self) -> &AuthProperties {
        &self.properties
    }

    /// Returns the serialized claims request, if present.
    #[must_use]
    pub fn claims(&self) -> Option<&str> {
        self.properties.get(CLAIMS_PROPERTY)
    }

    /// Returns the raw authentication context value, if present.
    #[must_use]
    pub fn acr_values(&self) -> Option<&str> {
        self.properties.get(ACR_VALUES_PROPERTY)
    }
}

/// Builds the step-up challenge for `required`, returning to `return_url`.
#[must_use]
pub fn build_challenge(required: &AuthContextRef, return_url: &str) -> ChallengeRequest {
    let claims = ClaimsRequest::essential_auth_context(required);

    let mut properties = AuthProperties::new();
    properties.insert(CLAIMS_PROPERTY, claims.to_string());
    properties.insert(ACR_VALUES_PROPERTY, required.as_str());

    ChallengeRequest {
        redirect_uri: return_url.to_string(),
        properties,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_request_wire_shape() {
        let claims = ClaimsRequest::essential_auth_context(&AuthContextRef::new("c1"));
        assert_eq!(
            claims.to_string(),
            r#"{"id_token":{"acrs":{"essential":true,"value":"c1"}}}"#
        );
    }

    #[test]
    fn claims_request_parses_back() {
        let claims = ClaimsRequest::essential_auth_context(&AuthContextRef::new("c3"));
        let parsed: ClaimsRequest = serde_json::from_str(&claims.to_string()).expect("parse");
        assert_eq!(parsed, claims);
    }

    #[test]
    fn claims_request_with_several_requirements() {
        let mut claims = ClaimsRequest::essential_auth_context(&AuthContextRef::new("c1"));
        claims.id_token.insert(
            "amr".to_string(),
            ClaimRequirement {
                essential: false,
                value: "mfa".to_string(),
            },
        );
        assert_eq!(
            claims.to_string(),
            r#"{"id_token":{"acrs":{"essential":true,"value":"c1"},"amr":{"essential":false,"value":"mfa"}}}"#
        );
    }

    #[test]
    fn challenge_carries_both_properties_and_return_url() {
        let challenge = build_challenge(&AuthContextRef::new("c1"), "/Settings");

        assert_eq!(challenge.redirect_uri(), "/Settings");
        assert_eq!(challenge.acr_values(), Some("c1"));
        let claims = challenge.claims().expect("claims property");
        assert!(claims.contains("acrs"));
        assert!(claims.contains("c1"));
        assert!(claims.contains("\"essential\":true"));
    }

    #[test]
    fn sign_in_challenge_has_no_properties() {
        let challenge = ChallengeRequest::sign_in("/Dashboard");
        assert_eq!(challenge.redirect_uri(), "/Dashboard");
        assert!(challenge.properties().is_empty());
        assert_eq!(challenge.acr_values(), None);
    }
}
