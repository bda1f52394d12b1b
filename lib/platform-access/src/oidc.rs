//! OIDC (OpenID Connect) provider configuration.
//!
//! Fields with defaults can be omitted when loading from environment
//! variables.

use serde::{Deserialize, Serialize};

/// Configuration for the OIDC identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OidcConfig {
    /// The OIDC issuer URL, used for discovery.
    issuer_url: String,
    /// The OAuth2 client ID registered with the provider.
    client_id: String,
    /// The OAuth2 client secret.
    client_secret: String,
    /// The redirect URI for the callback (e.g., "https://app.example.com/auth/callback").
    redirect_uri: String,
    /// Scopes to request as a comma-separated string.
    /// Default: "openid,profile,email,offline_access"
    #[serde(default = "default_scopes")]
    scopes: String,
    /// The claim name in the ID token that carries application roles.
    /// Default: "roles"
    #[serde(default = "default_roles_claim")]
    roles_claim: String,
}

fn default_scopes() -> String {
    "openid,profile,email,offline_access".to_string()
}

fn default_roles_claim() -> String {
    "roles".to_string()
}

impl OidcConfig {
    /// Creates a new OIDC configuration with defaults for optional fields.
    #[must_use]
    pub fn new(
        issuer_url: String,
        client_id: String,
        client_secret: String,
        redirect_uri: String,
    ) -> Self {
        Self {
            issuer_url,
            client_id,
            client_secret,
            redirect_uri,
            scopes: default_scopes(),
            roles_claim: default_roles_claim(),
        }
    }

    /// Returns the OIDC issuer URL.
    #[must_use]
    pub fn issuer_url(&self) -> &str {
        &self.issuer_url
    }

    /// Returns the OAuth2 client ID.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns the OAuth2 client secret.
    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Returns the OAuth2 redirect URI.
    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Returns the scopes to request, parsed from the comma-separated string.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.scopes
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Returns the scopes as a space-separated `scope` parameter value.
    #[must_use]
    pub fn scope_parameter(&self) -> String {
        self.scopes().join(" ")
    }

    /// Returns the name of the claim carrying application roles.
    #[must_use]
    pub fn roles_claim(&self) -> &str {
        &self.roles_claim
    }

    /// Sets the name of the claim carrying application roles.
    #[must_use]
    pub fn with_roles_claim(mut self, claim: String) -> Self {
        self.roles_claim = claim;
        self
    }
}
