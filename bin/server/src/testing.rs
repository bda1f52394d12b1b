//! Fixtures shared by the server tests.

use delegated_auth_platform_access::OidcConfig;
use openidconnect::core::CoreProviderMetadata;
use serde_json::json;

use crate::auth::OidcClient;

pub const ISSUER: &str = "https://login.example.com/tenant/v2.0";
pub const AUTHORIZATION_ENDPOINT: &str = "https://login.example.com/tenant/oauth2/v2.0/authorize";

/// An OIDC client over static provider metadata; never touches the network.
pub fn oidc_client() -> OidcClient {
    let metadata: CoreProviderMetadata = serde_json::from_value(json!({
        "issuer": ISSUER,
        "authorization_endpoint": AUTHORIZATION_ENDPOINT,
        "token_endpoint": "https://login.example.com/tenant/oauth2/v2.0/token",
        "jwks_uri": "https://login.example.com/tenant/discovery/v2.0/keys",
        "response_types_supported": ["code"],
        "subject_types_supported": ["pairwise"],
        "id_token_signing_alg_values_supported": ["RS256"]
    }))
    .expect("provider metadata");

    let config = OidcConfig::new(
        ISSUER.to_string(),
        "client-id".to_string(),
        "client-secret".to_string(),
        "http://localhost:3000/auth/callback".to_string(),
    );

    OidcClient::new(metadata, config).expect("oidc client")
}
