//! OIDC client implementation using the openidconnect crate.

use base64::Engine;
use delegated_auth_core::Result;
use delegated_auth_platform_access::interceptor::{self, ProtocolMessage};
use delegated_auth_platform_access::{
    ChallengeRequest, MULTI_VALUED_CLAIMS, OidcConfig, Principal, SavedTokens,
};
use openidconnect::core::{CoreAuthenticationFlow, CoreClient, CoreProviderMetadata};
use openidconnect::{
    AuthorizationCode, ClientId, ClientSecret, CsrfToken, IssuerUrl, Nonce, OAuth2TokenResponse,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, RequestTokenError, Scope, TokenResponse,
};
use serde::{Deserialize, Serialize};

/// OIDC client for authenticating users.
pub struct OidcClient {
    provider_metadata: CoreProviderMetadata,
    client_id: ClientId,
    client_secret: ClientSecret,
    redirect_url: RedirectUrl,
    config: OidcConfig,
}

/// Data needed to complete the OIDC callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthState {
    pub csrf_token: String,
    pub pkce_verifier: String,
    pub nonce: String,
    /// Local path to return to once signed in.
    pub return_url: String,
}

/// Result of a successful token exchange.
pub struct TokenResult {
    pub principal: Principal,
    pub tokens: SavedTokens,
}

impl OidcClient {
    /// Creates a new OIDC client by discovering the provider metadata.
    pub async fn discover(config: OidcConfig) -> Result<Self, OidcError> {
        let issuer_url = IssuerUrl::new(config.issuer_url().to_string())
            .map_err(|e| OidcError::Configuration(format!("invalid issuer URL: {}", e)))?;

        let http_client = http_client()?;

        let provider_metadata = CoreProviderMetadata::discover_async(issuer_url, &http_client)
            .await
            .map_err(|e| OidcError::Discovery(format!("failed to discover provider: {}", e)))?;

        Self::new(provider_metadata, config)
    }

    /// Creates a client from already known provider metadata.
    pub fn new(provider_metadata: CoreProviderMetadata, config: OidcConfig) -> Result<Self, OidcError> {
        let redirect_url = RedirectUrl::new(config.redirect_uri().to_string())
            .map_err(|e| OidcError::Configuration(format!("invalid redirect URI: {}", e)))?;

        let client_id = ClientId::new(config.client_id().to_string());
        let client_secret = ClientSecret::new(config.client_secret().to_string());

        Ok(Self {
            provider_metadata,
            client_id,
            client_secret,
            redirect_url,
            config,
        })
    }

    /// Generates the authorization URL for a challenge.
    ///
    /// The outbound hook decides the scope and any extra parameters, such
    /// as `acr_values` and `claims` for a step-up challenge.
    pub fn authorization_url(&self, challenge: &ChallengeRequest) -> (String, AuthState) {
        let client = CoreClient::from_provider_metadata(
            self.provider_metadata.clone(),
            self.client_id.clone(),
            Some(self.client_secret.clone()),
        )
        .set_redirect_uri(self.redirect_url.clone());

        let mut message = ProtocolMessage::default();
        interceptor::on_redirect_to_identity_provider(
            &mut message,
            challenge.properties(),
            &self.config.scope_parameter(),
        );

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut auth_request = client
            .authorize_url(
                CoreAuthenticationFlow::AuthorizationCode,
                CsrfToken::new_random,
                Nonce::new_random,
            )
            .set_pkce_challenge(pkce_challenge);

        // `openid` is always sent by the flow itself
        for scope in message.scope().split_whitespace().filter(|s| *s != "openid") {
            auth_request = auth_request.add_scope(Scope::new(scope.to_string()));
        }

        for (name, value) in message.parameters() {
            auth_request = auth_request.add_extra_param(name.to_string(), value.to_string());
        }

        let (auth_url, csrf_token, nonce) = auth_request.url();

        let state = AuthState {
            csrf_token: csrf_token.secret().clone(),
            pkce_verifier: pkce_verifier.secret().clone(),
            nonce: nonce.secret().clone(),
            return_url: challenge.redirect_uri().to_string(),
        };

        (auth_url.to_string(), state)
    }

    /// Exchanges the authorization code for tokens and builds the principal.
    pub async fn exchange_code(&self, code: &str, state: &AuthState) -> Result<TokenResult, OidcError> {
        let client = CoreClient::from_provider_metadata(
            self.provider_metadata.clone(),
            self.client_id.clone(),
            Some(self.client_secret.clone()),
        )
        .set_redirect_uri(self.redirect_url.clone());

        let pkce_verifier = PkceCodeVerifier::new(state.pkce_verifier.clone());

        let http_client = http_client()?;

        let token_request = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .map_err(|e| OidcError::TokenExchange(format!("token endpoint error: {}", e)))?;

        let token_response = token_request
            .set_pkce_verifier(pkce_verifier)
            .request_async(&http_client)
            .await
            .map_err(|e| match &e {
                RequestTokenError::ServerResponse(response) => OidcError::ProviderRejected {
                    code: response.error().to_string(),
                    details: format!("token exchange failed: {}", e),
                },
                _ => OidcError::TokenExchange(format!("token exchange failed: {}", e)),
            })?;

        let id_token = token_response
            .id_token()
            .ok_or_else(|| OidcError::TokenExchange("no ID token in response".to_string()))?;

        // Signature, audience, issuer, expiry and nonce
        let nonce = Nonce::new(state.nonce.clone());
        id_token
            .claims(&client.id_token_verifier(), &nonce)
            .map_err(|e| {
                OidcError::TokenValidation(format!("ID token validation failed: {}", e))
            })?;

        // The verified token is re-read as raw JSON so that provider
        // specific claims (acrs, amr, roles) reach the principal unchanged.
        let id_token_jwt = raw_id_token(&token_response)?;
        let payload = decode_jwt_payload(&id_token_jwt)?;

        let principal = principal_from_payload(&payload, self.config.roles_claim())?;

        Ok(TokenResult {
            principal,
            tokens: SavedTokens {
                id_token: id_token_jwt,
                access_token: token_response.access_token().secret().clone(),
                refresh_token: token_response.refresh_token().map(|t| t.secret().clone()),
            },
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &OidcConfig {
        &self.config
    }
}

fn http_client() -> std::result::Result<reqwest::Client, OidcError> {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(|e| OidcError::Configuration(format!("failed to create HTTP client: {}", e)))
}

/// Pulls the raw `id_token` string out of a token response.
fn raw_id_token<TR>(token_response: &TR) -> std::result::Result<String, OidcError>
where
    TR: Serialize,
{
    let response_json = serde_json::to_value(token_response).map_err(|e| {
        OidcError::TokenValidation(format!("failed to serialize token response: {}", e))
    })?;

    response_json
        .get("id_token")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| OidcError::TokenValidation("no id_token in response".to_string()))
}

/// Builds the principal from a verified ID token payload.
///
/// Array-valued authentication contexts, groups and roles become one
/// claim per value.
fn principal_from_payload(
    payload: &serde_json::Value,
    roles_claim: &str,
) -> std::result::Result<Principal, OidcError> {
    let mut multi_valued: Vec<&str> = MULTI_VALUED_CLAIMS.to_vec();
    multi_valued.push(roles_claim);
    Principal::from_token_payload(payload, &multi_valued)
        .map_err(|e| OidcError::TokenValidation(e.to_string()))
}

/// Decodes the payload of a JWT without verifying it.
///
/// Only use on tokens that were already verified, or for display.
pub fn decode_jwt_payload(token: &str) -> std::result::Result<serde_json::Value, OidcError> {
    // JWT is base64url(header).base64url(payload).signature
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(OidcError::TokenValidation("invalid JWT format".to_string()));
    }

    let payload_bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|e| OidcError::TokenValidation(format!("failed to decode JWT payload: {}", e)))?;

    serde_json::from_slice(&payload_bytes)
        .map_err(|e| OidcError::TokenValidation(format!("failed to parse JWT payload: {}", e)))
}

/// OIDC-related errors.
#[derive(Debug)]
pub enum OidcError {
    /// Configuration error (invalid URLs, etc.)
    Configuration(String),
    /// Failed to discover provider metadata.
    Discovery(String),
    /// Token exchange failed.
    TokenExchange(String),
    /// The token endpoint answered with an OAuth error code.
    ProviderRejected { code: String, details: String },
    /// Token validation failed.
    TokenValidation(String),
}

impl OidcError {
    /// A message safe to show the user: the failing stage, plus the
    /// provider's error code when it sent one. Details stay in the log.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Configuration(_) => "Sign-in is not configured correctly".to_string(),
            Self::Discovery(_) => "Identity provider is unavailable".to_string(),
            Self::TokenExchange(_) => "Token exchange failed".to_string(),
            Self::ProviderRejected { code, .. } => format!("Token exchange failed: {}", code),
            Self::TokenValidation(_) => "ID token validation failed".to_string(),
        }
    }
}

impl std::fmt::Display for OidcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "OIDC configuration error: {}", msg),
            Self::Discovery(msg) => write!(f, "OIDC discovery error: {}", msg),
            Self::TokenExchange(msg) => write!(f, "OIDC token exchange error: {}", msg),
            Self::ProviderRejected { code, details } => {
                write!(f, "OIDC provider rejected token request ({}): {}", code, details)
            }
            Self::TokenValidation(msg) => write!(f, "OIDC token validation error: {}", msg),
        }
    }
}

impl std::error::Error for OidcError {}
