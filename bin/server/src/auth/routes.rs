//! Authentication routes for login, callback, and logout.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use delegated_auth_core::SessionId;
use delegated_auth_platform_access::interceptor::{self, FailureRedirect};
use delegated_auth_platform_access::redirect::local_path_or_root;
use delegated_auth_platform_access::{AuthenticationError, ChallengeRequest, SessionRecord};
use serde::Deserialize;
use std::sync::Arc;
use time::Duration as TimeDuration;

use super::session::{self, AUTH_STATE_COOKIE, SESSION_COOKIE};
use super::{
    AppState,
    oidc::{AuthState, OidcError},
};
use crate::error::SessionError;

/// Lifetime of the auth state cookie; a sign-in must finish within it.
const AUTH_STATE_MINUTES: i64 = 10;

/// Query parameters for the login route.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    return_url: Option<String>,
}

/// Query parameters for the OIDC callback.
///
/// A successful response carries `code` and `state`; a failed one carries
/// `error` and usually `error_description`.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Initiates the OIDC login flow by redirecting to the identity provider.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LoginQuery>,
    jar: CookieJar,
) -> Result<Response, SessionError> {
    let return_url = local_path_or_root(query.return_url.as_deref());
    challenge(&state, jar, &ChallengeRequest::sign_in(return_url))
}

/// Sends the browser to the identity provider with `request`.
///
/// The CSRF token, nonce, PKCE verifier and return URL are kept in a short
/// lived cookie until the provider calls back.
pub fn challenge(
    state: &AppState,
    jar: CookieJar,
    request: &ChallengeRequest,
) -> Result<Response, SessionError> {
    let (auth_url, auth_state) = state.oidc_client.authorization_url(request);

    let auth_state_json =
        serde_json::to_string(&auth_state).map_err(|e| SessionError::AuthStateEncoding {
            details: e.to_string(),
        })?;

    let cookie = Cookie::build((AUTH_STATE_COOKIE, auth_state_json))
        .path("/")
        .http_only(true)
        .secure(state.session_config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::minutes(AUTH_STATE_MINUTES));

    tracing::debug!(
        return_url = request.redirect_uri(),
        acr_values = request.acr_values(),
        "redirecting to identity provider"
    );

    Ok((jar.add(cookie), Redirect::to(&auth_url)).into_response())
}

/// Handles the OIDC callback after the user authenticates with the identity provider.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Result<Response, SessionError> {
    let targets = state.step_up.targets();
    let auth_state = read_auth_state(&jar);
    let jar = jar.add(session::removal_cookie(AUTH_STATE_COOKIE));

    if let Some(error) = query.error {
        let message = match query.error_description {
            Some(description) => format!("{}: {}", error, description),
            None => error,
        };
        let failure = interceptor::on_remote_failure(Some(&message));
        return Ok(redirect(jar, &failure.location(targets)));
    }

    // Without the state this browser started with, the response cannot
    // be correlated to a sign-in.
    let auth_state = match (auth_state, query.state.as_deref()) {
        (Some(auth_state), Some(returned)) if auth_state.csrf_token == returned => auth_state,
        _ => {
            let message = AuthenticationError::CorrelationFailed.to_string();
            let failure = interceptor::on_remote_failure(Some(&message));
            return Ok(redirect(jar, &failure.location(targets)));
        }
    };

    let Some(code) = query.code else {
        let failure = interceptor::on_authentication_failed("authorization code missing");
        return Ok(redirect(jar, &failure.location(targets)));
    };

    let token_result = match state.oidc_client.exchange_code(&code, &auth_state).await {
        Ok(token_result) => token_result,
        Err(report) => {
            tracing::error!(error = %report, "sign-in could not be completed");
            let failure = authentication_failure(report.current_context());
            return Ok(redirect(jar, &failure.location(targets)));
        }
    };

    // Renew the session id on sign-in. Values such as an outstanding
    // step-up attempt move to the new id.
    let new_id = SessionId::new();
    let mut record = match session::load(&state, &jar).await? {
        Some(existing) => {
            state.sessions.delete(&existing.id()).await?;
            existing.renew(new_id)
        }
        None => SessionRecord::new(new_id),
    };
    record.sign_in(token_result.principal, token_result.tokens);
    session::save(&state, &record).await?;

    tracing::info!(
        session_id = %record.id(),
        subject = record.principal().and_then(|p| p.subject()),
        "user signed in"
    );

    let jar = jar.add(session::session_cookie(
        record.id(),
        state.session_config.secure_cookies,
    ));
    let return_url = local_path_or_root(Some(&auth_state.return_url));

    Ok(redirect(jar, &return_url))
}

/// Logs out the user by deleting their session.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Response, SessionError> {
    if let Some(session_id) = session::session_id(&jar) {
        state.sessions.delete(&session_id).await?;
        tracing::info!(session_id = %session_id, "user signed out");
    }

    let jar = jar.add(session::removal_cookie(SESSION_COOKIE));
    Ok(redirect(jar, &state.step_up.targets().root_path))
}

/// Maps a failed code exchange to the error page, showing only the
/// sanitized message.
fn authentication_failure(error: &OidcError) -> FailureRedirect {
    interceptor::on_authentication_failed(&error.public_message())
}

fn read_auth_state(jar: &CookieJar) -> Option<AuthState> {
    let cookie = jar.get(AUTH_STATE_COOKIE)?;
    match serde_json::from_str(cookie.value()) {
        Ok(auth_state) => Some(auth_state),
        Err(e) => {
            tracing::warn!(error = %e, "invalid auth state cookie");
            None
        }
    }
}

fn redirect(jar: CookieJar, location: &str) -> Response {
    (jar, Redirect::to(location)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use delegated_auth_platform_access::RedirectTargets;

    #[test]
    fn authentication_failure_shows_provider_code_only() {
        let error = OidcError::ProviderRejected {
            code: "invalid_grant".to_string(),
            details: "https://login.example.com/token said no".to_string(),
        };
        let location = authentication_failure(&error).location(&RedirectTargets::default());
        assert_eq!(location, "/Error?message=Token+exchange+failed%3A+invalid_grant");
    }

    #[test]
    fn authentication_failure_hides_transport_errors() {
        let error = OidcError::TokenExchange("connection refused (10.0.0.4:443)".to_string());
        let location = authentication_failure(&error).location(&RedirectTargets::default());
        assert_eq!(location, "/Error?message=Token+exchange+failed");
    }

    #[test]
    fn read_auth_state_rejects_invalid_json() {
        let jar = CookieJar::new().add(Cookie::new(AUTH_STATE_COOKIE, "{not json"));
        assert!(read_auth_state(&jar).is_none());
    }
}
