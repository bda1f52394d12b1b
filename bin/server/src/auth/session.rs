//! Session cookie handling on top of the session store.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use delegated_auth_core::SessionId;
use delegated_auth_platform_access::SessionRecord;
use time::Duration as TimeDuration;

use super::AppState;
use crate::error::SessionError;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "session";

/// Auth state cookie name (for CSRF protection during OIDC flow).
pub const AUTH_STATE_COOKIE: &str = "auth_state";

/// Reads the session id from the cookie jar.
///
/// A cookie that does not parse is treated as no session at all.
pub fn session_id(jar: &CookieJar) -> Option<SessionId> {
    let cookie = jar.get(SESSION_COOKIE)?;
    match cookie.value().parse() {
        Ok(id) => Some(id),
        Err(e) => {
            tracing::debug!(error = %e, "ignoring malformed session cookie");
            None
        }
    }
}

/// Loads the session the request's cookie points at, if it is still live.
pub async fn load(state: &AppState, jar: &CookieJar) -> Result<Option<SessionRecord>, SessionError> {
    let Some(id) = session_id(jar) else {
        return Ok(None);
    };
    Ok(state.sessions.load(&id).await?)
}

/// Writes the session back to the store.
pub async fn save(state: &AppState, record: &SessionRecord) -> Result<(), SessionError> {
    state.sessions.save(record).await?;
    Ok(())
}

/// Builds the session cookie for `id`.
///
/// The cookie lives as long as the browser session; idle expiry is
/// enforced by the store.
pub fn session_cookie(id: SessionId, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

/// Builds a cookie that removes `name` from the browser.
pub fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .max_age(TimeDuration::ZERO)
        .build()
}
