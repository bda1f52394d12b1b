//! Authentication middleware and extractors for Axum.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use delegated_auth_platform_access::redirect::with_query;
use delegated_auth_platform_access::{Principal, RolePolicy, RoleSet, SessionRecord};
use std::sync::Arc;

use super::{AppState, session};
use crate::error::SessionError;

/// Login route unauthenticated callers are sent to.
pub const LOGIN_PATH: &str = "/auth/login";

/// A signed-in caller.
pub struct Authenticated {
    /// The caller's session, as loaded for this request.
    pub session: SessionRecord,
    /// The signed-in principal.
    pub principal: Principal,
}

/// Extractor for requiring an authenticated user.
///
/// If the user is not authenticated, they will be redirected to the login
/// page with the current path as return URL.
pub struct RequireAuth(pub Authenticated);

impl<S> FromRequestParts<S> for RequireAuth
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<AppState>::from_ref(state);
        let jar = CookieJar::from_request_parts(parts, state)
            .await
            .map_err(|_| AuthRejection::InternalError)?;

        let return_url = parts
            .uri
            .path_and_query()
            .map_or("/", |pq| pq.as_str())
            .to_string();

        let session = session::load(&app_state, &jar)
            .await
            .map_err(AuthRejection::Session)?
            .ok_or_else(|| AuthRejection::NotAuthenticated {
                return_url: return_url.clone(),
            })?;

        let principal = session
            .principal()
            .cloned()
            .ok_or(AuthRejection::NotAuthenticated { return_url })?;

        Ok(RequireAuth(Authenticated { session, principal }))
    }
}

/// Extractor for optionally getting the authenticated user.
///
/// Returns None if the user is not authenticated.
pub struct OptionalAuth(pub Option<Authenticated>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match RequireAuth::from_request_parts(parts, state).await {
            Ok(RequireAuth(user)) => Ok(OptionalAuth(Some(user))),
            Err(_) => Ok(OptionalAuth(None)),
        }
    }
}

/// Requires a signed-in caller whose roles satisfy `policy`.
async fn require_policy<S>(
    parts: &mut Parts,
    state: &S,
    policy: RolePolicy,
) -> Result<Authenticated, AuthRejection>
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;
    let app_state = Arc::<AppState>::from_ref(state);

    let roles = RoleSet::from_principal(&user.principal, app_state.oidc_client.config().roles_claim());
    if !policy.is_satisfied_by(&roles) {
        tracing::warn!(
            policy = %policy,
            subject = user.principal.subject(),
            "role policy not satisfied"
        );
        let reason = format!(
            "The '{}' policy requires the '{}' role.",
            policy,
            policy.required_role()
        );
        return Err(AuthRejection::Forbidden {
            location: app_state.step_up.targets().access_denied(&reason),
        });
    }

    Ok(user)
}

/// Extractor for requiring an authenticated admin user.
pub struct RequireAdmin(pub Authenticated);

impl<S> FromRequestParts<S> for RequireAdmin
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        require_policy(parts, state, RolePolicy::AdminOnly)
            .await
            .map(RequireAdmin)
    }
}

/// Extractor for requiring an authenticated manager.
pub struct RequireManager(pub Authenticated);

impl<S> FromRequestParts<S> for RequireManager
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        require_policy(parts, state, RolePolicy::ManagerOnly)
            .await
            .map(RequireManager)
    }
}

/// Extractor for requiring an authenticated user holding the user role.
pub struct RequireUser(pub Authenticated);

impl<S> FromRequestParts<S> for RequireUser
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        require_policy(parts, state, RolePolicy::UserOnly)
            .await
            .map(RequireUser)
    }
}

/// Rejection type for authentication extractors.
#[derive(Debug)]
pub enum AuthRejection {
    NotAuthenticated { return_url: String },
    Forbidden { location: String },
    Session(SessionError),
    InternalError,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::NotAuthenticated { return_url } => {
                Redirect::to(&with_query(LOGIN_PATH, "return_url", &return_url)).into_response()
            }
            Self::Forbidden { location } => Redirect::to(&location).into_response(),
            Self::Session(e) => e.into_response(),
            Self::InternalError => {
                (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                    .into_response()
            }
        }
    }
}
