//! Settings page, protected by a step-up authentication context.

use axum::{
    extract::State,
    http::Uri,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use delegated_auth_platform_access::{AccessDecision, StepUpGrant};
use std::sync::Arc;

use super::{escape, layout, table};
use crate::auth::{AppState, RequireAuth, routes, session};
use crate::error::SessionError;

/// Serves the settings page once the required authentication context is
/// present, challenging the provider for it at most once per cycle.
pub async fn settings_page(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
    uri: Uri,
    jar: CookieJar,
) -> Result<Response, SessionError> {
    let mut session = user.session;
    let return_url = uri.path_and_query().map_or("/Settings", |pq| pq.as_str());

    let decision = state.step_up.evaluate_access(
        &user.principal,
        &mut session,
        &state.required_context,
        return_url,
    );
    session::save(&state, &session).await?;

    match decision {
        AccessDecision::Satisfied(grant) => {
            let body = render(&grant, state.required_context.as_str());
            Ok(layout("Settings", grant.display_name.as_deref(), &body).into_response())
        }
        AccessDecision::RedirectChallenge(challenge) => routes::challenge(&state, jar, &challenge),
        AccessDecision::RedirectDenied(denial) => {
            Ok(Redirect::to(denial.location()).into_response())
        }
    }
}

fn render(grant: &StepUpGrant, required_context: &str) -> String {
    let methods = if grant.authentication_methods.is_empty() {
        "none reported".to_string()
    } else {
        grant.authentication_methods.join(", ")
    };

    let rows = [
        (
            "Email".to_string(),
            grant.email.clone().unwrap_or_default(),
        ),
        (
            "Display name".to_string(),
            grant.display_name.clone().unwrap_or_default(),
        ),
        ("MFA completed".to_string(), "Yes".to_string()),
        (
            "Satisfied by".to_string(),
            format!("{} = {}", grant.satisfied_by.claim_name(), required_context),
        ),
        ("Authentication methods".to_string(), methods),
    ];

    format!(
        "<p>Authentication context <code>{}</code> is satisfied for this session.</p>{}",
        escape(required_context),
        table(&rows)
    )
}
