//! Home page.

use axum::response::Html;

use super::{escape, layout};
use crate::auth::OptionalAuth;

/// Renders the home page with the caller's sign-in state.
pub async fn home_page(OptionalAuth(user): OptionalAuth) -> Html<String> {
    match user {
        Some(user) => {
            let name = user
                .principal
                .display_name()
                .or_else(|| user.principal.email())
                .unwrap_or("signed-in user");
            let body = format!(
                "<p>You are signed in as <strong>{}</strong>.</p>\
                 <p>Open <a href=\"/Settings\">Settings</a> to try a step-up challenge.</p>",
                escape(name)
            );
            layout("Home", Some(name), &body)
        }
        None => layout(
            "Home",
            None,
            "<p>You are not signed in.</p><p><a href=\"/auth/login\">Sign in</a> to continue.</p>",
        ),
    }
}
