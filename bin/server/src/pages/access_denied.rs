//! Access denied page.

use axum::{extract::Query, response::Html};
use serde::Deserialize;

use super::{escape, layout};
use crate::auth::OptionalAuth;

const DEFAULT_REASON: &str = "You do not have permission to access this resource.";

/// Query parameters for the access denied page.
#[derive(Debug, Deserialize)]
pub struct AccessDeniedQuery {
    reason: Option<String>,
}

/// Explains why a request was denied.
pub async fn access_denied_page(
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<AccessDeniedQuery>,
) -> Html<String> {
    let reason = query
        .reason
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_REASON.to_string());

    let name = user.as_ref().and_then(|u| u.principal.display_name());
    tracing::warn!(
        user = name.unwrap_or("anonymous"),
        reason = %reason,
        "access denied"
    );

    let body = format!(
        "<p class=\"reason\">{}</p><p><a href=\"/\">Back to home</a></p>",
        escape(&reason)
    );
    layout("Access Denied", name, &body)
}
