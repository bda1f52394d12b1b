//! Generic error page.

use axum::{extract::Query, response::Html};
use delegated_auth_core::RequestId;
use serde::Deserialize;

use super::{escape, layout};

const DEFAULT_MESSAGE: &str = "An error occurred while processing your request.";

/// Query parameters for the error page.
#[derive(Debug, Deserialize)]
pub struct ErrorQuery {
    message: Option<String>,
}

/// Shows an error message with a request id to quote when reporting it.
pub async fn error_page(Query(query): Query<ErrorQuery>) -> Html<String> {
    let request_id = RequestId::new();
    let message = query
        .message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_MESSAGE.to_string());

    tracing::error!(request_id = %request_id, message = %message, "error page shown");

    let body = format!(
        "<p class=\"message\">{}</p><p>Request ID: <code>{}</code></p>",
        escape(&message),
        request_id
    );
    layout("Error", None, &body)
}
