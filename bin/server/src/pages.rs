//! Page handlers for the application.
//!
//! Each page renders server-side HTML through [`layout`]. Anything that
//! came from the request or a token passes through [`escape`] first.

pub mod access_denied;
pub mod dashboard;
pub mod error;
pub mod home;
pub mod panels;
pub mod settings;

pub use access_denied::access_denied_page;
pub use dashboard::dashboard_page;
pub use error::error_page;
pub use home::home_page;
pub use panels::{admin_panel, manager_panel, user_panel};
pub use settings::settings_page;

use axum::response::Html;

/// Escapes text for HTML element content.
pub fn escape(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

/// Wraps `body` in the shared page shell.
///
/// `signed_in_as` is the display name shown in the navigation bar; `None`
/// renders a sign-in link instead. `body` must already be escaped.
pub fn layout(title: &str, signed_in_as: Option<&str>, body: &str) -> Html<String> {
    let account = match signed_in_as {
        Some(name) => format!(
            r#"<span>Hello, {}</span> <form method="post" action="/auth/logout"><button type="submit">Sign out</button></form>"#,
            escape(name)
        ),
        None => r#"<a href="/auth/login">Sign in</a>"#.to_string(),
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8"/>
<meta name="viewport" content="width=device-width, initial-scale=1"/>
<title>{title}</title>
</head>
<body>
<nav>
<a href="/">Home</a>
<a href="/Dashboard">Dashboard</a>
<a href="/Settings">Settings</a>
{account}
</nav>
<main>
<h1>{title}</h1>
{body}
</main>
</body>
</html>"#,
        title = escape(title),
    ))
}

/// Renders `rows` as a two-column definition table.
pub fn table(rows: &[(String, String)]) -> String {
    let mut html = String::from("<table>");
    for (name, value) in rows {
        html.push_str(&format!(
            "<tr><th>{}</th><td>{}</td></tr>",
            escape(name),
            escape(value)
        ));
    }
    html.push_str("</table>");
    html
}
