//! Dashboard page showing the tokens saved with the session.

use axum::response::Html;
use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{escape, layout, table};
use crate::auth::{RequireAuth, oidc::decode_jwt_payload};

/// Decoded view of a saved token.
#[derive(Debug, Default)]
struct TokenView {
    claims: Vec<(String, String)>,
    expires_at: Option<DateTime<Utc>>,
}

impl TokenView {
    /// Decodes `token` for display. Tokens that are not JWTs (opaque
    /// access tokens) produce an empty view.
    fn decode(kind: &'static str, token: &str) -> Self {
        let payload = match decode_jwt_payload(token) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::debug!(token = kind, error = %e, "token is not a readable JWT");
                return Self::default();
            }
        };

        let Value::Object(map) = payload else {
            return Self::default();
        };

        let expires_at = map
            .get("exp")
            .and_then(Value::as_i64)
            .and_then(|exp| DateTime::from_timestamp(exp, 0));

        let claims = map
            .into_iter()
            .map(|(name, value)| {
                let value = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (name, value)
            })
            .collect();

        Self { claims, expires_at }
    }

    fn render(&self, heading: &str) -> String {
        let expiry = self
            .expires_at
            .map_or_else(|| "unknown".to_string(), |at| at.to_rfc3339());
        if self.claims.is_empty() {
            return format!(
                "<h2>{}</h2><p>Not a readable JWT.</p>",
                escape(heading)
            );
        }
        format!(
            "<h2>{}</h2><p>Expires: {}</p>{}",
            escape(heading),
            escape(&expiry),
            table(&self.claims)
        )
    }
}

/// Renders the signed-in user's token details.
pub async fn dashboard_page(RequireAuth(user): RequireAuth) -> Html<String> {
    let name = user.principal.display_name();

    let Some(tokens) = user.session.tokens() else {
        return layout(
            "Dashboard",
            name,
            "<p>No tokens are saved with this session.</p>",
        );
    };

    let id_token = TokenView::decode("id_token", &tokens.id_token);
    let access_token = TokenView::decode("access_token", &tokens.access_token);
    let refresh = if tokens.refresh_token.is_some() {
        "held"
    } else {
        "not issued"
    };

    let body = format!(
        "<p>Session started: {}</p>{}{}<h2>Refresh token</h2><p>{}</p>",
        escape(&user.session.created_at().to_rfc3339()),
        id_token.render("ID token"),
        access_token.render("Access token"),
        refresh
    );

    layout("Dashboard", name, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use serde_json::json;

    fn jwt(payload: &Value) -> String {
        let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
        format!(
            "{}.{}.sig",
            engine.encode(br#"{"alg":"none"}"#),
            engine.encode(payload.to_string())
        )
    }

    #[test]
    fn decodes_claims_and_expiry() {
        let view = TokenView::decode(
            "id_token",
            &jwt(&json!({"acrs": "c1", "amr": ["pwd", "mfa"], "exp": 1_700_000_000})),
        );
        assert_eq!(
            view.expires_at,
            DateTime::from_timestamp(1_700_000_000, 0)
        );
        assert!(view.claims.contains(&("acrs".to_string(), "c1".to_string())));
        assert!(
            view.claims
                .contains(&("amr".to_string(), r#"["pwd","mfa"]"#.to_string()))
        );
    }

    #[test]
    fn opaque_token_is_empty() {
        let view = TokenView::decode("access_token", "opaque");
        assert!(view.claims.is_empty());
        assert!(view.expires_at.is_none());
        assert!(view.render("Access token").contains("Not a readable JWT"));
    }

    #[test]
    fn render_escapes_claim_values() {
        let view = TokenView::decode("id_token", &jwt(&json!({"name": "<b>x</b>"})));
        let html = view.render("ID token");
        assert!(html.contains("&lt;b&gt;x&lt;/b&gt;"));
        assert!(html.contains("Expires: unknown"));
    }
}
