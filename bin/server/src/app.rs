//! Route table for the application.

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::auth::{self, AppState};
use crate::pages;

/// Builds the application router over `state`.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Auth routes
        .route("/auth/login", get(auth::login))
        .route("/auth/callback", get(auth::callback))
        .route("/auth/logout", get(auth::logout).post(auth::logout))
        // Pages
        .route("/", get(pages::home_page))
        .route("/Dashboard", get(pages::dashboard_page))
        .route("/Settings", get(pages::settings_page))
        .route("/AdminPanel", get(pages::admin_panel))
        .route("/ManagerPanel", get(pages::manager_panel))
        .route("/UserPanel", get(pages::user_panel))
        .route("/AccessDenied", get(pages::access_denied_page))
        .route("/Error", get(pages::error_page))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::oidc::AuthState;
    use crate::config::{SessionConfig, StepUpConfig};
    use crate::testing;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use delegated_auth_core::SessionId;
    use delegated_auth_platform_access::{
        MemorySessionStore, Principal, SavedTokens, SessionRecord, SessionStore, attempt,
    };
    use tower::ServiceExt;

    struct Harness {
        router: Router,
        sessions: Arc<MemorySessionStore>,
    }

    impl Harness {
        fn new() -> Self {
            let sessions = Arc::new(MemorySessionStore::new(chrono::Duration::minutes(10)));
            let state = AppState::new(
                testing::oidc_client(),
                sessions.clone(),
                SessionConfig::default(),
                StepUpConfig::default(),
            );
            Self {
                router: router(Arc::new(state)),
                sessions,
            }
        }

        async fn signed_in(&self, principal: Principal) -> SessionId {
            let id = SessionId::new();
            let mut record = SessionRecord::new(id);
            record.sign_in(
                principal,
                SavedTokens {
                    id_token: "header.payload.sig".to_string(),
                    access_token: "opaque".to_string(),
                    refresh_token: None,
                },
            );
            self.sessions.save(&record).await.expect("save session");
            id
        }

        async fn get(&self, uri: &str, session: Option<SessionId>) -> Response {
            let cookie = session.map(|id| format!("session={}", id));
            self.get_with_cookie(uri, cookie.as_deref()).await
        }

        async fn get_with_cookie(&self, uri: &str, cookie: Option<&str>) -> Response {
            let mut request = Request::builder().uri(uri);
            if let Some(cookie) = cookie {
                request = request.header(header::COOKIE, cookie);
            }
            self.router
                .clone()
                .oneshot(request.body(Body::empty()).expect("request"))
                .await
                .expect("response")
        }

        async fn attempted(&self, id: SessionId) -> bool {
            let record = self
                .sessions
                .load(&id)
                .await
                .expect("load")
                .expect("session present");
            attempt::was_attempted(&record)
        }
    }

    fn location(response: &Response) -> String {
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .expect("location header")
            .to_string()
    }

    async fn body(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        String::from_utf8(bytes.to_vec()).expect("utf-8")
    }

    fn alice() -> Principal {
        Principal::default()
            .with_claim("sub", "alice-sub")
            .with_claim("name", "Alice")
            .with_claim("email", "alice@example.com")
    }

    #[tokio::test]
    async fn home_without_session_offers_sign_in() {
        let harness = Harness::new();
        let response = harness.get("/", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body(response).await.contains("You are not signed in"));
    }

    #[tokio::test]
    async fn home_with_session_greets_user() {
        let harness = Harness::new();
        let id = harness.signed_in(alice()).await;
        let response = harness.get("/", Some(id)).await;
        assert!(body(response).await.contains("Alice"));
    }

    #[tokio::test]
    async fn settings_requires_sign_in() {
        let harness = Harness::new();
        let response = harness.get("/Settings", None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/auth/login?return_url=%2FSettings");
    }

    #[tokio::test]
    async fn login_redirects_to_provider_with_scope() {
        let harness = Harness::new();
        let response = harness.get("/auth/login?return_url=%2FDashboard", None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let target = location(&response);
        assert!(target.starts_with(testing::AUTHORIZATION_ENDPOINT));
        assert!(target.contains("offline_access"));
        assert!(!target.contains("acr_values"));

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .expect("auth state cookie");
        assert!(cookie.starts_with("auth_state="));
    }

    #[tokio::test]
    async fn settings_challenges_once_then_denies() {
        let harness = Harness::new();
        let id = harness.signed_in(alice()).await;

        let first = harness.get("/Settings", Some(id)).await;
        assert_eq!(first.status(), StatusCode::SEE_OTHER);
        let target = location(&first);
        assert!(target.starts_with(testing::AUTHORIZATION_ENDPOINT));
        assert!(target.contains("acr_values=c1"));
        assert!(target.contains("claims="));
        assert!(harness.attempted(id).await);

        let second = harness.get("/Settings", Some(id)).await;
        assert_eq!(second.status(), StatusCode::SEE_OTHER);
        assert!(location(&second).starts_with("/AccessDenied?reason=Authentication+context"));
        assert!(!harness.attempted(id).await);
    }

    #[tokio::test]
    async fn settings_served_when_context_present() {
        let harness = Harness::new();
        let id = harness
            .signed_in(alice().with_claim("acrs", "c1").with_claim("amr", r#"["pwd","mfa"]"#))
            .await;

        let response = harness.get("/Settings", Some(id)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body(response).await;
        assert!(html.contains("alice@example.com"));
        assert!(html.contains("pwd, mfa"));
        assert!(!harness.attempted(id).await);
    }

    #[tokio::test]
    async fn dashboard_shows_refresh_state() {
        let harness = Harness::new();
        let id = harness.signed_in(alice()).await;
        let response = harness.get("/Dashboard", Some(id)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body(response).await;
        assert!(html.contains("not issued"));
        assert!(html.contains("Session started: "));
    }

    #[tokio::test]
    async fn admin_panel_denies_missing_role() {
        let harness = Harness::new();
        let id = harness.signed_in(alice().with_claim("roles", "User")).await;

        let response = harness.get("/AdminPanel", Some(id)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(location(&response).starts_with("/AccessDenied?reason="));

        let response = harness.get("/UserPanel", Some(id)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body(response).await.contains("Your roles: User"));
    }

    #[tokio::test]
    async fn callback_error_goes_to_error_page() {
        let harness = Harness::new();
        let response = harness
            .get(
                "/auth/callback?error=access_denied&error_description=User+cancelled",
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(location(&response).starts_with("/Error?message=access_denied"));
    }

    #[tokio::test]
    async fn callback_without_auth_state_returns_to_root() {
        let harness = Harness::new();
        let response = harness.get("/auth/callback?code=abc&state=xyz", None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
    }

    #[tokio::test]
    async fn callback_with_mismatched_state_returns_to_root() {
        let harness = Harness::new();
        let auth_state = serde_json::to_string(&AuthState {
            csrf_token: "expected-csrf".to_string(),
            pkce_verifier: "verifier".to_string(),
            nonce: "nonce".to_string(),
            return_url: "/Settings".to_string(),
        })
        .expect("serialize");
        let cookie = format!("auth_state={}", auth_state);

        let response = harness
            .get_with_cookie("/auth/callback?code=abc&state=other-csrf", Some(&cookie))
            .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
    }

    #[tokio::test]
    async fn callback_with_unreadable_auth_state_returns_to_root() {
        let harness = Harness::new();
        let response = harness
            .get_with_cookie(
                "/auth/callback?code=abc&state=xyz",
                Some("auth_state=not-json"),
            )
            .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
    }

    #[tokio::test]
    async fn logout_deletes_session() {
        let harness = Harness::new();
        let id = harness.signed_in(alice()).await;

        let response = harness.get("/auth/logout", Some(id)).await;
        assert_eq!(location(&response), "/");
        assert!(harness.sessions.load(&id).await.expect("load").is_none());
    }

    #[tokio::test]
    async fn error_page_escapes_message_and_shows_request_id() {
        let harness = Harness::new();
        let response = harness
            .get("/Error?message=%3Cscript%3Einvalid_grant", None)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body(response).await;
        assert!(html.contains("&lt;script&gt;invalid_grant"));
        assert!(html.contains("req_"));
    }

    #[tokio::test]
    async fn access_denied_page_shows_reason() {
        let harness = Harness::new();
        let response = harness
            .get("/AccessDenied?reason=Not+today", None)
            .await;
        assert!(body(response).await.contains("Not today"));
    }
}
