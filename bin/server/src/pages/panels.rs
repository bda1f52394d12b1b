//! Role-protected panels.

use axum::{extract::State, response::Html};
use delegated_auth_platform_access::{Role, RoleSet};
use std::sync::Arc;

use super::{escape, layout};
use crate::auth::{AppState, RequireAdmin, RequireManager, RequireUser, middleware::Authenticated};

fn panel(state: &AppState, title: &str, role: Role, user: &Authenticated) -> Html<String> {
    let name = user.principal.display_name();
    let roles = RoleSet::from_principal(&user.principal, state.oidc_client.config().roles_claim());
    let held = roles
        .roles()
        .iter()
        .map(Role::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    let body = format!(
        "<p>This page is restricted to the <strong>{}</strong> role.</p><p>Signed in as {}.</p><p>Your roles: {}</p>",
        role,
        escape(name.unwrap_or("unknown user")),
        held
    );
    layout(title, name, &body)
}

/// Administration panel.
pub async fn admin_panel(
    State(state): State<Arc<AppState>>,
    RequireAdmin(user): RequireAdmin,
) -> Html<String> {
    panel(&state, "Admin Panel", Role::Admin, &user)
}

/// Manager panel.
pub async fn manager_panel(
    State(state): State<Arc<AppState>>,
    RequireManager(user): RequireManager,
) -> Html<String> {
    panel(&state, "Manager Panel", Role::Manager, &user)
}

/// User panel.
pub async fn user_panel(
    State(state): State<Arc<AppState>>,
    RequireUser(user): RequireUser,
) -> Html<String> {
    panel(&state, "User Panel", Role::User, &user)
}
