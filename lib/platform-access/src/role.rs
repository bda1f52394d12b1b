//! Application roles and the page policies built on them.
//!
//! Roles are read from the configured roles claim of the principal (app
//! roles assigned at the provider). Matching is exact and case-sensitive.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::principal::Principal;

/// Application role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Administrator.
    Admin,
    /// Standard user.
    User,
    /// Manager.
    Manager,
}

impl Role {
    /// Returns the role value as it appears in the roles claim.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::User => "User",
            Self::Manager => "Manager",
        }
    }

    fn from_claim_value(value: &str) -> Option<Self> {
        match value {
            "Admin" => Some(Self::Admin),
            "User" => Some(Self::User),
            "Manager" => Some(Self::Manager),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of roles held by a principal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSet {
    roles: Vec<Role>,
}

impl RoleSet {
    /// Collects the roles named in `roles_claim`. Unknown values are ignored.
    #[must_use]
    pub fn from_principal(principal: &Principal, roles_claim: &str) -> Self {
        let mut roles = Vec::new();
        for role in principal
            .find_all(roles_claim)
            .filter_map(Role::from_claim_value)
        {
            if !roles.contains(&role) {
                roles.push(role);
            }
        }
        Self { roles }
    }

    /// Returns true if the set contains `role`.
    #[must_use]
    pub fn contains(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Returns the roles as a slice.
    #[must_use]
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }
}

/// Named authorization policy guarding a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolePolicy {
    /// Requires [`Role::Admin`].
    AdminOnly,
    /// Requires [`Role::User`].
    UserOnly,
    /// Requires [`Role::Manager`].
    ManagerOnly,
}

impl RolePolicy {
    /// The role the policy requires.
    #[must_use]
    pub fn required_role(self) -> Role {
        match self {
            Self::AdminOnly => Role::Admin,
            Self::UserOnly => Role::User,
            Self::ManagerOnly => Role::Manager,
        }
    }

    /// Returns true if `roles` satisfies the policy.
    #[must_use]
    pub fn is_satisfied_by(self, roles: &RoleSet) -> bool {
        roles.contains(self.required_role())
    }
}

impl fmt::Display for RolePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdminOnly => f.write_str("AdminOnly"),
            Self::UserOnly => f.write_str("UserOnly"),
            Self::ManagerOnly => f.write_str("ManagerOnly"),
        }
    }
}
