//! Authentication-context inspection.
//!
//! Decides from the principal's claims alone whether a required
//! authentication context is already satisfied, and parses the
//! authentication methods list once it is.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ClaimError;
use crate::principal::{Principal, claim_types};

/// Identifier of an authentication context a resource requires (e.g. `c1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthContextRef(String);

impl AuthContextRef {
    /// Creates an authentication context reference.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuthContextRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AuthContextRef {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Which claim satisfied the requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextClaimSource {
    /// Matched on the `acrs` claim.
    Acrs,
    /// Matched on the `acr` claim.
    Acr,
}

impl ContextClaimSource {
    /// Returns the claim name.
    #[must_use]
    pub fn claim_name(self) -> &'static str {
        match self {
            Self::Acrs => claim_types::ACRS,
            Self::Acr => claim_types::ACR,
        }
    }
}

/// Returns the claim that satisfies `required`, if any.
///
/// `acrs` is authoritative when it matches; `acr` is consulted only
/// otherwise. Only the first value of each claim type is considered.
#[must_use]
pub fn satisfying_claim(
    principal: &Principal,
    required: &AuthContextRef,
) -> Option<ContextClaimSource> {
    [ContextClaimSource::Acrs, ContextClaimSource::Acr]
        .into_iter()
        .find(|source| {
            let value = principal.find_first(source.claim_name());
            if let Some(value) = value {
                tracing::debug!(
                    claim = source.claim_name(),
                    value,
                    required_context = %required,
                    "inspecting authentication context claim"
                );
            }
            value == Some(required.as_str())
        })
}

/// Returns true if the principal already satisfies `required`.
#[must_use]
pub fn is_context_satisfied(principal: &Principal, required: &AuthContextRef) -> bool {
    satisfying_claim(principal, required).is_some()
}

/// Parses the `amr` claim into a list of authentication methods.
///
/// An absent claim yields an empty list.
///
/// # Errors
///
/// Returns `ClaimError::Malformed` when the claim is present but is not a
/// JSON array of strings.
pub fn authentication_methods(principal: &Principal) -> Result<Vec<String>, ClaimError> {
    let Some(raw) = principal.find_first(claim_types::AMR) else {
        return Ok(Vec::new());
    };

    serde_json::from_str::<Vec<String>>(raw).map_err(|e| ClaimError::Malformed {
        claim: claim_types::AMR.to_string(),
        reason: e.to_string(),
    })
}
