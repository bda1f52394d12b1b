//! The authenticated principal.
//!
//! A principal is the flat claim set produced by sign-in: every claim is a
//! `(type, value)` pair of strings, and the same type may appear more than
//! once. Lookups are option-returning; a missing claim is an ordinary
//! outcome, never an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AuthenticationError;

/// Standard claim names read by this crate.
pub mod claim_types {
    /// Authentication context references satisfied during sign-in.
    pub const ACRS: &str = "acrs";
    /// Authentication context class reference.
    pub const ACR: &str = "acr";
    /// Authentication methods references, a JSON array of strings.
    pub const AMR: &str = "amr";
    /// Email address.
    pub const EMAIL: &str = "email";
    /// Username preferred by the user at the provider.
    pub const PREFERRED_USERNAME: &str = "preferred_username";
    /// Full display name.
    pub const NAME: &str = "name";
    /// Subject identifier.
    pub const SUBJECT: &str = "sub";
}

/// Claims providers may issue as a JSON array of strings.
///
/// Arrays under these names become one claim per element, so that
/// `acrs: ["c1"]` is looked up exactly like `acrs: "c1"`. `amr` is not
/// listed; it stays JSON text.
pub const MULTI_VALUED_CLAIMS: &[&str] = &[claim_types::ACRS, claim_types::ACR, "groups"];

/// A single claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    claim_type: String,
    value: String,
}

impl Claim {
    /// Creates a claim.
    #[must_use]
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
        }
    }

    /// Returns the claim type.
    #[must_use]
    pub fn claim_type(&self) -> &str {
        &self.claim_type
    }

    /// Returns the claim value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// The claim set of an authenticated caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    claims: Vec<Claim>,
}

impl Principal {
    /// Builds a principal from a decoded ID token payload.
    ///
    /// String values become one claim each. Arrays under a name listed in
    /// `multi_valued` (e.g. `roles`) become one claim per string element.
    /// Every other value, including arrays such as `amr`, is kept as its
    /// JSON text so callers can parse it themselves.
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationError::InvalidToken` if the payload is not a
    /// JSON object.
    pub fn from_token_payload(
        payload: &Value,
        multi_valued: &[&str],
    ) -> Result<Self, AuthenticationError> {
        let object = payload
            .as_object()
            .ok_or_else(|| AuthenticationError::InvalidToken {
                reason: "token payload is not a JSON object".to_string(),
            })?;

        let mut claims = Vec::with_capacity(object.len());
        for (name, value) in object {
            match value {
                Value::String(s) => claims.push(Claim::new(name, s)),
                Value::Array(items) if multi_valued.contains(&name.as_str()) => {
                    claims.extend(
                        items
                            .iter()
                            .filter_map(Value::as_str)
                            .map(|item| Claim::new(name, item)),
                    );
                }
                Value::Null => {}
                other => claims.push(Claim::new(name, other.to_string())),
            }
        }

        Ok(Self { claims })
    }

    /// Adds a claim, returning the updated principal.
    #[must_use]
    pub fn with_claim(mut self, claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        self.claims.push(Claim::new(claim_type, value));
        self
    }

    /// Returns all claims in issue order.
    #[must_use]
    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    /// Returns the value of the first claim of the given type.
    #[must_use]
    pub fn find_first(&self, claim_type: &str) -> Option<&str> {
        self.claims
            .iter()
            .find(|c| c.claim_type == claim_type)
            .map(Claim::value)
    }

    /// Returns every value of the given claim type.
    pub fn find_all<'a>(&'a self, claim_type: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.claims
            .iter()
            .filter(move |c| c.claim_type == claim_type)
            .map(Claim::value)
    }

    /// Returns the subject claim.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.find_first(claim_types::SUBJECT)
    }

    /// Returns the email, falling back to the preferred username.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.find_first(claim_types::EMAIL)
            .or_else(|| self.find_first(claim_types::PREFERRED_USERNAME))
    }

    /// Returns the display name, falling back to the preferred username.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.find_first(claim_types::NAME)
            .or_else(|| self.find_first(claim_types::PREFERRED_USERNAME))
    }
}
