//! Step-up authentication decisions.
//!
//! Every request to a resource that requires an authentication context is
//! evaluated from the top:
//!
//! 1. The principal already carries the context: serve the resource.
//! 2. It does not, and a challenge was already issued in this cycle: the
//!    provider came back without satisfying the requirement, so deny.
//! 3. It does not, and no challenge is outstanding: record the attempt and
//!    send the browser to the provider with a claims challenge.
//!
//! The attempt flag bounds the provider round trips to one per cycle. A
//! provider that cannot satisfy the context (for example, no conditional
//! access policy is bound to it) ends in a denial instead of a redirect
//! loop.

use crate::attempt;
use crate::challenge::{ChallengeRequest, build_challenge};
use crate::claims::{self, AuthContextRef, ContextClaimSource};
use crate::principal::Principal;
use crate::redirect::RedirectTargets;
use crate::session::SessionState;

/// The state a single evaluation ends in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepUpState {
    /// The requirement is met.
    Satisfied,
    /// First challenge of the cycle was issued.
    FirstAttempt,
    /// A challenge was already issued and did not help.
    RetryExhausted,
}

/// What the page gets to show once the requirement is met.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepUpGrant {
    /// The claim that satisfied the requirement.
    pub satisfied_by: ContextClaimSource,
    /// Email, or preferred username when no email claim is present.
    pub email: Option<String>,
    /// Display name, or preferred username when no name claim is present.
    pub display_name: Option<String>,
    /// Authentication methods from the `amr` claim. Empty when the claim is
    /// absent or malformed.
    pub authentication_methods: Vec<String>,
}

/// A terminal denial after an unsuccessful challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDenial {
    reason: String,
    location: String,
}

impl AccessDenial {
    /// Human-readable reason shown on the denial page.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// The denial page location, reason included.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }
}

/// Outcome of [`StepUpEngine::evaluate_access`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// Serve the resource.
    Satisfied(StepUpGrant),
    /// Redirect to the provider with this challenge.
    RedirectChallenge(ChallengeRequest),
    /// Redirect to the denial page.
    RedirectDenied(AccessDenial),
}

impl AccessDecision {
    /// Returns the state the evaluation ended in.
    #[must_use]
    pub fn state(&self) -> StepUpState {
        match self {
            Self::Satisfied(_) => StepUpState::Satisfied,
            Self::RedirectChallenge(_) => StepUpState::FirstAttempt,
            Self::RedirectDenied(_) => StepUpState::RetryExhausted,
        }
    }
}

/// Returns the denial reason for an unmet `required` context.
#[must_use]
pub fn denial_reason(required: &AuthContextRef) -> String {
    format!(
        "Authentication context '{required}' requirement not satisfied. \
         MFA may not be configured or policy not applied."
    )
}

/// Evaluates step-up requirements against the caller's session.
#[derive(Debug, Clone, Default)]
pub struct StepUpEngine {
    targets: RedirectTargets,
}

impl StepUpEngine {
    /// Creates an engine redirecting denials to `targets`.
    #[must_use]
    pub fn new(targets: RedirectTargets) -> Self {
        Self { targets }
    }

    /// Returns the configured redirect targets.
    #[must_use]
    pub fn targets(&self) -> &RedirectTargets {
        &self.targets
    }

    /// Decides how to answer a request for a resource requiring `required`.
    ///
    /// `return_url` is the path the browser asked for; a challenge sends it
    /// back there after re-authenticating. The session attempt flag is the
    /// only state read or written.
    pub fn evaluate_access<S: SessionState + ?Sized>(
        &self,
        principal: &Principal,
        session: &mut S,
        required: &AuthContextRef,
        return_url: &str,
    ) -> AccessDecision {
        if let Some(source) = claims::satisfying_claim(principal, required) {
            attempt::clear(session);
            tracing::info!(
                required_context = %required,
                claim = source.claim_name(),
                "authentication context satisfied"
            );
            return AccessDecision::Satisfied(grant(principal, source));
        }

        if attempt::was_attempted(session) {
            attempt::clear(session);
            tracing::error!(
                required_context = %required,
                acrs = principal.find_first("acrs"),
                acr = principal.find_first("acr"),
                "step-up already attempted but authentication context still missing"
            );
            let reason = denial_reason(required);
            let location = self.targets.access_denied(&reason);
            return AccessDecision::RedirectDenied(AccessDenial { reason, location });
        }

        attempt::mark_attempted(session);
        tracing::info!(
            required_context = %required,
            return_url,
            "authentication context missing, issuing step-up challenge"
        );
        AccessDecision::RedirectChallenge(build_challenge(required, return_url))
    }
}

fn grant(principal: &Principal, satisfied_by: ContextClaimSource) -> StepUpGrant {
    let authentication_methods = claims::authentication_methods(principal).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "ignoring authentication methods claim");
        Vec::new()
    });

    StepUpGrant {
        satisfied_by,
        email: principal.email().map(str::to_string),
        display_name: principal.display_name().map(str::to_string),
        authentication_methods,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attempt::STEP_UP_ATTEMPTED_KEY;
    use std::collections::HashMap;

    type Session = HashMap<String, String>;

    fn c1() -> AuthContextRef {
        AuthContextRef::new("c1")
    }

    fn engine() -> StepUpEngine {
        StepUpEngine::default()
    }

    fn flagged() -> Session {
        let mut session = Session::new();
        attempt::mark_attempted(&mut session);
        session
    }

    fn unsatisfied_principals() -> Vec<Principal> {
        vec![
            Principal::default(),
            Principal::default().with_claim("name", "Alice"),
            Principal::default().with_claim("acrs", "c2"),
            Principal::default().with_claim("acr", "c3"),
            Principal::default()
                .with_claim("acrs", "C1")
                .with_claim("acr", "1"),
        ]
    }

    #[test]
    fn satisfying_claim_never_sets_the_flag() {
        let principals = [
            Principal::default().with_claim("acrs", "c1"),
            Principal::default().with_claim("acr", "c1"),
            Principal::default()
                .with_claim("acrs", "c2")
                .with_claim("acr", "c1"),
        ];

        for principal in &principals {
            let mut session = Session::new();
            let decision = engine().evaluate_access(principal, &mut session, &c1(), "/Settings");
            assert_eq!(decision.state(), StepUpState::Satisfied);
            assert!(!attempt::was_attempted(&session));
            assert!(session.is_empty());
        }
    }

    #[test]
    fn satisfied_removes_unrecognised_flag_value() {
        let principal = Principal::default().with_claim("acrs", "c1");
        let mut session = Session::new();
        session.set_string(STEP_UP_ATTEMPTED_KEY, "True");

        let decision = engine().evaluate_access(&principal, &mut session, &c1(), "/Settings");

        assert_eq!(decision.state(), StepUpState::Satisfied);
        assert_eq!(session.get_string(STEP_UP_ATTEMPTED_KEY), None);
    }

    #[test]
    fn unsatisfied_without_flag_challenges_and_sets_flag() {
        for principal in unsatisfied_principals() {
            let mut session = Session::new();
            let decision = engine().evaluate_access(&principal, &mut session, &c1(), "/Settings");
            assert_eq!(decision.state(), StepUpState::FirstAttempt);
            assert!(attempt::was_attempted(&session));
        }
    }

    #[test]
    fn unsatisfied_with_flag_denies_and_clears_flag() {
        for principal in unsatisfied_principals() {
            let mut session = flagged();
            let decision = engine().evaluate_access(&principal, &mut session, &c1(), "/Settings");
            assert_eq!(decision.state(), StepUpState::RetryExhausted);
            assert!(!attempt::was_attempted(&session));
        }
    }

    #[test]
    fn denial_resets_to_a_fresh_cycle() {
        let principal = Principal::default();
        let mut session = flagged();

        let first = engine().evaluate_access(&principal, &mut session, &c1(), "/Settings");
        assert_eq!(first.state(), StepUpState::RetryExhausted);

        let second = engine().evaluate_access(&principal, &mut session, &c1(), "/Settings");
        assert_eq!(second.state(), StepUpState::FirstAttempt);
        assert!(attempt::was_attempted(&session));
    }

    #[test]
    fn challenge_then_upgraded_token_is_satisfied_and_clears_flag() {
        let mut session = Session::new();
        let before = Principal::default().with_claim("name", "Alice");

        let decision = engine().evaluate_access(&before, &mut session, &c1(), "/Settings");
        assert_eq!(decision.state(), StepUpState::FirstAttempt);

        // The provider round trip adds the satisfying claim.
        let after = before.with_claim("acrs", "c1");
        let decision = engine().evaluate_access(&after, &mut session, &c1(), "/Settings");

        assert_eq!(decision.state(), StepUpState::Satisfied);
        assert!(!session.contains_key(STEP_UP_ATTEMPTED_KEY));
    }

    #[test]
    fn scenario_satisfied_via_acrs_with_methods() {
        let principal = Principal::default()
            .with_claim("acrs", "c1")
            .with_claim("amr", r#"["pwd","mfa"]"#)
            .with_claim("email", "alice@example.com")
            .with_claim("name", "Alice");
        let mut session = Session::new();

        let decision = engine().evaluate_access(&principal, &mut session, &c1(), "/Settings");

        let AccessDecision::Satisfied(grant) = decision else {
            panic!("expected Satisfied, got {decision:?}");
        };
        assert_eq!(grant.satisfied_by, ContextClaimSource::Acrs);
        assert_eq!(grant.authentication_methods, vec!["pwd", "mfa"]);
        assert_eq!(grant.email.as_deref(), Some("alice@example.com"));
        assert_eq!(grant.display_name.as_deref(), Some("Alice"));
    }

    #[test]
    fn scenario_missing_context_builds_claims_challenge() {
        let mut session = Session::new();

        let decision =
            engine().evaluate_access(&Principal::default(), &mut session, &c1(), "/Settings");

        let AccessDecision::RedirectChallenge(challenge) = decision else {
            panic!("expected RedirectChallenge, got {decision:?}");
        };
        let claims = challenge.claims().expect("claims property");
        assert!(claims.contains("acrs"));
        assert!(claims.contains("c1"));
        assert_eq!(challenge.acr_values(), Some("c1"));
        assert_eq!(challenge.redirect_uri(), "/Settings");
        assert!(attempt::was_attempted(&session));
    }

    #[test]
    fn scenario_retry_exhausted_denies_with_reason() {
        let mut session = flagged();

        let decision =
            engine().evaluate_access(&Principal::default(), &mut session, &c1(), "/Settings");

        let AccessDecision::RedirectDenied(denial) = decision else {
            panic!("expected RedirectDenied, got {decision:?}");
        };
        assert!(denial.reason().contains("c1"));
        assert!(denial.location().starts_with("/AccessDenied?reason="));
        assert!(denial.location().contains("c1"));
        assert!(!attempt::was_attempted(&session));
    }

    #[test]
    fn malformed_amr_still_satisfied_with_empty_methods() {
        let principal = Principal::default()
            .with_claim("acrs", "c1")
            .with_claim("amr", "not-json");
        let mut session = Session::new();

        let decision = engine().evaluate_access(&principal, &mut session, &c1(), "/Settings");

        let AccessDecision::Satisfied(grant) = decision else {
            panic!("expected Satisfied, got {decision:?}");
        };
        assert!(grant.authentication_methods.is_empty());
    }

    #[test]
    fn denial_uses_configured_targets() {
        let engine = StepUpEngine::new(RedirectTargets {
            access_denied_path: "/denied".to_string(),
            ..RedirectTargets::default()
        });
        let mut session = flagged();

        let decision = engine.evaluate_access(&Principal::default(), &mut session, &c1(), "/x");

        let AccessDecision::RedirectDenied(denial) = decision else {
            panic!("expected RedirectDenied, got {decision:?}");
        };
        assert!(denial.location().starts_with("/denied?reason="));
    }

    #[test]
    fn other_session_values_are_untouched() {
        let mut session = Session::new();
        session.insert("Theme".to_string(), "dark".to_string());

        engine().evaluate_access(&Principal::default(), &mut session, &c1(), "/Settings");
        engine().evaluate_access(&Principal::default(), &mut session, &c1(), "/Settings");

        assert_eq!(session.get("Theme").map(String::as_str), Some("dark"));
    }
}
