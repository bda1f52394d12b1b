//! Claims inspection, session state and step-up authentication.
//!
//! This crate provides:
//! - The authenticated principal (`Principal`) and its claim lookups
//! - Authentication-context inspection (`claims`)
//! - Server-side session state (`SessionStore`, `SessionRecord`)
//! - The step-up attempt flag (`attempt`) and challenge builder (`challenge`)
//! - The step-up decision engine (`StepUpEngine`)
//! - Hooks for provider redirects and failures (`interceptor`)
//! - Application roles and page policies (`Role`, `RolePolicy`)
//!
//! # Example
//!
//! ```
//! use delegated_auth_platform_access::{
//!     AccessDecision, AuthContextRef, Principal, StepUpEngine, attempt,
//! };
//! use std::collections::HashMap;
//!
//! let engine = StepUpEngine::default();
//! let required = AuthContextRef::new("c1");
//! let mut session: HashMap<String, String> = HashMap::new();
//!
//! // Signed in without the authentication context: challenge once.
//! let principal = Principal::default().with_claim("name", "Alice");
//! let decision = engine.evaluate_access(&principal, &mut session, &required, "/Settings");
//! assert!(matches!(decision, AccessDecision::RedirectChallenge(_)));
//! assert!(attempt::was_attempted(&session));
//!
//! // Back from the provider with the context satisfied.
//! let principal = principal.with_claim("acrs", "c1");
//! let decision = engine.evaluate_access(&principal, &mut session, &required, "/Settings");
//! assert!(matches!(decision, AccessDecision::Satisfied(_)));
//! assert!(!attempt::was_attempted(&session));
//! ```

pub mod attempt;
pub mod challenge;
pub mod claims;
pub mod error;
pub mod interceptor;
pub mod oidc;
pub mod principal;
pub mod redirect;
pub mod role;
pub mod session;
pub mod step_up;

// Re-export main types at crate root
pub use challenge::{AuthProperties, ChallengeRequest, ClaimsRequest, build_challenge};
pub use claims::{AuthContextRef, ContextClaimSource, is_context_satisfied};
pub use error::{AuthenticationError, ClaimError, SessionStoreError};
pub use interceptor::{FailureRedirect, ProtocolMessage};
pub use oidc::OidcConfig;
pub use principal::{Claim, MULTI_VALUED_CLAIMS, Principal};
pub use redirect::RedirectTargets;
pub use role::{Role, RolePolicy, RoleSet};
pub use session::{
    DEFAULT_MAX_SESSIONS, MemorySessionStore, SavedTokens, SessionRecord, SessionState,
    SessionStore,
};
pub use step_up::{AccessDecision, AccessDenial, StepUpEngine, StepUpGrant, StepUpState};
