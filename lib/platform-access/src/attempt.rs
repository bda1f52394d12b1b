//! Step-up attempt tracking.
//!
//! A single session entry records that a step-up challenge has already been
//! issued in the current cycle. The entry is binary: present with the value
//! `"true"`, or absent.

use crate::session::SessionState;

/// Session key holding the attempt flag.
pub const STEP_UP_ATTEMPTED_KEY: &str = "StepUpAttempted";

const ATTEMPTED: &str = "true";

/// Returns true if a challenge was already issued for this session.
///
/// Any value other than `"true"` counts as not attempted.
#[must_use]
pub fn was_attempted<S: SessionState + ?Sized>(session: &S) -> bool {
    session.get_string(STEP_UP_ATTEMPTED_KEY) == Some(ATTEMPTED)
}

/// Records that a challenge has been issued.
pub fn mark_attempted<S: SessionState + ?Sized>(session: &mut S) {
    session.set_string(STEP_UP_ATTEMPTED_KEY, ATTEMPTED);
}

/// Removes the attempt flag.
pub fn clear<S: SessionState + ?Sized>(session: &mut S) {
    session.remove(STEP_UP_ATTEMPTED_KEY);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn fresh_session_is_not_attempted() {
        let session: HashMap<String, String> = HashMap::new();
        assert!(!was_attempted(&session));
    }

    #[test]
    fn mark_then_clear() {
        let mut session: HashMap<String, String> = HashMap::new();

        mark_attempted(&mut session);
        assert!(was_attempted(&session));
        assert_eq!(session.get(STEP_UP_ATTEMPTED_KEY).map(String::as_str), Some("true"));

        clear(&mut session);
        assert!(!was_attempted(&session));
        assert!(!session.contains_key(STEP_UP_ATTEMPTED_KEY));
    }

    #[test]
    fn marking_twice_stays_binary() {
        let mut session: HashMap<String, String> = HashMap::new();
        mark_attempted(&mut session);
        mark_attempted(&mut session);
        assert_eq!(session.len(), 1);
        clear(&mut session);
        assert!(!was_attempted(&session));
    }

    #[test]
    fn only_the_sentinel_counts() {
        let mut session: HashMap<String, String> = HashMap::new();
        session.insert(STEP_UP_ATTEMPTED_KEY.to_string(), "True".to_string());
        assert!(!was_attempted(&session));
    }
}
