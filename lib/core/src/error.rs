//! Error handling foundation for the delegated-auth workspace.
//!
//! This module provides only the `Result` type alias using rootcause.
//! Each crate defines its own domain-specific error types in their own
//! error modules and carries them in a `Report` as they propagate.

use rootcause::Report;

/// A Result type alias using rootcause's Report for error handling.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_alias_carries_ok_values() {
        let ok: Result<&str> = Ok("c1");
        assert_eq!(ok.expect("should be ok"), "c1");
    }
}
