//! Runtime invariant checks with a contract log
//!
//! Session bookkeeping asserts its invariants through [`assert_invariant!`].
//! Every checked invariant is recorded in a thread-local log so tests can
//! prove that a code path really exercised the checks it claims to.
//!
//! ```rust,ignore
//! use crabpano::invariant_ppt::*;
//!
//! assert_invariant!(
//!     state.captured_count() == state.patches().len(),
//!     CAPTURED_COUNT_MATCHES_PATCHES,
//!     "session::state"
//! );
//!
//! #[test]
//! fn contract_session_state() {
//!     // ... drive a session ...
//!     contract_test("session state", &[CAPTURED_COUNT_MATCHES_PATCHES]);
//! }
//! ```

use std::cell::RefCell;
use std::collections::HashSet;
use std::thread_local;

/// `captured_count` equals the number of committed patches
pub const CAPTURED_COUNT_MATCHES_PATCHES: &str = "Captured count must equal number of patches";

/// Captured slots plus queued slots always add up to the planned total
pub const CAPTURED_PLUS_QUEUED_IS_TOTAL: &str =
    "Captured count plus queue length must equal total slots";

/// The `Complete` phase is only reachable with an empty queue
pub const COMPLETE_MEANS_EMPTY_QUEUE: &str = "Complete phase requires an empty queue";

thread_local! {
    static INVARIANT_LOG: RefCell<HashSet<String>> = RefCell::new(HashSet::new());
}

/// Assert an invariant and record it for contract testing.
///
/// # Panics
/// Panics if the condition is false. A violated invariant is a defect in
/// the session bookkeeping, never a runtime condition to recover from.
#[macro_export]
macro_rules! assert_invariant {
    ($condition:expr, $message:expr) => {
        $crate::invariant_ppt::__assert_invariant_impl($condition, $message, None)
    };
    ($condition:expr, $message:expr, $context:expr) => {
        $crate::invariant_ppt::__assert_invariant_impl($condition, $message, Some($context))
    };
}

#[doc(hidden)]
pub fn __assert_invariant_impl(condition: bool, message: &str, context: Option<&str>) {
    INVARIANT_LOG.with(|log| {
        log.borrow_mut().insert(message.to_string());
    });

    if !condition {
        let ctx = context.unwrap_or("unknown");
        log::error!("Invariant violated in {}: {}", ctx, message);
        panic!("INVARIANT VIOLATION [{}]: {}", ctx, message);
    }
}

/// Check that the listed invariants were asserted on this thread.
///
/// # Panics
/// Panics naming every invariant that was never checked.
pub fn contract_test(test_name: &str, required_invariants: &[&str]) {
    let log = INVARIANT_LOG.with(|log| log.borrow().clone());

    let missing: Vec<&str> = required_invariants
        .iter()
        .copied()
        .filter(|invariant| !log.contains(*invariant))
        .collect();

    if !missing.is_empty() {
        panic!(
            "CONTRACT FAILURE [{}]: The following invariants were not checked:\n  - {}",
            test_name,
            missing.join("\n  - ")
        );
    }
}

/// Clear the invariant log
pub fn clear_invariant_log() {
    INVARIANT_LOG.with(|log| {
        log.borrow_mut().clear();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_invariant_satisfies_contract() {
        clear_invariant_log();
        assert_invariant!(true, COMPLETE_MEANS_EMPTY_QUEUE, "tests");
        contract_test("single", &[COMPLETE_MEANS_EMPTY_QUEUE]);
    }

    #[test]
    #[should_panic(expected = "CONTRACT FAILURE")]
    fn test_unchecked_invariant_fails_contract() {
        clear_invariant_log();
        contract_test("missing", &[CAPTURED_PLUS_QUEUED_IS_TOTAL]);
    }

    #[test]
    #[should_panic(expected = "INVARIANT VIOLATION [tests]")]
    fn test_violation_panics() {
        assert_invariant!(false, CAPTURED_COUNT_MATCHES_PATCHES, "tests");
    }
}
