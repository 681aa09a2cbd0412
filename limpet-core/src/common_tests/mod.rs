//! Reusable test suites, driven from the integration tests under `tests/`.
//!
//! - [`list_core_tests`] - seed scenarios, round-trips and invariant checks
//! - [`list_stress_tests`] - multi-threaded suites

pub mod list_stress_tests;

/// Work item payload used by the shared suites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Task {
    pub id: u64,
}
