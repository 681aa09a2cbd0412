use std::error::Error;
use std::fmt;

/// Typed errors for list operations.
///
/// Empty pops and unmatched finds are encoded as `None`, not as errors, and
/// contention is retried internally or tolerated; the only surfaced failure
/// is allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListError {
    /// An allocating insert could not obtain memory; the list is unchanged.
    ResourceExhausted,
}

impl fmt::Display for ListError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListError::ResourceExhausted => write!(f, "node allocation failed"),
        }
    }
}

impl Error for ListError {}
