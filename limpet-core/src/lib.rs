//! Concurrent doubly-linked list for work-queue style workloads.
//!
//! Producers publish at either end without locks, consumers mark nodes
//! removed while iterators are live, and a reclaimer frees marked nodes once
//! their externally maintained reference count drops to zero. See
//! [`data_structures::linked::reclaim_protocol`] for the protocol.

pub mod common_tests;
pub mod data_structures;
pub mod error;

// Re-export the primary types for convenience
pub use data_structures::{ListNode, LiveIter, LockFreeList, NodeRef};
pub use error::ListError;
