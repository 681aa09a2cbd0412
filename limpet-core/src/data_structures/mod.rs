//! Data structures.
//!
//! # Organization
//!
//! - [`linked`] - the lock-free doubly-linked list and its iterator
//!
//! # Usage
//!
//! ```
//! use limpet_core::data_structures::LockFreeList;
//!
//! let list = LockFreeList::new();
//! list.insert_tail(42u64).unwrap();
//! assert_eq!(list.count_live(), 1);
//! ```

pub mod linked;

// Re-exports for convenience
pub use linked::{ListNode, LiveIter, LockFreeList, NodeRef};
