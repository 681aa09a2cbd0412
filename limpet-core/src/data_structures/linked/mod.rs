//! The concurrent doubly-linked list.
//!
//! - [`lock_free_list`] - node layout, anchors, publication, unlink, sweep
//! - [`live_iter`] - iteration that tolerates concurrent removal
//! - `reorder` - quiescent positional moves and sorts
//! - [`reclaim_protocol`] - protocol write-up (doc-only)

pub mod live_iter;
pub mod lock_free_list;
pub mod reclaim_protocol;
mod reorder;

pub use live_iter::LiveIter;
pub use lock_free_list::{ListNode, LockFreeList, NodeRef};
