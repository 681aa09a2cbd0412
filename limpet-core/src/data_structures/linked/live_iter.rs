//! Live iteration over a [`LockFreeList`].

use std::marker::PhantomData;
use std::sync::atomic::Ordering;

use super::lock_free_list::{LockFreeList, NodePtr, NodeRef};

/// Forward iterator over the nodes that are not logically removed.
///
/// Construction snapshots `head`; each step loads the node's successor
/// *before* inspecting its `removed` flag and always advances via that
/// stashed pointer. The node yielded for the current step may therefore be
/// marked or deleted inside the loop body without derailing the traversal,
/// and head insertions after the snapshot are never observed.
///
/// A fresh iterator per traversal; no suspension points, cancel by breaking.
pub struct LiveIter<'a, T> {
    cursor: NodePtr<T>,
    _list: PhantomData<&'a LockFreeList<T>>,
}

impl<'a, T> LiveIter<'a, T> {
    pub(crate) fn new(list: &'a LockFreeList<T>) -> Self {
        LiveIter {
            cursor: list.head.load(Ordering::Acquire),
            _list: PhantomData,
        }
    }
}

impl<'a, T> Iterator for LiveIter<'a, T> {
    type Item = NodeRef<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.cursor.is_null() {
            let node = self.cursor;

            // Stash the successor before the removed check so the caller may
            // unlink the yielded node without losing our position.
            let next = unsafe { (*node).get_next() };
            self.cursor = next;

            if !unsafe { (*node).is_removed() } {
                return NodeRef::from_raw(node);
            }
        }
        None
    }
}
