//! Reordering utilities: positional moves and comparison sorts.
//!
//! These operations rewrite several links non-atomically and therefore assume
//! quiescence on the affected region. They are structural: logically removed
//! nodes participate (liveness filtering stays the iterator's concern).

use std::ptr;
use std::sync::atomic::Ordering;

use super::lock_free_list::{LockFreeList, NodePtr, NodeRef};

impl<T> LockFreeList<T> {
    /// Detach `node` and splice it immediately before `anchor`.
    ///
    /// No-op when `anchor` and `node` are the same node.
    ///
    /// # Safety
    /// - both nodes must currently be published in this list
    /// - no other thread may access the list for the duration of the call
    pub unsafe fn move_before(&self, anchor: NodeRef<'_, T>, node: NodeRef<'_, T>) {
        if anchor.ptr_eq(node) {
            return;
        }
        unsafe {
            self.detach(node.as_ptr());
            self.splice_before(anchor.as_ptr(), node.as_ptr());
        }
    }

    /// Detach `node` and splice it immediately after `anchor`.
    ///
    /// No-op when `anchor` and `node` are the same node.
    ///
    /// # Safety
    /// Same contract as [`move_before`](LockFreeList::move_before).
    pub unsafe fn move_after(&self, anchor: NodeRef<'_, T>, node: NodeRef<'_, T>) {
        if anchor.ptr_eq(node) {
            return;
        }
        unsafe {
            self.detach(node.as_ptr());
            self.splice_after(anchor.as_ptr(), node.as_ptr());
        }
    }

    /// Stable ascending sort by the selected payload field.
    ///
    /// # Safety
    /// No other thread may access the list for the duration of the call.
    pub unsafe fn sort_asc_by<K, F>(&self, key: F)
    where
        K: Ord,
        F: Fn(&T) -> K,
    {
        unsafe { self.sort_nodes(&key, true) };
    }

    /// Stable descending sort by the selected payload field.
    ///
    /// # Safety
    /// No other thread may access the list for the duration of the call.
    pub unsafe fn sort_desc_by<K, F>(&self, key: F)
    where
        K: Ord,
        F: Fn(&T) -> K,
    {
        unsafe { self.sort_nodes(&key, false) };
    }

    // Same link updates as delete, without freeing; the node comes out with
    // clean links.
    unsafe fn detach(&self, node: NodePtr<T>) {
        let prev = unsafe { (*node).get_prev() };
        let next = unsafe { (*node).get_next() };

        if !prev.is_null() {
            unsafe { (*prev).set_next(next) };
        } else {
            self.head.store(next, Ordering::Release);
        }
        if !next.is_null() {
            unsafe { (*next).set_prev(prev) };
        } else {
            self.tail.store(prev, Ordering::Release);
        }

        unsafe {
            (*node).set_next(ptr::null_mut());
            (*node).set_prev(ptr::null_mut());
        }
    }

    unsafe fn splice_before(&self, anchor: NodePtr<T>, node: NodePtr<T>) {
        let before = unsafe { (*anchor).get_prev() };
        unsafe {
            (*node).set_prev(before);
            (*node).set_next(anchor);
        }
        if !before.is_null() {
            unsafe { (*before).set_next(node) };
        } else {
            self.head.store(node, Ordering::Release);
        }
        unsafe { (*anchor).set_prev(node) };
    }

    unsafe fn splice_after(&self, anchor: NodePtr<T>, node: NodePtr<T>) {
        let after = unsafe { (*anchor).get_next() };
        unsafe {
            (*node).set_next(after);
            (*node).set_prev(anchor);
        }
        if !after.is_null() {
            unsafe { (*after).set_prev(node) };
        } else {
            self.tail.store(node, Ordering::Release);
        }
        unsafe { (*anchor).set_next(node) };
    }

    // Collect, stable-sort, relink. The observable contract is only the final
    // order, so the simple algorithm wins over in-place link surgery.
    unsafe fn sort_nodes<K, F>(&self, key: &F, ascending: bool)
    where
        K: Ord,
        F: Fn(&T) -> K,
    {
        let mut nodes: Vec<NodePtr<T>> = Vec::new();
        let mut cursor = self.head.load(Ordering::Acquire);
        while !cursor.is_null() {
            nodes.push(cursor);
            cursor = unsafe { (*cursor).get_next() };
        }
        if nodes.len() < 2 {
            return;
        }

        nodes.sort_by(|&a, &b| {
            let (ka, kb) = unsafe { (key((*a).value()), key((*b).value())) };
            if ascending {
                ka.cmp(&kb)
            } else {
                kb.cmp(&ka)
            }
        });

        for (i, &node) in nodes.iter().enumerate() {
            let prev = if i == 0 { ptr::null_mut() } else { nodes[i - 1] };
            let next = if i + 1 == nodes.len() {
                ptr::null_mut()
            } else {
                nodes[i + 1]
            };
            unsafe {
                (*node).set_prev(prev);
                (*node).set_next(next);
            }
        }
        self.head.store(nodes[0], Ordering::Release);
        self.tail.store(nodes[nodes.len() - 1], Ordering::Release);
    }
}
