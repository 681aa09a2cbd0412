use std::alloc::{alloc, Layout};
use std::marker::PhantomData;
use std::ops::Deref;
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicBool, AtomicPtr, AtomicUsize, Ordering};

use crate::error::ListError;

use super::live_iter::LiveIter;

pub(crate) type NodePtr<T> = *mut ListNode<T>;

///
/// Concurrent doubly-linked list with CAS-based publication, logical removal
/// and refcount-gated reclamation. See the [`reclaim_protocol`] module for the
/// full protocol write-up.
///
/// [`reclaim_protocol`]: super::reclaim_protocol
///
// =============================================================================
// LIST STRUCTURE & REMOVAL DISCIPLINE
// =============================================================================
//
// ┌──────┐    ┌──────┐    ┌──────┐    ┌──────┐
// │ head │───►│  n1  │───►│  n2  │───►│ NULL │
// └──────┘    │      │◄───│      │    └──────┘
//             └──────┘    └──────┘
//                ▲           ▲
//              prev=NULL   tail
//
// No sentinels: head == NULL ⇔ tail == NULL. Forward links are the source of
// truth; prev links are maintained for delete/sweep and backward walks and may
// briefly lag behind concurrent head insertions before converging.
//
// Removal is two-phase:
//
//   Phase 1: LOGICAL    - mark_removed sets the `removed` flag (release).
//                         No structural change. Monotonic: never unset.
//   Phase 2: PHYSICAL   - delete / pop_* unlink immediately (caller proves
//                         exclusivity), or sweep unlinks later once
//                         removed ∧ refcount == 0 is observed.
//
// =============================================================================
// CAS FAILURE HANDLING
// =============================================================================
//
// Publication loops (insert_head / insert_tail) retry until their CAS lands.
// The tail is advanced by a second, best-effort CAS: a stale tail observed by
// another inserter self-heals as that inserter chases `next` pointers.
//
// delete performs one CAS per link and tolerates failure: a failed CAS means a
// concurrent operation already adjusted that side. This is sound only under
// delete's precondition (no concurrent mutation of either neighbor).
//
// sweep CASes pred.next (or head) from the condemned node to its successor.
// On failure the structure changed underneath; the walk restarts from head
// with a cleared trailing cursor. Each successful unlink shrinks the
// condemned population, so restarts are bounded by concurrent mutations.
// =============================================================================

/// A node of a [`LockFreeList`].
///
/// Carries its own atomic links, the monotonic `removed` flag and the
/// externally maintained reference count. The payload is opaque to the list;
/// queries that inspect it take an accessor closure at the call site.
#[derive(Debug)]
pub struct ListNode<T> {
    next: AtomicPtr<ListNode<T>>,
    prev: AtomicPtr<ListNode<T>>,
    removed: AtomicBool,
    refcount: AtomicUsize,
    data: T,
}

impl<T> ListNode<T> {
    /// Allocate an unlinked node for the pre-allocated insert flavor.
    ///
    /// The caller fully initializes the payload here; `insert_head_node` /
    /// `insert_tail_node` reset the link state before publication.
    pub fn new(data: T) -> Box<ListNode<T>> {
        Box::new(ListNode::unlinked(data))
    }

    fn unlinked(data: T) -> ListNode<T> {
        ListNode {
            next: AtomicPtr::new(ptr::null_mut()),
            prev: AtomicPtr::new(ptr::null_mut()),
            removed: AtomicBool::new(false),
            refcount: AtomicUsize::new(0),
            data,
        }
    }

    /// Borrow the payload.
    pub fn value(&self) -> &T {
        &self.data
    }

    /// Take the payload out of an owned (unlinked) node.
    pub fn into_value(self: Box<ListNode<T>>) -> T {
        self.data
    }

    // =========================================================================
    // Logical removal
    // =========================================================================

    /// Logically remove this node: set the `removed` flag with release
    /// ordering. Idempotent, O(1), no structural change. The node stays
    /// reachable until `delete` or `sweep` unlinks it.
    pub fn mark_removed(&self) {
        self.removed.store(true, Ordering::Release);
    }

    /// Whether the node has been logically removed (acquire load).
    pub fn is_removed(&self) -> bool {
        self.removed.load(Ordering::Acquire)
    }

    // =========================================================================
    // External reference count
    //
    // The list never manipulates this count; it only reads it in `sweep` and
    // `count_pending`. Holders increment before dereferencing a node they did
    // not just insert and decrement when done. The decrement is a release so
    // the holder's last access happens-before a sweep that observes zero.
    // =========================================================================

    /// Register an outstanding holder. Returns the new count.
    pub fn ref_acquire(&self) -> usize {
        self.refcount.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Drop an outstanding holder. Returns the new count.
    pub fn ref_release(&self) -> usize {
        self.refcount.fetch_sub(1, Ordering::Release) - 1
    }

    /// Current holder count (acquire load).
    pub fn ref_count(&self) -> usize {
        self.refcount.load(Ordering::Acquire)
    }

    // =========================================================================
    // Link accessors
    // =========================================================================

    /// Load the successor (acquire).
    #[inline]
    pub(crate) fn get_next(&self) -> NodePtr<T> {
        self.next.load(Ordering::Acquire)
    }

    /// Load the predecessor (acquire).
    #[inline]
    pub(crate) fn get_prev(&self) -> NodePtr<T> {
        self.prev.load(Ordering::Acquire)
    }

    /// Store the successor (release).
    #[inline]
    pub(crate) fn set_next(&self, ptr: NodePtr<T>) {
        self.next.store(ptr, Ordering::Release)
    }

    /// Store the predecessor (release).
    #[inline]
    pub(crate) fn set_prev(&self, ptr: NodePtr<T>) {
        self.prev.store(ptr, Ordering::Release)
    }

    /// Store the successor of a not-yet-reachable node (relaxed).
    #[inline]
    fn set_next_relaxed(&self, ptr: NodePtr<T>) {
        self.next.store(ptr, Ordering::Relaxed)
    }

    /// Store the predecessor of a not-yet-reachable node (relaxed).
    #[inline]
    fn set_prev_relaxed(&self, ptr: NodePtr<T>) {
        self.prev.store(ptr, Ordering::Relaxed)
    }

    /// Publication CAS on the successor (release / relaxed).
    #[inline]
    fn cas_next(&self, expected: NodePtr<T>, new: NodePtr<T>) -> Result<NodePtr<T>, NodePtr<T>> {
        self.next
            .compare_exchange(expected, new, Ordering::Release, Ordering::Relaxed)
    }

    /// Unlink CAS on the successor (acq_rel / acquire).
    #[inline]
    pub(crate) fn cas_next_unlink(
        &self,
        expected: NodePtr<T>,
        new: NodePtr<T>,
    ) -> Result<NodePtr<T>, NodePtr<T>> {
        self.next
            .compare_exchange(expected, new, Ordering::AcqRel, Ordering::Acquire)
    }

    /// Unlink CAS on the predecessor (acq_rel / acquire).
    #[inline]
    pub(crate) fn cas_prev_unlink(
        &self,
        expected: NodePtr<T>,
        new: NodePtr<T>,
    ) -> Result<NodePtr<T>, NodePtr<T>> {
        self.prev
            .compare_exchange(expected, new, Ordering::AcqRel, Ordering::Acquire)
    }

    /// Deallocate a node previously allocated by this crate.
    ///
    /// # Safety
    /// - `node` must have been allocated by `ListNode::new`, an allocating
    ///   insert, or a pre-allocated insert's `Box`
    /// - `node` must be unlinked (not reachable by traversal) and have no
    ///   remaining holders
    pub(crate) unsafe fn dealloc_ptr(node: NodePtr<T>) {
        drop(unsafe { Box::from_raw(node) });
    }
}

/// A borrowed handle to a published node.
///
/// `Copy`, pointer-sized, tied to the borrow of the list that produced it.
/// Dereferences to the [`ListNode`], so payload access, `mark_removed` and
/// the refcount operations are all available through it.
pub struct NodeRef<'a, T> {
    node: NonNull<ListNode<T>>,
    _list: PhantomData<&'a LockFreeList<T>>,
}

// Manual impls to avoid requiring T: Clone/Copy
impl<T> Copy for NodeRef<'_, T> {}

impl<T> Clone for NodeRef<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

// A NodeRef hands out &ListNode<T>, so it moves between threads exactly when
// a shared reference would.
unsafe impl<T: Sync> Send for NodeRef<'_, T> {}
unsafe impl<T: Sync> Sync for NodeRef<'_, T> {}

impl<'a, T> NodeRef<'a, T> {
    pub(crate) fn from_raw(node: NodePtr<T>) -> Option<NodeRef<'a, T>> {
        NonNull::new(node).map(|node| NodeRef {
            node,
            _list: PhantomData,
        })
    }

    /// Rebuild a handle from a raw pointer obtained via [`NodeRef::as_ptr`].
    ///
    /// # Safety
    /// `node` must point to a node that is still allocated and belongs to the
    /// list the caller is borrowing.
    pub unsafe fn from_ptr(node: NodePtr<T>) -> NodeRef<'a, T> {
        NodeRef {
            node: unsafe { NonNull::new_unchecked(node) },
            _list: PhantomData,
        }
    }

    /// The raw node pointer behind this handle.
    pub fn as_ptr(self) -> NodePtr<T> {
        self.node.as_ptr()
    }

    /// Successor handle, if any (acquire load; manual forward walk).
    pub fn next(self) -> Option<NodeRef<'a, T>> {
        NodeRef::from_raw(unsafe { self.node.as_ref() }.get_next())
    }

    /// Predecessor handle, if any (acquire load; manual backward walk).
    pub fn prev(self) -> Option<NodeRef<'a, T>> {
        NodeRef::from_raw(unsafe { self.node.as_ref() }.get_prev())
    }

    /// Whether two handles refer to the same node.
    pub fn ptr_eq(self, other: NodeRef<'_, T>) -> bool {
        self.node == other.node
    }
}

impl<T> Deref for NodeRef<'_, T> {
    type Target = ListNode<T>;

    fn deref(&self) -> &ListNode<T> {
        unsafe { self.node.as_ref() }
    }
}

/// The list anchor: an atomic head/tail pair, both null when empty.
///
/// Declarable standalone or embedded in a larger aggregate; `new` is const.
#[derive(Debug)]
pub struct LockFreeList<T> {
    pub(crate) head: AtomicPtr<ListNode<T>>,
    pub(crate) tail: AtomicPtr<ListNode<T>>,
    _marker: PhantomData<*mut ListNode<T>>,
}

// The marker field suppresses the auto impls; the list owns its nodes'
// payloads and shares them across threads.
unsafe impl<T: Send> Send for LockFreeList<T> {}
unsafe impl<T: Send + Sync> Sync for LockFreeList<T> {}

impl<T> Default for LockFreeList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LockFreeList<T> {
    /// Create an empty list.
    pub const fn new() -> Self {
        LockFreeList {
            head: AtomicPtr::new(ptr::null_mut()),
            tail: AtomicPtr::new(ptr::null_mut()),
            _marker: PhantomData,
        }
    }

    // =========================================================================
    // Publication
    // =========================================================================

    /// Allocate a node for `value` and publish it at the head.
    ///
    /// Returns [`ListError::ResourceExhausted`] and leaves the list unchanged
    /// when the allocation fails.
    pub fn insert_head(&self, value: T) -> Result<NodeRef<'_, T>, ListError> {
        let node = self.alloc_node(value)?;
        self.publish_head(node);
        Ok(NodeRef::from_raw(node).expect("freshly allocated node"))
    }

    /// Allocate a node for `value` and publish it at the tail.
    ///
    /// Returns [`ListError::ResourceExhausted`] and leaves the list unchanged
    /// when the allocation fails.
    pub fn insert_tail(&self, value: T) -> Result<NodeRef<'_, T>, ListError> {
        let node = self.alloc_node(value)?;
        self.publish_tail(node);
        Ok(NodeRef::from_raw(node).expect("freshly allocated node"))
    }

    /// Publish a caller-allocated node at the head.
    ///
    /// Link state and the `removed` flag are reset before the node becomes
    /// reachable; the payload is taken as initialized.
    pub fn insert_head_node(&self, node: Box<ListNode<T>>) -> NodeRef<'_, T> {
        let node = Box::into_raw(node);
        unsafe { (*node).removed.store(false, Ordering::Relaxed) };
        self.publish_head(node);
        NodeRef::from_raw(node).expect("boxed node")
    }

    /// Publish a caller-allocated node at the tail.
    ///
    /// Link state and the `removed` flag are reset before the node becomes
    /// reachable; the payload is taken as initialized.
    pub fn insert_tail_node(&self, node: Box<ListNode<T>>) -> NodeRef<'_, T> {
        let node = Box::into_raw(node);
        unsafe {
            (*node).set_next_relaxed(ptr::null_mut());
            (*node).removed.store(false, Ordering::Relaxed);
        }
        self.publish_tail(node);
        NodeRef::from_raw(node).expect("boxed node")
    }

    fn alloc_node(&self, value: T) -> Result<NodePtr<T>, ListError> {
        let layout = Layout::new::<ListNode<T>>();
        let raw = unsafe { alloc(layout) } as NodePtr<T>;
        if raw.is_null() {
            return Err(ListError::ResourceExhausted);
        }
        unsafe { raw.write(ListNode::unlinked(value)) };
        Ok(raw)
    }

    // Head publication: swing head to the new node, then repair the old
    // head's prev (or publish tail when the list was empty).
    fn publish_head(&self, node: NodePtr<T>) {
        loop {
            let old_head = self.head.load(Ordering::Acquire);
            unsafe {
                (*node).set_next_relaxed(old_head);
                (*node).set_prev_relaxed(ptr::null_mut());
            }
            if self
                .head
                .compare_exchange_weak(old_head, node, Ordering::Release, Ordering::Relaxed)
                .is_ok()
            {
                if !old_head.is_null() {
                    unsafe { (*old_head).set_prev(node) };
                } else {
                    self.tail.store(node, Ordering::Release);
                }
                return;
            }
        }
    }

    // Tail publication: two-step CAS. Link into the observed tail's next,
    // then advance the tail pointer; a failed advance means another inserter
    // already moved it past us.
    fn publish_tail(&self, node: NodePtr<T>) {
        loop {
            let expected_tail = self.tail.load(Ordering::Acquire);
            if expected_tail.is_null() {
                if self
                    .head
                    .compare_exchange_weak(
                        ptr::null_mut(),
                        node,
                        Ordering::Release,
                        Ordering::Relaxed,
                    )
                    .is_ok()
                {
                    self.tail.store(node, Ordering::Release);
                    unsafe { (*node).set_prev_relaxed(ptr::null_mut()) };
                    return;
                }
            } else {
                let linked = unsafe { (*expected_tail).cas_next(ptr::null_mut(), node) };
                if linked.is_ok() {
                    unsafe { (*node).set_prev(expected_tail) };
                    let _ = self.tail.compare_exchange(
                        expected_tail,
                        node,
                        Ordering::Release,
                        Ordering::Relaxed,
                    );
                    return;
                }
            }
        }
    }

    // =========================================================================
    // Anchor access
    // =========================================================================

    /// First node, if any (acquire load).
    pub fn head(&self) -> Option<NodeRef<'_, T>> {
        NodeRef::from_raw(self.head.load(Ordering::Acquire))
    }

    /// Last node, if any (acquire load).
    pub fn tail(&self) -> Option<NodeRef<'_, T>> {
        NodeRef::from_raw(self.tail.load(Ordering::Acquire))
    }

    /// Whether the list is empty at this instant.
    pub fn is_empty(&self) -> bool {
        self.head.load(Ordering::Acquire).is_null()
    }

    // =========================================================================
    // Physical unlink
    // =========================================================================

    /// Unlink one specific node and free it.
    ///
    /// Each side is a single tolerated CAS, not a retry loop: a failed CAS
    /// means a concurrent operation already adjusted that link.
    ///
    /// # Safety
    /// - `node` must currently be published in this list
    /// - no other thread may concurrently mutate either neighbor of `node`
    ///   or hold a reference into it when this call returns (prove it via
    ///   just-inserted ownership or application-level synchronization)
    pub unsafe fn delete(&self, node: NodeRef<'_, T>) {
        let node = node.as_ptr();
        let prev = unsafe { (*node).get_prev() };
        let next = unsafe { (*node).get_next() };

        if !prev.is_null() {
            let _ = unsafe { (*prev).cas_next_unlink(node, next) };
        } else {
            let _ = self
                .head
                .compare_exchange(node, next, Ordering::AcqRel, Ordering::Acquire);
        }

        if !next.is_null() {
            let _ = unsafe { (*next).cas_prev_unlink(node, prev) };
        } else {
            let _ = self
                .tail
                .compare_exchange(node, prev, Ordering::AcqRel, Ordering::Acquire);
        }

        unsafe { ListNode::dealloc_ptr(node) };
    }

    /// Unlink and return the first node. `None` when empty.
    ///
    /// The node is returned still allocated; dropping the `Box` frees it.
    ///
    /// # Safety
    /// The caller must ensure no other thread can still reach the popped node
    /// (e.g. an iterator paused on it) by the time the returned `Box` drops.
    pub unsafe fn pop_head(&self) -> Option<Box<ListNode<T>>> {
        loop {
            let cursor = self.head.load(Ordering::Acquire);
            if cursor.is_null() {
                return None;
            }
            let next = unsafe { (*cursor).get_next() };
            if self
                .head
                .compare_exchange_weak(cursor, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                if next.is_null() {
                    self.tail.store(ptr::null_mut(), Ordering::Release);
                } else {
                    // keep head.prev == null for the new head
                    let _ = unsafe { (*next).cas_prev_unlink(cursor, ptr::null_mut()) };
                }
                unsafe {
                    (*cursor).set_next(ptr::null_mut());
                    (*cursor).set_prev(ptr::null_mut());
                }
                return Some(unsafe { Box::from_raw(cursor) });
            }
        }
    }

    /// Unlink and return the last node. `None` when empty.
    ///
    /// O(n): walks head→tail to locate the predecessor of the current tail,
    /// restarting when the tail moves underneath the walk.
    ///
    /// # Safety
    /// Same contract as [`pop_head`](LockFreeList::pop_head).
    pub unsafe fn pop_tail(&self) -> Option<Box<ListNode<T>>> {
        let mut cursor_tail = self.tail.load(Ordering::Acquire);
        while !cursor_tail.is_null() {
            let mut prev: NodePtr<T> = ptr::null_mut();
            let mut curr = self.head.load(Ordering::Acquire);
            while !curr.is_null() && curr != cursor_tail {
                prev = curr;
                curr = unsafe { (*curr).get_next() };
            }
            if curr.is_null() {
                // tail vanished mid-walk
                return None;
            }

            if !prev.is_null() {
                if self
                    .tail
                    .compare_exchange(cursor_tail, prev, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
                {
                    unsafe {
                        (*prev).set_next(ptr::null_mut());
                        (*curr).set_next(ptr::null_mut());
                        (*curr).set_prev(ptr::null_mut());
                    }
                    return Some(unsafe { Box::from_raw(curr) });
                }
            } else if self
                .head
                .compare_exchange(
                    cursor_tail,
                    ptr::null_mut(),
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok()
            {
                self.tail.store(ptr::null_mut(), Ordering::Release);
                unsafe {
                    (*curr).set_next(ptr::null_mut());
                    (*curr).set_prev(ptr::null_mut());
                }
                return Some(unsafe { Box::from_raw(curr) });
            }

            cursor_tail = self.tail.load(Ordering::Acquire);
        }
        None
    }

    // =========================================================================
    // Sweep & reclamation
    // =========================================================================

    /// Free every node observed as logically removed with no outstanding
    /// holders. Returns the number of nodes freed.
    ///
    /// # Safety
    /// Same contract as [`sweep_with`](LockFreeList::sweep_with).
    pub unsafe fn sweep(&self) -> usize {
        unsafe { self.sweep_with(|_| {}) }
    }

    /// Sweep with a cleanup callback invoked on each node just before it is
    /// freed. Returns the number of nodes freed.
    ///
    /// The walk keeps a trailing predecessor cursor. A condemned node is
    /// unlinked by CASing the predecessor's `next` (or `head`) to its
    /// successor; on CAS failure the walk restarts from head. The tail anchor
    /// and the successor's `prev` get the same tolerated-failure repairs that
    /// `delete` performs, so a freed node is never left reachable.
    ///
    /// # Safety
    /// Reclamation relies on the external refcount discipline: every thread
    /// that dereferences nodes it did not just insert must hold a refcount
    /// increment for the duration, and its last access must happen-before the
    /// decrement to zero. Concurrent unprotected readers make this call a
    /// use-after-free.
    pub unsafe fn sweep_with<F>(&self, mut cleanup: F) -> usize
    where
        F: FnMut(&ListNode<T>),
    {
        let mut freed = 0;
        let mut prev: NodePtr<T> = ptr::null_mut();
        let mut curr = self.head.load(Ordering::Acquire);

        while !curr.is_null() {
            let next = unsafe { (*curr).get_next() };
            let removed = unsafe { (*curr).is_removed() };
            let refs = unsafe { (*curr).ref_count() };

            if removed && refs == 0 {
                let unlinked = if !prev.is_null() {
                    unsafe { (*prev).cas_next_unlink(curr, next).is_ok() }
                } else {
                    self.head
                        .compare_exchange(curr, next, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                };

                if unlinked {
                    if next.is_null() {
                        let _ = self.tail.compare_exchange(
                            curr,
                            prev,
                            Ordering::AcqRel,
                            Ordering::Acquire,
                        );
                    } else {
                        let _ = unsafe { (*next).cas_prev_unlink(curr, prev) };
                    }
                    unsafe {
                        cleanup(&*curr);
                        ListNode::dealloc_ptr(curr);
                    }
                    freed += 1;
                    curr = next;
                    continue;
                }

                // structure changed underneath; restart from head
                prev = ptr::null_mut();
                curr = self.head.load(Ordering::Acquire);
                continue;
            }

            prev = curr;
            curr = next;
        }

        freed
    }

    /// Unconditionally free every node and reset both anchors.
    ///
    /// # Safety
    /// The caller must be the only thread accessing the list, and no handles
    /// into it may survive the call (shutdown path).
    pub unsafe fn clear(&self) {
        let mut cursor = self.head.load(Ordering::Acquire);
        while !cursor.is_null() {
            let next = unsafe { (*cursor).next.load(Ordering::Relaxed) };
            unsafe { ListNode::dealloc_ptr(cursor) };
            cursor = next;
        }
        self.head.store(ptr::null_mut(), Ordering::Release);
        self.tail.store(ptr::null_mut(), Ordering::Release);
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Iterate over the nodes that are not logically removed.
    ///
    /// The iterator snapshots `head` on entry and stashes each node's
    /// successor before inspecting its `removed` flag, so the current node
    /// may be marked or deleted inside the loop body without losing the
    /// traversal position. Nodes inserted at the head after entry are not
    /// observed.
    pub fn iter_live(&self) -> LiveIter<'_, T> {
        LiveIter::new(self)
    }

    /// Count the nodes that are not logically removed. O(n).
    pub fn count_live(&self) -> usize {
        self.iter_live().count()
    }

    /// Count the nodes that are logically removed but still held
    /// (`removed ∧ refcount > 0`), i.e. what a sweep would have to skip. O(n).
    pub fn count_pending(&self) -> usize {
        let mut pending = 0;
        let mut cursor = self.head.load(Ordering::Acquire);
        while !cursor.is_null() {
            let removed = unsafe { (*cursor).is_removed() };
            let refs = unsafe { (*cursor).ref_count() };
            if removed && refs > 0 {
                pending += 1;
            }
            cursor = unsafe { (*cursor).get_next() };
        }
        pending
    }

    /// First live node whose selected payload field equals `value`.
    ///
    /// `selector` is a pure accessor from payload to a comparable scalar,
    /// resolved at the call site. Logically removed nodes are skipped; `None`
    /// encodes not-found.
    pub fn find<K, F>(&self, selector: F, value: K) -> Option<NodeRef<'_, T>>
    where
        F: Fn(&T) -> K,
        K: PartialEq,
    {
        self.iter_live()
            .find(|node| selector(node.value()) == value)
    }
}

impl<T> Drop for LockFreeList<T> {
    fn drop(&mut self) {
        // exclusive access: &mut self
        unsafe { self.clear() };
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_list() {
        let list: LockFreeList<u64> = LockFreeList::new();
        assert!(list.is_empty());
        assert!(list.head().is_none());
        assert!(list.tail().is_none());
        assert_eq!(list.count_live(), 0);
        assert_eq!(list.count_pending(), 0);
    }

    #[test]
    fn test_single_insert_links() {
        let list = LockFreeList::new();
        let node = list.insert_tail(7u64).unwrap();

        let head = list.head().unwrap();
        let tail = list.tail().unwrap();
        assert!(head.ptr_eq(node));
        assert!(tail.ptr_eq(node));
        assert!(node.next().is_none());
        assert!(node.prev().is_none());
        assert!(!node.is_removed());
        assert_eq!(node.ref_count(), 0);
    }

    #[test]
    fn test_tail_insert_order() {
        let list = LockFreeList::new();
        for id in [1u64, 2, 3] {
            list.insert_tail(id).unwrap();
        }

        let mut ids = Vec::new();
        let mut cursor = list.head();
        while let Some(node) = cursor {
            ids.push(*node.value());
            cursor = node.next();
        }
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(*list.tail().unwrap().value(), 3);
    }

    #[test]
    fn test_head_insert_order() {
        let list = LockFreeList::new();
        for id in [1u64, 2, 3] {
            list.insert_head(id).unwrap();
        }

        let mut ids = Vec::new();
        let mut cursor = list.head();
        while let Some(node) = cursor {
            ids.push(*node.value());
            cursor = node.next();
        }
        assert_eq!(ids, vec![3, 2, 1]);
        assert_eq!(*list.tail().unwrap().value(), 1);
    }

    #[test]
    fn test_preallocated_insert_resets_state() {
        let list = LockFreeList::new();
        let boxed = ListNode::new(42u64);
        boxed.mark_removed();

        let node = list.insert_tail_node(boxed);
        assert!(!node.is_removed());
        assert_eq!(list.count_live(), 1);
    }

    #[test]
    fn test_pop_head_roundtrip() {
        let list = LockFreeList::new();
        let inserted = list.insert_head(9u64).unwrap().as_ptr();

        let popped = unsafe { list.pop_head() }.unwrap();
        assert_eq!(*popped.value(), 9);
        assert_eq!(&*popped as *const ListNode<u64> as *mut _, inserted);
        assert!(list.is_empty());
        assert!(list.tail().is_none());
    }

    #[test]
    fn test_pop_head_repairs_new_head_prev() {
        let list = LockFreeList::new();
        list.insert_tail(1u64).unwrap();
        list.insert_tail(2u64).unwrap();

        let popped = unsafe { list.pop_head() }.unwrap();
        assert_eq!(*popped.value(), 1);

        let head = list.head().unwrap();
        assert_eq!(*head.value(), 2);
        assert!(head.prev().is_none());
    }

    #[test]
    fn test_pop_tail_single_element() {
        let list = LockFreeList::new();
        list.insert_tail(5u64).unwrap();

        let popped = unsafe { list.pop_tail() }.unwrap();
        assert_eq!(popped.into_value(), 5);
        assert!(list.head().is_none());
        assert!(list.tail().is_none());
    }

    #[test]
    fn test_sweep_skips_live_and_held() {
        let list = LockFreeList::new();
        let a = list.insert_tail(1u64).unwrap();
        let b = list.insert_tail(2u64).unwrap();
        list.insert_tail(3u64).unwrap();

        // a stays live; b is removed but held
        b.mark_removed();
        b.ref_acquire();
        let _ = a;

        let freed = unsafe { list.sweep() };
        assert_eq!(freed, 0);
        assert_eq!(list.count_pending(), 1);

        b.ref_release();
        let freed = unsafe { list.sweep() };
        assert_eq!(freed, 1);
        assert_eq!(list.count_live(), 2);
        assert_eq!(list.count_pending(), 0);
    }

    #[test]
    fn test_sweep_repairs_tail_anchor() {
        let list = LockFreeList::new();
        list.insert_tail(1u64).unwrap();
        let last = list.insert_tail(2u64).unwrap();

        last.mark_removed();
        let freed = unsafe { list.sweep() };
        assert_eq!(freed, 1);

        let tail = list.tail().unwrap();
        assert_eq!(*tail.value(), 1);
        assert!(tail.next().is_none());
    }

    #[test]
    fn test_alloc_failure_maps_to_resource_exhausted() {
        // Can't force the allocator to fail here; assert the error variant
        // wiring instead.
        let err = ListError::ResourceExhausted;
        assert_eq!(format!("{err}"), "node allocation failed");
    }
}
