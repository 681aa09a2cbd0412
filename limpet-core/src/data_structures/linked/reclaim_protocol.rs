//! # Removal & Reclamation Protocol
//!
//! Design notes for the two-phase removal discipline of
//! [`LockFreeList`](super::LockFreeList) and the interaction between logical
//! removal, live iteration and the sweep.
//!
//! ## Why two phases
//!
//! Removal must be callable while other threads hold references into the
//! node, so it cannot free. Freeing must not race with holders, so it cannot
//! happen at removal time. The split:
//!
//! ```text
//! Phase 1 (any thread):   removed ← true        one release store, O(1)
//! Phase 2 (the sweeper):  observe removed ∧ refcount == 0, unlink, free
//! ```
//!
//! The sweep is the single point where "safe to free" is decided. The
//! refcount is consulted there and only there.
//!
//! ## Refcount discipline (external)
//!
//! The count is maintained by the list's *users*, never by the list:
//!
//! ```text
//! acquire:  refcount.fetch_add(1, Relaxed)     before dereferencing a node
//!                                              the thread did not just insert
//! release:  refcount.fetch_sub(1, Release)     after the last access
//! sweep:    refcount.load(Acquire)             zero authorizes the free
//! ```
//!
//! The release/acquire pair makes a holder's last access happen-before the
//! free that a zero observation authorizes. An increment needs no ordering of
//! its own: it is always derived from an existing protected reference, the
//! same shape as a reference-counted clone.
//!
//! ## Sweep walk
//!
//! ```text
//! prev ← null, curr ← head (acquire)
//! while curr:
//!     next, removed, refs ← curr.next, curr.removed, curr.refcount (acquire)
//!     if removed ∧ refs == 0:
//!         CAS (prev ? prev.next : head): curr → next     (acq_rel)
//!         ok   → repair tail / next.prev, cleanup(curr), free, curr ← next
//!         fail → prev ← null, curr ← head                (restart)
//!     else:
//!         prev ← curr, curr ← next
//! ```
//!
//! A failed CAS means the structure changed underneath (another sweep, a
//! delete, a pop, or a head insertion when prev was null); the restart
//! re-observes a consistent prefix. Every successful unlink shrinks the
//! condemned population and every non-unlink step advances the cursor, so the
//! walk terminates; under unbounded contention there is no liveness bound.
//!
//! ## Anchor and backlink repair
//!
//! Unlinking through `pred.next` alone would leave two stale routes to the
//! freed node: the tail anchor (when the condemned node was last) and the
//! successor's `prev`. Both get the same tolerated-failure CAS repair that
//! `delete` performs on its own neighbors:
//!
//! ```text
//! next == null → CAS tail: curr → prev
//! next != null → CAS next.prev: curr → prev
//! ```
//!
//! A failure means a concurrent operation already moved that link past the
//! condemned node, which is exactly the state the repair wanted.
//!
//! ## Live iteration vs. sweep
//!
//! The iterator stashes `next` before checking `removed`, so an in-loop
//! `mark_removed`/`delete` of the yielded node cannot derail it. Against the
//! sweep the contract is directional:
//!
//! - a node the iterator already passed may be freed at any time (safe, the
//!   iterator holds no reference back);
//! - a node the iterator is *about to* visit must be protected by the
//!   iterator's own refcount increment if the iterator can pause across the
//!   visit. The list does not enforce this; it only promises the sweep will
//!   honor a non-zero count.
//!
//! ## Publication edges
//!
//! Head insertion is a single CAS on `head`; a successful publisher then
//! repairs `old_head.prev` (or publishes `tail` when the list was empty).
//! Tail insertion is two steps: CAS the observed tail's `next` from null,
//! then best-effort CAS of the `tail` anchor. Because the anchor advance can
//! lag, the tail pointer is a hint, not a linearization point: readers chase
//! `next` to the true end, and the next inserter's advance CAS self-heals
//! the anchor. This is also why the structure is not a strict linearizable
//! MPMC queue: draining the list to empty concurrently with tail insertion
//! can strand a node behind a just-popped head. Pop-to-empty therefore
//! belongs to a quiesced producer side.
//!
//! ## Immediate path
//!
//! `delete` and `pop_*` skip the refcount check by contract: the caller
//! proves exclusivity (the node was just popped or just inserted by this
//! thread, or the application serialized access). Their unlink CASes are
//! single-shot and tolerated, not retried; under the precondition a failure
//! can only mean the link was already adjusted in the caller's favor.
