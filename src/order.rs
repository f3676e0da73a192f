//! Lock-free recency list threaded through the slab.
//!
//! Live entries form a doubly linked cycle rooted at sentinel slot 0:
//! `slot(0).next` is the most recently linked entry, `slot(0).prev` the
//! oldest. All maintenance runs as compare-and-swap retries on the `prev`/
//! `next` fields, independent of any bucket lock, so a thread inspecting the
//! list is never blocked by one relinking an entry.
//!
//! Unlinking is optimistic: both fields of the victim are first marked by
//! storing their bit-complement, then the neighbors are spliced. If the
//! splice loses a race the marks are rolled back and the whole attempt
//! retries. A marked field also causes any competing splice or link into the
//! victim to fail and retry, which is what lets the two sides converge
//! without blocking.

use core::sync::atomic::{AtomicI32, Ordering};

use crossbeam_utils::Backoff;

use crate::slab::Slab;

/// Index of the entry that has been linked the longest ago, or 0 when the
/// list is empty. A snapshot only; the caller must re-validate under the
/// owning bucket's lock before trusting it.
#[inline]
pub(crate) fn oldest<K, V>(slab: &Slab<K, V>) -> i32 {
    slab.slot(0).prev.load(Ordering::Acquire)
}

/// Links `index` in front of every current entry.
///
/// The slot's `prev`/`next` are staged before the sentinel head is swung, so
/// the entry is fully wired the moment it becomes reachable. The displaced
/// head's back link is then fixed with a spin: the only way that CAS can
/// keep failing is a concurrent unlink of the displaced head, which must
/// roll back (its own splice now fails against our published head) before
/// this loop can proceed.
pub(crate) fn link<K, V>(slab: &Slab<K, V>, index: i32) {
    debug_assert!(index > 0);
    let slot = slab.slot(index);
    let sentinel = slab.slot(0);
    loop {
        let head = sentinel.next.load(Ordering::Acquire);
        slot.prev.store(0, Ordering::Relaxed);
        slot.next.store(head, Ordering::Relaxed);
        if sentinel
            .next
            .compare_exchange(head, index, Ordering::SeqCst, Ordering::Relaxed)
            .is_err()
        {
            continue;
        }
        let neighbor = slab.slot(head);
        while neighbor
            .prev
            .compare_exchange(0, index, Ordering::SeqCst, Ordering::Relaxed)
            .is_err()
        {
            core::hint::spin_loop();
        }
        return;
    }
}

/// Detaches `index` from wherever it currently sits in the list.
///
/// The caller must own the entry (hold its bucket's stripe lock), which is
/// what guarantees no second unlink of the same slot runs concurrently;
/// observing an already-marked field here therefore means the protocol was
/// violated and continuing would corrupt the cycle.
pub(crate) fn unlink<K, V>(slab: &Slab<K, V>, index: i32) {
    debug_assert!(index > 0);
    let slot = slab.slot(index);
    let backoff = Backoff::new();
    loop {
        let prev = mark(&slot.prev, index);
        let next = mark(&slot.next, index);

        if slab
            .slot(prev)
            .next
            .compare_exchange(index, next, Ordering::SeqCst, Ordering::Relaxed)
            .is_ok()
        {
            // A competing unlink of `next` cannot get past its own splice
            // while our marks are in place, so it rolls back and this CAS
            // eventually observes `index` again.
            while slab
                .slot(next)
                .prev
                .compare_exchange(index, prev, Ordering::SeqCst, Ordering::Relaxed)
                .is_err()
            {
                core::hint::spin_loop();
            }
            return;
        }

        // Splice lost a race (a neighbor changed); roll the marks back and
        // start over from the fresh neighborhood.
        slot.next.store(next, Ordering::Release);
        slot.prev.store(prev, Ordering::Release);
        backoff.spin();
    }
}

/// Replaces a non-negative link value with its bit-complement mark and
/// returns the value that was marked.
fn mark(field: &AtomicI32, index: i32) -> i32 {
    let mut value = field.load(Ordering::Acquire);
    loop {
        assert!(
            value >= 0,
            "order list corrupted: slot {index} unlinked twice"
        );
        match field.compare_exchange(value, !value, Ordering::SeqCst, Ordering::Acquire) {
            Ok(_) => return value,
            Err(current) => value = current,
        }
    }
}
