//! Block-structured entry storage with striped free-list recycling.
//!
//! Entries live in fixed-size blocks that are only ever appended, so a slot
//! index stays valid for the lifetime of the slab. The top-level directory of
//! block pointers is grown copy-on-write behind a coarse mutex: readers load
//! it with a single atomic read and a stale directory remains valid because
//! blocks never move.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicI32, AtomicPtr, AtomicUsize, Ordering};

use crossbeam_utils::CachePadded;
use parking_lot::Mutex;
use portable_atomic::AtomicU64;

/// Number of independent free lists. Slots are pushed and popped round-robin
/// so no single list becomes a contention point.
pub(crate) const FREE_LISTS: usize = 16;
const FREE_MASK: usize = FREE_LISTS - 1;

/// Smallest permitted block size. Must exceed the carve headroom of one slot
/// per free list so growth always makes progress.
pub(crate) const MIN_BLOCK: usize = 64;

/// One entry slot.
///
/// `prev`/`next` thread the order list and are mutated only through the CAS
/// protocol in `order.rs`; a negative value is the bit-complement "being
/// unlinked" mark. `link` chains entries within a hash bucket (0 = end) and
/// doubles as the free-list link while the slot is unallocated. `key` and
/// `value` are guarded by the stripe lock of the owning bucket.
pub(crate) struct Slot<K, V> {
    pub(crate) prev: AtomicI32,
    pub(crate) next: AtomicI32,
    pub(crate) link: AtomicI32,
    pub(crate) hash: AtomicU64,
    key: UnsafeCell<Option<K>>,
    value: UnsafeCell<Option<V>>,
}

impl<K, V> Slot<K, V> {
    fn empty() -> Self {
        Slot {
            prev: AtomicI32::new(0),
            next: AtomicI32::new(0),
            link: AtomicI32::new(0),
            hash: AtomicU64::new(0),
            key: UnsafeCell::new(None),
            value: UnsafeCell::new(None),
        }
    }

    /// # Safety
    /// The stripe lock of the bucket owning this slot must be held.
    pub(crate) unsafe fn key_ref(&self) -> Option<&K> {
        (*self.key.get()).as_ref()
    }

    /// # Safety
    /// The stripe lock of the bucket owning this slot must be held.
    pub(crate) unsafe fn value_ref(&self) -> Option<&V> {
        (*self.value.get()).as_ref()
    }

    /// # Safety
    /// The stripe lock of the bucket owning this slot must be held.
    pub(crate) unsafe fn value_mut(&self) -> Option<&mut V> {
        (*self.value.get()).as_mut()
    }

    /// Installs the key/value pair of a freshly allocated slot.
    ///
    /// # Safety
    /// The stripe lock of the destination bucket must be held and the slot
    /// must not be reachable from any chain yet.
    pub(crate) unsafe fn set_kv(&self, key: K, value: V) {
        *self.key.get() = Some(key);
        *self.value.get() = Some(value);
    }

    /// Moves the key/value pair out of a slot being removed.
    ///
    /// # Safety
    /// The stripe lock of the bucket owning this slot must be held.
    pub(crate) unsafe fn take_kv(&self) -> (K, V) {
        match ((*self.key.get()).take(), (*self.value.get()).take()) {
            (Some(k), Some(v)) => (k, v),
            _ => panic!("slab corrupted: live slot missing key or value"),
        }
    }
}

/// Snapshot of block base pointers. Superseded directories are kept
/// registered in `Storage` so a reader holding a stale one can still index
/// every block that existed when it was published.
struct Directory<K, V> {
    blocks: Vec<*mut Slot<K, V>>,
}

/// Registry of all blocks and directories ever created, guarded by the
/// growth mutex. Nothing is freed until the slab itself drops.
struct Storage<K, V> {
    blocks: Vec<*mut Slot<K, V>>,
    directories: Vec<*mut Directory<K, V>>,
}

/// One striped free list: a single word packing `(tag: u32, head: i32)`.
/// The tag increments on every successful push or pop, which defeats ABA on
/// the head index even though slots are recycled.
struct FreeList {
    state: AtomicU64,
}

impl FreeList {
    fn new() -> Self {
        FreeList {
            state: AtomicU64::new(0),
        }
    }

    fn push<K, V>(&self, slab: &Slab<K, V>, index: i32) {
        debug_assert!(index > 0);
        loop {
            let cur = self.state.load(Ordering::Acquire);
            let head = cur as u32 as i32;
            slab.slot(index).link.store(head, Ordering::Relaxed);
            let next = (((cur >> 32).wrapping_add(1)) << 32) | index as u32 as u64;
            if self
                .state
                .compare_exchange_weak(cur, next, Ordering::SeqCst, Ordering::Relaxed)
                .is_ok()
            {
                return;
            }
        }
    }

    fn pop<K, V>(&self, slab: &Slab<K, V>) -> Option<i32> {
        loop {
            let cur = self.state.load(Ordering::Acquire);
            let head = cur as u32 as i32;
            if head == 0 {
                return None;
            }
            // If `head` is popped and repushed behind our back this read is
            // stale, but the tag bump makes the CAS below fail.
            let link = slab.slot(head).link.load(Ordering::Relaxed);
            let next = (((cur >> 32).wrapping_add(1)) << 32) | link as u32 as u64;
            if self
                .state
                .compare_exchange_weak(cur, next, Ordering::SeqCst, Ordering::Relaxed)
                .is_ok()
            {
                return Some(head);
            }
        }
    }
}

/// Growable slab of entry slots addressed by `i32` index.
///
/// Index 0 is reserved for the order-list sentinel and is never allocated.
pub(crate) struct Slab<K, V> {
    /// Current directory; replaced only under the growth mutex.
    dir: AtomicPtr<Directory<K, V>>,
    /// Coarse growth lock, also the owner of every block and directory.
    grow: Mutex<Storage<K, V>>,
    /// Total slots backed by blocks (in units of slots, not blocks).
    size: AtomicI32,
    /// First slot index that has never been carved from a block.
    next_unused: AtomicI32,
    free: Box<[CachePadded<FreeList>]>,
    alloc_version: AtomicUsize,
    free_version: AtomicUsize,
    block_size: usize,
    shift: u32,
    mask: usize,
}

// SAFETY: the raw block pointers only ever reference heap memory owned by
// `Storage`, which lives exactly as long as the slab. Key/value cells are
// guarded by the caller's stripe locks, so sending or sharing the slab is
// sound whenever K and V themselves may cross threads.
unsafe impl<K: Send, V: Send> Send for Slab<K, V> {}
unsafe impl<K: Send + Sync, V: Send + Sync> Sync for Slab<K, V> {}

impl<K, V> Slab<K, V> {
    pub(crate) fn new(block_size: usize) -> Self {
        let block_size = block_size.next_power_of_two().max(MIN_BLOCK);
        let block = new_block::<K, V>(block_size);
        let dir = Box::into_raw(Box::new(Directory {
            blocks: vec![block],
        }));

        Slab {
            dir: AtomicPtr::new(dir),
            grow: Mutex::new(Storage {
                blocks: vec![block],
                directories: vec![dir],
            }),
            size: AtomicI32::new(block_size as i32),
            next_unused: AtomicI32::new(1),
            free: (0..FREE_LISTS)
                .map(|_| CachePadded::new(FreeList::new()))
                .collect(),
            alloc_version: AtomicUsize::new(0),
            free_version: AtomicUsize::new(0),
            block_size,
            shift: block_size.trailing_zeros(),
            mask: block_size - 1,
        }
    }

    /// Resolves an index to its slot. Never blocks; a stale directory is
    /// fine because any index handed out is covered by every directory
    /// published at or after its block was appended.
    #[inline]
    pub(crate) fn slot(&self, index: i32) -> &Slot<K, V> {
        debug_assert!(index >= 0, "marked link value used as slot index");
        // SAFETY: the directory pointer is valid for the life of the slab.
        let dir = unsafe { &*self.dir.load(Ordering::Acquire) };
        let block = index as usize >> self.shift;
        assert!(block < dir.blocks.len(), "slot index beyond slab directory");
        // SAFETY: block pointers are valid for the life of the slab and
        // offset is masked into the block.
        unsafe { &*dir.blocks[block].add(index as usize & self.mask) }
    }

    /// Hands out a slot in O(1) amortized time: recycled from a free list,
    /// carved off the never-used tail, or (rarely) from a freshly grown
    /// block. Existing indices are never invalidated.
    pub(crate) fn alloc_slot(&self) -> i32 {
        loop {
            let start = self.alloc_version.fetch_add(1, Ordering::Relaxed);
            for offset in 0..FREE_LISTS {
                if let Some(index) = self.free[(start + offset) & FREE_MASK].pop(self) {
                    return index;
                }
            }

            // Carve below a headroom of one slot per free list; the CAS on
            // `next_unused` is what keeps concurrent exhaustion from handing
            // out the same index twice.
            loop {
                let used = self.next_unused.load(Ordering::Relaxed);
                if used + FREE_LISTS as i32 >= self.size.load(Ordering::Acquire) {
                    break;
                }
                if self
                    .next_unused
                    .compare_exchange_weak(used, used + 1, Ordering::SeqCst, Ordering::Relaxed)
                    .is_ok()
                {
                    return used;
                }
            }

            self.grow();
        }
    }

    /// Returns a slot for reuse. The caller must have cleared the key/value
    /// and detached the slot from its chain and from the order list; each
    /// freed slot must be passed here exactly once.
    pub(crate) fn free_slot(&self, index: i32) {
        let at = self.free_version.fetch_add(1, Ordering::Relaxed) & FREE_MASK;
        self.free[at].push(self, index);
    }

    /// Appends one block and publishes a new directory. Held briefly and
    /// rarely; re-checks under the lock so racing growers append one block
    /// total, not one each.
    fn grow(&self) {
        let mut storage = self.grow.lock();
        if self.next_unused.load(Ordering::Relaxed) + (FREE_LISTS as i32)
            < self.size.load(Ordering::Relaxed)
        {
            return;
        }

        let block = new_block::<K, V>(self.block_size);

        // SAFETY: the current directory is registered in `storage`, which we
        // hold, and stays valid until the slab drops.
        let current = unsafe { &*self.dir.load(Ordering::Relaxed) };
        let mut blocks = current.blocks.clone();
        blocks.push(block);
        let dir = Box::into_raw(Box::new(Directory { blocks }));

        storage.blocks.push(block);
        storage.directories.push(dir);
        self.dir.store(dir, Ordering::Release);
        self.size
            .fetch_add(self.block_size as i32, Ordering::Release);
    }

    #[cfg(test)]
    fn carved(&self) -> i32 {
        self.next_unused.load(Ordering::Relaxed)
    }

    #[cfg(test)]
    fn free_len(&self) -> usize {
        // Quiescent-only accounting walk used by tests.
        let mut total = 0;
        for list in self.free.iter() {
            let mut index = list.state.load(Ordering::Acquire) as u32 as i32;
            while index != 0 {
                total += 1;
                index = self.slot(index).link.load(Ordering::Relaxed);
            }
        }
        total
    }
}

impl<K, V> Drop for Slab<K, V> {
    fn drop(&mut self) {
        let storage = self.grow.get_mut();
        for &dir in &storage.directories {
            // SAFETY: created by Box::into_raw in new/grow, freed once here.
            unsafe { drop(Box::from_raw(dir)) };
        }
        for &block in &storage.blocks {
            // SAFETY: every block is `block_size` slots obtained from
            // Box::into_raw; dropping it also drops any live keys/values.
            unsafe {
                drop(Box::from_raw(core::ptr::slice_from_raw_parts_mut(
                    block,
                    self.block_size,
                )));
            }
        }
    }
}

fn new_block<K, V>(block_size: usize) -> *mut Slot<K, V> {
    let block: Box<[Slot<K, V>]> = (0..block_size).map(|_| Slot::empty()).collect();
    Box::into_raw(block).cast()
}
