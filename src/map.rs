//! The bucket-table engine and the public map facade.

use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use core::sync::atomic::{AtomicI32, AtomicUsize, Ordering};

use crossbeam_utils::{Backoff, CachePadded};
use foldhash::fast::FixedState;
use parking_lot::Mutex;

use crate::options::{Events, Options, OrderMode};
use crate::order;
use crate::slab::Slab;
use crate::visitor::{CreateOrUpdate, GetOrInsert, InsertIfAbsent, RemoveIf, Upsert, UpsertWith};

/// Outcome of an [`insert_with`](LinkedMap::insert_with) call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertResult {
    /// A new entry was created.
    Inserted,
    /// An existing entry's value was replaced.
    Updated,
    /// The key was present and the visitor declined to update it.
    Exists,
    /// The key was absent and the visitor declined to create it.
    NotFound,
}

/// Concurrent hash map whose entries are threaded on a recency list and
/// which can evict its oldest entry once a configured limit is exceeded.
///
/// Every per-key operation takes exactly one stripe lock (buckets map onto a
/// small fixed pool of mutexes), holds it for the length of one bucket
/// chain, and maintains the recency list lock-free. Values are returned by
/// clone, so cheap-to-clone value types (`Arc<T>`, small copies) work best.
///
/// Construct with [`LinkedMap::new`] for an unordered, unbounded map or
/// through [`Options`] for ordering, bounding, and tuning.
pub struct LinkedMap<K, V, S = FixedState> {
    slab: Slab<K, V>,
    buckets: Box<[AtomicI32]>,
    locks: Box<[CachePadded<Mutex<()>>]>,
    lock_mask: usize,
    count: AtomicUsize,
    order: OrderMode,
    /// 0 means unbounded; `Options::build` rejects an explicit zero.
    limit: usize,
    hasher: S,
    events: Option<Arc<dyn Events<K, V>>>,
}

impl<K, V> LinkedMap<K, V, FixedState>
where
    K: Hash + Eq + Clone + 'static,
    V: Clone + 'static,
{
    /// Creates an unordered, unbounded map with default tuning.
    pub fn new() -> Self {
        match Options::default().build() {
            Ok(map) => map,
            Err(_) => unreachable!("default options always validate"),
        }
    }

    /// Creates an unbounded map with the given recency policy.
    pub fn with_order(order: OrderMode) -> Self {
        match Options::default().order(order).build() {
            Ok(map) => map,
            Err(_) => unreachable!("an order mode alone always validates"),
        }
    }
}

impl<K, V> Default for LinkedMap<K, V, FixedState>
where
    K: Hash + Eq + Clone + 'static,
    V: Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> LinkedMap<K, V, S>
where
    K: Hash + Eq + Clone + 'static,
    V: Clone + 'static,
    S: BuildHasher,
{
    pub(crate) fn with_options(options: Options<K, V, S>) -> Self {
        let hash_buckets = next_prime(options.hash_buckets.max(17));
        let lock_stripes = options.lock_stripes.max(1).next_power_of_two();
        LinkedMap {
            slab: Slab::new(options.block_size),
            buckets: (0..hash_buckets).map(|_| AtomicI32::new(0)).collect(),
            locks: (0..lock_stripes)
                .map(|_| CachePadded::new(Mutex::new(())))
                .collect(),
            lock_mask: lock_stripes - 1,
            count: AtomicUsize::new(0),
            order: options.order,
            limit: options.limit.unwrap_or(0),
            hasher: options.hasher,
            events: options.events,
        }
    }

    #[inline]
    fn hash_of<Q: Hash + ?Sized>(&self, key: &Q) -> u64 {
        self.hasher.hash_one(key)
    }

    #[inline]
    fn bucket_of(&self, hash: u64) -> usize {
        (hash % self.buckets.len() as u64) as usize
    }

    #[inline]
    fn lock_for(&self, bucket: usize) -> &Mutex<()> {
        &self.locks[bucket & self.lock_mask]
    }

    #[inline]
    fn require_order(&self, op: &str) {
        assert!(
            self.order != OrderMode::None,
            "{op} requires an ordered map; build with OrderMode::Insertion, Modified, or Access"
        );
    }

    /// Walks `bucket`'s chain for `key`. Returns `(predecessor, index)`,
    /// both 0 when absent. Caller holds the bucket's stripe lock.
    fn chain_find<Q>(&self, bucket: usize, hash: u64, key: &Q) -> (i32, i32)
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let mut prev = 0;
        let mut index = self.buckets[bucket].load(Ordering::Relaxed);
        while index != 0 {
            let slot = self.slab.slot(index);
            if slot.hash.load(Ordering::Relaxed) == hash {
                // SAFETY: the caller holds this bucket's stripe lock.
                if unsafe { slot.key_ref() }.is_some_and(|k| k.borrow() == key) {
                    return (prev, index);
                }
            }
            prev = index;
            index = slot.link.load(Ordering::Relaxed);
        }
        (0, 0)
    }

    /// Walks `bucket`'s chain for a slot index (identity, not key equality).
    /// Returns the predecessor when found. Caller holds the stripe lock.
    fn chain_find_index(&self, bucket: usize, target: i32) -> Option<i32> {
        let mut prev = 0;
        let mut index = self.buckets[bucket].load(Ordering::Relaxed);
        while index != 0 {
            if index == target {
                return Some(prev);
            }
            prev = index;
            index = self.slab.slot(index).link.load(Ordering::Relaxed);
        }
        None
    }

    /// Patches `index` out of its chain. Caller holds the stripe lock.
    fn chain_detach(&self, bucket: usize, prev: i32, index: i32) {
        let next = self.slab.slot(index).link.load(Ordering::Relaxed);
        if prev == 0 {
            self.buckets[bucket].store(next, Ordering::Relaxed);
        } else {
            self.slab.slot(prev).link.store(next, Ordering::Relaxed);
        }
    }

    /// Returns a clone of the value stored for `key`.
    ///
    /// Under [`OrderMode::Access`] a hit also refreshes the entry's recency.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_of(key);
        let bucket = self.bucket_of(hash);
        let _guard = self.lock_for(bucket).lock();
        let (_, index) = self.chain_find(bucket, hash, key);
        if index == 0 {
            return None;
        }
        let slot = self.slab.slot(index);
        // SAFETY: stripe lock held.
        let value = match unsafe { slot.value_ref() } {
            Some(value) => value.clone(),
            None => panic!("bucket chain corrupted: live slot missing value"),
        };
        if self.order == OrderMode::Access {
            order::unlink(&self.slab, index);
            order::link(&self.slab, index);
        }
        Some(value)
    }

    /// Returns true if `key` is present. Never counts as an access for
    /// [`OrderMode::Access`].
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_of(key);
        let bucket = self.bucket_of(hash);
        let _guard = self.lock_for(bucket).lock();
        self.chain_find(bucket, hash, key).1 != 0
    }

    /// The engine entry point behind every inserting operation: resolves
    /// `key` under its bucket's stripe lock and lets `visitor` decide what
    /// happens, per [`CreateOrUpdate`].
    ///
    /// A successful create links the entry (unless unordered), a successful
    /// update refreshes recency under `Modified`/`Access`, and an insert
    /// that pushes the map past its limit evicts the oldest entries after
    /// the lock is released.
    pub fn insert_with<T: CreateOrUpdate<K, V>>(&self, key: K, visitor: &mut T) -> InsertResult {
        let hash = self.hash_of(&key);
        let bucket = self.bucket_of(hash);
        let guard = self.lock_for(bucket).lock();
        let head = self.buckets[bucket].load(Ordering::Relaxed);
        let (_, found) = self.chain_find(bucket, hash, &key);

        if found != 0 {
            let slot = self.slab.slot(found);
            // SAFETY: stripe lock held.
            let value = match unsafe { slot.value_mut() } {
                Some(value) => value,
                None => panic!("bucket chain corrupted: live slot missing value"),
            };
            let old = self.events.as_ref().map(|_| value.clone());
            if !visitor.try_update(&key, &mut *value) {
                return InsertResult::Exists;
            }
            let new = self.events.as_ref().map(|_| value.clone());
            if matches!(self.order, OrderMode::Modified | OrderMode::Access) {
                order::unlink(&self.slab, found);
                order::link(&self.slab, found);
            }
            drop(guard);
            if let (Some(events), Some(old), Some(new)) = (&self.events, old, new) {
                events.item_updated(&key, &old, &new);
            }
            return InsertResult::Updated;
        }

        let value = match visitor.try_create(&key) {
            Some(value) => value,
            None => return InsertResult::NotFound,
        };
        let event_kv = self.events.as_ref().map(|_| (key.clone(), value.clone()));

        let index = self.slab.alloc_slot();
        let slot = self.slab.slot(index);
        slot.hash.store(hash, Ordering::Relaxed);
        // SAFETY: stripe lock held and the slot is not reachable yet.
        unsafe { slot.set_kv(key, value) };
        slot.link.store(head, Ordering::Relaxed);
        self.buckets[bucket].store(index, Ordering::Relaxed);
        if self.order != OrderMode::None {
            order::link(&self.slab, index);
        }
        self.count.fetch_add(1, Ordering::Relaxed);
        drop(guard);

        if let (Some(events), Some((k, v))) = (&self.events, event_kv) {
            events.item_added(&k, &v);
        }
        if self.limit != 0 {
            // The insert itself never fails on a full map; trimming happens
            // afterwards, outside every lock.
            while self.count.load(Ordering::Relaxed) > self.limit {
                if self.dequeue_oldest(|_, _| true).is_none() {
                    break;
                }
            }
        }
        InsertResult::Inserted
    }

    /// The engine entry point behind every removing operation: resolves
    /// `key` under its bucket's stripe lock and removes the entry if
    /// `visitor` agrees, per [`RemoveIf`]. Returns the removed value.
    pub fn remove_with<Q, T>(&self, key: &Q, visitor: &mut T) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        T: RemoveIf<K, V>,
    {
        let hash = self.hash_of(key);
        let bucket = self.bucket_of(hash);
        let guard = self.lock_for(bucket).lock();
        let (prev, index) = self.chain_find(bucket, hash, key);
        if index == 0 {
            return None;
        }
        let slot = self.slab.slot(index);
        // SAFETY: stripe lock held.
        let keep = unsafe {
            match (slot.key_ref(), slot.value_ref()) {
                (Some(k), Some(v)) => !visitor.should_remove(k, v),
                _ => panic!("bucket chain corrupted: live slot missing key or value"),
            }
        };
        if keep {
            return None;
        }
        self.chain_detach(bucket, prev, index);
        // SAFETY: stripe lock held.
        let (k, v) = unsafe { slot.take_kv() };
        self.count.fetch_sub(1, Ordering::Relaxed);
        if self.order != OrderMode::None {
            order::unlink(&self.slab, index);
        }
        drop(guard);
        self.slab.free_slot(index);
        if let Some(events) = &self.events {
            events.item_removed(&k, &v);
        }
        Some(v)
    }

    /// Inserts or replaces, returning the previous value on replacement.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        let mut visitor = Upsert::new(value);
        self.insert_with(key, &mut visitor);
        visitor.previous()
    }

    /// Inserts only when `key` is absent; returns the existing value when
    /// one is already present.
    pub fn insert_if_absent(&self, key: K, value: V) -> Option<V> {
        let mut visitor = InsertIfAbsent::new(value);
        self.insert_with(key, &mut visitor);
        visitor.existing()
    }

    /// Returns the value for `key`, inserting `value` first if absent.
    /// Exactly one caller creates under contention; the rest observe it.
    pub fn get_or_insert(&self, key: K, value: V) -> V {
        self.get_or_insert_with(key, move || value)
    }

    /// Like [`get_or_insert`](Self::get_or_insert) but the value is only
    /// produced when the key turns out to be absent. The factory runs under
    /// the bucket lock; keep it cheap.
    pub fn get_or_insert_with<F: FnOnce() -> V>(&self, key: K, make: F) -> V {
        let mut visitor = GetOrInsert::new(make);
        self.insert_with(key, &mut visitor);
        visitor.into_value()
    }

    /// Creates the entry with `create` or mutates the existing value with
    /// `update`, atomically with respect to the key.
    pub fn upsert<C, U>(&self, key: K, create: C, update: U) -> InsertResult
    where
        C: FnOnce() -> V,
        U: FnMut(&mut V),
    {
        let mut visitor = UpsertWith::new(create, update);
        self.insert_with(key, &mut visitor)
    }

    /// Update-only path shared by [`try_update`](Self::try_update) and
    /// [`try_update_eq`](Self::try_update_eq): never creates, refreshes
    /// recency under `Modified`/`Access`, fires the updated event.
    fn update_in_place<Q, F>(&self, key: &Q, update: F) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        F: FnOnce(&K, &mut V) -> bool,
    {
        let hash = self.hash_of(key);
        let bucket = self.bucket_of(hash);
        let guard = self.lock_for(bucket).lock();
        let (_, index) = self.chain_find(bucket, hash, key);
        if index == 0 {
            return false;
        }
        let slot = self.slab.slot(index);
        // SAFETY: stripe lock held; key and value are distinct cells.
        let (stored_key, value) = unsafe {
            match (slot.key_ref(), slot.value_mut()) {
                (Some(k), Some(v)) => (k, v),
                _ => panic!("bucket chain corrupted: live slot missing key or value"),
            }
        };
        let old = self.events.as_ref().map(|_| value.clone());
        if !update(stored_key, &mut *value) {
            return false;
        }
        let event = match (&self.events, old) {
            (Some(_), Some(old)) => Some((stored_key.clone(), old, value.clone())),
            _ => None,
        };
        if matches!(self.order, OrderMode::Modified | OrderMode::Access) {
            order::unlink(&self.slab, index);
            order::link(&self.slab, index);
        }
        drop(guard);
        if let (Some(events), Some((k, old, new))) = (&self.events, event) {
            events.item_updated(&k, &old, &new);
        }
        true
    }

    /// Replaces the value for an existing key; false when absent.
    pub fn try_update<Q>(&self, key: &Q, value: V) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.update_in_place(key, move |_, slot| {
            *slot = value;
            true
        })
    }

    /// Replaces the value for an existing key only when the current value
    /// equals `expected` (a single-key compare-and-swap).
    pub fn try_update_eq<Q>(&self, key: &Q, value: V, expected: &V) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: PartialEq,
    {
        self.update_in_place(key, move |_, slot| {
            if *slot == *expected {
                *slot = value;
                true
            } else {
                false
            }
        })
    }

    /// Removes `key`, returning its value.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_with(key, &mut |_: &K, _: &V| true)
    }

    /// Removes `key` only when `pred` approves of the stored pair.
    pub fn remove_if<Q, F>(&self, key: &Q, mut pred: F) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        F: FnMut(&K, &V) -> bool,
    {
        self.remove_with(key, &mut pred)
    }

    /// Clones the oldest entry without removing it.
    ///
    /// # Panics
    /// Panics when the map was built with [`OrderMode::None`].
    pub fn peek(&self) -> Option<(K, V)> {
        self.require_order("peek");
        let backoff = Backoff::new();
        loop {
            let index = order::oldest(&self.slab);
            if index == 0 {
                return None;
            }
            let hash = self.slab.slot(index).hash.load(Ordering::Acquire);
            let bucket = self.bucket_of(hash);
            let guard = self.lock_for(bucket).lock();
            // The tail snapshot may be a slot that was freed, recycled, or
            // re-aged in the meantime: trust it only if it is still chained
            // in the bucket we locked and still the tail.
            if self.chain_find_index(bucket, index).is_some() && order::oldest(&self.slab) == index
            {
                let slot = self.slab.slot(index);
                // SAFETY: stripe lock held and the slot is live in this chain.
                let pair = unsafe {
                    match (slot.key_ref(), slot.value_ref()) {
                        (Some(k), Some(v)) => (k.clone(), v.clone()),
                        _ => panic!("bucket chain corrupted: live slot missing key or value"),
                    }
                };
                return Some(pair);
            }
            drop(guard);
            backoff.spin();
        }
    }

    /// Validates the current oldest entry under its bucket lock and removes
    /// it when `pred` accepts. `None` when the list is empty, the candidate
    /// was rejected, or (for the caller loop) the snapshot went stale.
    fn dequeue_oldest<F>(&self, mut pred: F) -> Option<(K, V)>
    where
        F: FnMut(&K, &V) -> bool,
    {
        let backoff = Backoff::new();
        loop {
            let index = order::oldest(&self.slab);
            if index == 0 {
                return None;
            }
            let hash = self.slab.slot(index).hash.load(Ordering::Acquire);
            let bucket = self.bucket_of(hash);
            let guard = self.lock_for(bucket).lock();
            let prev = match self.chain_find_index(bucket, index) {
                Some(prev) if order::oldest(&self.slab) == index => prev,
                _ => {
                    drop(guard);
                    backoff.spin();
                    continue;
                }
            };
            let slot = self.slab.slot(index);
            // SAFETY: stripe lock held and the slot is live in this chain.
            let accept = unsafe {
                match (slot.key_ref(), slot.value_ref()) {
                    (Some(k), Some(v)) => pred(k, v),
                    _ => panic!("bucket chain corrupted: live slot missing key or value"),
                }
            };
            if !accept {
                return None;
            }
            self.chain_detach(bucket, prev, index);
            // SAFETY: stripe lock held.
            let (k, v) = unsafe { slot.take_kv() };
            self.count.fetch_sub(1, Ordering::Relaxed);
            order::unlink(&self.slab, index);
            drop(guard);
            self.slab.free_slot(index);
            if let Some(events) = &self.events {
                events.item_removed(&k, &v);
            }
            return Some((k, v));
        }
    }

    /// Removes and returns the oldest entry, or `None` when empty.
    ///
    /// # Panics
    /// Panics when the map was built with [`OrderMode::None`].
    pub fn try_dequeue(&self) -> Option<(K, V)> {
        self.require_order("try_dequeue");
        self.dequeue_oldest(|_, _| true)
    }

    /// Removes and returns the oldest entry if `pred` accepts it; a
    /// rejection leaves the entry in place and returns `None`.
    ///
    /// # Panics
    /// Panics when the map was built with [`OrderMode::None`].
    pub fn try_dequeue_if<F>(&self, pred: F) -> Option<(K, V)>
    where
        F: FnMut(&K, &V) -> bool,
    {
        self.require_order("try_dequeue_if");
        self.dequeue_oldest(pred)
    }

    /// Removes and returns the oldest entry, spinning (with backoff) until
    /// one is available. There is no timeout; wrap externally if needed.
    ///
    /// # Panics
    /// Panics when the map was built with [`OrderMode::None`].
    pub fn dequeue(&self) -> (K, V) {
        self.require_order("dequeue");
        let backoff = Backoff::new();
        loop {
            if let Some(pair) = self.dequeue_oldest(|_, _| true) {
                return pair;
            }
            backoff.snooze();
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    /// True when the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The recency policy this map was built with.
    pub fn order(&self) -> OrderMode {
        self.order
    }

    /// The configured entry limit, if any.
    pub fn limit(&self) -> Option<usize> {
        if self.limit == 0 {
            None
        } else {
            Some(self.limit)
        }
    }

    /// Returns a reference to the map's hash builder.
    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Removes every entry, bucket by bucket.
    pub fn clear(&self) {
        for bucket in 0..self.buckets.len() {
            let mut drained = Vec::new();
            let guard = self.lock_for(bucket).lock();
            let mut index = self.buckets[bucket].load(Ordering::Relaxed);
            self.buckets[bucket].store(0, Ordering::Relaxed);
            while index != 0 {
                let slot = self.slab.slot(index);
                let next = slot.link.load(Ordering::Relaxed);
                // SAFETY: stripe lock held.
                let (k, v) = unsafe { slot.take_kv() };
                self.count.fetch_sub(1, Ordering::Relaxed);
                if self.order != OrderMode::None {
                    order::unlink(&self.slab, index);
                }
                self.slab.free_slot(index);
                if self.events.is_some() {
                    drained.push((k, v));
                }
                index = next;
            }
            drop(guard);
            if let Some(events) = &self.events {
                for (k, v) in &drained {
                    events.item_removed(k, v);
                }
            }
        }
    }

    /// Forward-only iterator over cloned `(K, V)` pairs.
    ///
    /// Traversal is guarded bucket by bucket: a bucket's stripe lock is held
    /// only while its chain is being captured, never across yielded items.
    /// Each call starts a fresh traversal; entries mutated concurrently may
    /// or may not be observed.
    pub fn iter(&self) -> Iter<'_, K, V, S> {
        Iter {
            map: self,
            bucket: 0,
            pending: Vec::new().into_iter(),
        }
    }

    /// Iterator over cloned keys.
    pub fn keys(&self) -> Keys<'_, K, V, S> {
        Keys { iter: self.iter() }
    }

    /// Iterator over cloned values.
    pub fn values(&self) -> Values<'_, K, V, S> {
        Values { iter: self.iter() }
    }
}

/// Iterator over a map's entries; see [`LinkedMap::iter`].
pub struct Iter<'a, K, V, S> {
    map: &'a LinkedMap<K, V, S>,
    bucket: usize,
    pending: std::vec::IntoIter<(K, V)>,
}

impl<K, V, S> Iterator for Iter<'_, K, V, S>
where
    K: Hash + Eq + Clone + 'static,
    V: Clone + 'static,
    S: BuildHasher,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        loop {
            if let Some(pair) = self.pending.next() {
                return Some(pair);
            }
            if self.bucket >= self.map.buckets.len() {
                return None;
            }
            let bucket = self.bucket;
            self.bucket += 1;

            let mut drained = Vec::new();
            let _guard = self.map.lock_for(bucket).lock();
            let mut index = self.map.buckets[bucket].load(Ordering::Relaxed);
            while index != 0 {
                let slot = self.map.slab.slot(index);
                // SAFETY: stripe lock held for this bucket.
                match unsafe { (slot.key_ref(), slot.value_ref()) } {
                    (Some(k), Some(v)) => drained.push((k.clone(), v.clone())),
                    _ => panic!("bucket chain corrupted: live slot missing key or value"),
                }
                index = slot.link.load(Ordering::Relaxed);
            }
            self.pending = drained.into_iter();
        }
    }
}

/// Iterator over a map's keys; see [`LinkedMap::keys`].
pub struct Keys<'a, K, V, S> {
    iter: Iter<'a, K, V, S>,
}

impl<K, V, S> Iterator for Keys<'_, K, V, S>
where
    K: Hash + Eq + Clone + 'static,
    V: Clone + 'static,
    S: BuildHasher,
{
    type Item = K;

    fn next(&mut self) -> Option<K> {
        self.iter.next().map(|(k, _)| k)
    }
}

/// Iterator over a map's values; see [`LinkedMap::values`].
pub struct Values<'a, K, V, S> {
    iter: Iter<'a, K, V, S>,
}

impl<K, V, S> Iterator for Values<'_, K, V, S>
where
    K: Hash + Eq + Clone + 'static,
    V: Clone + 'static,
    S: BuildHasher,
{
    type Item = V;

    fn next(&mut self) -> Option<V> {
        self.iter.next().map(|(_, v)| v)
    }
}

impl<'a, K, V, S> IntoIterator for &'a LinkedMap<K, V, S>
where
    K: Hash + Eq + Clone + 'static,
    V: Clone + 'static,
    S: BuildHasher,
{
    type Item = (K, V);
    type IntoIter = Iter<'a, K, V, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn next_prime(mut n: usize) -> usize {
    if n < 3 {
        return 3;
    }
    if n % 2 == 0 {
        n += 1;
    }
    while !is_prime(n) {
        n += 2;
    }
    n
}

fn is_prime(n: usize) -> bool {
    let mut d = 3;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}
