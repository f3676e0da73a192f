//! Construction options, ordering policy, typed errors, and mutation events.

use std::fmt;
use std::sync::Arc;

use foldhash::fast::FixedState;

use crate::map::LinkedMap;

/// Policy governing which entry counts as "oldest" for eviction, `peek`,
/// and `dequeue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderMode {
    /// No recency list is maintained. `peek`/`dequeue` are unavailable and
    /// the map cannot be bounded.
    None,
    /// Entries age from the moment they are inserted; updates and lookups do
    /// not refresh them.
    Insertion,
    /// Entries are refreshed on insert and on every value update.
    Modified,
    /// Entries are refreshed on insert, update, and successful `get`.
    Access,
}

/// Observer for map mutations.
///
/// Callbacks fire synchronously on the mutating thread, after the map is
/// consistent again and outside any lock. Default implementations do
/// nothing, so an observer only overrides what it cares about.
pub trait Events<K, V>: Send + Sync {
    /// A new entry was created.
    fn item_added(&self, _key: &K, _value: &V) {}
    /// An existing entry's value was replaced.
    fn item_updated(&self, _key: &K, _old: &V, _new: &V) {}
    /// An entry was removed, whether explicitly, by `dequeue`, or by
    /// capacity eviction.
    fn item_removed(&self, _key: &K, _value: &V) {}
}

/// Construction-time validation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A limit of zero was requested; a bounded map must admit at least one
    /// entry.
    ZeroLimit,
    /// A limit was requested together with [`OrderMode::None`], which gives
    /// eviction no notion of an oldest entry.
    LimitRequiresOrder,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ZeroLimit => write!(f, "entry limit must be at least 1"),
            Error::LimitRequiresOrder => {
                write!(f, "a bounded map requires an order mode other than None")
            }
        }
    }
}

impl std::error::Error for Error {}

/// Configuration for a [`LinkedMap`].
///
/// All fields have workable defaults; `hash_buckets` is rounded up to a
/// prime and `block_size`/`lock_stripes` to powers of two at build time.
pub struct Options<K, V, S = FixedState> {
    /// Recency policy; defaults to [`OrderMode::None`].
    pub order: OrderMode,
    /// Maximum number of live entries, or `None` for unbounded.
    pub limit: Option<usize>,
    /// Number of hash buckets.
    pub hash_buckets: usize,
    /// Entry-slab block size in slots.
    pub block_size: usize,
    /// Number of stripe locks shared by the buckets.
    pub lock_stripes: usize,
    /// Hash builder.
    pub hasher: S,
    /// Optional mutation observer.
    pub events: Option<Arc<dyn Events<K, V>>>,
}

impl<K, V> Default for Options<K, V, FixedState> {
    fn default() -> Self {
        Options {
            order: OrderMode::None,
            limit: None,
            hash_buckets: 1103,
            block_size: 128,
            lock_stripes: 32,
            hasher: FixedState::default(),
            events: None,
        }
    }
}

impl<K, V, S> Options<K, V, S> {
    /// Sets the recency policy.
    pub fn order(mut self, order: OrderMode) -> Self {
        self.order = order;
        self
    }

    /// Bounds the map to `limit` live entries; inserting past the bound
    /// evicts the oldest entry per the configured [`OrderMode`].
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the number of hash buckets (rounded up to a prime).
    pub fn hash_buckets(mut self, buckets: usize) -> Self {
        self.hash_buckets = buckets;
        self
    }

    /// Sets the slab block size in slots (rounded up to a power of two).
    pub fn block_size(mut self, slots: usize) -> Self {
        self.block_size = slots;
        self
    }

    /// Sets the stripe-lock pool size (rounded up to a power of two).
    pub fn lock_stripes(mut self, stripes: usize) -> Self {
        self.lock_stripes = stripes;
        self
    }

    /// Installs a mutation observer.
    pub fn events<E: Events<K, V> + 'static>(mut self, events: Arc<E>) -> Self {
        self.events = Some(events as Arc<dyn Events<K, V>>);
        self
    }

    /// Replaces the hash builder.
    pub fn hasher<S2>(self, hasher: S2) -> Options<K, V, S2> {
        Options {
            order: self.order,
            limit: self.limit,
            hash_buckets: self.hash_buckets,
            block_size: self.block_size,
            lock_stripes: self.lock_stripes,
            hasher,
            events: self.events,
        }
    }

    /// Validates the options and builds the map.
    pub fn build(self) -> Result<LinkedMap<K, V, S>, Error>
    where
        K: std::hash::Hash + Eq + Clone + 'static,
        V: Clone + 'static,
        S: std::hash::BuildHasher,
    {
        match (self.limit, self.order) {
            (Some(0), _) => Err(Error::ZeroLimit),
            (Some(_), OrderMode::None) => Err(Error::LimitRequiresOrder),
            _ => Ok(LinkedMap::with_options(self)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_limit() {
        let result = Options::<u32, u32>::default()
            .order(OrderMode::Insertion)
            .limit(0)
            .build();
        assert_eq!(result.err(), Some(Error::ZeroLimit));
    }

    #[test]
    fn rejects_limit_without_order() {
        let result = Options::<u32, u32>::default().limit(10).build();
        assert_eq!(result.err(), Some(Error::LimitRequiresOrder));
    }
}
