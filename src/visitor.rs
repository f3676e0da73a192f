//! Read-modify-write contracts invoked by the engine under the bucket lock.
//!
//! The engine exposes exactly two capabilities: create-or-update and
//! conditional removal. Facade operations are thin visitors over these, and
//! callers can supply their own to get atomic read-modify-write semantics
//! without ever seeing a lock. Visitors are generic bounds, not trait
//! objects, so each facade operation monomorphizes to a direct call.

/// Atomic create-or-update capability used by
/// [`LinkedMap::insert_with`](crate::LinkedMap::insert_with).
///
/// Both methods run while the owning bucket's stripe lock is held; they must
/// not touch the map and should return quickly.
pub trait CreateOrUpdate<K, V> {
    /// Produces a value for a missing key, or `None` to decline the insert.
    fn try_create(&mut self, key: &K) -> Option<V>;
    /// Mutates an existing value in place; returning `false` leaves the
    /// entry (and its recency) untouched.
    fn try_update(&mut self, key: &K, value: &mut V) -> bool;
}

/// Conditional-delete capability used by
/// [`LinkedMap::remove_with`](crate::LinkedMap::remove_with).
pub trait RemoveIf<K, V> {
    /// Decides whether the matched entry is removed.
    fn should_remove(&mut self, key: &K, value: &V) -> bool;
}

impl<K, V, F> RemoveIf<K, V> for F
where
    F: FnMut(&K, &V) -> bool,
{
    fn should_remove(&mut self, key: &K, value: &V) -> bool {
        self(key, value)
    }
}

/// Unconditional upsert; remembers the replaced value.
pub(crate) struct Upsert<V> {
    value: Option<V>,
    previous: Option<V>,
}

impl<V> Upsert<V> {
    pub(crate) fn new(value: V) -> Self {
        Upsert {
            value: Some(value),
            previous: None,
        }
    }

    pub(crate) fn previous(self) -> Option<V> {
        self.previous
    }
}

impl<K, V> CreateOrUpdate<K, V> for Upsert<V> {
    fn try_create(&mut self, _key: &K) -> Option<V> {
        self.value.take()
    }

    fn try_update(&mut self, _key: &K, value: &mut V) -> bool {
        let next = self.value.take().expect("upsert visitor invoked twice");
        self.previous = Some(std::mem::replace(value, next));
        true
    }
}

/// Insert that refuses to touch an existing entry; remembers what it found.
pub(crate) struct InsertIfAbsent<V> {
    value: Option<V>,
    existing: Option<V>,
}

impl<V> InsertIfAbsent<V> {
    pub(crate) fn new(value: V) -> Self {
        InsertIfAbsent {
            value: Some(value),
            existing: None,
        }
    }

    pub(crate) fn existing(self) -> Option<V> {
        self.existing
    }
}

impl<K, V: Clone> CreateOrUpdate<K, V> for InsertIfAbsent<V> {
    fn try_create(&mut self, _key: &K) -> Option<V> {
        self.value.take()
    }

    fn try_update(&mut self, _key: &K, value: &mut V) -> bool {
        self.existing = Some(value.clone());
        false
    }
}

/// Get-or-insert with a lazy factory; always ends up holding the entry's
/// value, whichever side produced it.
pub(crate) struct GetOrInsert<V, F> {
    make: Option<F>,
    value: Option<V>,
}

impl<V, F> GetOrInsert<V, F> {
    pub(crate) fn new(make: F) -> Self {
        GetOrInsert {
            make: Some(make),
            value: None,
        }
    }

    pub(crate) fn into_value(self) -> V {
        match self.value {
            Some(value) => value,
            None => unreachable!("get-or-insert visitor always resolves a value"),
        }
    }
}

impl<K, V, F> CreateOrUpdate<K, V> for GetOrInsert<V, F>
where
    V: Clone,
    F: FnOnce() -> V,
{
    fn try_create(&mut self, _key: &K) -> Option<V> {
        let make = self.make.take().expect("get-or-insert visitor invoked twice");
        let value = make();
        self.value = Some(value.clone());
        Some(value)
    }

    fn try_update(&mut self, _key: &K, value: &mut V) -> bool {
        self.value = Some(value.clone());
        false
    }
}

/// Factory-based upsert: one closure creates, another mutates in place.
pub(crate) struct UpsertWith<C, U> {
    create: Option<C>,
    update: U,
}

impl<C, U> UpsertWith<C, U> {
    pub(crate) fn new(create: C, update: U) -> Self {
        UpsertWith {
            create: Some(create),
            update,
        }
    }
}

impl<K, V, C, U> CreateOrUpdate<K, V> for UpsertWith<C, U>
where
    C: FnOnce() -> V,
    U: FnMut(&mut V),
{
    fn try_create(&mut self, _key: &K) -> Option<V> {
        let create = self.create.take().expect("upsert visitor invoked twice");
        Some(create())
    }

    fn try_update(&mut self, _key: &K, value: &mut V) -> bool {
        (self.update)(value);
        true
    }
}
