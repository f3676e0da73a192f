use std::sync::{Arc, Mutex};

use petek::{CreateOrUpdate, Events, InsertResult, LinkedMap, Options, RemoveIf};

#[test]
fn round_trip() {
    let map = LinkedMap::new();
    for i in 0..100 {
        map.insert(i, i * 10);
    }
    for i in 0..100 {
        assert_eq!(map.get(&i), Some(i * 10));
    }
    assert_eq!(map.get(&100), None);
    assert_eq!(map.len(), 100);
}

#[test]
fn insert_replaces_and_returns_previous() {
    let map = LinkedMap::new();
    assert_eq!(map.insert("k", 1), None);
    assert_eq!(map.insert("k", 2), Some(1));
    assert_eq!(map.get(&"k"), Some(2));
    assert_eq!(map.len(), 1);
}

#[test]
fn insert_if_absent_keeps_first_value() {
    let map = LinkedMap::new();
    assert_eq!(map.insert_if_absent("k", 1), None);
    assert_eq!(map.insert_if_absent("k", 2), Some(1));
    assert_eq!(map.get(&"k"), Some(1));
}

#[test]
fn remove_returns_value_once() {
    let map = LinkedMap::new();
    map.insert(1, 100);
    map.insert(2, 200);
    assert_eq!(map.remove(&1), Some(100));
    assert_eq!(map.remove(&1), None);
    assert_eq!(map.get(&2), Some(200));
    assert_eq!(map.len(), 1);
}

#[test]
fn remove_if_respects_predicate() {
    let map = LinkedMap::new();
    map.insert("k", 10);
    assert_eq!(map.remove_if(&"k", |_, v| *v > 50), None);
    assert_eq!(map.get(&"k"), Some(10));
    assert_eq!(map.remove_if(&"k", |_, v| *v == 10), Some(10));
    assert_eq!(map.get(&"k"), None);
}

#[test]
fn get_or_insert_returns_stored_value() {
    let map = LinkedMap::new();
    let first = Arc::new(41_u64);
    let stored = map.get_or_insert("k", first.clone());
    assert!(Arc::ptr_eq(&stored, &first));

    let again = map.get_or_insert("k", Arc::new(99));
    assert!(Arc::ptr_eq(&again, &first));
}

#[test]
fn get_or_insert_with_runs_factory_once() {
    let map = LinkedMap::new();
    let mut calls = 0;
    let value = map.get_or_insert_with("k", || {
        calls += 1;
        7
    });
    assert_eq!(value, 7);
    let value = map.get_or_insert_with("k", || unreachable!("key already present"));
    assert_eq!(value, 7);
    assert_eq!(calls, 1);
}

#[test]
fn upsert_creates_then_updates() {
    let map = LinkedMap::new();
    assert_eq!(map.upsert("k", || 1, |v| *v += 1), InsertResult::Inserted);
    assert_eq!(map.get(&"k"), Some(1));
    assert_eq!(map.upsert("k", || 1, |v| *v += 1), InsertResult::Updated);
    assert_eq!(map.get(&"k"), Some(2));
}

#[test]
fn try_update_only_touches_existing_keys() {
    let map = LinkedMap::new();
    assert!(!map.try_update(&"k", 5));
    map.insert("k", 1);
    assert!(map.try_update(&"k", 5));
    assert_eq!(map.get(&"k"), Some(5));
}

#[test]
fn try_update_eq_is_a_single_key_cas() {
    let map = LinkedMap::new();
    map.insert("k", 1);
    assert!(!map.try_update_eq(&"k", 9, &2));
    assert_eq!(map.get(&"k"), Some(1));
    assert!(map.try_update_eq(&"k", 9, &1));
    assert_eq!(map.get(&"k"), Some(9));
}

#[test]
fn contains_key_and_borrowed_lookups() {
    let map: LinkedMap<String, u32> = LinkedMap::new();
    map.insert("alpha".to_string(), 1);
    assert!(map.contains_key("alpha"));
    assert!(!map.contains_key("beta"));
    assert_eq!(map.get("alpha"), Some(1));
    assert_eq!(map.remove("alpha"), Some(1));
}

#[test]
fn clear_empties_the_map() {
    let map = LinkedMap::new();
    for i in 0..500 {
        map.insert(i, i);
    }
    map.clear();
    assert!(map.is_empty());
    assert_eq!(map.iter().count(), 0);
    // The map stays usable afterwards.
    map.insert(1, 1);
    assert_eq!(map.get(&1), Some(1));
}

#[test]
fn iteration_sees_every_entry_exactly_once() {
    let map = LinkedMap::new();
    for i in 0..1000_u32 {
        map.insert(i, i * 2);
    }
    let mut seen: Vec<_> = map.iter().collect();
    assert_eq!(seen.len(), 1000);
    seen.sort_unstable();
    for (i, (k, v)) in seen.into_iter().enumerate() {
        assert_eq!(k, i as u32);
        assert_eq!(v, k * 2);
    }

    let mut keys: Vec<_> = map.keys().collect();
    keys.sort_unstable();
    assert_eq!(keys.len(), 1000);
    assert_eq!(map.values().count(), 1000);
    assert_eq!((&map).into_iter().count(), 1000);
}

#[test]
fn reuses_slots_after_heavy_churn() {
    let map = Options::default().block_size(64).build().unwrap();
    for round in 0..50_u32 {
        for i in 0..64_u32 {
            map.insert(i, round);
        }
        for i in 0..64_u32 {
            assert_eq!(map.remove(&i), Some(round));
        }
    }
    assert!(map.is_empty());
}

struct CountedInsert {
    value: Option<u32>,
}

impl CreateOrUpdate<u32, u32> for CountedInsert {
    fn try_create(&mut self, _key: &u32) -> Option<u32> {
        self.value.take()
    }

    fn try_update(&mut self, _key: &u32, _value: &mut u32) -> bool {
        false
    }
}

struct RemoveBelow {
    threshold: u32,
}

impl RemoveIf<u32, u32> for RemoveBelow {
    fn should_remove(&mut self, _key: &u32, value: &u32) -> bool {
        *value < self.threshold
    }
}

#[test]
fn custom_visitors_drive_the_engine() {
    let map = LinkedMap::new();
    let mut visitor = CountedInsert { value: Some(10) };
    assert_eq!(map.insert_with(1, &mut visitor), InsertResult::Inserted);
    let mut visitor = CountedInsert { value: Some(20) };
    assert_eq!(map.insert_with(1, &mut visitor), InsertResult::Exists);
    let mut visitor = CountedInsert { value: None };
    assert_eq!(map.insert_with(2, &mut visitor), InsertResult::NotFound);

    let mut visitor = RemoveBelow { threshold: 5 };
    assert_eq!(map.remove_with(&1, &mut visitor), None);
    let mut visitor = RemoveBelow { threshold: 50 };
    assert_eq!(map.remove_with(&1, &mut visitor), Some(10));
}

#[derive(Default)]
struct Recorder {
    added: Mutex<Vec<(u32, u32)>>,
    updated: Mutex<Vec<(u32, u32, u32)>>,
    removed: Mutex<Vec<(u32, u32)>>,
}

impl Events<u32, u32> for Recorder {
    fn item_added(&self, key: &u32, value: &u32) {
        self.added.lock().unwrap().push((*key, *value));
    }

    fn item_updated(&self, key: &u32, old: &u32, new: &u32) {
        self.updated.lock().unwrap().push((*key, *old, *new));
    }

    fn item_removed(&self, key: &u32, value: &u32) {
        self.removed.lock().unwrap().push((*key, *value));
    }
}

#[test]
fn events_fire_after_each_mutation() {
    let recorder = Arc::new(Recorder::default());
    let map = Options::default()
        .events(recorder.clone())
        .build()
        .unwrap();

    map.insert(1, 10);
    map.insert(1, 11);
    map.try_update(&1, 12);
    map.insert_if_absent(1, 99); // declined, no event
    map.remove(&1);

    assert_eq!(recorder.added.lock().unwrap().as_slice(), &[(1, 10)]);
    assert_eq!(
        recorder.updated.lock().unwrap().as_slice(),
        &[(1, 10, 11), (1, 11, 12)]
    );
    assert_eq!(recorder.removed.lock().unwrap().as_slice(), &[(1, 12)]);
}
