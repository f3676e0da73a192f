//! Concurrent ordered hash map over a block-structured entry slab.
//!
//! `petek` provides [`LinkedMap`], a thread-safe associative container that
//! keeps its entries threaded on an intrusive order list (by insertion,
//! modification, or access time) and can evict the oldest entry once a
//! configured capacity is exceeded.
//!
//! # Architecture
//!
//! - **Entry slab**: entries live in fixed-size blocks that are only ever
//!   appended, so an entry's integer index stays valid for its whole life.
//!   Freed slots are recycled through 16 striped, tag-guarded free lists.
//! - **Striped locking**: buckets map onto a small fixed pool of
//!   `parking_lot` mutexes; every per-key operation takes exactly one lock.
//! - **Lock-free order list**: the recency list is maintained purely with
//!   compare-and-swap retries and never blocks readers or other writers.
//!
//! # Example
//!
//! ```rust
//! use petek::{Options, OrderMode};
//!
//! let map = Options::default()
//!     .order(OrderMode::Insertion)
//!     .limit(3)
//!     .build()
//!     .unwrap();
//!
//! map.insert("a", 1);
//! map.insert("b", 2);
//! map.insert("c", 3);
//! map.insert("d", 4); // evicts "a"
//!
//! assert_eq!(map.get(&"a"), None);
//! assert_eq!(map.peek().map(|(k, _)| k), Some("b"));
//! ```

#![warn(missing_docs)]

mod map;
mod options;
mod order;
mod slab;
mod visitor;

pub use map::{InsertResult, Iter, Keys, LinkedMap, Values};
pub use options::{Error, Events, Options, OrderMode};
pub use visitor::{CreateOrUpdate, RemoveIf};
