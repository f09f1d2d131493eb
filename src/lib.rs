//! # Chained Hash
//!
//! A Rust implementation of a hash table that resolves collisions by separate chaining.
//!
//! Each bucket of a [`HashTable`] is a [`Chain`]: a doubly linked list of entries kept in a
//! slab arena, with new keys linked in at the head. Before every insertion the table checks
//! its load factor; at 75% the bucket array is doubled and every entry is rehashed, because
//! the default hash reduces modulo the bucket count while it hashes.
//!
//! The hash is a pluggable [`BucketHasher`]:
//!
//! - [`PolynomialHash`] (default): rolling hash with multiplier 31 over UTF-16 code units
//! - [`MultiplicativeHash`]: the polynomial hash scaled through a golden ratio multiplier
//! - [`StdHash`]: any [`Hash`](std::hash::Hash) key through the standard library hasher
//!
//! ## Basic Usage
//!
//! ```rust
//! use chained_hash::{HashMapExtensions, HashTable};
//!
//! // Create a new table with 16 buckets
//! let mut map = HashTable::new();
//!
//! // Insert values
//! map.insert("apple".to_string(), 1);
//! map.insert("banana".to_string(), 2);
//!
//! // Retrieve values
//! assert_eq!(map.get("apple"), Some(&1));
//!
//! // Update values
//! map.insert("apple".to_string(), 10);
//! assert_eq!(map.get("apple"), Some(&10));
//! assert_eq!(map.len(), 2);
//!
//! // Remove values
//! assert_eq!(map.remove("apple"), Some(10));
//! assert!(!map.contains_key("apple"));
//! assert_eq!(map.keys(), vec!["banana".to_string()]);
//! ```
//!
//! ## Custom Hashing
//!
//! ```rust
//! use chained_hash::{HashTable, MultiplicativeHash, StdHash};
//!
//! let mut words = HashTable::with_hasher(MultiplicativeHash::default());
//! words.insert("pear".to_string(), 3);
//! assert_eq!(words.get("pear"), Some(&3));
//!
//! // Non-string keys go through the standard library hasher
//! let mut squares = HashTable::with_hasher(StdHash);
//! for n in 0_u64..20 {
//!     squares.insert(n, n * n);
//! }
//! assert_eq!(squares.get(&7), Some(&49));
//! assert_eq!(squares.bucket_count(), 32);
//! ```

/// Module implementing the doubly linked list used as a bucket
mod chain;
/// Module defining the error type
mod error;
/// Module implementing the separate chaining hash table
mod hash_table;
/// Module implementing the bucket hashing strategies
mod hasher;
/// Utility functions and traits for the hash table
mod utils;

pub use chain::{Appended, Chain, EntryRef, IntoIter as ChainIntoIter, Iter as ChainIter};
pub use error::TableError;
pub use hash_table::{DEFAULT_BUCKET_COUNT, HashTable, Iter};
pub use hasher::{BucketHasher, MultiplicativeHash, PolynomialHash, StdHash};
pub use utils::HashMapExtensions;
