//! Snapshot helpers for [`HashTable`]

use crate::HashTable;

/// Extension trait for map implementations that provides owned snapshots of their contents.
///
/// Snapshots follow the table's iteration order: buckets in index order, each bucket from its
/// most recently inserted entry to its oldest.
pub trait HashMapExtensions<K, V> {
    /// Returns the keys of the hash map as a Vec
    fn keys(&self) -> Vec<K>;

    /// Returns the values of the hash map as a Vec
    fn values(&self) -> Vec<V>;

    /// Returns the key-value pairs of the hash map as a Vec
    fn entries(&self) -> Vec<(K, V)>;
}

impl<K, V, H> HashMapExtensions<K, V> for HashTable<K, V, H>
where
    K: Clone,
    V: Clone,
{
    fn keys(&self) -> Vec<K> {
        self.iter().map(|(k, _)| k.clone()).collect()
    }

    fn values(&self) -> Vec<V> {
        self.iter().map(|(_, v)| v.clone()).collect()
    }

    fn entries(&self) -> Vec<(K, V)> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}
