use std::{
    borrow::Borrow,
    fmt::{self, Debug},
    mem,
    slice,
};

use tracing::{debug, trace, warn};

use crate::{
    TableError,
    chain::{self, Chain},
    hasher::{BucketHasher, PolynomialHash},
};

/// Number of buckets a table starts with
pub const DEFAULT_BUCKET_COUNT: usize = 16;

/// Load factor (as a percentage) at which the bucket array doubles
const DEFAULT_LOAD_FACTOR_THRESHOLD: usize = 75;

/// A hash table resolving collisions by separate chaining.
///
/// Every bucket is a [`Chain`] holding the entries whose key maps to it under the current
/// bucket count. Before each insertion the load factor is checked; once it reaches the
/// threshold (75% by default) the bucket array is replaced by one twice as large and every
/// entry is rehashed into it. The table never shrinks.
///
/// The bucket index of a key is computed by an injectable [`BucketHasher`], the polynomial
/// string hash by default.
///
/// Note: This implementation is not thread-safe.
#[derive(Debug, Clone)]
pub struct HashTable<K, V, H = PolynomialHash> {
    /// The buckets, one chain each
    buckets: Vec<Chain<K, V>>,
    /// Current number of entries, kept equal to the sum of the chain lengths
    size: usize,
    /// Threshold for load factor before resizing - stored as percentage (1-95)
    load_factor_threshold: usize,
    /// Strategy mapping keys to bucket indices
    hasher: H,
}

impl<K, V, H> Default for HashTable<K, V, H>
where
    K: Eq,
    H: BucketHasher<K> + Default,
{
    fn default() -> Self {
        Self::with_hasher(H::default())
    }
}

impl<K, V, H> Extend<(K, V)> for HashTable<K, V, H>
where
    K: Eq,
    H: BucketHasher<K>,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, H> FromIterator<(K, V)> for HashTable<K, V, H>
where
    K: Eq,
    H: BucketHasher<K> + Default,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut table = Self::default();
        table.extend(iter);
        table
    }
}

impl<K, V> HashTable<K, V>
where
    K: Eq + AsRef<str>,
{
    /// Creates an empty table with 16 buckets and the polynomial string hash
    #[must_use]
    pub fn new() -> Self {
        Self::with_hasher(PolynomialHash)
    }

    /// Creates an empty table with `bucket_count` buckets and the polynomial string hash
    ///
    /// # Errors
    ///
    /// Returns [`TableError::InvalidBucketCount`] if `bucket_count` is zero.
    pub fn with_buckets(bucket_count: usize) -> Result<Self, TableError> {
        Self::with_buckets_and_hasher(bucket_count, PolynomialHash)
    }
}

impl<K, V, H> HashTable<K, V, H>
where
    K: Eq,
    H: BucketHasher<K>,
{
    /// Creates an empty table with 16 buckets using `hasher` to place keys
    #[must_use]
    pub fn with_hasher(hasher: H) -> Self {
        Self::build(DEFAULT_BUCKET_COUNT, hasher)
    }

    /// Creates an empty table with `bucket_count` buckets using `hasher` to place keys
    ///
    /// # Errors
    ///
    /// Returns [`TableError::InvalidBucketCount`] if `bucket_count` is zero.
    pub fn with_buckets_and_hasher(bucket_count: usize, hasher: H) -> Result<Self, TableError> {
        if bucket_count == 0 {
            warn!("refusing to build a hash table without buckets");
            return Err(TableError::InvalidBucketCount);
        }
        Ok(Self::build(bucket_count, hasher))
    }

    /// Assembles a table from a positive bucket count
    fn build(bucket_count: usize, hasher: H) -> Self {
        Self {
            buckets: empty_buckets(bucket_count),
            size: 0,
            load_factor_threshold: DEFAULT_LOAD_FACTOR_THRESHOLD,
            hasher,
        }
    }

    /// Computes the bucket holding `key` under the current bucket count
    fn bucket_of<Q>(&self, key: &Q) -> usize
    where
        Q: ?Sized,
        H: BucketHasher<Q>,
    {
        let bucket_count = self.buckets.len();
        self.hasher.bucket_index(key, bucket_count).checked_rem(bucket_count).unwrap_or_default()
    }

    /// Insert a key-value pair into the hash table.
    ///
    /// Returns the previous value if the key was already present; its entry is then updated
    /// in place.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.resize_buckets_if_needed();
        self.place(key, value)
    }

    /// Links a key-value pair into its bucket without checking the load factor
    fn place(&mut self, key: K, value: V) -> Option<V> {
        let index = self.bucket_of(&key);
        let previous = self.buckets.get_mut(index)?.append(key, value).into_previous();

        if previous.is_none() {
            self.size = self.size.saturating_add(1);
        }

        previous
    }

    /// Returns true when the next insertion has to grow the bucket array first
    fn needs_growth(&self) -> bool {
        self.size.saturating_mul(100) >=
            self.load_factor_threshold.saturating_mul(self.buckets.len())
    }

    /// Doubles the bucket array and rehashes every entry once the threshold is reached
    fn resize_buckets_if_needed(&mut self) {
        if !self.needs_growth() {
            return;
        }

        let old_count = self.buckets.len();
        let new_count = old_count.saturating_mul(2);
        debug!(from = old_count, to = new_count, entries = self.size, "growing bucket array");

        let old_buckets = self.resize(new_count);
        self.size = 0;
        for (key, value) in old_buckets.into_iter().flatten() {
            self.place(key, value);
        }
    }

    /// Replaces the bucket array with `bucket_count` empty chains and hands back the old one.
    ///
    /// The entry count is left untouched; the caller owns the detached entries.
    fn resize(&mut self, bucket_count: usize) -> Vec<Chain<K, V>> {
        mem::replace(&mut self.buckets, empty_buckets(bucket_count.max(1)))
    }

    /// Retrieve a value for a given key
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
        H: BucketHasher<Q>,
    {
        let chain = self.buckets.get(self.bucket_of(key))?;
        let entry = chain.search(key)?;
        chain.get(entry).map(|(_, value)| value)
    }

    /// Get a mutable reference to a value for a given key
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
        H: BucketHasher<Q>,
    {
        let index = self.bucket_of(key);
        let chain = self.buckets.get_mut(index)?;
        let entry = chain.search(key)?;
        chain.get_mut(entry)
    }

    /// Returns true if the table holds an entry for `key`
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
        H: BucketHasher<Q>,
    {
        self.buckets.get(self.bucket_of(key)).is_some_and(|chain| chain.search(key).is_some())
    }

    /// Removes a key from the table, returning its value if it was present
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
        H: BucketHasher<Q>,
    {
        let index = self.bucket_of(key);
        let chain = self.buckets.get_mut(index)?;
        let entry = chain.search(key)?;
        let (_, value) = chain.remove(entry).ok()?;
        self.size = self.size.saturating_sub(1);
        Some(value)
    }
}

impl<K, V, H> HashTable<K, V, H> {
    /// Returns the number of entries in the table
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns true if the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the number of buckets
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the current load factor of the table
    #[must_use]
    #[allow(clippy::arithmetic_side_effects, clippy::cast_precision_loss)]
    pub fn load_factor(&self) -> f64 {
        self.size as f64 / self.buckets.len() as f64
    }

    /// The load factor threshold, as a percentage
    #[must_use]
    pub fn load_factor_threshold(&self) -> usize {
        self.load_factor_threshold
    }

    /// Provide a way to configure the load factor threshold (percentage)
    pub fn set_load_factor_threshold(&mut self, threshold: usize) {
        self.load_factor_threshold = threshold.clamp(1, 95); // Keep within reasonable range
    }

    /// The strategy placing keys into buckets
    #[must_use]
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Drops every entry; the bucket count is kept
    pub fn clear(&mut self) {
        for chain in &mut self.buckets {
            chain.clear();
        }
        self.size = 0;
        trace!(buckets = self.buckets.len(), "cleared hash table");
    }

    /// Iterates the entries bucket by bucket, each bucket from its most recent entry
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter { buckets: self.buckets.iter(), current: None, remaining: self.size }
    }

    /// Number of entries in each bucket, in bucket order
    #[must_use]
    pub fn chain_lengths(&self) -> Vec<usize> {
        self.buckets.iter().map(Chain::len).collect()
    }

    /// Writes one line per bucket: its index followed by the chain in traversal order
    ///
    /// # Errors
    ///
    /// Propagates errors of the underlying writer.
    pub fn write_buckets<W>(&self, out: &mut W) -> fmt::Result
    where
        W: fmt::Write,
        K: Debug,
        V: Debug,
    {
        for (index, chain) in self.buckets.iter().enumerate() {
            write!(out, "{index}:")?;
            for (position, (key, value)) in chain.iter().enumerate() {
                let separator = if position == 0 { " " } else { " -> " };
                write!(out, "{separator}{key:?} => {value:?}")?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    /// Renders [`Self::write_buckets`] into a string
    #[must_use]
    pub fn bucket_dump(&self) -> String
    where
        K: Debug,
        V: Debug,
    {
        let mut out = String::new();
        // writing into a String cannot fail
        let _ = self.write_buckets(&mut out);
        out
    }
}

/// Allocates `bucket_count` empty chains
fn empty_buckets<K, V>(bucket_count: usize) -> Vec<Chain<K, V>> {
    std::iter::repeat_with(Chain::new).take(bucket_count).collect()
}

/// Iterator over the key-value pairs of the hash table
#[derive(Debug, Clone)]
pub struct Iter<'a, K, V> {
    /// Buckets not yet visited
    buckets: slice::Iter<'a, Chain<K, V>>,
    /// Walk through the bucket being visited
    current: Option<chain::Iter<'a, K, V>>,
    /// Entries not yet yielded
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.current.as_mut().and_then(Iterator::next) {
                self.remaining = self.remaining.saturating_sub(1);
                return Some(item);
            }
            self.current = Some(self.buckets.next()?.iter());
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<'a, K, V, H> IntoIterator for &'a HashTable<K, V, H> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
