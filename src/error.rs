//! Error type shared by [`Chain`](crate::Chain) and [`HashTable`](crate::HashTable)

/// Misuse of the table or of a chain.
///
/// Lookups of absent keys are not errors; they yield `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    /// A table was constructed with zero buckets
    #[error("bucket count must be positive")]
    InvalidBucketCount,
    /// An entry was removed from a chain holding no entries
    #[error("cannot remove an entry from an empty chain")]
    EmptyChain,
    /// The entry handle does not refer to a live entry of this chain
    #[error("entry does not belong to this chain")]
    ForeignEntry,
}
