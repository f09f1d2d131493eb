//! Bucket hashing strategies for [`HashTable`](crate::HashTable)
//!
//! A strategy maps a key and the current bucket count to a bucket index. The polynomial and
//! multiplicative hashes reduce modulo the bucket count while hashing, so their output for a
//! key is unrelated across bucket counts and every key must be rehashed when the table grows.

use std::hash::{DefaultHasher, Hash, Hasher};

/// Maps keys to bucket indices.
///
/// Implementations should return a value below `bucket_count`; the table reduces the result
/// modulo the bucket count regardless. `bucket_count` is never zero.
pub trait BucketHasher<K: ?Sized> {
    /// Computes the bucket index of `key` for a table of `bucket_count` buckets
    fn bucket_index(&self, key: &K, bucket_count: usize) -> usize;
}

/// Polynomial rolling hash over the UTF-16 code units of a string key.
///
/// `h = (h * 31 + unit) % bucket_count` for every code unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PolynomialHash;

/// Multiplier of the rolling hash
const POLYNOMIAL_BASE: u128 = 31;

/// Computes the polynomial rolling hash of `key`
#[allow(clippy::arithmetic_side_effects, clippy::cast_possible_truncation)]
fn polynomial(key: &str, bucket_count: usize) -> usize {
    let modulus = bucket_count.max(1) as u128;
    let hash = key
        .encode_utf16()
        .fold(0_u128, |hash, unit| (hash * POLYNOMIAL_BASE + u128::from(unit)) % modulus);
    // hash < modulus <= usize::MAX
    hash as usize
}

impl<K> BucketHasher<K> for PolynomialHash
where
    K: AsRef<str> + ?Sized,
{
    fn bucket_index(&self, key: &K, bucket_count: usize) -> usize {
        polynomial(key.as_ref(), bucket_count)
    }
}

/// Multiplicative hashing layered on top of [`PolynomialHash`].
///
/// The polynomial hash is multiplied by `factor`, and the fractional part of the product is
/// scaled by the bucket count and floored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MultiplicativeHash {
    /// Multiplier, ideally irrational and in `(0, 1)`
    factor: f64,
}

impl MultiplicativeHash {
    /// Knuth's suggestion, `(sqrt(5) - 1) / 2`
    pub const GOLDEN_RATIO_FACTOR: f64 = 0.618_033_988_749_894_9;

    /// Creates a multiplicative hash with a custom multiplier
    #[must_use]
    pub const fn with_factor(factor: f64) -> Self {
        Self { factor }
    }

    /// The multiplier in use
    #[must_use]
    pub const fn factor(&self) -> f64 {
        self.factor
    }
}

impl Default for MultiplicativeHash {
    fn default() -> Self {
        Self::with_factor(Self::GOLDEN_RATIO_FACTOR)
    }
}

impl<K> BucketHasher<K> for MultiplicativeHash
where
    K: AsRef<str> + ?Sized,
{
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn bucket_index(&self, key: &K, bucket_count: usize) -> usize {
        let hash = polynomial(key.as_ref(), bucket_count) as f64;
        let scaled = (hash * self.factor).fract().abs() * bucket_count as f64;
        // rounding can push the product up to `bucket_count` itself
        (scaled.floor() as usize).min(bucket_count.saturating_sub(1))
    }
}

/// Hashes any [`Hash`] key with the standard library's `DefaultHasher`.
///
/// Unlike the string hashes this works for arbitrary key types; the output is a full 64-bit
/// hash reduced modulo the bucket count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StdHash;

impl<K> BucketHasher<K> for StdHash
where
    K: Hash + ?Sized,
{
    #[allow(clippy::cast_possible_truncation)]
    fn bucket_index(&self, key: &K, bucket_count: usize) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let hash = hasher.finish();
        // the remainder is below `bucket_count`, so it fits in a usize
        (hash % (bucket_count.max(1) as u64)) as usize
    }
}

/// A free function can serve as the hash strategy for string keys
impl<K> BucketHasher<K> for fn(&str, usize) -> usize
where
    K: AsRef<str> + ?Sized,
{
    fn bucket_index(&self, key: &K, bucket_count: usize) -> usize {
        self(key.as_ref(), bucket_count)
    }
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    #[test]
    fn test_polynomial_matches_rolling_formula() {
        // (0 * 31 + 97) % 16 = 1, (1 * 31 + 98) % 16 = 1
        assert_eq!(PolynomialHash.bucket_index("ab", 16), 1);
        assert_eq!(PolynomialHash.bucket_index("a", 16), 97 % 16);
        assert_eq!(PolynomialHash.bucket_index("", 16), 0);
        assert_eq!(PolynomialHash.bucket_index("a", 1), 0);
    }

    #[test]
    fn test_polynomial_agrees_for_owned_and_borrowed_keys() {
        let owned = String::from("banana");
        assert_eq!(
            PolynomialHash.bucket_index(&owned, 32),
            PolynomialHash.bucket_index("banana", 32)
        );
    }

    #[test]
    fn test_polynomial_uses_utf16_code_units() {
        // U+1F600 is the surrogate pair 0xD83D 0xDE00
        let expected = ((0xD83D_usize % 1000) * 31 + 0xDE00) % 1000;
        assert_eq!(PolynomialHash.bucket_index("\u{1F600}", 1000), expected);
    }

    #[test]
    fn test_polynomial_handles_huge_bucket_counts() {
        let index = PolynomialHash.bucket_index("a long key that wraps many times", usize::MAX);
        assert!(index < usize::MAX);
    }

    #[test]
    fn test_multiplicative_stays_in_range() {
        let hash = MultiplicativeHash::default();
        for bucket_count in [1, 2, 3, 16, 17, 1024] {
            for key in ["", "a", "apple", "banana", "cherry", "zzzzzzzzzz"] {
                assert!(hash.bucket_index(key, bucket_count) < bucket_count);
            }
        }
    }

    #[test]
    fn test_multiplicative_formula() {
        let hash = MultiplicativeHash::default();
        // polynomial("ab", 16) == 1, frac(0.618..) * 16 == 9.88..
        assert_eq!(hash.bucket_index("ab", 16), 9);
        assert!((hash.factor() - MultiplicativeHash::GOLDEN_RATIO_FACTOR).abs() < f64::EPSILON);
    }

    #[test]
    fn test_std_hash_is_deterministic() {
        assert_eq!(StdHash.bucket_index(&42_u64, 64), StdHash.bucket_index(&42_u64, 64));
        assert_eq!(StdHash.bucket_index("k", 64), StdHash.bucket_index(&String::from("k"), 64));
        assert!(StdHash.bucket_index(&(1, 2), 7) < 7);
    }

    #[test]
    fn test_function_pointer_strategy() {
        fn first_byte(key: &str, bucket_count: usize) -> usize {
            key.bytes().next().map_or(0, usize::from) % bucket_count
        }

        let strategy: fn(&str, usize) -> usize = first_byte;
        assert_eq!(BucketHasher::<str>::bucket_index(&strategy, "b", 16), 98 % 16);
    }
}
