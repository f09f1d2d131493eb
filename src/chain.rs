use std::{
    borrow::Borrow,
    mem,
    sync::atomic::{AtomicU64, Ordering},
};

use slab::Slab;

use crate::TableError;

/// Source of entry stamps, unique for the lifetime of the process
static NEXT_STAMP: AtomicU64 = AtomicU64::new(0);

/// Hands out a fresh entry stamp
fn next_stamp() -> u64 {
    NEXT_STAMP.fetch_add(1, Ordering::Relaxed)
}

/// Handle to a live entry of a [`Chain`].
///
/// The handle records the arena slot together with the stamp the entry received when it was
/// created, so a handle that outlived its entry (or that belongs to another chain) is rejected
/// instead of silently aliasing whatever reuses the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryRef {
    /// Arena slot of the entry
    slot: usize,
    /// Identity of the entry
    stamp: u64,
}

/// A key-value pair linked to its neighbours in the same chain
#[derive(Debug, Clone)]
struct Node<K, V> {
    /// The key of the entry
    key: K,
    /// The value associated with the key
    value: V,
    /// Identity checked against [`EntryRef::stamp`]
    stamp: u64,
    /// Slot of the entry closer to the head
    prev: Option<usize>,
    /// Slot of the entry closer to the tail
    next: Option<usize>,
}

/// Outcome of [`Chain::append`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Appended<V> {
    /// A new entry was linked in as the head of the chain
    Inserted(EntryRef),
    /// The key already existed; its value was overwritten and the old one is returned
    Updated(EntryRef, V),
}

impl<V> Appended<V> {
    /// Handle of the entry that now holds the appended value
    #[must_use]
    pub fn entry(&self) -> EntryRef {
        match self {
            Self::Inserted(entry) | Self::Updated(entry, _) => *entry,
        }
    }

    /// The value that was replaced, if the key already existed
    #[must_use]
    pub fn into_previous(self) -> Option<V> {
        match self {
            Self::Inserted(_) => None,
            Self::Updated(_, previous) => Some(previous),
        }
    }
}

/// A doubly linked list of key-value entries forming one bucket of a [`HashTable`].
///
/// Entries live in a slab arena owned by the chain; `prev`/`next` links are slot indices
/// rather than references. New keys are linked in at the head, so traversal yields the most
/// recently inserted entry first. Keys within a chain are unique.
///
/// Cloning a chain gives every copied entry a fresh identity, so handles taken from the
/// original are rejected by the clone.
///
/// [`HashTable`]: crate::HashTable
#[derive(Debug)]
pub struct Chain<K, V> {
    /// Arena owning every entry of the chain
    entries: Slab<Node<K, V>>,
    /// Slot of the first entry
    head: Option<usize>,
    /// Slot of the last entry
    tail: Option<usize>,
}

impl<K, V> Clone for Chain<K, V>
where
    K: Clone,
    V: Clone,
{
    fn clone(&self) -> Self {
        let mut entries = self.entries.clone();
        for (_, node) in &mut entries {
            node.stamp = next_stamp();
        }
        Self { entries, head: self.head, tail: self.tail }
    }
}

impl<K, V> Default for Chain<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Chain<K, V> {
    /// Creates an empty chain
    #[must_use]
    pub fn new() -> Self {
        Self { entries: Slab::new(), head: None, tail: None }
    }

    /// Number of entries in the chain
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the chain holds no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Handle of the first (most recently inserted) entry
    #[must_use]
    pub fn head(&self) -> Option<EntryRef> {
        self.head.and_then(|slot| self.entry_ref(slot))
    }

    /// Handle of the last (least recently inserted) entry
    #[must_use]
    pub fn tail(&self) -> Option<EntryRef> {
        self.tail.and_then(|slot| self.entry_ref(slot))
    }

    /// Builds the handle for an occupied slot
    fn entry_ref(&self, slot: usize) -> Option<EntryRef> {
        self.entries.get(slot).map(|node| EntryRef { slot, stamp: node.stamp })
    }

    /// Resolves a handle, rejecting stale or foreign ones
    fn node(&self, entry: EntryRef) -> Option<&Node<K, V>> {
        self.entries.get(entry.slot).filter(|node| node.stamp == entry.stamp)
    }

    /// Mutable counterpart of [`Self::node`]
    fn node_mut(&mut self, entry: EntryRef) -> Option<&mut Node<K, V>> {
        self.entries.get_mut(entry.slot).filter(|node| node.stamp == entry.stamp)
    }

    /// Finds the entry holding `key`, scanning from the head
    pub fn search<Q>(&self, key: &Q) -> Option<EntryRef>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let mut cursor = self.head;
        while let Some(slot) = cursor {
            let node = self.entries.get(slot)?;
            if node.key.borrow() == key {
                return Some(EntryRef { slot, stamp: node.stamp });
            }
            cursor = node.next;
        }
        None
    }

    /// Key and value of a live entry
    #[must_use]
    pub fn get(&self, entry: EntryRef) -> Option<(&K, &V)> {
        self.node(entry).map(|node| (&node.key, &node.value))
    }

    /// Mutable access to the value of a live entry
    pub fn get_mut(&mut self, entry: EntryRef) -> Option<&mut V> {
        self.node_mut(entry).map(|node| &mut node.value)
    }

    /// Stores `value` under `key`.
    ///
    /// An existing entry is updated in place and keeps its position; otherwise a new entry
    /// becomes the head of the chain.
    pub fn append(&mut self, key: K, value: V) -> Appended<V>
    where
        K: Eq,
    {
        if let Some(entry) = self.search(&key) {
            if let Some(node) = self.node_mut(entry) {
                let previous = mem::replace(&mut node.value, value);
                return Appended::Updated(entry, previous);
            }
        }

        let stamp = next_stamp();
        let slot = self.entries.insert(Node { key, value, stamp, prev: None, next: self.head });
        match self.head {
            Some(old_head) => {
                if let Some(node) = self.entries.get_mut(old_head) {
                    node.prev = Some(slot);
                }
            }
            None => self.tail = Some(slot),
        }
        self.head = Some(slot);

        Appended::Inserted(EntryRef { slot, stamp })
    }

    /// Unlinks `entry` from the chain and returns its key and value.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::EmptyChain`] if the chain has no entries and
    /// [`TableError::ForeignEntry`] if `entry` is not a live entry of this chain.
    pub fn remove(&mut self, entry: EntryRef) -> Result<(K, V), TableError> {
        if self.entries.is_empty() {
            return Err(TableError::EmptyChain);
        }
        if self.node(entry).is_none() {
            return Err(TableError::ForeignEntry);
        }
        let node = self.entries.try_remove(entry.slot).ok_or(TableError::ForeignEntry)?;

        match node.prev {
            Some(prev) => {
                if let Some(prev_node) = self.entries.get_mut(prev) {
                    prev_node.next = node.next;
                }
            }
            None => self.head = node.next,
        }
        match node.next {
            Some(next) => {
                if let Some(next_node) = self.entries.get_mut(next) {
                    next_node.prev = node.prev;
                }
            }
            None => self.tail = node.prev,
        }

        Ok((node.key, node.value))
    }

    /// Drops every entry of the chain
    pub fn clear(&mut self) {
        self.entries.clear();
        self.head = None;
        self.tail = None;
    }

    /// Iterates the entries from head to tail
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter { entries: &self.entries, cursor: self.head, remaining: self.entries.len() }
    }

    /// Visits the entries from head to tail with mutable access to each value
    pub fn for_each_mut<F>(&mut self, mut visit: F)
    where
        F: FnMut(&K, &mut V),
    {
        let mut cursor = self.head;
        while let Some(node) = cursor.and_then(|slot| self.entries.get_mut(slot)) {
            visit(&node.key, &mut node.value);
            cursor = node.next;
        }
    }
}

/// Borrowing iterator over a [`Chain`], head to tail
#[derive(Debug, Clone)]
pub struct Iter<'a, K, V> {
    /// Arena of the chain being walked
    entries: &'a Slab<Node<K, V>>,
    /// Slot of the next entry to yield
    cursor: Option<usize>,
    /// Entries not yet yielded
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.entries.get(self.cursor?)?;
        self.cursor = node.next;
        self.remaining = self.remaining.saturating_sub(1);
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<'a, K, V> IntoIterator for &'a Chain<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Owning iterator over a [`Chain`], head to tail
#[derive(Debug)]
pub struct IntoIter<K, V> {
    /// Entries not yet yielded
    entries: Slab<Node<K, V>>,
    /// Slot of the next entry to yield
    cursor: Option<usize>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.entries.try_remove(self.cursor?)?;
        self.cursor = node.next;
        Some((node.key, node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.entries.len(), Some(self.entries.len()))
    }
}

impl<K, V> IntoIterator for Chain<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter { entries: self.entries, cursor: self.head }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    fn keys(chain: &Chain<&'static str, i32>) -> Vec<&'static str> {
        chain.iter().map(|(k, _)| *k).collect()
    }

    fn filled() -> Chain<&'static str, i32> {
        let mut chain = Chain::new();
        chain.append("a", 1);
        chain.append("b", 2);
        chain.append("c", 3);
        chain
    }

    #[test]
    fn test_append_links_new_entries_at_head() {
        let chain = filled();

        assert_eq!(keys(&chain), vec!["c", "b", "a"]);
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.head().and_then(|e| chain.get(e)), Some((&"c", &3)));
        assert_eq!(chain.tail().and_then(|e| chain.get(e)), Some((&"a", &1)));
    }

    #[test]
    fn test_append_existing_key_updates_in_place() {
        let mut chain = filled();
        let before = chain.search("b");

        let appended = chain.append("b", 20);

        assert_eq!(Some(appended.entry()), before);
        assert_eq!(appended.into_previous(), Some(2));
        assert_eq!(chain.len(), 3);
        assert_eq!(keys(&chain), vec!["c", "b", "a"]);
        assert_eq!(chain.search("b").and_then(|e| chain.get(e)), Some((&"b", &20)));
    }

    #[test]
    fn test_search_missing_key() {
        let chain = filled();
        assert_eq!(chain.search("z"), None);
        assert_eq!(Chain::<String, i32>::new().search("a"), None);
    }

    #[test]
    fn test_remove_head_middle_and_tail() {
        let mut chain = filled();

        let middle = chain.search("b").unwrap();
        assert_eq!(chain.remove(middle), Ok(("b", 2)));
        assert_eq!(keys(&chain), vec!["c", "a"]);

        let head = chain.head().unwrap();
        assert_eq!(chain.remove(head), Ok(("c", 3)));
        assert_eq!(keys(&chain), vec!["a"]);

        chain.append("d", 4);
        let tail = chain.tail().unwrap();
        assert_eq!(chain.remove(tail), Ok(("a", 1)));
        assert_eq!(keys(&chain), vec!["d"]);
        assert_eq!(chain.head(), chain.tail());
    }

    #[test]
    fn test_remove_middle_then_tail() {
        let mut chain = filled();

        let middle = chain.search("b").unwrap();
        chain.remove(middle).unwrap();
        let tail = chain.tail().unwrap();
        assert_eq!(chain.get(tail), Some((&"a", &1)));
        assert_eq!(chain.remove(tail), Ok(("a", 1)));

        assert_eq!(keys(&chain), vec!["c"]);
        assert_eq!(chain.head(), chain.tail());
        assert_eq!(chain.tail().and_then(|e| chain.get(e)), Some((&"c", &3)));

        chain.append("d", 4);
        assert_eq!(keys(&chain), vec!["d", "c"]);
        assert_eq!(chain.tail().and_then(|e| chain.get(e)), Some((&"c", &3)));
    }

    #[test]
    fn test_clone_rejects_handles_of_original() {
        let chain = filled();
        let entry = chain.search("b").unwrap();
        let mut copy = chain.clone();

        assert_eq!(copy.remove(entry), Err(TableError::ForeignEntry));
        assert_eq!(keys(&copy), vec!["c", "b", "a"]);

        let own = copy.search("b").unwrap();
        assert_eq!(copy.remove(own), Ok(("b", 2)));
        assert_eq!(keys(&copy), vec!["c", "a"]);
        assert_eq!(chain.get(entry), Some((&"b", &2)));
    }

    #[test]
    fn test_remove_last_entry_empties_chain() {
        let mut chain = Chain::new();
        let entry = chain.append("only", 1).entry();

        assert_eq!(chain.remove(entry), Ok(("only", 1)));
        assert!(chain.is_empty());
        assert_eq!(chain.head(), None);
        assert_eq!(chain.tail(), None);

        chain.append("again", 2);
        assert_eq!(keys(&chain), vec!["again"]);
    }

    #[test]
    fn test_remove_rejects_stale_and_foreign_entries() {
        let mut chain = filled();
        let mut other = filled();

        let foreign = other.search("a").unwrap();
        assert_eq!(chain.remove(foreign), Err(TableError::ForeignEntry));

        let entry = chain.search("a").unwrap();
        assert!(chain.remove(entry).is_ok());
        // the freed slot is reused by the next insertion
        chain.append("e", 5);
        assert_eq!(chain.remove(entry), Err(TableError::ForeignEntry));
        assert_eq!(chain.len(), 3);
        assert_eq!(keys(&chain), vec!["e", "c", "b"]);

        other.clear();
        assert_eq!(other.remove(foreign), Err(TableError::EmptyChain));
    }

    #[test]
    fn test_clear() {
        let mut chain = filled();
        chain.clear();

        assert!(chain.is_empty());
        assert_eq!(chain.iter().count(), 0);
        assert_eq!(chain.head(), None);
        assert_eq!(chain.search("a"), None);
    }

    #[test]
    fn test_for_each_mut_updates_values() {
        let mut chain = filled();
        let mut visited = Vec::new();

        chain.for_each_mut(|k, v| {
            visited.push(*k);
            *v *= 10;
        });

        assert_eq!(visited, vec!["c", "b", "a"]);
        let values: Vec<i32> = chain.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![30, 20, 10]);
    }

    #[test]
    fn test_into_iter_moves_entries_in_order() {
        let mut chain = filled();
        let b = chain.search("b").unwrap();
        chain.remove(b).unwrap();

        let iter = chain.into_iter();
        assert_eq!(iter.size_hint(), (2, Some(2)));
        assert_eq!(iter.collect::<Vec<_>>(), vec![("c", 3), ("a", 1)]);
    }
}
