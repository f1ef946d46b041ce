use std::collections::BTreeMap;

/// Timestamp-keyed ordered map used for pending packets and every statistic
/// the controller reads.
///
/// Keys are unique within a stream epoch; inserting at an existing key
/// replaces the previous value.
#[derive(Debug, Clone)]
pub struct OrderedStore<V> {
    entries: BTreeMap<i64, V>,
}

impl<V> Default for OrderedStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> OrderedStore<V> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Insert or replace, returning the value previously stored at `key`.
    pub fn insert(&mut self, key: i64, value: V) -> Option<V> {
        self.entries.insert(key, value)
    }

    pub fn first_key(&self) -> Option<i64> {
        self.entries.first_key_value().map(|(&key, _)| key)
    }

    pub fn pop_first(&mut self) -> Option<(i64, V)> {
        self.entries.pop_first()
    }

    /// Remove the minimum entry only if its key is below `bound`.
    pub fn pop_first_below(&mut self, bound: i64) -> Option<(i64, V)> {
        match self.first_key() {
            Some(key) if key < bound => self.entries.pop_first(),
            _ => None,
        }
    }

    /// Drop every entry with key `< bound`, returning how many were removed.
    pub fn remove_below(&mut self, bound: i64) -> usize {
        let kept = self.entries.split_off(&bound);
        let removed = std::mem::replace(&mut self.entries, kept);
        removed.len()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, &V)> {
        self.entries.iter().map(|(&key, value)| (key, value))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
