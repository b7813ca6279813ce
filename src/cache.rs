use std::cell::Cell;

use crate::utils::MyHash;

struct Entry<K, V> {
    key: K,
    value: V,
}

/// Direct-mapped computed table.
///
/// Full keys are stored, so a collision evicts the previous entry and can
/// only ever cause a miss.
pub struct Cache<K, V> {
    data: Vec<Option<Entry<K, V>>>,
    bitmask: u64,
    hits: Cell<usize>,
    misses: Cell<usize>,
}

impl<K, V> Cache<K, V> {
    /// Create a new cache of size `2^bits`.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Bits should be in the range 0..=31");

        let size = 1 << bits;
        Self {
            data: std::iter::repeat_with(|| None).take(size).collect(),
            bitmask: (size - 1) as u64,
            hits: Cell::new(0),
            misses: Cell::new(0),
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.get()
    }
    pub fn misses(&self) -> usize {
        self.misses.get()
    }
}

impl<K, V> Cache<K, V>
where
    K: MyHash + Eq,
{
    fn index(&self, key: &K) -> usize {
        (key.hash() & self.bitmask) as usize
    }

    /// Look up `key`, counting the outcome.
    pub fn get(&self, key: &K) -> Option<&V> {
        match &self.data[self.index(key)] {
            Some(entry) if &entry.key == key => {
                self.hits.set(self.hits.get() + 1);
                Some(&entry.value)
            }
            _ => {
                self.misses.set(self.misses.get() + 1);
                None
            }
        }
    }

    /// Store `value` under `key`, evicting whatever shared its slot.
    pub fn insert(&mut self, key: K, value: V) {
        let index = self.index(&key);
        self.data[index] = Some(Entry { key, value });
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_hits_and_misses() {
        // (0, 1) -> 1, (1, 1) -> 3, (2, 0) -> 6: distinct slots out of 8.
        let mut cache = Cache::<(u64, u64), &str>::new(3);
        cache.insert((0, 1), "a");
        cache.insert((1, 1), "b");
        cache.insert((2, 0), "c");

        assert_eq!(cache.get(&(1, 1)), Some(&"b"));
        assert_eq!(cache.get(&(2, 0)), Some(&"c"));
        assert_eq!(cache.get(&(0, 2)), None);
        assert_eq!((cache.hits(), cache.misses()), (2, 1));

        cache.insert((1, 1), "d");
        assert_eq!(cache.get(&(1, 1)), Some(&"d"));
    }

    #[test]
    fn test_collision_is_a_miss() {
        // One slot: every key collides.
        let mut cache = Cache::<(u64, u64), i32>::new(0);
        cache.insert((1, 2), 10);
        cache.insert((5, 7), 20);
        assert_eq!(cache.get(&(1, 2)), None);
        assert_eq!(cache.get(&(5, 7)), Some(&20));

        cache.insert((1, 2), 30);
        assert_eq!(cache.get(&(5, 7)), None);
        assert_eq!(cache.get(&(1, 2)), Some(&30));
    }
}
