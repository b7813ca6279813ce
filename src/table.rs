use std::ops::Index;

use log::debug;

use crate::error::SolverError;
use crate::utils::MyHash;

#[derive(Clone)]
struct Entry<T> {
    value: T,
    next: usize,
}

/// Hash-consing table: every distinct value is stored exactly once and is
/// addressed by a stable 1-based index.
///
/// Slot 0 is a sentinel, so `0` doubles as the "end of chain" marker.
/// The table never holds more than `limit` values; the next insertion
/// fails with [`SolverError::NodeLimit`].
pub struct Table<T> {
    data: Vec<Entry<T>>,
    buckets: Vec<usize>,
    bitmask: u64,
    limit: usize,
}

impl<T> Table<T>
where
    T: Default,
{
    /// Create a new table with room for `2^bits` values before reallocating
    /// and at most `limit` values overall.
    pub fn new(bits: usize, limit: usize) -> Self {
        assert!(bits <= 31, "Storage bits should be in the range 0..=31");

        let capacity = 1 << bits;
        let mut data = Vec::with_capacity(capacity.min(limit.saturating_add(1)));
        data.push(Entry {
            value: T::default(),
            next: 0,
        });

        let buckets_size = 1 << bits.min(16);
        Self {
            data,
            buckets: vec![0; buckets_size],
            bitmask: (buckets_size - 1) as u64,
            limit,
        }
    }
}

impl<T> Table<T> {
    /// Number of stored values.
    pub fn size(&self) -> usize {
        self.data.len() - 1
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Get the reference to the value at the given index.
    pub fn value(&self, index: usize) -> &T {
        assert_ne!(index, 0, "Index is 0");
        &self.data[index].value
    }

    /// All stored values in index order, including the sentinel at 0.
    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.data.iter().map(|entry| &entry.value)
    }

    /// Append a value without hash-consing it.
    pub fn add(&mut self, value: T) -> Result<usize, SolverError> {
        if self.size() >= self.limit {
            return Err(SolverError::NodeLimit { limit: self.limit });
        }
        self.data.push(Entry { value, next: 0 });
        Ok(self.data.len() - 1)
    }
}

impl<T> Table<T>
where
    T: MyHash + Eq,
{
    fn bucket_index(&self, value: &T) -> usize {
        (value.hash() & self.bitmask) as usize
    }

    /// Put a value into the table and return its index, reusing the index of
    /// an equal value if one is already stored.
    pub fn put(&mut self, value: T) -> Result<usize, SolverError> {
        let bucket = self.bucket_index(&value);
        let mut index = self.buckets[bucket];

        while index != 0 {
            if self.data[index].value == value {
                return Ok(index);
            }
            index = self.data[index].next;
        }

        let i = self.add(value)?;
        self.data[i].next = self.buckets[bucket];
        self.buckets[bucket] = i;

        if self.size() > 2 * self.buckets.len() {
            self.grow_buckets();
        }
        Ok(i)
    }

    fn grow_buckets(&mut self) {
        let size = self.buckets.len() * 2;
        debug!("table: growing buckets to {}", size);
        self.buckets = vec![0; size];
        self.bitmask = (size - 1) as u64;
        for i in 1..self.data.len() {
            let bucket = self.bucket_index(&self.data[i].value);
            self.data[i].next = self.buckets[bucket];
            self.buckets[bucket] = i;
        }
    }
}

impl<T> Index<usize> for Table<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        self.value(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
    struct Item(i32);

    impl MyHash for Item {
        fn hash(&self) -> u64 {
            self.0.unsigned_abs() as u64
        }
    }

    #[test]
    fn test_add() {
        let mut table = Table::new(2, 8);
        let index = table.add(42).unwrap();
        assert_eq!(index, 1);
        assert_eq!(table[index], 42);
        assert_eq!(table.size(), 1);
    }

    #[test]
    fn test_limit() {
        let mut table = Table::<()>::new(2, 2);
        assert_eq!(table.add(()), Ok(1));
        assert_eq!(table.add(()), Ok(2));
        assert_eq!(table.add(()), Err(SolverError::NodeLimit { limit: 2 }));
    }

    #[test]
    fn test_put_dedup() {
        let mut table = Table::new(2, 16);
        let i1 = table.put(Item(5)).unwrap();
        let i2 = table.put(Item(-5)).unwrap();
        let i3 = table.put(Item(5)).unwrap();
        assert_ne!(i1, i2);
        assert_eq!(i1, i3);
        // Same bucket, chained.
        assert_eq!(table.size(), 2);
        assert_eq!(table[i1], Item(5));
        assert_eq!(table[i2], Item(-5));
    }

    #[test]
    fn test_put_survives_bucket_growth() {
        let mut table = Table::new(1, 1000);
        let indices: Vec<usize> = (0..100).map(|i| table.put(Item(i)).unwrap()).collect();
        for (i, &index) in indices.iter().enumerate() {
            assert_eq!(table.put(Item(i as i32)).unwrap(), index);
            assert_eq!(table[index], Item(i as i32));
        }
        assert_eq!(table.size(), 100);
    }
}
