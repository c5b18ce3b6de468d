use super::{BatchOperation, KeyValueStore};
use crate::errors::CcvResult;
use std::collections::BTreeMap;

/// Buffered write-set over a parent store.
///
/// Reads see buffered writes first. Nothing reaches the parent until
/// [`CachedKvStore::commit`], which hands every buffered write to the parent
/// as one atomic batch. Dropping the cache discards its writes. Caches nest:
/// a cache over a cache commits into the outer write-set.
pub struct CachedKvStore<'a, S: KeyValueStore + ?Sized> {
    parent: &'a mut S,
    // `None` marks a deletion.
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a, S: KeyValueStore + ?Sized> CachedKvStore<'a, S> {
    pub fn new(parent: &'a mut S) -> Self {
        Self {
            parent,
            writes: BTreeMap::new(),
        }
    }

    /// Number of buffered writes.
    pub fn pending_writes(&self) -> usize {
        self.writes.len()
    }

    /// Flush buffered writes into the parent atomically.
    pub fn commit(self) -> CcvResult<()> {
        if self.writes.is_empty() {
            return Ok(());
        }
        let ops = self
            .writes
            .into_iter()
            .map(|(key, value)| match value {
                Some(value) => BatchOperation::Put { key, value },
                None => BatchOperation::Delete { key },
            })
            .collect();
        self.parent.atomic_batch_write(ops)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for CachedKvStore<'_, S> {
    fn get(&self, key: &[u8]) -> CcvResult<Option<Vec<u8>>> {
        match self.writes.get(key) {
            Some(buffered) => Ok(buffered.clone()),
            None => self.parent.get(key),
        }
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> CcvResult<()> {
        self.writes.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> CcvResult<()> {
        self.writes.insert(key.to_vec(), None);
        Ok(())
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> CcvResult<()> {
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => {
                    self.writes.insert(key, Some(value));
                }
                BatchOperation::Delete { key } => {
                    self.writes.insert(key, None);
                }
            }
        }
        Ok(())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> CcvResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.parent.prefix_scan(prefix)?.into_iter().collect();
        for (key, value) in self
            .writes
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
        {
            match value {
                Some(v) => {
                    merged.insert(key.clone(), v.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        Ok(merged.into_iter().collect())
    }
}
