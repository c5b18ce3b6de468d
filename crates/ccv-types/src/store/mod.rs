//! # Key-Value Store Port
//!
//! Persisted CCV state is a set of per-chain records in an ordered
//! key-value store. Keys are built with [`KeyBuilder`]; values are
//! `bincode`-encoded through [`TypedStore`].
//!
//! Every block step runs on a [`CachedKvStore`] write-set over the backing
//! store and commits it with a single [`KeyValueStore::atomic_batch_write`].

mod cached;
mod memory;
#[cfg(feature = "rocksdb")]
mod rocks;

pub use cached::CachedKvStore;
pub use memory::InMemoryKvStore;
#[cfg(feature = "rocksdb")]
pub use rocks::{RocksDbConfig, RocksDbStore};

use crate::errors::{CcvError, CcvResult};
use crate::ids::ChainId;
use serde::{de::DeserializeOwned, Serialize};

/// Ordered key-value store.
///
/// `prefix_scan` returns entries in ascending key order; state machines
/// rely on this for deterministic iteration.
pub trait KeyValueStore {
    /// Get a value by key.
    fn get(&self, key: &[u8]) -> CcvResult<Option<Vec<u8>>>;

    /// Put a single key-value pair.
    fn put(&mut self, key: &[u8], value: &[u8]) -> CcvResult<()>;

    /// Delete a key.
    fn delete(&mut self, key: &[u8]) -> CcvResult<()>;

    /// Apply all operations, or none of them.
    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> CcvResult<()>;

    /// Check if a key exists.
    fn exists(&self, key: &[u8]) -> CcvResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// All entries whose key starts with `prefix`, ascending by key.
    fn prefix_scan(&self, prefix: &[u8]) -> CcvResult<Vec<(Vec<u8>, Vec<u8>)>>;
}

/// Batch operation for atomic writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOperation {
    /// Put a key-value pair.
    Put { key: Vec<u8>, value: Vec<u8> },
    /// Delete a key.
    Delete { key: Vec<u8> },
}

impl BatchOperation {
    /// Create a Put operation.
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a Delete operation.
    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Delete { key: key.into() }
    }
}

/// Typed access on top of any [`KeyValueStore`].
pub trait TypedStore: KeyValueStore {
    /// Decode the value at `key`.
    fn get_value<T: DeserializeOwned>(&self, key: &[u8]) -> CcvResult<Option<T>> {
        match self.get(key)? {
            Some(bytes) => decode_value(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Encode and store `value` at `key`.
    fn put_value<T: Serialize>(&mut self, key: &[u8], value: &T) -> CcvResult<()> {
        let bytes = encode_value(value)?;
        self.put(key, &bytes)
    }

    /// Decode every value under `prefix`, keeping the raw key.
    fn scan_values<T: DeserializeOwned>(&self, prefix: &[u8]) -> CcvResult<Vec<(Vec<u8>, T)>> {
        self.prefix_scan(prefix)?
            .into_iter()
            .map(|(k, v)| decode_value(&v).map(|t| (k, t)))
            .collect()
    }

    /// Delete every key under `prefix`, returning how many were removed.
    fn delete_prefix(&mut self, prefix: &[u8]) -> CcvResult<usize> {
        let keys: Vec<Vec<u8>> = self.prefix_scan(prefix)?.into_iter().map(|(k, _)| k).collect();
        for key in &keys {
            self.delete(key)?;
        }
        Ok(keys.len())
    }
}

impl<S: KeyValueStore + ?Sized> TypedStore for S {}

/// Encode a value with bincode.
pub fn encode_value<T: Serialize>(value: &T) -> CcvResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| CcvError::Codec(e.to_string()))
}

/// Decode a bincode value.
pub fn decode_value<T: DeserializeOwned>(bytes: &[u8]) -> CcvResult<T> {
    bincode::deserialize(bytes).map_err(|e| CcvError::Codec(e.to_string()))
}

/// Builder for record keys: `prefix | len(chain) | chain | suffix...`.
///
/// Integers are big-endian so byte order matches numeric order.
#[derive(Debug, Clone)]
pub struct KeyBuilder(Vec<u8>);

impl KeyBuilder {
    /// Start a key with a one-byte record prefix.
    pub fn new(prefix: u8) -> Self {
        Self(vec![prefix])
    }

    /// Append a length-prefixed chain id.
    pub fn chain(mut self, chain_id: &ChainId) -> Self {
        self.0.push(chain_id.as_str().len() as u8);
        self.0.extend_from_slice(chain_id.as_str().as_bytes());
        self
    }

    /// Append a big-endian `u64`.
    pub fn u64(mut self, value: u64) -> Self {
        self.0.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Append raw bytes.
    pub fn bytes(mut self, bytes: &[u8]) -> Self {
        self.0.extend_from_slice(bytes);
        self
    }

    /// Finish.
    pub fn build(self) -> Vec<u8> {
        self.0
    }
}

/// Read the trailing big-endian `u64` of a key.
pub fn trailing_u64(key: &[u8]) -> CcvResult<u64> {
    if key.len() < 8 {
        return Err(CcvError::CorruptedState(format!(
            "key too short for u64 suffix: {} bytes",
            key.len()
        )));
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&key[key.len() - 8..]);
    Ok(u64::from_be_bytes(buf))
}

/// Read the length-prefixed chain id that follows the one-byte prefix.
pub fn chain_after_prefix(key: &[u8]) -> CcvResult<ChainId> {
    let len = *key
        .get(1)
        .ok_or_else(|| CcvError::CorruptedState("key missing chain length".to_string()))?
        as usize;
    let raw = key
        .get(2..2 + len)
        .ok_or_else(|| CcvError::CorruptedState("key shorter than chain id".to_string()))?;
    let s = std::str::from_utf8(raw).map_err(|e| CcvError::CorruptedState(e.to_string()))?;
    ChainId::new(s)
}
