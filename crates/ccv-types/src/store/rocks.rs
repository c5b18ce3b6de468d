//! RocksDB adapter, enabled with the `rocksdb` feature.

use super::{BatchOperation, KeyValueStore};
use crate::errors::{CcvError, CcvResult};
use rocksdb::{Direction, IteratorMode, Options, WriteBatch, WriteOptions, DB};
use std::path::Path;

/// RocksDB tuning for CCV state.
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Database directory.
    pub path: String,
    /// Block cache size in bytes (default: 64MB).
    pub block_cache_size: usize,
    /// Write buffer size in bytes (default: 16MB).
    pub write_buffer_size: usize,
    /// fsync after each write (default: true).
    pub sync_writes: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            path: "./data/ccv".to_string(),
            block_cache_size: 64 * 1024 * 1024,
            write_buffer_size: 16 * 1024 * 1024,
            sync_writes: true,
        }
    }
}

impl RocksDbConfig {
    /// Small buffers, no fsync.
    pub fn for_testing(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 4 * 1024 * 1024,
            write_buffer_size: 1024 * 1024,
            sync_writes: false,
        }
    }
}

/// RocksDB-backed [`KeyValueStore`].
pub struct RocksDbStore {
    db: DB,
    config: RocksDbConfig,
}

impl RocksDbStore {
    /// Open or create a database.
    pub fn open(config: RocksDbConfig) -> CcvResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);

        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&rocksdb::Cache::new_lru_cache(config.block_cache_size));
        opts.set_block_based_table_factory(&block_opts);

        let db = DB::open(&opts, &config.path)
            .map_err(|e| CcvError::Store(format!("Failed to open RocksDB: {e}")))?;
        Ok(Self { db, config })
    }

    /// Open with default tuning at `path`.
    pub fn open_default(path: impl AsRef<Path>) -> CcvResult<Self> {
        Self::open(RocksDbConfig {
            path: path.as_ref().to_string_lossy().to_string(),
            ..Default::default()
        })
    }

    fn write_opts(&self) -> WriteOptions {
        let mut opts = WriteOptions::default();
        opts.set_sync(self.config.sync_writes);
        opts
    }
}

impl KeyValueStore for RocksDbStore {
    fn get(&self, key: &[u8]) -> CcvResult<Option<Vec<u8>>> {
        self.db
            .get(key)
            .map_err(|e| CcvError::Store(format!("RocksDB get failed: {e}")))
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> CcvResult<()> {
        self.db
            .put_opt(key, value, &self.write_opts())
            .map_err(|e| CcvError::Store(format!("RocksDB put failed: {e}")))
    }

    fn delete(&mut self, key: &[u8]) -> CcvResult<()> {
        self.db
            .delete_opt(key, &self.write_opts())
            .map_err(|e| CcvError::Store(format!("RocksDB delete failed: {e}")))
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> CcvResult<()> {
        let mut batch = WriteBatch::default();
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => batch.put(&key, &value),
                BatchOperation::Delete { key } => batch.delete(&key),
            }
        }
        self.db
            .write_opt(batch, &self.write_opts())
            .map_err(|e| CcvError::Store(format!("RocksDB batch write failed: {e}")))
    }

    fn exists(&self, key: &[u8]) -> CcvResult<bool> {
        self.db
            .get_pinned(key)
            .map(|v| v.is_some())
            .map_err(|e| CcvError::Store(format!("RocksDB exists check failed: {e}")))
    }

    fn prefix_scan(&self, prefix: &[u8]) -> CcvResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut results = Vec::new();
        for item in self
            .db
            .iterator(IteratorMode::From(prefix, Direction::Forward))
        {
            let (key, value) =
                item.map_err(|e| CcvError::Store(format!("RocksDB scan failed: {e}")))?;
            if !key.starts_with(prefix) {
                break;
            }
            results.push((key.to_vec(), value.to_vec()));
        }
        Ok(results)
    }
}
