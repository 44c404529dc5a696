use crate::error::{Result, StoreError};
use crate::log::LogSink;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for a typed store
///
/// Built once and handed to `Store::open_with_config`. Every field except the
/// log sink can be loaded from a host application's own config files; missing
/// fields fall back to their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the LMDB environment
    pub path: PathBuf,

    /// Maximum number of concurrent read transactions (LMDB reader slots)
    /// Default: 126
    #[serde(default = "default_max_readers")]
    pub max_readers: u32,

    /// Maximum number of namespaces that can be bound
    /// Default: 128
    #[serde(default = "default_max_namespaces")]
    pub max_namespaces: u32,

    /// Maximum map size for LMDB (in bytes)
    /// Default: 1GB
    #[serde(default = "default_map_size")]
    pub map_size: usize,

    /// Sync mode for durability
    #[serde(default)]
    pub sync_mode: SyncMode,

    /// How long a read waits for a free reader slot, in milliseconds
    ///
    /// `None` (the default) waits until a slot frees. With a value set, a read
    /// that cannot get a slot in time fails with `StoreError::ReaderLimit`.
    #[serde(default)]
    pub reader_acquire_timeout_ms: Option<u64>,

    /// Destination for lifecycle and failure events (default: discard)
    #[serde(skip)]
    pub log_sink: LogSink,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// Calls `fsync()` on every commit.
    Full,

    /// Skips syncing the LMDB meta-page on each commit (default).
    ///
    /// The last transaction may be lost on an OS crash, but the environment
    /// stays consistent.
    #[default]
    NoMetaSync,

    /// Leaves flushing to the OS page cache. Test and scratch workloads only.
    NoSync,
}

fn default_max_readers() -> u32 {
    126
}

fn default_max_namespaces() -> u32 {
    128
}

fn default_map_size() -> usize {
    1024 * 1024 * 1024 // 1GB
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_readers: default_max_readers(),
            max_namespaces: default_max_namespaces(),
            map_size: default_map_size(),
            sync_mode: SyncMode::default(),
            reader_acquire_timeout_ms: None,
            log_sink: LogSink::default(),
        }
    }

    pub fn with_max_readers(mut self, max_readers: u32) -> Self {
        self.max_readers = max_readers;
        self
    }

    pub fn with_max_namespaces(mut self, max_namespaces: u32) -> Self {
        self.max_namespaces = max_namespaces;
        self
    }

    pub fn with_map_size(mut self, map_size: usize) -> Self {
        self.map_size = map_size;
        self
    }

    pub fn with_sync_mode(mut self, sync_mode: SyncMode) -> Self {
        self.sync_mode = sync_mode;
        self
    }

    /// Fail reads that wait longer than `timeout_ms` for a reader slot
    pub fn with_reader_acquire_timeout(mut self, timeout_ms: u64) -> Self {
        self.reader_acquire_timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_log_sink(mut self, log_sink: LogSink) -> Self {
        self.log_sink = log_sink;
        self
    }

    pub fn reader_acquire_timeout(&self) -> Option<Duration> {
        self.reader_acquire_timeout_ms.map(Duration::from_millis)
    }

    /// Reject configurations LMDB cannot open
    pub fn validate(&self) -> Result<()> {
        if self.max_readers == 0 {
            return Err(StoreError::open(&self.path, "max_readers must be > 0"));
        }
        if self.max_namespaces == 0 {
            return Err(StoreError::open(&self.path, "max_namespaces must be > 0"));
        }
        if self.map_size == 0 {
            return Err(StoreError::open(&self.path, "map_size must be > 0"));
        }
        Ok(())
    }
}
