use lmdb::{Database, DatabaseFlags, Environment, EnvironmentFlags};
use parking_lot::{const_mutex, Mutex, RwLock};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use typekv_core::{NamespaceSignature, Result, StoreConfig, StoreError, SyncMode};

use crate::executor::TxnExecutor;
use crate::keys::SIGNATURES_DB;
use crate::read_pool::ReadSlotPool;
use crate::txn::{LmdbReadTxn, LmdbWriteTxn, TxnStats};

/// Environments currently open in this process
///
/// LMDB must not open the same environment twice in one process; its file
/// locks would be released by the second handle's close.
static OPEN_PATHS: Mutex<BTreeSet<PathBuf>> = const_mutex(BTreeSet::new());

struct PathLock(PathBuf);

impl PathLock {
    fn acquire(path: &Path) -> Result<Self> {
        let canonical = path
            .canonicalize()
            .map_err(|e| StoreError::open(path, e))?;
        if !OPEN_PATHS.lock().insert(canonical.clone()) {
            return Err(StoreError::open(
                path,
                "environment is already open in this process",
            ));
        }
        Ok(Self(canonical))
    }
}

impl Drop for PathLock {
    fn drop(&mut self) {
        OPEN_PATHS.lock().remove(&self.0);
    }
}

struct OpenEnv {
    env: Environment,
    _lock: PathLock, // Released after `env` is dropped
}

/// One LMDB environment plus the executor that runs transactions on it
///
/// The environment sits behind a `RwLock<Option<_>>`: every transaction
/// holds the shared side for its whole duration, and `close` takes the
/// exclusive side, so closing waits for in-flight work and everything after
/// it sees `StoreError::Closed`.
pub struct LmdbEnv {
    env: RwLock<Option<OpenEnv>>,
    closed: AtomicBool,
    executor: TxnExecutor,
    signatures_db: Database,
    path: PathBuf,
}

impl LmdbEnv {
    pub fn open(cfg: &StoreConfig) -> Result<Self> {
        cfg.validate()?;

        // Create directory if it doesn't exist
        std::fs::create_dir_all(&cfg.path).map_err(|e| StoreError::open(&cfg.path, e))?;
        let lock = PathLock::acquire(&cfg.path)?;

        let mut env_builder = Environment::new();
        env_builder.set_max_dbs(cfg.max_namespaces.saturating_add(1)); // + signatures
        env_builder.set_map_size(cfg.map_size);
        env_builder.set_max_readers(cfg.max_readers);

        // Reader slots follow transactions, not threads
        let mut flags = EnvironmentFlags::NO_TLS;
        match cfg.sync_mode {
            SyncMode::Full => {}
            SyncMode::NoMetaSync => flags.insert(EnvironmentFlags::NO_META_SYNC),
            SyncMode::NoSync => flags.insert(EnvironmentFlags::NO_SYNC),
        }
        env_builder.set_flags(flags);

        let env = env_builder
            .open(&cfg.path)
            .map_err(|e| StoreError::open(&cfg.path, e))?;

        let signatures_db = env
            .create_db(Some(SIGNATURES_DB), DatabaseFlags::empty())
            .map_err(|e| StoreError::open(&cfg.path, e))?;

        Ok(Self {
            env: RwLock::new(Some(OpenEnv { env, _lock: lock })),
            closed: AtomicBool::new(false),
            executor: TxnExecutor::new(cfg.max_readers, cfg.reader_acquire_timeout()),
            signatures_db,
            path: cfg.path.clone(),
        })
    }

    /// Close the environment
    ///
    /// Returns `Ok(true)` if this call closed it and `Ok(false)` if it was
    /// already closed. Either way the environment has been released when this
    /// returns, including when another thread's close is still in progress.
    /// A failed flush is reported, but the environment is released regardless.
    pub fn close(&self) -> Result<bool> {
        if self.closed.swap(true, Ordering::SeqCst) {
            // The closing thread holds the write lock until the env is dropped
            drop(self.env.write());
            return Ok(false);
        }

        // Waits for in-flight transactions (they hold the shared lock)
        let mut slot = self.env.write();
        match slot.take() {
            Some(open) => {
                let flushed = open.env.sync(true);
                drop(open);
                flushed.map_err(StoreError::Close)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read_pool(&self) -> &ReadSlotPool {
        self.executor.read_pool()
    }

    /// Run `op` in one committed write transaction
    pub fn write<T, F>(&self, op: F) -> Result<(T, TxnStats)>
    where
        F: FnOnce(&mut LmdbWriteTxn<'_>) -> Result<T>,
    {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }
        let guard = self.env.read();
        let open = guard.as_ref().ok_or(StoreError::Closed)?;
        self.executor.write(&open.env, op)
    }

    /// Run `op` in one read transaction
    pub fn read<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&LmdbReadTxn<'_>) -> Result<T>,
    {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }
        let guard = self.env.read();
        let open = guard.as_ref().ok_or(StoreError::Closed)?;
        self.executor.read(&open.env, op)
    }

    /// Open or create the named database and check its signature
    ///
    /// The first bind records `requested`; later binds must be compatible with
    /// it. Returns the database and the signature now on record.
    pub fn bind_namespace(
        &self,
        name: &str,
        requested: &NamespaceSignature,
    ) -> Result<(Database, NamespaceSignature)> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }
        let guard = self.env.read();
        let open = guard.as_ref().ok_or(StoreError::Closed)?;

        let db = self
            .executor
            .exclusive(|| open.env.create_db(Some(name), DatabaseFlags::empty()))
            .map_err(|e| match e {
                lmdb::Error::DbsFull => StoreError::Ref(format!(
                    "cannot create namespace '{}': namespace limit reached",
                    name
                )),
                lmdb::Error::Incompatible => StoreError::Ref(format!(
                    "namespace '{}' exists with incompatible database flags",
                    name
                )),
                e => StoreError::Write(e),
            })?;

        let signatures_db = self.signatures_db;
        let (recorded, _) = self.executor.write(&open.env, |txn| {
            let stored = txn
                .get(signatures_db, name.as_bytes())?
                .map(NamespaceSignature::from_bytes)
                .transpose()?;

            let recorded = match stored {
                Some(stored) => {
                    stored.check(name, requested)?;
                    match stored.adopt_schema(requested) {
                        Some(tagged) => {
                            txn.put(signatures_db, name.as_bytes(), &tagged.to_bytes()?)?;
                            tagged
                        }
                        None => stored,
                    }
                }
                None => {
                    txn.put(signatures_db, name.as_bytes(), &requested.to_bytes()?)?;
                    requested.clone()
                }
            };
            Ok(recorded)
        })?;

        Ok((db, recorded))
    }

    /// Signature recorded for `name`, if it was ever bound
    pub fn signature(&self, name: &str) -> Result<Option<NamespaceSignature>> {
        let signatures_db = self.signatures_db;
        self.read(|txn| {
            txn.get(signatures_db, name.as_bytes())?
                .map(NamespaceSignature::from_bytes)
                .transpose()
        })
    }
}

impl Drop for LmdbEnv {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to close LMDB environment");
        }
    }
}
