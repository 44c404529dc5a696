//! Transaction executor
//!
//! Runs one closure inside exactly one LMDB transaction:
//! - `write`: takes the writer mutex, begins a write transaction, commits on
//!   `Ok`, aborts on `Err`
//! - `read`: takes a reader slot, begins a read transaction, aborts when done
//!
//! Callers never hold a transaction between calls.

use lmdb::Environment;
use parking_lot::Mutex;
use std::time::Duration;
use typekv_core::{Result, StoreError};

use crate::read_pool::ReadSlotPool;
use crate::txn::{LmdbReadTxn, LmdbWriteTxn, TxnStats};

pub struct TxnExecutor {
    write_lock: Mutex<()>, // Single writer
    read_pool: ReadSlotPool,
}

impl TxnExecutor {
    pub fn new(max_readers: u32, reader_acquire_timeout: Option<Duration>) -> Self {
        Self {
            write_lock: Mutex::new(()),
            read_pool: ReadSlotPool::new(max_readers as usize, reader_acquire_timeout),
        }
    }

    /// Run `op` in a write transaction and commit it
    ///
    /// Blocks until no other write is in progress. If `op` or the commit
    /// fails, nothing it wrote becomes visible.
    pub fn write<T, F>(&self, env: &Environment, op: F) -> Result<(T, TxnStats)>
    where
        F: FnOnce(&mut LmdbWriteTxn<'_>) -> Result<T>,
    {
        let _writer = self.write_lock.lock();

        let txn = env.begin_rw_txn().map_err(StoreError::Write)?;
        let mut txn = LmdbWriteTxn::new(txn);

        match op(&mut txn) {
            Ok(value) => {
                let stats = txn.commit()?;
                Ok((value, stats))
            }
            Err(e) => {
                txn.abort();
                Err(e)
            }
        }
    }

    /// Run `op` against a read snapshot
    pub fn read<T, F>(&self, env: &Environment, op: F) -> Result<T>
    where
        F: FnOnce(&LmdbReadTxn<'_>) -> Result<T>,
    {
        let permit = self.read_pool.acquire_blocking()?;
        let txn = env.begin_ro_txn().map_err(StoreError::Read)?;
        let txn = LmdbReadTxn::new(txn, permit);
        op(&txn)
    }

    /// Hold the writer role without opening a transaction
    ///
    /// For LMDB calls that open their own internal write transaction, such as
    /// creating a named database.
    pub fn exclusive<T>(&self, op: impl FnOnce() -> T) -> T {
        let _writer = self.write_lock.lock();
        op()
    }

    pub fn read_pool(&self) -> &ReadSlotPool {
        &self.read_pool
    }
}
