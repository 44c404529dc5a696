use lmdb::{Database, RoTransaction, RwTransaction, Transaction, WriteFlags};
use tokio::sync::SemaphorePermit;
use typekv_core::{Result, StoreError};

/// Write transaction
///
/// LMDB aborts the inner transaction on drop unless it was committed, so an
/// early `?` never leaks a half-finished write.
pub struct LmdbWriteTxn<'a> {
    txn: RwTransaction<'a>,
    stats: TxnStats,
}

/// Counts of records touched by a write transaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxnStats {
    pub keys_written: usize,
    pub keys_deleted: usize,
}

/// Read-only transaction holding one reader slot
///
/// Sees the snapshot taken when it began. The slot goes back to the pool when
/// the transaction is dropped.
pub struct LmdbReadTxn<'a> {
    txn: RoTransaction<'a>,
    _permit: SemaphorePermit<'a>,
}

impl<'a> LmdbReadTxn<'a> {
    pub fn new(txn: RoTransaction<'a>, permit: SemaphorePermit<'a>) -> Self {
        Self {
            txn,
            _permit: permit,
        }
    }

    /// Get a value by key, borrowed from the snapshot
    pub fn get(&self, db: Database, key: &[u8]) -> Result<Option<&[u8]>> {
        match self.txn.get(db, &key) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(lmdb::Error::NotFound) => Ok(None),
            Err(e) => Err(StoreError::Read(e)),
        }
    }
}

impl<'a> LmdbWriteTxn<'a> {
    pub fn new(txn: RwTransaction<'a>) -> Self {
        Self {
            txn,
            stats: TxnStats::default(),
        }
    }

    /// Get a value by key, including writes made earlier in this transaction
    pub fn get(&self, db: Database, key: &[u8]) -> Result<Option<&[u8]>> {
        match self.txn.get(db, &key) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(lmdb::Error::NotFound) => Ok(None),
            Err(e) => Err(StoreError::Write(e)),
        }
    }

    /// Insert or overwrite a record
    pub fn put(&mut self, db: Database, key: &[u8], value: &[u8]) -> Result<()> {
        self.txn
            .put(db, &key, &value, WriteFlags::empty())
            .map_err(StoreError::Write)?;
        self.stats.keys_written += 1;
        Ok(())
    }

    /// Delete a record; returns whether it existed
    pub fn del(&mut self, db: Database, key: &[u8]) -> Result<bool> {
        match self.txn.del(db, &key, None) {
            Ok(()) => {
                self.stats.keys_deleted += 1;
                Ok(true)
            }
            Err(lmdb::Error::NotFound) => Ok(false),
            Err(e) => Err(StoreError::Write(e)),
        }
    }

    pub fn commit(self) -> Result<TxnStats> {
        self.txn.commit().map_err(StoreError::Write)?;
        Ok(self.stats)
    }

    pub fn abort(self) {
        self.txn.abort();
    }
}
