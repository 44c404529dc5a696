//! LMDB adapter for typekv
//!
//! Wraps one LMDB environment and exposes "run one operation atomically":
//! - Single-writer write transactions (serialized by a mutex)
//! - Read transactions gated by a reader-slot pool sized to `max_readers`
//! - Scoped transactions that abort on every error path
//! - Close that waits for in-flight transactions before releasing the environment

pub mod env;
pub mod executor;
pub mod keys;
pub mod read_pool;
pub mod txn;

pub use env::LmdbEnv;
pub use executor::TxnExecutor;
pub use lmdb::Database;
pub use read_pool::ReadSlotPool;
pub use txn::{LmdbReadTxn, LmdbWriteTxn};
