//! typekv: strongly-typed key/value storage on LMDB
//!
//! Store and load any `serde` type under named namespaces inside a single
//! LMDB environment, without writing serialization or transaction code.
//!
//! - **Store**: owns the environment and its lifecycle
//! - **TypedRef**: a `<K, V>` handle bound to one namespace; every `put`/`get`
//!   is one atomic transaction
//! - **Codec**: bincode by default, JSON on request
//!
//! # Quick Start
//!
//! ```no_run
//! use typekv::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let store = Store::open("./data")?;
//! let users = store.bind::<u64, String>("users")?;
//!
//! users.put(&1, &"alice".to_string())?;
//! assert_eq!(users.get(&1)?, "alice");
//!
//! store.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Concurrency
//!
//! `Store` and `TypedRef` are `Send + Sync`. Writes are serialized (one write
//! transaction at a time), reads run against snapshots and never block on the
//! writer. When all `max_readers` slots are busy, a read waits for one to free
//! up, or fails with `StoreError::ReaderLimit` if
//! `StoreConfig::with_reader_acquire_timeout` was set.

pub mod prelude;
pub mod store;
pub mod typed_ref;

// Re-export core types
pub use typekv_core::{
    codec::{BincodeCodec, Codec, JsonCodec},
    config::{StoreConfig, SyncMode},
    error::{Result, StoreError},
    log::LogSink,
    namespace::NamespaceSignature,
};

pub use store::Store;
pub use typed_ref::TypedRef;
