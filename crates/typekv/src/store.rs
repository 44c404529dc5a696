//! Store client
//!
//! Owns the LMDB environment, applies the configuration, and keeps the
//! registry of namespaces bound in this process.

use crate::typed_ref::TypedRef;
use crate::{Codec, LogSink, NamespaceSignature, Result, StoreConfig, StoreError};
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Weak};
use typekv_lmdb::{Database, LmdbEnv};

/// Typed key/value store backed by one LMDB environment
///
/// Closing (explicitly or by dropping the `Store`) waits for in-flight
/// operations, then releases the environment. Every `TypedRef` bound to the
/// store fails with `StoreError::Closed` afterwards.
pub struct Store {
    shared: Arc<StoreShared>,
}

pub(crate) struct StoreShared {
    pub(crate) env: LmdbEnv,
    pub(crate) log: LogSink,
    config: StoreConfig,
    namespaces: Mutex<HashMap<String, BoundNamespace>>,
}

struct BoundNamespace {
    db: Database,
    signature: NamespaceSignature,
}

impl Store {
    /// Open a store at `path` with default configuration
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(StoreConfig::new(path.as_ref()))
    }

    pub fn open_with_config(config: StoreConfig) -> Result<Self> {
        let log = config.log_sink.clone();

        let env = match LmdbEnv::open(&config) {
            Ok(env) => env,
            Err(e) => {
                log.emit(|| {
                    tracing::error!(path = %config.path.display(), error = %e, "Failed to open store")
                });
                return Err(e);
            }
        };

        log.emit(|| {
            tracing::info!(
                path = %config.path.display(),
                max_readers = config.max_readers,
                max_namespaces = config.max_namespaces,
                "Store opened"
            )
        });

        Ok(Self {
            shared: Arc::new(StoreShared {
                env,
                log,
                config,
                namespaces: Mutex::new(HashMap::new()),
            }),
        })
    }

    /// Close the store
    ///
    /// Idempotent: closing a closed store returns `Ok(())`. If flushing the
    /// environment fails the error is returned, but the store is closed
    /// regardless.
    pub fn close(&self) -> Result<()> {
        let shared = &self.shared;
        let result = shared.env.close();
        match &result {
            Ok(false) => return Ok(()),
            Ok(true) => shared.log.emit(|| {
                tracing::info!(path = %shared.config.path.display(), "Store closed")
            }),
            Err(e) => shared.log.emit(|| {
                tracing::error!(
                    path = %shared.config.path.display(),
                    error = %e,
                    "Store closed with errors"
                )
            }),
        }
        shared.namespaces.lock().clear();
        result.map(|_| ())
    }

    /// Bind a namespace using the default codec
    pub fn bind<K, V>(&self, name: &str) -> Result<TypedRef<K, V>>
    where
        K: Serialize + ?Sized,
        V: Serialize + DeserializeOwned,
    {
        TypedRef::bind(name, self)
    }

    /// Bind a namespace using a specific codec
    pub fn bind_with_codec<K, V, C>(&self, name: &str, codec: C) -> Result<TypedRef<K, V, C>>
    where
        K: Serialize + ?Sized,
        V: Serialize + DeserializeOwned,
        C: Codec,
    {
        TypedRef::bind_with_codec(name, self, codec)
    }

    /// Bind a namespace under a stable schema tag such as `"user.v1"`
    ///
    /// See [`TypedRef::bind_with_schema`].
    pub fn bind_with_schema<K, V, C>(
        &self,
        name: &str,
        codec: C,
        schema: &str,
    ) -> Result<TypedRef<K, V, C>>
    where
        K: Serialize + ?Sized,
        V: Serialize + DeserializeOwned,
        C: Codec,
    {
        TypedRef::bind_with_schema(name, self, codec, schema)
    }

    pub fn is_closed(&self) -> bool {
        self.shared.env.is_closed()
    }

    pub fn path(&self) -> &Path {
        self.shared.env.path()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.shared.config
    }

    /// Names bound through this store since it was opened, sorted
    pub fn namespaces(&self) -> Vec<String> {
        let mut names: Vec<String> = self.shared.namespaces.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Reader slots not currently held by a read transaction
    pub fn available_reader_slots(&self) -> usize {
        self.shared.env.read_pool().available_permits()
    }

    /// Resolve `name` to its database, creating and signing it on first use
    ///
    /// The registry lock is held across the LMDB call so two threads binding
    /// the same new name cannot both record a signature.
    pub(crate) fn register(&self, name: &str, signature: &NamespaceSignature) -> Result<Database> {
        let mut namespaces = self.shared.namespaces.lock();
        if self.is_closed() {
            return Err(StoreError::Closed);
        }

        if let Some(bound) = namespaces.get(name) {
            bound.signature.check(name, signature)?;
            if bound.signature.adopt_schema(signature).is_none() {
                return Ok(bound.db);
            }
        }

        let (db, recorded) = self.shared.env.bind_namespace(name, signature)?;
        namespaces.insert(
            name.to_string(),
            BoundNamespace {
                db,
                signature: recorded,
            },
        );
        Ok(db)
    }

    pub(crate) fn shared(&self) -> &Arc<StoreShared> {
        &self.shared
    }

    pub(crate) fn downgrade(&self) -> Weak<StoreShared> {
        Arc::downgrade(&self.shared)
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        // Failures were already reported to the log sink
        let _ = self.close();
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.shared.config.path)
            .field("closed", &self.is_closed())
            .finish()
    }
}
