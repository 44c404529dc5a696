//! Typed references
//!
//! A `TypedRef<K, V, C>` is a handle on one namespace. It encodes keys and
//! values with `C`, runs exactly one transaction per call, and decodes what it
//! reads back into `V`.
//!
//! # Example
//!
//! ```no_run
//! use typekv::prelude::*;
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Profile {
//!     name: String,
//!     age: u32,
//! }
//!
//! # fn main() -> Result<()> {
//! let store = Store::open("./data")?;
//! let profiles: TypedRef<String, Profile> = TypedRef::bind("profiles", &store)?;
//!
//! let profile = Profile { name: "Alice".into(), age: 30 };
//! profiles.put(&"alice".to_string(), &profile)?;
//! assert_eq!(profiles.get(&"alice".to_string())?, profile);
//!
//! match profiles.get(&"bob".to_string()) {
//!     Err(StoreError::NotFound) => {}
//!     other => panic!("unexpected: {:?}", other),
//! }
//! # Ok(())
//! # }
//! ```

use crate::store::{Store, StoreShared};
use crate::{BincodeCodec, Codec, NamespaceSignature, Result, StoreError};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Weak};
use std::time::Instant;
use typekv_core::{
    namespace::{validate_name, validate_schema},
    observe,
};
use typekv_lmdb::{keys::check_key, Database};

/// Handle on one namespace of a [`Store`]
///
/// Holds only a weak pointer to the store. Once the store is closed or
/// dropped, every operation fails with `StoreError::Closed` without touching
/// LMDB.
pub struct TypedRef<K: ?Sized, V, C = BincodeCodec> {
    name: Arc<str>,
    store: Weak<StoreShared>,
    db: Database,
    codec: C,
    _types: PhantomData<fn(&K) -> V>,
}

impl<K, V, C> TypedRef<K, V, C>
where
    K: Serialize + ?Sized,
    V: Serialize + DeserializeOwned,
    C: Codec,
{
    /// Bind `name` on `store`, creating the namespace if it does not exist
    ///
    /// Fails with `StoreError::Ref` if the name is empty or reserved, or if the
    /// namespace was created with a different codec.
    pub fn bind(name: &str, store: &Store) -> Result<Self>
    where
        C: Default,
    {
        Self::bind_with_codec(name, store, C::default())
    }

    pub fn bind_with_codec(name: &str, store: &Store, codec: C) -> Result<Self> {
        Self::bind_signed(name, store, codec, None)
    }

    /// Bind under a caller-chosen schema tag such as `"user.v1"`
    ///
    /// Without a tag, a namespace only pins its codec. The first tag given for
    /// a namespace is recorded, and later binds with a different tag fail with
    /// `StoreError::Ref`. Bump the tag when the stored types change shape.
    pub fn bind_with_schema(name: &str, store: &Store, codec: C, schema: &str) -> Result<Self> {
        validate_schema(schema)?;
        Self::bind_signed(name, store, codec, Some(schema))
    }

    fn bind_signed(name: &str, store: &Store, codec: C, schema: Option<&str>) -> Result<Self> {
        let signature = NamespaceSignature::of::<K, V, C>(&codec, schema);
        let log = &store.shared().log;

        let db = validate_name(name)
            .and_then(|()| store.register(name, &signature))
            .map_err(|e| {
                log.emit(|| tracing::warn!(namespace = name, error = %e, "Failed to bind namespace"));
                e
            })?;

        log.emit(|| {
            tracing::debug!(
                namespace = name,
                codec = codec.name(),
                schema = schema.unwrap_or("<untagged>"),
                key_type = %signature.key_type,
                value_type = %signature.value_type,
                "Namespace bound"
            )
        });

        Ok(Self {
            name: Arc::from(name),
            store: store.downgrade(),
            db,
            codec,
            _types: PhantomData,
        })
    }

    /// Store `value` under `key`, replacing any previous value
    pub fn put(&self, key: &K, value: &V) -> Result<()> {
        let shared = self.shared()?;
        let key = self.encode_key(key)?;
        let value = self.codec.encode(value)?;

        let started = Instant::now();
        let result = shared
            .env
            .write(|txn| txn.put(self.db, &key, &value))
            .map(|_| ());
        observe::record_put(started.elapsed(), result.is_ok());

        self.report(&shared, "Put failed", result)
    }

    /// Load the value stored under `key`
    ///
    /// Fails with `StoreError::NotFound` if there is none, and with
    /// `StoreError::Decode` if the stored bytes are not a valid `V`.
    pub fn get(&self, key: &K) -> Result<V> {
        self.try_get(key)?.ok_or(StoreError::NotFound)
    }

    /// Like [`get`](Self::get), with absence as `None`
    pub fn try_get(&self, key: &K) -> Result<Option<V>> {
        let shared = self.shared()?;
        let key = self.encode_key(key)?;

        let started = Instant::now();
        let result = shared.env.read(|txn| match txn.get(self.db, &key)? {
            Some(bytes) => self.decode(bytes).map(Some),
            None => Ok(None),
        });
        let outcome = match &result {
            Ok(Some(_)) => "hit",
            Ok(None) => "miss",
            Err(_) => "fail",
        };
        observe::record_get(started.elapsed(), outcome);

        self.report(&shared, "Get failed", result)
    }

    pub fn contains(&self, key: &K) -> Result<bool> {
        let shared = self.shared()?;
        let key = self.encode_key(key)?;
        let result = shared.env.read(|txn| Ok(txn.get(self.db, &key)?.is_some()));
        self.report(&shared, "Contains failed", result)
    }

    /// Remove the value under `key`; returns whether one existed
    pub fn delete(&self, key: &K) -> Result<bool> {
        let shared = self.shared()?;
        let key = self.encode_key(key)?;
        let result = shared
            .env
            .write(|txn| txn.del(self.db, &key))
            .map(|(existed, _)| existed);
        self.report(&shared, "Delete failed", result)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// False once the owning store is closed
    pub fn is_open(&self) -> bool {
        self.shared().is_ok()
    }

    fn shared(&self) -> Result<Arc<StoreShared>> {
        self.store
            .upgrade()
            .filter(|shared| !shared.env.is_closed())
            .ok_or(StoreError::Closed)
    }

    fn encode_key(&self, key: &K) -> Result<Vec<u8>> {
        let bytes = self.codec.encode(key)?;
        check_key(&bytes)?;
        Ok(bytes)
    }

    fn decode(&self, bytes: &[u8]) -> Result<V> {
        self.codec.decode(bytes).map_err(|e| match e {
            StoreError::Decode(reason) => {
                StoreError::Decode(format!("namespace '{}': {}", self.name, reason))
            }
            other => other,
        })
    }

    fn report<T>(&self, shared: &StoreShared, message: &str, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if !e.is_closed() {
                shared.log.emit(|| {
                    tracing::warn!(namespace = %self.name, error = %e, "{}", message)
                });
            }
        }
        result
    }
}

impl<K: ?Sized, V, C: Clone> Clone for TypedRef<K, V, C> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            store: Weak::clone(&self.store),
            db: self.db,
            codec: self.codec.clone(),
            _types: PhantomData,
        }
    }
}

impl<K: ?Sized, V, C> fmt::Debug for TypedRef<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedRef")
            .field("name", &self.name)
            .field("key_type", &std::any::type_name::<K>())
            .field("value_type", &std::any::type_name::<V>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{JsonCodec, StoreConfig, SyncMode};
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn open_store() -> (TempDir, Store) {
        let temp_dir = tempfile::tempdir().unwrap();
        let store =
            Store::open_with_config(StoreConfig::new(temp_dir.path()).with_sync_mode(SyncMode::NoSync))
                .unwrap();
        (temp_dir, store)
    }

    #[test]
    fn test_put_get_string() {
        let (_temp, store) = open_store();
        let r: TypedRef<String, String> = TypedRef::bind("test_ref", &store).unwrap();

        r.put(&"hello".to_string(), &"world".to_string()).unwrap();
        assert_eq!(r.get(&"hello".to_string()).unwrap(), "world");
    }

    #[test]
    fn test_unsized_str_keys() {
        let (_temp, store) = open_store();
        let r = store.bind::<str, u64>("by_name").unwrap();

        r.put("alice", &7).unwrap();
        assert_eq!(r.get("alice").unwrap(), 7);
        assert!(r.contains("alice").unwrap());
        assert!(!r.contains("bob").unwrap());
    }

    #[test]
    fn test_delete() {
        let (_temp, store) = open_store();
        let r = store.bind::<u64, String>("items").unwrap();

        r.put(&1, &"one".to_string()).unwrap();
        assert!(r.delete(&1).unwrap());
        assert!(!r.delete(&1).unwrap());
        assert!(r.get(&1).unwrap_err().is_not_found());
        assert!(r.try_get(&1).unwrap().is_none());
    }

    #[test]
    fn test_empty_key_encoding_rejected() {
        let (_temp, store) = open_store();
        let r = store.bind::<(), u64>("unit_keys").unwrap();

        assert!(matches!(r.put(&(), &1), Err(StoreError::Encode(_))));
        assert!(matches!(r.get(&()), Err(StoreError::Encode(_))));
    }

    #[test]
    fn test_oversized_key_rejected() {
        let (_temp, store) = open_store();
        let r = store.bind::<String, u64>("long_keys").unwrap();

        let key = "k".repeat(600);
        assert!(matches!(r.put(&key, &1), Err(StoreError::Encode(_))));
    }

    #[test]
    fn test_json_codec() {
        let (_temp, store) = open_store();
        let r = store
            .bind_with_codec::<String, Vec<u32>, _>("json_values", JsonCodec)
            .unwrap();

        r.put(&"primes".to_string(), &vec![2, 3, 5, 7]).unwrap();
        assert_eq!(r.get(&"primes".to_string()).unwrap(), vec![2, 3, 5, 7]);

        let err = store.bind::<String, Vec<u32>>("json_values").unwrap_err();
        assert!(matches!(err, StoreError::Ref(_)));
    }

    #[test]
    fn test_unencodable_value_rejected() {
        let (_temp, store) = open_store();
        let r = store
            .bind_with_codec::<u64, HashMap<(u8, u8), u8>, _>("pairs", JsonCodec)
            .unwrap();

        let mut value = HashMap::new();
        value.insert((1, 2), 3);
        assert!(matches!(r.put(&1, &value), Err(StoreError::Encode(_))));
        assert!(r.try_get(&1).unwrap().is_none());
    }

    #[test]
    fn test_owned_and_borrowed_key_types_share_namespace() {
        let (_temp, store) = open_store();
        let owned = store.bind::<String, u64>("names").unwrap();
        owned.put(&"alice".to_string(), &7).unwrap();

        let borrowed = store.bind::<str, u64>("names").unwrap();
        assert_eq!(borrowed.get("alice").unwrap(), 7);
    }

    #[test]
    fn test_schema_tag_conflict() {
        let (_temp, store) = open_store();
        let v1 = store
            .bind_with_schema::<u64, String, _>("users", BincodeCodec, "user.v1")
            .unwrap();
        v1.put(&1, &"alice".to_string()).unwrap();

        let err = store
            .bind_with_schema::<u64, Vec<u8>, _>("users", BincodeCodec, "user.v2")
            .unwrap_err();
        assert!(matches!(err, StoreError::Ref(_)));

        // An untagged bind does not assert a schema
        let untagged = store.bind::<u64, String>("users").unwrap();
        assert_eq!(untagged.get(&1).unwrap(), "alice");

        assert!(matches!(
            store.bind_with_schema::<u64, String, _>("users", BincodeCodec, ""),
            Err(StoreError::Ref(_))
        ));
    }

    #[test]
    fn test_clone_shares_namespace() {
        let (_temp, store) = open_store();
        let r = store.bind::<u64, u64>("counters").unwrap();
        let copy = r.clone();

        r.put(&1, &10).unwrap();
        assert_eq!(copy.get(&1).unwrap(), 10);
        assert_eq!(copy.name(), "counters");
    }
}
