//! typekv core: shared types for the typed LMDB store
//!
//! This crate holds the pieces every layer of typekv agrees on:
//! - Error taxonomy ([`StoreError`]) and the crate-wide [`Result`] alias
//! - Store configuration ([`StoreConfig`], [`SyncMode`]) and the [`LogSink`]
//! - The [`Codec`] trait with bincode and JSON implementations
//! - Namespace naming rules and the persisted [`NamespaceSignature`]
//! - Optional metrics hooks ([`observe`])

pub mod codec;
pub mod config;
pub mod error;
pub mod log;
pub mod namespace;
pub mod observe;

pub use codec::{BincodeCodec, Codec, JsonCodec};
pub use config::{StoreConfig, SyncMode};
pub use error::{Result, StoreError};
pub use log::LogSink;
pub use namespace::{validate_name, validate_schema, NamespaceSignature, RESERVED_PREFIX};
