//! typekv prelude
//!
//! ```
//! use typekv::prelude::*;
//! ```

pub use crate::{
    BincodeCodec, Codec, JsonCodec, LogSink, Result, Store, StoreConfig, StoreError, SyncMode,
    TypedRef,
};

pub use serde::{Deserialize, Serialize};
pub use std::sync::Arc;
