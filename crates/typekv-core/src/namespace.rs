//! Namespace naming rules and persisted signatures
//!
//! Every namespace records the codec it was created with and, optionally, a
//! caller-chosen schema tag. A later bind with another codec or another tag is
//! refused, so bytes written in one format are never handed to a decoder for
//! another.

use crate::codec::Codec;
use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};

/// Names with this prefix belong to the store itself
pub const RESERVED_PREFIX: &str = "__typekv";

/// Check that `name` can be used for a user namespace
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(StoreError::Ref("namespace name must not be empty".into()));
    }
    if name.starts_with(RESERVED_PREFIX) {
        return Err(StoreError::Ref(format!(
            "namespace name '{}' uses reserved prefix '{}'",
            name, RESERVED_PREFIX
        )));
    }
    if name.contains('\0') {
        return Err(StoreError::Ref(format!(
            "namespace name {:?} contains a NUL byte",
            name
        )));
    }
    Ok(())
}

/// What a namespace was created with, persisted next to its data
///
/// Compatibility is decided by the codec name and the optional schema tag.
/// The Rust type names are kept for error messages only: `type_name` output
/// is not stable across compiler versions or module moves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceSignature {
    pub codec: String,

    /// Caller-chosen tag such as `"user.v1"`
    #[serde(default)]
    pub schema: Option<String>,

    pub key_type: String,
    pub value_type: String,

    /// RFC 3339 timestamp of the first bind
    pub created_at: String,
}

impl NamespaceSignature {
    pub fn of<K: ?Sized, V: ?Sized, C: Codec>(codec: &C, schema: Option<&str>) -> Self {
        Self {
            codec: codec.name().to_string(),
            schema: schema.map(str::to_string),
            key_type: std::any::type_name::<K>().to_string(),
            value_type: std::any::type_name::<V>().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Same codec, and no conflicting schema tags
    ///
    /// A bind without a tag asserts nothing about the schema, so it is
    /// compatible with any tag.
    pub fn is_compatible(&self, requested: &NamespaceSignature) -> bool {
        if self.codec != requested.codec {
            return false;
        }
        match (&self.schema, &requested.schema) {
            (Some(recorded), Some(wanted)) => recorded == wanted,
            _ => true,
        }
    }

    /// Fail with `StoreError::Ref` unless `requested` is compatible
    pub fn check(&self, name: &str, requested: &NamespaceSignature) -> Result<()> {
        if self.is_compatible(requested) {
            return Ok(());
        }
        Err(StoreError::Ref(format!(
            "namespace '{}' was created with codec '{}' and schema {} (as <{}, {}>), \
             cannot bind with codec '{}' and schema {}",
            name,
            self.codec,
            describe_schema(&self.schema),
            self.key_type,
            self.value_type,
            requested.codec,
            describe_schema(&requested.schema)
        )))
    }

    /// The signature to record after a compatible bind
    ///
    /// Returns `Some` when `requested` carries a schema tag this signature
    /// lacks; the first tag given for a namespace is adopted.
    pub fn adopt_schema(&self, requested: &NamespaceSignature) -> Option<NamespaceSignature> {
        match (&self.schema, &requested.schema) {
            (None, Some(tag)) => Some(NamespaceSignature {
                schema: Some(tag.clone()),
                ..self.clone()
            }),
            _ => None,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| StoreError::Encode(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| StoreError::Decode(e.to_string()))
    }
}

fn describe_schema(schema: &Option<String>) -> String {
    match schema {
        Some(tag) => format!("'{}'", tag),
        None => "<untagged>".to_string(),
    }
}

/// Check a caller-supplied schema tag
pub fn validate_schema(schema: &str) -> Result<()> {
    if schema.trim().is_empty() {
        return Err(StoreError::Ref("schema tag must not be empty".into()));
    }
    Ok(())
}
