use typekv_core::{Result, StoreError};

/// Internal namespace holding one signature per user namespace
pub const SIGNATURES_DB: &str = "__typekv_signatures";

/// LMDB's compiled-in key size limit (MDB_MAXKEYSIZE)
pub const MAX_KEY_SIZE: usize = 511;

/// Reject encoded keys LMDB would refuse
pub fn check_key(key: &[u8]) -> Result<()> {
    if key.is_empty() {
        return Err(StoreError::Encode("encoded key is empty".into()));
    }
    if key.len() > MAX_KEY_SIZE {
        return Err(StoreError::Encode(format!(
            "encoded key is {} bytes, limit is {}",
            key.len(),
            MAX_KEY_SIZE
        )));
    }
    Ok(())
}
