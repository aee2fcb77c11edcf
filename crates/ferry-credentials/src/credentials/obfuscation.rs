//! Reversible password obfuscation.
//!
//! Hex encoding of the UTF-8 bytes. This keeps passwords from being
//! readable at a glance in the store file; it is not encryption.

use crate::credentials::error::{StoreError, StoreResult};

pub fn obfuscate(plain: &str) -> String {
    hex::encode(plain.as_bytes())
}

pub fn reveal(encoded: &str) -> StoreResult<String> {
    let bytes = hex::decode(encoded.trim())
        .map_err(|e| StoreError::encoding(format!("stored password is not hex: {}", e)))?;
    String::from_utf8(bytes).map_err(|_| StoreError::encoding("stored password is not UTF-8"))
}
