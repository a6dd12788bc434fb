//! Record encoding.
//!
//! Records are bincode-encoded. Every persisted type avoids
//! `skip_serializing_if`, which bincode cannot decode.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::store::{StorageError, StorageResult};

/// Encode a record.
pub fn encode<T: Serialize>(value: &T) -> StorageResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| StorageError::Codec {
        reason: e.to_string(),
    })
}

/// Decode a record.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StorageResult<T> {
    bincode::deserialize(bytes).map_err(|e| StorageError::Codec {
        reason: e.to_string(),
    })
}
