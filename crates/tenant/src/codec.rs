//! JSON encoding of stored bucket records.
//!
//! Unknown fields are ignored on decode and absent optional fields take
//! their defaults, so records written by newer versions remain readable.
//! The id and organization are required: a record missing either is
//! corrupt.

use crate::{
    bucket::Bucket,
    error::{Result, TenantError},
};

/// Encodes a bucket for the primary table.
///
/// # Errors
///
/// Returns [`TenantError::UnprocessableBucket`] if serialization fails,
/// including for a bucket whose id is unset.
pub fn encode_bucket(bucket: &Bucket) -> Result<Vec<u8>> {
    serde_json::to_vec(bucket).map_err(TenantError::unprocessable)
}

/// Decodes a bucket read from the primary table.
///
/// # Errors
///
/// Returns [`TenantError::CorruptBucket`] if the bytes are not a valid record.
pub fn decode_bucket(bytes: &[u8]) -> Result<Bucket> {
    serde_json::from_slice(bytes).map_err(|e| {
        tracing::warn!(error = %e, len = bytes.len(), "stored bucket failed to decode");
        TenantError::corrupt(e)
    })
}
