//! Key builders for the primary and index tables.
//!
//! The primary table is keyed by the encoded bucket id. The index table is
//! keyed by the encoded organization id followed by the raw name bytes, so
//! all of an organization's buckets share a fixed-width prefix and sort by
//! name under it.

use crate::{
    error::Result,
    id::{ID_LENGTH, Id},
};

/// Key of a bucket record in the primary table.
///
/// # Errors
///
/// Returns [`TenantError::InvalidId`](crate::TenantError::InvalidId) for the zero id.
pub fn primary_key(id: Id) -> Result<[u8; ID_LENGTH]> {
    id.encode()
}

/// Key of a bucket's entry in the index table.
///
/// # Errors
///
/// Returns [`TenantError::InvalidId`](crate::TenantError::InvalidId) for the zero org id.
pub fn index_key(org_id: Id, name: &str) -> Result<Vec<u8>> {
    let org = org_id.encode()?;
    let mut key = Vec::with_capacity(ID_LENGTH + name.len());
    key.extend_from_slice(&org);
    key.extend_from_slice(name.as_bytes());
    Ok(key)
}

/// Prefix shared by every index key of `org_id`.
///
/// # Errors
///
/// Returns [`TenantError::InvalidId`](crate::TenantError::InvalidId) for the zero org id.
pub fn org_prefix(org_id: Id) -> Result<Vec<u8>> {
    index_key(org_id, "")
}
