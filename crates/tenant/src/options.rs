//! Filter and pagination options for listing buckets.

use serde::{Deserialize, Serialize};

use crate::id::Id;

/// Pagination and ordering of a list call.
///
/// A `limit` of zero, or one above the store's maximum page size, is clamped
/// to the maximum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
#[serde(default, deny_unknown_fields)]
pub struct FindOptions {
    /// Largest number of buckets returned.
    #[builder(default)]
    pub limit: usize,

    /// Number of matching entries skipped before collection starts.
    #[builder(default)]
    pub offset: usize,

    /// Scan in reverse key order.
    #[builder(default)]
    pub descending: bool,
}

/// Which buckets a list call returns.
///
/// `name` and `organization_id` are mutually exclusive: a name within an
/// organization is a point lookup, served by
/// [`get_bucket_by_name`](crate::BucketStorage::get_bucket_by_name).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketFilter {
    /// Exact bucket name to match across all organizations.
    pub name: Option<String>,

    /// Restricts the listing to one organization, ordered by name.
    pub organization_id: Option<Id>,
}

impl BucketFilter {
    /// Matches every bucket.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Matches buckets with exactly this name, in any organization.
    #[must_use]
    pub fn by_name(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), organization_id: None }
    }

    /// Matches the buckets of one organization.
    #[must_use]
    pub fn by_organization(org_id: Id) -> Self {
        Self { name: None, organization_id: Some(org_id) }
    }
}
