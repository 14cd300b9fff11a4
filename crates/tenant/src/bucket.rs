//! Bucket model and the well-known system buckets.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::Id;

/// Name of the system bucket holding task logs.
pub const TASKS_SYSTEM_BUCKET_NAME: &str = "_tasks";
/// Reserved id of the task log system bucket.
pub const TASKS_SYSTEM_BUCKET_ID: Id = Id::new(10);
/// Retention of the task log system bucket.
pub const TASKS_SYSTEM_BUCKET_RETENTION: Duration = Duration::from_secs(3 * 24 * 60 * 60);

/// Name of the system bucket holding monitoring logs.
pub const MONITORING_SYSTEM_BUCKET_NAME: &str = "_monitoring";
/// Reserved id of the monitoring system bucket.
pub const MONITORING_SYSTEM_BUCKET_ID: Id = Id::new(11);
/// Retention of the monitoring system bucket.
pub const MONITORING_SYSTEM_BUCKET_RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Kind of bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketType {
    /// Created and managed by users.
    #[default]
    User,
    /// Owned by the system; its name cannot change.
    System,
}

/// A named, organization-scoped data container.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use tenantdb_tenant::{Bucket, BucketType, Id};
///
/// let bucket = Bucket::builder()
///     .org_id(Id::new(1))
///     .name("metrics")
///     .retention_period(Duration::from_secs(3600))
///     .build();
///
/// assert!(!bucket.id.is_valid());
/// assert_eq!(bucket.bucket_type, BucketType::User);
/// assert!(bucket.created_at.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    /// Assigned by the store when left invalid; immutable afterwards.
    /// Required in stored records.
    #[builder(default)]
    pub id: Id,

    /// Owning organization; immutable after creation.
    #[serde(rename = "orgID")]
    pub org_id: Id,

    /// Bucket kind.
    #[serde(rename = "type", default)]
    #[builder(default)]
    pub bucket_type: BucketType,

    /// Name, unique within the organization.
    #[builder(into)]
    pub name: String,

    /// Free-form description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    #[builder(into, default)]
    pub description: String,

    /// How long data is kept; zero means forever.
    #[serde(with = "humantime_serde", default)]
    #[builder(default)]
    pub retention_period: Duration,

    /// Set by the store on create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Set by the store on every create and update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Bucket {
    /// Returns `true` for system buckets.
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.bucket_type == BucketType::System
    }
}

/// Partial update applied by [`update_bucket`](crate::BucketStorage::update_bucket).
///
/// Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BucketUpdate {
    /// New name; a change moves the bucket's index entry.
    #[builder(into)]
    #[serde(default)]
    pub name: Option<String>,

    /// New description.
    #[builder(into)]
    #[serde(default)]
    pub description: Option<String>,

    /// New retention period.
    #[serde(with = "humantime_serde", default)]
    pub retention_period: Option<Duration>,
}

/// Fixed definition of a well-known system bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemBucket {
    /// Reserved name.
    pub name: &'static str,
    /// Reserved id shared by every organization.
    pub id: Id,
    /// Fixed retention period.
    pub retention_period: Duration,
    /// Fixed description.
    pub description: &'static str,
}

/// The well-known system buckets, synthesized on lookup and never stored.
pub const SYSTEM_BUCKETS: [SystemBucket; 2] = [
    SystemBucket {
        name: TASKS_SYSTEM_BUCKET_NAME,
        id: TASKS_SYSTEM_BUCKET_ID,
        retention_period: TASKS_SYSTEM_BUCKET_RETENTION,
        description: "System bucket for task logs",
    },
    SystemBucket {
        name: MONITORING_SYSTEM_BUCKET_NAME,
        id: MONITORING_SYSTEM_BUCKET_ID,
        retention_period: MONITORING_SYSTEM_BUCKET_RETENTION,
        description: "System bucket for monitoring logs",
    },
];

impl SystemBucket {
    /// Looks up a system bucket by its reserved name.
    #[must_use]
    pub fn by_name(name: &str) -> Option<&'static SystemBucket> {
        SYSTEM_BUCKETS.iter().find(|b| b.name == name)
    }

    /// Materializes this definition for `org_id`. No timestamps are set.
    #[must_use]
    pub fn for_org(&self, org_id: Id) -> Bucket {
        Bucket {
            id: self.id,
            org_id,
            bucket_type: BucketType::System,
            name: self.name.to_owned(),
            description: self.description.to_owned(),
            retention_period: self.retention_period,
            created_at: None,
            updated_at: None,
        }
    }
}
