use chrono::{DateTime, Utc};

use crate::domain::{
    models::PolicyDocument,
    value_objects::{BucketName, ObjectKey},
};

/// Versioning status as reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersioningStatus {
    /// Versioning has never been enabled on the bucket
    #[default]
    Unversioned,
    Enabled,
    Suspended,
}

impl VersioningStatus {
    /// Map the `<Status>` value of a versioning configuration; absent means never enabled
    pub fn from_status(status: Option<&str>) -> Self {
        match status.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("enabled") => VersioningStatus::Enabled,
            Some(s) if s.eq_ignore_ascii_case("suspended") => VersioningStatus::Suspended,
            _ => VersioningStatus::Unversioned,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, VersioningStatus::Enabled)
    }
}

impl std::fmt::Display for VersioningStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VersioningStatus::Unversioned => write!(f, "unversioned"),
            VersioningStatus::Enabled => write!(f, "enabled"),
            VersioningStatus::Suspended => write!(f, "suspended"),
        }
    }
}

/// Observed configuration of a bucket, read fresh for each query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketState {
    pub exists: bool,
    pub versioning: VersioningStatus,
    pub policy: Option<PolicyDocument>,
}

impl BucketState {
    pub fn absent() -> Self {
        Self {
            exists: false,
            versioning: VersioningStatus::Unversioned,
            policy: None,
        }
    }
}

/// What `create_bucket` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateBucketOutcome {
    Created,
    /// The caller already owns a bucket with this name
    AlreadyOwned,
}

/// One entry of a bucket listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketSummary {
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Result of uploading a local file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectUpload {
    pub bucket: BucketName,
    pub key: ObjectKey,
    pub size: u64,
    pub etag: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versioning_status_mapping() {
        assert_eq!(VersioningStatus::from_status(None), VersioningStatus::Unversioned);
        assert_eq!(VersioningStatus::from_status(Some("")), VersioningStatus::Unversioned);
        assert_eq!(
            VersioningStatus::from_status(Some("Enabled")),
            VersioningStatus::Enabled
        );
        assert_eq!(
            VersioningStatus::from_status(Some("Suspended")),
            VersioningStatus::Suspended
        );
        assert!(VersioningStatus::Enabled.is_enabled());
        assert!(!VersioningStatus::Suspended.is_enabled());
    }
}
