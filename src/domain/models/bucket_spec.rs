use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::domain::{
    errors::ProvisioningError,
    value_objects::{BucketName, Region},
};

/// Access policy a bucket should end up with
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyChoice {
    /// No bucket policy at all
    #[default]
    Private,
    /// Anonymous GetObject
    PublicRead,
    /// Anonymous GetObject, PutObject and DeleteObject
    PublicReadWrite,
}

impl PolicyChoice {
    pub const ALL: [PolicyChoice; 3] = [
        PolicyChoice::Private,
        PolicyChoice::PublicRead,
        PolicyChoice::PublicReadWrite,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyChoice::Private => "private",
            PolicyChoice::PublicRead => "public-read",
            PolicyChoice::PublicReadWrite => "public-read-write",
        }
    }
}

impl std::fmt::Display for PolicyChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PolicyChoice {
    type Err = ProvisioningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PolicyChoice::ALL
            .into_iter()
            .find(|choice| choice.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ProvisioningError::InvalidPolicyChoice {
                value: s.to_string(),
            })
    }
}

/// Desired state for one bucket
///
/// `policy: None` leaves the bucket policy untouched for this invocation.
/// `versioning: false` never disables versioning that is already on.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct BucketSpec {
    name: BucketName,
    #[builder(default)]
    versioning: bool,
    policy: Option<PolicyChoice>,
    region: Option<Region>,
}

impl BucketSpec {
    pub fn name(&self) -> &BucketName {
        &self.name
    }

    pub fn versioning(&self) -> bool {
        self.versioning
    }

    pub fn policy(&self) -> Option<PolicyChoice> {
        self.policy
    }

    pub fn region(&self) -> Option<&Region> {
        self.region.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_choice_parsing() {
        assert_eq!("private".parse::<PolicyChoice>().unwrap(), PolicyChoice::Private);
        assert_eq!(
            "Public-Read".parse::<PolicyChoice>().unwrap(),
            PolicyChoice::PublicRead
        );
        assert_eq!(
            "public-read-write".parse::<PolicyChoice>().unwrap(),
            PolicyChoice::PublicReadWrite
        );
    }

    #[test]
    fn test_unknown_policy_choice_is_rejected() {
        let err = "world-writable".parse::<PolicyChoice>().unwrap_err();
        assert_eq!(
            err,
            ProvisioningError::InvalidPolicyChoice {
                value: "world-writable".to_string()
            }
        );
    }

    #[test]
    fn test_builder_defaults() {
        let spec = BucketSpec::builder()
            .name(BucketName::new("test-bucket").unwrap())
            .build();

        assert!(!spec.versioning());
        assert_eq!(spec.policy(), None);
        assert_eq!(spec.region(), None);
    }

    #[test]
    fn test_builder_with_everything() {
        let spec = BucketSpec::builder()
            .name(BucketName::new("test-bucket").unwrap())
            .versioning(true)
            .policy(PolicyChoice::PublicRead)
            .maybe_region(Some(Region::new("eu-west-1").unwrap()))
            .build();

        assert!(spec.versioning());
        assert_eq!(spec.policy(), Some(PolicyChoice::PublicRead));
        assert_eq!(spec.region().map(Region::as_str), Some("eu-west-1"));
    }
}
