use std::path::Path;

use async_trait::async_trait;

use crate::domain::{
    errors::ProvisioningResult,
    models::{
        BucketState, BucketSummary, CreateBucketOutcome, ObjectUpload, PolicyDocument,
        VersioningStatus,
    },
    value_objects::{BucketName, ObjectKey, Region},
};

/// Port for bucket control-plane operations
/// This abstracts the concrete backend (local emulator, cloud S3, ...)
#[async_trait]
pub trait BucketBackend: Send + Sync + 'static {
    /// Short label for logs and reports
    fn name(&self) -> &'static str;

    /// Check if a bucket exists; "not found" is `Ok(false)`, never an error
    async fn bucket_exists(&self, bucket: &BucketName) -> ProvisioningResult<bool>;

    /// Create a bucket; a bucket the caller already owns is `AlreadyOwned`, not an error
    async fn create_bucket(
        &self,
        bucket: &BucketName,
        region: Option<&Region>,
    ) -> ProvisioningResult<CreateBucketOutcome>;

    /// Read the versioning status
    async fn get_versioning(&self, bucket: &BucketName) -> ProvisioningResult<VersioningStatus>;

    /// Enable or suspend versioning
    async fn set_versioning(&self, bucket: &BucketName, enabled: bool) -> ProvisioningResult<()>;

    /// Read the bucket policy; no policy is `Ok(None)`
    async fn get_policy(&self, bucket: &BucketName) -> ProvisioningResult<Option<PolicyDocument>>;

    /// Attach a policy, or remove the policy entirely when `None`
    async fn set_policy(
        &self,
        bucket: &BucketName,
        policy: Option<&PolicyDocument>,
    ) -> ProvisioningResult<()>;

    /// Snapshot of all buckets visible to the caller, in no particular order
    async fn list_buckets(&self) -> ProvisioningResult<Vec<BucketSummary>>;

    /// Upload a local file as a single object
    async fn put_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        path: &Path,
    ) -> ProvisioningResult<ObjectUpload>;

    /// Read the full observed state of a bucket
    async fn observe_state(&self, bucket: &BucketName) -> ProvisioningResult<BucketState> {
        if !self.bucket_exists(bucket).await? {
            return Ok(BucketState::absent());
        }

        Ok(BucketState {
            exists: true,
            versioning: self.get_versioning(bucket).await?,
            policy: self.get_policy(bucket).await?,
        })
    }
}
