use std::path::Path;

use async_trait::async_trait;

use crate::domain::{
    models::{BucketSpec, OperationResult, ProvisioningReport},
    value_objects::{BucketName, ObjectKey},
};

/// Service port for idempotent bucket provisioning
#[async_trait]
pub trait ProvisioningService: Send + Sync + 'static {
    /// Bring the bucket to the desired state, one reported result per step.
    ///
    /// Never returns an error: failures are recorded in the report.
    async fn provision(&self, spec: &BucketSpec) -> ProvisioningReport;

    /// Upload a local file into a provisioned bucket
    async fn upload(&self, bucket: &BucketName, key: &ObjectKey, path: &Path) -> OperationResult;
}
