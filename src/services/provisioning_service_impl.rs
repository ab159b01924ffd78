use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::{
    domain::{
        errors::ProvisioningResult,
        models::{
            BucketSpec, CreateBucketOutcome, OperationKind, OperationResult, PolicyChoice,
            PolicyDocument, ProvisioningReport,
        },
        value_objects::{BucketName, ObjectKey, Region},
    },
    ports::{services::ProvisioningService, storage::BucketBackend},
};

/// Whether a step changed backend state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    Applied,
    Unchanged,
}

/// Implementation of the provisioning workflow over a single backend
#[derive(Clone)]
pub struct ProvisioningServiceImpl {
    backend: Arc<dyn BucketBackend>,
}

impl ProvisioningServiceImpl {
    pub fn new(backend: Arc<dyn BucketBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn BucketBackend> {
        &self.backend
    }

    async fn ensure_bucket(
        &self,
        bucket: &BucketName,
        region: Option<&Region>,
    ) -> ProvisioningResult<Change> {
        if self.backend.bucket_exists(bucket).await? {
            return Ok(Change::Unchanged);
        }

        match self.backend.create_bucket(bucket, region).await? {
            CreateBucketOutcome::Created => Ok(Change::Applied),
            // Created by someone using our credentials between the check and the create
            CreateBucketOutcome::AlreadyOwned => Ok(Change::Unchanged),
        }
    }

    async fn ensure_versioning(&self, bucket: &BucketName) -> ProvisioningResult<Change> {
        if self.backend.get_versioning(bucket).await?.is_enabled() {
            return Ok(Change::Unchanged);
        }

        self.backend.set_versioning(bucket, true).await?;
        Ok(Change::Applied)
    }

    async fn ensure_policy(
        &self,
        bucket: &BucketName,
        choice: PolicyChoice,
    ) -> ProvisioningResult<Change> {
        let desired = PolicyDocument::for_choice(choice, bucket);
        let current = self.backend.get_policy(bucket).await?;

        let satisfied = match (&desired, &current) {
            (None, None) => true,
            (Some(desired), Some(current)) => desired.is_equivalent(current),
            _ => false,
        };
        if satisfied {
            return Ok(Change::Unchanged);
        }

        self.backend.set_policy(bucket, desired.as_ref()).await?;
        Ok(Change::Applied)
    }

    fn record(
        &self,
        bucket: &BucketName,
        kind: OperationKind,
        result: ProvisioningResult<Change>,
    ) -> OperationResult {
        match result {
            Ok(Change::Applied) => {
                info!(bucket = %bucket, step = %kind, backend = self.backend.name(), "Applied");
                OperationResult::applied(kind)
            }
            Ok(Change::Unchanged) => {
                debug!(bucket = %bucket, step = %kind, "Already satisfied");
                OperationResult::already_satisfied(kind)
            }
            Err(err) => {
                warn!(bucket = %bucket, step = %kind, error = %err, "Step failed");
                OperationResult::failed(kind, err)
            }
        }
    }
}

#[async_trait]
impl ProvisioningService for ProvisioningServiceImpl {
    async fn provision(&self, spec: &BucketSpec) -> ProvisioningReport {
        let bucket = spec.name();
        let mut report = ProvisioningReport::new(bucket.clone());

        let ensured = self.ensure_bucket(bucket, spec.region()).await;
        let ensured = self.record(bucket, OperationKind::EnsureBucket, ensured);
        let bucket_failed = ensured.is_failure();
        report.push(ensured);
        if bucket_failed {
            return report;
        }

        if spec.versioning() {
            let result = self.ensure_versioning(bucket).await;
            report.push(self.record(bucket, OperationKind::EnsureVersioning, result));
        }

        if let Some(choice) = spec.policy() {
            let result = self.ensure_policy(bucket, choice).await;
            report.push(self.record(bucket, OperationKind::EnsurePolicy, result));
        }

        report
    }

    async fn upload(&self, bucket: &BucketName, key: &ObjectKey, path: &Path) -> OperationResult {
        let result = self
            .backend
            .put_object(bucket, key, path)
            .await
            .map(|upload| {
                debug!(bucket = %bucket, key = %key, size = upload.size, "Uploaded object");
                Change::Applied
            });

        self.record(bucket, OperationKind::UploadObject, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapters::outbound::storage::{BackendOp, InMemoryBucketBackend},
        domain::{errors::ProvisioningError, models::Outcome},
    };

    fn spec(policy: Option<PolicyChoice>) -> BucketSpec {
        BucketSpec::builder()
            .name(BucketName::new("test-bucket").unwrap())
            .versioning(true)
            .maybe_policy(policy)
            .build()
    }

    #[tokio::test]
    async fn test_fresh_backend_applies_every_step() {
        let backend = Arc::new(InMemoryBucketBackend::new());
        let service = ProvisioningServiceImpl::new(backend.clone());

        let report = service.provision(&spec(Some(PolicyChoice::PublicRead))).await;

        assert_eq!(
            report.outcomes(),
            vec![&Outcome::Applied, &Outcome::Applied, &Outcome::Applied]
        );
        let state = backend.snapshot(&BucketName::new("test-bucket").unwrap()).await;
        assert!(state.versioning.is_enabled());
        assert!(state.policy.is_some());
    }

    #[tokio::test]
    async fn test_private_on_fresh_bucket_is_already_satisfied() {
        let backend = Arc::new(InMemoryBucketBackend::new());
        let service = ProvisioningServiceImpl::new(backend.clone());

        let report = service.provision(&spec(Some(PolicyChoice::Private))).await;

        assert_eq!(
            report.get(OperationKind::EnsurePolicy).map(|r| &r.outcome),
            Some(&Outcome::AlreadySatisfied)
        );
        assert!(!backend.calls().await.contains(&BackendOp::SetPolicy));
    }

    #[tokio::test]
    async fn test_private_removes_existing_policy() {
        let backend = Arc::new(InMemoryBucketBackend::new());
        let service = ProvisioningServiceImpl::new(backend.clone());
        service.provision(&spec(Some(PolicyChoice::PublicReadWrite))).await;

        let report = service.provision(&spec(Some(PolicyChoice::Private))).await;

        assert_eq!(
            report.get(OperationKind::EnsurePolicy).map(|r| &r.outcome),
            Some(&Outcome::Applied)
        );
        let state = backend.snapshot(&BucketName::new("test-bucket").unwrap()).await;
        assert_eq!(state.policy, None);
    }

    #[tokio::test]
    async fn test_versioning_failure_does_not_stop_policy_step() {
        let backend = Arc::new(InMemoryBucketBackend::new());
        backend
            .fail_on(
                BackendOp::SetVersioning,
                ProvisioningError::AuthError {
                    message: "denied".to_string(),
                },
            )
            .await;
        let service = ProvisioningServiceImpl::new(backend.clone());

        let report = service.provision(&spec(Some(PolicyChoice::PublicRead))).await;

        assert_eq!(report.results().len(), 3);
        assert!(report.get(OperationKind::EnsureVersioning).unwrap().is_failure());
        assert_eq!(
            report.get(OperationKind::EnsurePolicy).map(|r| &r.outcome),
            Some(&Outcome::Applied)
        );
        assert_eq!(report.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_no_versioning_and_no_policy_runs_only_bucket_step() {
        let backend = Arc::new(InMemoryBucketBackend::new());
        let service = ProvisioningServiceImpl::new(backend);

        let spec = BucketSpec::builder()
            .name(BucketName::new("test-bucket").unwrap())
            .build();
        let report = service.provision(&spec).await;

        assert_eq!(report.results().len(), 1);
        assert_eq!(report.results()[0].kind, OperationKind::EnsureBucket);
    }

    #[tokio::test]
    async fn test_upload_appends_result() {
        let backend = Arc::new(InMemoryBucketBackend::new());
        let service = ProvisioningServiceImpl::new(backend.clone());
        service.provision(&spec(None)).await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        std::fs::write(&path, b"hello").unwrap();

        let bucket = BucketName::new("test-bucket").unwrap();
        let key = ObjectKey::new("hello.txt").unwrap();
        let result = service.upload(&bucket, &key, &path).await;

        assert_eq!(result.outcome, Outcome::Applied);
        assert_eq!(backend.object(&bucket, &key).await, Some(b"hello".to_vec()));
    }

    #[tokio::test]
    async fn test_upload_of_missing_file_fails() {
        let backend = Arc::new(InMemoryBucketBackend::new());
        let service = ProvisioningServiceImpl::new(backend);
        service.provision(&spec(None)).await;

        let result = service
            .upload(
                &BucketName::new("test-bucket").unwrap(),
                &ObjectKey::new("missing.txt").unwrap(),
                Path::new("/definitely/not/here.txt"),
            )
            .await;

        assert_eq!(result.error().map(ProvisioningError::kind), Some("Io"));
    }
}
