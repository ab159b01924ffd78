use std::path::Path;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    config::{http::HttpResponse, retry::RetryConfig, Credentials, Region as SdkRegion},
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    primitives::ByteStream,
    types::{
        BucketLocationConstraint, BucketVersioningStatus, CreateBucketConfiguration,
        ServerSideEncryption, VersioningConfiguration,
    },
    Client,
};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::{
    adapters::outbound::storage::{error::StoreError, integrity},
    domain::{
        errors::{ProvisioningError, ProvisioningResult},
        models::{BucketSummary, CreateBucketOutcome, ObjectUpload, PolicyDocument, VersioningStatus},
        value_objects::{BucketName, Credential, Endpoint, ObjectKey, Region},
    },
    ports::storage::BucketBackend,
};

/// Connection settings for an S3-compatible cloud endpoint
#[derive(Debug, Clone)]
pub struct S3Config {
    pub endpoint: Endpoint,
    pub credential: Credential,
    pub region: Region,
    pub path_style: bool,
}

/// Bucket backend built on the AWS SDK
#[derive(Clone, Debug)]
pub struct S3BucketBackend {
    client: Client,
}

impl S3BucketBackend {
    /// Build a client from explicit settings; the ambient AWS profile is not consulted
    /// for credentials or region.
    pub async fn connect(config: S3Config) -> Self {
        let credentials = Credentials::new(
            config.credential.access_key(),
            config.credential.secret_key(),
            None,
            None,
            "storage-setup",
        );

        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(SdkRegion::new(config.region.as_str().to_string()))
            .credentials_provider(credentials)
            .endpoint_url(config.endpoint.base_url())
            .retry_config(RetryConfig::disabled())
            .load()
            .await;

        let sdk_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.path_style)
            .build();

        debug!(endpoint = %config.endpoint, path_style = config.path_style, "Built S3 client");

        Self {
            client: Client::from_conf(sdk_config),
        }
    }

    /// Wrap an already configured SDK client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    async fn credentials_are_valid(&self) -> ProvisioningResult<bool> {
        match self.list_buckets().await {
            Ok(_) => Ok(true),
            Err(ProvisioningError::AuthError { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }
}

/// Flatten an SDK error into the adapter error type
fn to_store_error<E>(err: SdkError<E, HttpResponse>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    if matches!(err, SdkError::DispatchFailure(_) | SdkError::TimeoutError(_)) {
        return StoreError::Connection(DisplayErrorContext(&err).to_string());
    }

    match err.raw_response().map(|r| r.status().as_u16()) {
        Some(status) => StoreError::Service {
            status,
            code: err.code().map(str::to_string),
            message: err
                .message()
                .map(str::to_string)
                .unwrap_or_else(|| DisplayErrorContext(&err).to_string()),
        },
        None => StoreError::Other(DisplayErrorContext(&err).to_string()),
    }
}

fn to_chrono(date: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(date.secs(), date.subsec_nanos())
}

#[async_trait]
impl BucketBackend for S3BucketBackend {
    fn name(&self) -> &'static str {
        "s3"
    }

    async fn bucket_exists(&self, bucket: &BucketName) -> ProvisioningResult<bool> {
        match self.client.head_bucket().bucket(bucket.as_str()).send().await {
            Ok(_) => Ok(true),
            Err(err) => match to_store_error(err) {
                StoreError::Service { status: 404, .. } => Ok(false),
                StoreError::Service { status: 403, .. } => {
                    if self.credentials_are_valid().await? {
                        debug!(bucket = %bucket, "HEAD forbidden with valid credentials");
                        Ok(false)
                    } else {
                        Err(ProvisioningError::AuthError {
                            message: "Access denied".to_string(),
                        })
                    }
                }
                other => Err(other.into_provisioning_error(Some(bucket))),
            },
        }
    }

    async fn create_bucket(
        &self,
        bucket: &BucketName,
        region: Option<&Region>,
    ) -> ProvisioningResult<CreateBucketOutcome> {
        let mut request = self.client.create_bucket().bucket(bucket.as_str());

        if let Some(location) = region.and_then(Region::location_constraint) {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(location))
                    .build(),
            );
        }

        match request.send().await {
            Ok(_) => Ok(CreateBucketOutcome::Created),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_bucket_already_owned_by_you()) =>
            {
                Ok(CreateBucketOutcome::AlreadyOwned)
            }
            Err(err) => Err(to_store_error(err).into_provisioning_error(Some(bucket))),
        }
    }

    async fn get_versioning(&self, bucket: &BucketName) -> ProvisioningResult<VersioningStatus> {
        let output = self
            .client
            .get_bucket_versioning()
            .bucket(bucket.as_str())
            .send()
            .await
            .map_err(|e| to_store_error(e).into_provisioning_error(Some(bucket)))?;

        Ok(VersioningStatus::from_status(
            output.status().map(BucketVersioningStatus::as_str),
        ))
    }

    async fn set_versioning(&self, bucket: &BucketName, enabled: bool) -> ProvisioningResult<()> {
        let status = if enabled {
            BucketVersioningStatus::Enabled
        } else {
            BucketVersioningStatus::Suspended
        };

        self.client
            .put_bucket_versioning()
            .bucket(bucket.as_str())
            .versioning_configuration(VersioningConfiguration::builder().status(status).build())
            .send()
            .await
            .map_err(|e| to_store_error(e).into_provisioning_error(Some(bucket)))?;

        Ok(())
    }

    async fn get_policy(&self, bucket: &BucketName) -> ProvisioningResult<Option<PolicyDocument>> {
        let output = match self
            .client
            .get_bucket_policy()
            .bucket(bucket.as_str())
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) if err.code() == Some("NoSuchBucketPolicy") => return Ok(None),
            Err(err) => return Err(to_store_error(err).into_provisioning_error(Some(bucket))),
        };

        match output.policy() {
            Some(json) if !json.trim().is_empty() => Ok(Some(
                PolicyDocument::from_json(json).unwrap_or_else(|err| {
                    warn!(bucket = %bucket, error = %err, "Stored bucket policy has an unrecognized shape");
                    PolicyDocument::unrecognized()
                }),
            )),
            _ => Ok(None),
        }
    }

    async fn set_policy(
        &self,
        bucket: &BucketName,
        policy: Option<&PolicyDocument>,
    ) -> ProvisioningResult<()> {
        match policy {
            Some(policy) => {
                let json = policy.to_json().map_err(StoreError::from)?;
                self.client
                    .put_bucket_policy()
                    .bucket(bucket.as_str())
                    .policy(json)
                    .send()
                    .await
                    .map_err(|e| to_store_error(e).into_provisioning_error(Some(bucket)))?;
            }
            None => match self
                .client
                .delete_bucket_policy()
                .bucket(bucket.as_str())
                .send()
                .await
            {
                Ok(_) => {}
                Err(err) if err.code() == Some("NoSuchBucketPolicy") => {}
                Err(err) => return Err(to_store_error(err).into_provisioning_error(Some(bucket))),
            },
        }

        Ok(())
    }

    async fn list_buckets(&self) -> ProvisioningResult<Vec<BucketSummary>> {
        let output = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(to_store_error)?;

        Ok(output
            .buckets()
            .iter()
            .filter_map(|b| {
                Some(BucketSummary {
                    name: b.name()?.to_string(),
                    created_at: b.creation_date().and_then(to_chrono),
                })
            })
            .collect())
    }

    async fn put_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        path: &Path,
    ) -> ProvisioningResult<ObjectUpload> {
        let data = tokio::fs::read(path).await?;
        let size = data.len() as u64;
        let digest = integrity::md5_hex(&data);

        let output = self
            .client
            .put_object()
            .bucket(bucket.as_str())
            .key(key.as_str())
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| to_store_error(e).into_provisioning_error(Some(bucket)))?;

        let etag = output.e_tag().map(|e| e.trim_matches('"').to_string());
        if etag.is_none() {
            warn!(bucket = %bucket, key = %key, "Upload response carried no ETag");
        }
        integrity::verify_etag(
            &digest,
            etag.as_deref(),
            output.server_side_encryption().map(ServerSideEncryption::as_str),
        )?;

        Ok(ObjectUpload {
            bucket: bucket.clone(),
            key: key.clone(),
            size,
            etag,
        })
    }
}
