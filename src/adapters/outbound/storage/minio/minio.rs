use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, Response, Url};
use tracing::{debug, warn};

use super::{signing, xml};
use crate::{
    adapters::outbound::storage::{error::StoreError, integrity},
    domain::{
        errors::{ProvisioningError, ProvisioningResult},
        models::{BucketSummary, CreateBucketOutcome, ObjectUpload, PolicyDocument, VersioningStatus},
        value_objects::{BucketName, Credential, Endpoint, ObjectKey, Region},
    },
    ports::storage::BucketBackend,
};

/// Bucket backend that talks the S3 REST API directly, with path-style
/// addressing and SigV4 request signing. Suited to MinIO and other
/// S3-compatible emulators.
pub struct MinioBucketBackend {
    client: Client,
    base_url: Url,
    credential: Credential,
    region: Region,
}

impl MinioBucketBackend {
    /// Create a new MinIO backend
    pub fn new(
        endpoint: &Endpoint,
        credential: Credential,
        region: Region,
    ) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| StoreError::Other(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = Url::parse(&endpoint.base_url())
            .map_err(|e| StoreError::Other(format!("Invalid endpoint {}: {}", endpoint, e)))?;

        Ok(Self {
            client,
            base_url,
            credential,
            region,
        })
    }

    fn bucket_path(bucket: &BucketName) -> String {
        format!("/{}", bucket.as_str())
    }

    fn object_path(bucket: &BucketName, key: &ObjectKey) -> String {
        let encoded: Vec<String> = key
            .segments()
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("/{}/{}", bucket.as_str(), encoded.join("/"))
    }

    /// Host header value as reqwest will send it
    fn host_header(url: &Url) -> String {
        let host = url.host_str().unwrap_or_default();
        match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }

    /// Sign and send one request. Non-2xx responses become `StoreError::Service`.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<Response, StoreError> {
        let mut url = self.base_url.clone();
        url.set_path(path);
        url.set_query(if query.is_empty() { None } else { Some(query) });

        let host = Self::host_header(&url);
        let signed = signing::sign(
            &signing::RequestToSign {
                method: method.as_str(),
                host: &host,
                path: url.path(),
                query,
                payload: &body,
            },
            &self.credential,
            &self.region,
            chrono::Utc::now(),
        );

        debug!(%method, %url, "Sending S3 request");

        let mut request = self
            .client
            .request(method, url)
            .header("x-amz-date", &signed.amz_date)
            .header("x-amz-content-sha256", &signed.content_sha256)
            .header("Authorization", &signed.authorization);
        if let Some(content_type) = content_type {
            request = request.header("Content-Type", content_type);
        }

        let response = request.body(body).send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() || e.is_request() {
                StoreError::Connection(e.to_string())
            } else {
                StoreError::Other(format!("Request failed: {}", e))
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let body = xml::parse_error(&text).unwrap_or_default();

        Err(StoreError::Service {
            status: status.as_u16(),
            code: body.code,
            message: body
                .message
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string()),
        })
    }

    async fn read_text(response: Response) -> Result<String, StoreError> {
        response
            .text()
            .await
            .map_err(|e| StoreError::Connection(format!("Failed to read response body: {}", e)))
    }

    /// Distinguish "the name is someone else's" from "our credentials are bad"
    /// after a HEAD answered 403 with no body.
    async fn credentials_are_valid(&self) -> ProvisioningResult<bool> {
        match self.list_buckets().await {
            Ok(_) => Ok(true),
            Err(ProvisioningError::AuthError { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl BucketBackend for MinioBucketBackend {
    fn name(&self) -> &'static str {
        "minio"
    }

    async fn bucket_exists(&self, bucket: &BucketName) -> ProvisioningResult<bool> {
        match self
            .execute(Method::HEAD, &Self::bucket_path(bucket), "", Vec::new(), None)
            .await
        {
            Ok(_) => Ok(true),
            Err(StoreError::Service { status: 404, .. }) => Ok(false),
            Err(StoreError::Service { status: 403, .. }) => {
                if self.credentials_are_valid().await? {
                    // The name exists but belongs to someone else
                    debug!(bucket = %bucket, "HEAD forbidden with valid credentials");
                    Ok(false)
                } else {
                    Err(ProvisioningError::AuthError {
                        message: "Access denied".to_string(),
                    })
                }
            }
            Err(err) => Err(err.into_provisioning_error(Some(bucket))),
        }
    }

    async fn create_bucket(
        &self,
        bucket: &BucketName,
        region: Option<&Region>,
    ) -> ProvisioningResult<CreateBucketOutcome> {
        let body = match region.and_then(Region::location_constraint) {
            Some(location) => xml::create_bucket_configuration(location)
                .map_err(|e| e.into_provisioning_error(Some(bucket)))?
                .into_bytes(),
            None => Vec::new(),
        };
        let content_type = (!body.is_empty()).then_some("application/xml");

        match self
            .execute(Method::PUT, &Self::bucket_path(bucket), "", body, content_type)
            .await
        {
            Ok(_) => Ok(CreateBucketOutcome::Created),
            Err(err) if err.code() == Some("BucketAlreadyOwnedByYou") => {
                Ok(CreateBucketOutcome::AlreadyOwned)
            }
            Err(err) => Err(err.into_provisioning_error(Some(bucket))),
        }
    }

    async fn get_versioning(&self, bucket: &BucketName) -> ProvisioningResult<VersioningStatus> {
        let response = self
            .execute(Method::GET, &Self::bucket_path(bucket), "versioning", Vec::new(), None)
            .await
            .map_err(|e| e.into_provisioning_error(Some(bucket)))?;

        let text = Self::read_text(response).await?;
        Ok(xml::parse_versioning(&text)?)
    }

    async fn set_versioning(&self, bucket: &BucketName, enabled: bool) -> ProvisioningResult<()> {
        let body = xml::versioning_configuration(enabled)?.into_bytes();

        self.execute(
            Method::PUT,
            &Self::bucket_path(bucket),
            "versioning",
            body,
            Some("application/xml"),
        )
        .await
        .map_err(|e| e.into_provisioning_error(Some(bucket)))?;

        Ok(())
    }

    async fn get_policy(&self, bucket: &BucketName) -> ProvisioningResult<Option<PolicyDocument>> {
        let response = match self
            .execute(Method::GET, &Self::bucket_path(bucket), "policy", Vec::new(), None)
            .await
        {
            Ok(response) => response,
            Err(err) if err.code() == Some("NoSuchBucketPolicy") => return Ok(None),
            Err(err) => return Err(err.into_provisioning_error(Some(bucket))),
        };

        let text = Self::read_text(response).await?;
        if text.trim().is_empty() {
            return Ok(None);
        }

        let policy = PolicyDocument::from_json(&text).unwrap_or_else(|err| {
            warn!(bucket = %bucket, error = %err, "Stored bucket policy has an unrecognized shape");
            PolicyDocument::unrecognized()
        });
        Ok(Some(policy))
    }

    async fn set_policy(
        &self,
        bucket: &BucketName,
        policy: Option<&PolicyDocument>,
    ) -> ProvisioningResult<()> {
        let path = Self::bucket_path(bucket);

        let result = match policy {
            Some(policy) => {
                let body = policy.to_json().map_err(StoreError::from)?.into_bytes();
                self.execute(Method::PUT, &path, "policy", body, Some("application/json"))
                    .await
            }
            None => self
                .execute(Method::DELETE, &path, "policy", Vec::new(), None)
                .await,
        };

        match result {
            Ok(_) => Ok(()),
            Err(err) if policy.is_none() && err.code() == Some("NoSuchBucketPolicy") => Ok(()),
            Err(err) => Err(err.into_provisioning_error(Some(bucket))),
        }
    }

    async fn list_buckets(&self) -> ProvisioningResult<Vec<BucketSummary>> {
        let response = self
            .execute(Method::GET, "/", "", Vec::new(), None)
            .await?;

        let text = Self::read_text(response).await?;
        Ok(xml::parse_list_buckets(&text)?)
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

        let response = self
            .execute(
                Method::PUT,
                &Self::object_path(bucket, key),
                "",
                data,
                Some("application/octet-stream"),
            )
            .await
            .map_err(|e| e.into_provisioning_error(Some(bucket)))?;

        let etag = response
            .headers()
            .get("ETag")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim_matches('"').to_string());

        if etag.is_none() {
            warn!(bucket = %bucket, key = %key, "Upload response carried no ETag");
        }
        let encryption = response
            .headers()
            .get("x-amz-server-side-encryption")
            .and_then(|v| v.to_str().ok());
        integrity::verify_etag(&digest, etag.as_deref(), encryption)?;

        Ok(ObjectUpload {
            bucket: bucket.clone(),
            key: key.clone(),
            size,
            etag,
        })
    }
}

impl std::fmt::Debug for MinioBucketBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MinioBucketBackend")
            .field("base_url", &self.base_url.as_str())
            .field("credential", &self.credential)
            .field("region", &self.region)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_path_encodes_each_segment() {
        let bucket = BucketName::new("test-bucket").unwrap();
        let key = ObjectKey::new("reports/2024 q1/summary+final.txt").unwrap();
        assert_eq!(
            MinioBucketBackend::object_path(&bucket, &key),
            "/test-bucket/reports/2024%20q1/summary%2Bfinal.txt"
        );
    }

    #[test]
    fn test_host_header_omits_default_port() {
        let url = Url::parse("http://localhost:80/bucket").unwrap();
        assert_eq!(MinioBucketBackend::host_header(&url), "localhost");

        let url = Url::parse("http://localhost:9000/bucket").unwrap();
        assert_eq!(MinioBucketBackend::host_header(&url), "localhost:9000");
    }
}
