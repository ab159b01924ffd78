//! In-process bucket backend.
//!
//! Behaves like a single-region S3 endpoint: it tracks bucket ownership,
//! enforces the location constraint rules of its home region and records
//! every call. Failures can be injected per operation.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::{
    adapters::outbound::storage::integrity,
    domain::{
        errors::{ProvisioningError, ProvisioningResult},
        models::{
            BucketState, BucketSummary, CreateBucketOutcome, ObjectUpload, PolicyDocument,
            VersioningStatus,
        },
        value_objects::{BucketName, ObjectKey, Region},
    },
    ports::storage::BucketBackend,
};

const LOCAL_OWNER: &str = "local-owner";
const FOREIGN_OWNER: &str = "someone-else";

/// Backend operation, as recorded in the call log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendOp {
    BucketExists,
    CreateBucket,
    GetVersioning,
    SetVersioning,
    GetPolicy,
    SetPolicy,
    ListBuckets,
    PutObject,
}

#[derive(Debug, Clone)]
struct StoredBucket {
    owner: String,
    created_at: DateTime<Utc>,
    versioning: VersioningStatus,
    policy: Option<PolicyDocument>,
    objects: BTreeMap<String, Vec<u8>>,
}

impl StoredBucket {
    fn new(owner: &str) -> Self {
        Self {
            owner: owner.to_string(),
            created_at: Utc::now(),
            versioning: VersioningStatus::Unversioned,
            policy: None,
            objects: BTreeMap::new(),
        }
    }

    fn is_local(&self) -> bool {
        self.owner == LOCAL_OWNER
    }
}

#[derive(Debug, Default)]
struct State {
    buckets: BTreeMap<String, StoredBucket>,
    calls: Vec<BackendOp>,
    failures: HashMap<BackendOp, ProvisioningError>,
}

#[derive(Debug)]
pub struct InMemoryBucketBackend {
    home_region: Region,
    state: Mutex<State>,
}

impl Default for InMemoryBucketBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBucketBackend {
    /// Backend homed in the default region
    pub fn new() -> Self {
        Self::with_home_region(Region::default())
    }

    pub fn with_home_region(home_region: Region) -> Self {
        Self {
            home_region,
            state: Mutex::new(State::default()),
        }
    }

    /// Register a bucket name owned by a different principal
    pub async fn insert_foreign_bucket(&self, bucket: &BucketName) {
        self.state
            .lock()
            .await
            .buckets
            .insert(bucket.as_str().to_string(), StoredBucket::new(FOREIGN_OWNER));
    }

    /// Make every later call of `op` fail with `error`
    pub async fn fail_on(&self, op: BackendOp, error: ProvisioningError) {
        self.state.lock().await.failures.insert(op, error);
    }

    pub async fn clear_failures(&self) {
        self.state.lock().await.failures.clear();
    }

    /// Operations invoked so far, oldest first
    pub async fn calls(&self) -> Vec<BackendOp> {
        self.state.lock().await.calls.clone()
    }

    pub async fn clear_calls(&self) {
        self.state.lock().await.calls.clear();
    }

    /// Stored state of a bucket owned by the caller, bypassing the call log
    pub async fn snapshot(&self, bucket: &BucketName) -> BucketState {
        let state = self.state.lock().await;
        match state.buckets.get(bucket.as_str()).filter(|b| b.is_local()) {
            Some(stored) => BucketState {
                exists: true,
                versioning: stored.versioning,
                policy: stored.policy.clone(),
            },
            None => BucketState::absent(),
        }
    }

    pub async fn object(&self, bucket: &BucketName, key: &ObjectKey) -> Option<Vec<u8>> {
        let state = self.state.lock().await;
        state
            .buckets
            .get(bucket.as_str())
            .and_then(|b| b.objects.get(key.as_str()))
            .cloned()
    }

    /// Record the call and return the injected failure for it, if any
    fn enter(state: &mut State, op: BackendOp) -> ProvisioningResult<()> {
        state.calls.push(op);
        match state.failures.get(&op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn owned<'a>(
        state: &'a mut State,
        bucket: &BucketName,
    ) -> ProvisioningResult<&'a mut StoredBucket> {
        match state.buckets.get_mut(bucket.as_str()) {
            Some(stored) if stored.is_local() => Ok(stored),
            Some(_) => Err(ProvisioningError::AuthError {
                message: format!("Access denied to bucket {}", bucket),
            }),
            None => Err(ProvisioningError::BucketNotFound {
                bucket: bucket.as_str().to_string(),
            }),
        }
    }
}

#[async_trait]
impl BucketBackend for InMemoryBucketBackend {
    fn name(&self) -> &'static str {
        "in-memory"
    }

    async fn bucket_exists(&self, bucket: &BucketName) -> ProvisioningResult<bool> {
        let mut state = self.state.lock().await;
        Self::enter(&mut state, BackendOp::BucketExists)?;

        // A name held by another owner reads as absent, as it does after the 403 probe
        Ok(state
            .buckets
            .get(bucket.as_str())
            .is_some_and(StoredBucket::is_local))
    }

    async fn create_bucket(
        &self,
        bucket: &BucketName,
        region: Option<&Region>,
    ) -> ProvisioningResult<CreateBucketOutcome> {
        let mut state = self.state.lock().await;
        Self::enter(&mut state, BackendOp::CreateBucket)?;

        let requested = region.and_then(Region::location_constraint);
        if requested != self.home_region.location_constraint() {
            return Err(ProvisioningError::Backend {
                code: Some("IllegalLocationConstraintException".to_string()),
                message: format!(
                    "The {} location constraint is incompatible with the region {} endpoint",
                    requested.unwrap_or("unspecified"),
                    self.home_region
                ),
            });
        }

        match state.buckets.get(bucket.as_str()) {
            Some(stored) if stored.is_local() => Ok(CreateBucketOutcome::AlreadyOwned),
            Some(_) => Err(ProvisioningError::BucketConflict {
                bucket: bucket.as_str().to_string(),
            }),
            None => {
                state
                    .buckets
                    .insert(bucket.as_str().to_string(), StoredBucket::new(LOCAL_OWNER));
                Ok(CreateBucketOutcome::Created)
            }
        }
    }

    async fn get_versioning(&self, bucket: &BucketName) -> ProvisioningResult<VersioningStatus> {
        let mut state = self.state.lock().await;
        Self::enter(&mut state, BackendOp::GetVersioning)?;
        Ok(Self::owned(&mut state, bucket)?.versioning)
    }

    async fn set_versioning(&self, bucket: &BucketName, enabled: bool) -> ProvisioningResult<()> {
        let mut state = self.state.lock().await;
        Self::enter(&mut state, BackendOp::SetVersioning)?;

        let stored = Self::owned(&mut state, bucket)?;
        stored.versioning = match (enabled, stored.versioning) {
            (true, _) => VersioningStatus::Enabled,
            (false, VersioningStatus::Unversioned) => VersioningStatus::Unversioned,
            (false, _) => VersioningStatus::Suspended,
        };
        Ok(())
    }

    async fn get_policy(&self, bucket: &BucketName) -> ProvisioningResult<Option<PolicyDocument>> {
        let mut state = self.state.lock().await;
        Self::enter(&mut state, BackendOp::GetPolicy)?;
        Ok(Self::owned(&mut state, bucket)?.policy.clone())
    }

    async fn set_policy(
        &self,
        bucket: &BucketName,
        policy: Option<&PolicyDocument>,
    ) -> ProvisioningResult<()> {
        let mut state = self.state.lock().await;
        Self::enter(&mut state, BackendOp::SetPolicy)?;
        Self::owned(&mut state, bucket)?.policy = policy.cloned();
        Ok(())
    }

    async fn list_buckets(&self) -> ProvisioningResult<Vec<BucketSummary>> {
        let mut state = self.state.lock().await;
        Self::enter(&mut state, BackendOp::ListBuckets)?;

        Ok(state
            .buckets
            .iter()
            .filter(|(_, stored)| stored.is_local())
            .map(|(name, stored)| BucketSummary {
                name: name.clone(),
                created_at: Some(stored.created_at),
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

        let mut state = self.state.lock().await;
        Self::enter(&mut state, BackendOp::PutObject)?;

        let size = data.len() as u64;
        let etag = integrity::md5_hex(&data);
        Self::owned(&mut state, bucket)?
            .objects
            .insert(key.as_str().to_string(), data);

        Ok(ObjectUpload {
            bucket: bucket.clone(),
            key: key.clone(),
            size,
            etag: Some(etag),
        })
    }
}
