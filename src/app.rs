use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    adapters::outbound::{
        container::DockerCli,
        storage::{MinioBucketBackend, S3BucketBackend, S3Config},
    },
    domain::{
        errors::{ProvisioningError, ProvisioningResult},
        models::{BucketSpec, BucketSummary, ProvisioningReport},
        value_objects::{BucketName, Credential, Endpoint, ObjectKey, Region},
    },
    ports::{emulator::ContainerRuntime, services::ProvisioningService, storage::BucketBackend},
    services::{EmulatorSettings, EmulatorStatus, LocalEmulator, ProvisioningServiceImpl},
};

/// Where provisioning runs
#[derive(Debug, Clone)]
pub enum Target {
    /// Local emulator speaking the S3 REST API
    Local {
        endpoint: Endpoint,
        credential: Credential,
        /// Start the emulator container before provisioning
        manage_emulator: bool,
    },
    /// Cloud S3-compatible service
    Cloud {
        endpoint: Endpoint,
        credential: Credential,
        region: Region,
        path_style: bool,
    },
}

impl Target {
    pub fn endpoint(&self) -> &Endpoint {
        match self {
            Target::Local { endpoint, .. } | Target::Cloud { endpoint, .. } => endpoint,
        }
    }

    pub fn credential(&self) -> &Credential {
        match self {
            Target::Local { credential, .. } | Target::Cloud { credential, .. } => credential,
        }
    }
}

/// Application builder for dependency injection
#[derive(Default)]
pub struct AppBuilder {
    target: Option<Target>,
    backend: Option<Arc<dyn BucketBackend>>,
    runtime: Option<Arc<dyn ContainerRuntime>>,
    emulator_settings: Option<EmulatorSettings>,
}

impl AppBuilder {
    /// Create a new application builder
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    /// Use this backend instead of the one the target would select
    pub fn with_backend(mut self, backend: Arc<dyn BucketBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_container_runtime(mut self, runtime: Arc<dyn ContainerRuntime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn with_emulator_settings(mut self, settings: EmulatorSettings) -> Self {
        self.emulator_settings = Some(settings);
        self
    }

    /// Build the application
    pub async fn build(self) -> Result<App, AppError> {
        let backend = match (self.backend, &self.target) {
            (Some(backend), _) => backend,
            (None, Some(target)) => Self::create_backend(target).await?,
            (None, None) => {
                return Err(AppError::Configuration {
                    message: "either a target or a backend is required".to_string(),
                })
            }
        };

        let emulator = match &self.target {
            Some(Target::Local {
                endpoint,
                credential,
                manage_emulator: true,
            }) => {
                let runtime = self
                    .runtime
                    .unwrap_or_else(|| Arc::new(DockerCli::new()) as Arc<dyn ContainerRuntime>);
                let settings = self
                    .emulator_settings
                    .unwrap_or_else(|| EmulatorSettings::for_credential(credential));
                Some((LocalEmulator::new(runtime, settings), endpoint.clone()))
            }
            _ => None,
        };

        debug!(backend = backend.name(), managed_emulator = emulator.is_some(), "Built application");

        Ok(App {
            service: ProvisioningServiceImpl::new(backend),
            emulator,
        })
    }

    /// Resolve the backend variant for a target
    async fn create_backend(target: &Target) -> Result<Arc<dyn BucketBackend>, AppError> {
        match target {
            Target::Local {
                endpoint,
                credential,
                ..
            } => {
                let backend =
                    MinioBucketBackend::new(endpoint, credential.clone(), Region::default())
                        .map_err(|e| AppError::StorageInit {
                            message: e.to_string(),
                        })?;
                Ok(Arc::new(backend))
            }
            Target::Cloud {
                endpoint,
                credential,
                region,
                path_style,
            } => {
                let backend = S3BucketBackend::connect(S3Config {
                    endpoint: endpoint.clone(),
                    credential: credential.clone(),
                    region: region.clone(),
                    path_style: *path_style,
                })
                .await;
                Ok(Arc::new(backend))
            }
        }
    }
}

/// Wired application: one backend, the provisioning workflow and, for a
/// managed local target, the emulator.
pub struct App {
    service: ProvisioningServiceImpl,
    emulator: Option<(LocalEmulator, Endpoint)>,
}

impl App {
    pub fn backend_name(&self) -> &'static str {
        self.service.backend().name()
    }

    /// Start the local emulator if this app manages one
    pub async fn prepare(&self) -> Result<Option<EmulatorStatus>, AppError> {
        let Some((emulator, endpoint)) = &self.emulator else {
            return Ok(None);
        };

        let status = emulator
            .ensure_running(endpoint)
            .await
            .map_err(AppError::Emulator)?;
        info!(?status, %endpoint, "Local emulator ready");
        Ok(Some(status))
    }

    pub async fn provision(&self, spec: &BucketSpec) -> ProvisioningReport {
        self.service.provision(spec).await
    }

    /// Upload `path` into the report's bucket and record the result.
    ///
    /// Skipped when any provisioning step failed.
    pub async fn upload(&self, report: &mut ProvisioningReport, key: &ObjectKey, path: &Path) {
        if !report.succeeded() {
            debug!(bucket = %report.bucket(), "Skipping upload after failed provisioning");
            return;
        }

        let bucket: BucketName = report.bucket().clone();
        let result = self.service.upload(&bucket, key, path).await;
        report.push(result);
    }

    pub async fn list_buckets(&self) -> ProvisioningResult<Vec<BucketSummary>> {
        self.service.backend().list_buckets().await
    }
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Storage initialization error: {message}")]
    StorageInit { message: String },

    #[error("Local emulator error: {0}")]
    Emulator(ProvisioningError),
}

// Convenience functions for common configurations

/// Emulator handle for the default local container, driven through Docker
pub fn create_local_emulator() -> LocalEmulator {
    LocalEmulator::new(Arc::new(DockerCli::new()), EmulatorSettings::default())
}

/// Create an application against a local emulator
pub async fn create_local_app(
    endpoint: Endpoint,
    credential: Credential,
    manage_emulator: bool,
) -> Result<App, AppError> {
    AppBuilder::new()
        .with_target(Target::Local {
            endpoint,
            credential,
            manage_emulator,
        })
        .build()
        .await
}

/// Create an application against a cloud S3 endpoint
pub async fn create_cloud_app(
    endpoint: Endpoint,
    credential: Credential,
    region: Region,
    path_style: bool,
) -> Result<App, AppError> {
    AppBuilder::new()
        .with_target(Target::Cloud {
            endpoint,
            credential,
            region,
            path_style,
        })
        .build()
        .await
}
