pub mod adapters;
pub mod app;
pub mod domain;
pub mod ports;
pub mod services;

// Re-export key types for convenience

// Domain types - core business entities and value objects
pub use domain::{
    // Value objects
    BucketName,
    // Models
    BucketSpec,
    BucketSummary,
    Credential,
    Endpoint,
    ObjectKey,
    OperationKind,
    OperationResult,
    Outcome,
    PolicyChoice,
    PolicyDocument,
    // Errors
    ProvisioningError,
    ProvisioningReport,
    ProvisioningResult,
    Region,
    ValidationError,
};

// Port types - interfaces for external systems
pub use ports::{BucketBackend, ContainerRuntime, ProvisioningService};

// Service implementations - business logic
pub use services::{EmulatorSettings, LocalEmulator, ProvisioningServiceImpl};

// Application factory and configuration
pub use app::{
    App, AppBuilder, AppError, Target, create_cloud_app, create_local_app, create_local_emulator,
};

// Adapter types - infrastructure implementations
pub use adapters::outbound::{
    container::DockerCli,
    storage::{InMemoryBucketBackend, MinioBucketBackend, S3BucketBackend},
};

// Public facade for easy construction
pub mod prelude {
    pub use crate::{
        AppBuilder, BucketBackend, BucketName, BucketSpec, InMemoryBucketBackend, PolicyChoice,
        ProvisioningService, ProvisioningServiceImpl, Target, create_cloud_app, create_local_app,
    };
}
