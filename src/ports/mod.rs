pub mod emulator;
pub mod services;
pub mod storage;

// Re-export all port traits for convenience
pub use emulator::{ContainerRuntime, ContainerSpec, ContainerState};
pub use services::ProvisioningService;
pub use storage::BucketBackend;
