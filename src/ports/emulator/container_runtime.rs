use async_trait::async_trait;

use crate::domain::errors::ProvisioningResult;

/// Lifecycle state of a named container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Missing,
    Stopped,
    Running,
}

/// Everything needed to create a container from scratch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    /// (host, container) port pairs
    pub ports: Vec<(u16, u16)>,
    pub env: Vec<(String, String)>,
    pub args: Vec<String>,
}

/// Port for the local container runtime
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Whether the runtime is installed and its daemon answers
    async fn is_available(&self) -> bool;

    async fn container_state(&self, name: &str) -> ProvisioningResult<ContainerState>;

    async fn start_container(&self, name: &str) -> ProvisioningResult<()>;

    async fn run_container(&self, spec: &ContainerSpec) -> ProvisioningResult<()>;

    async fn stop_container(&self, name: &str) -> ProvisioningResult<()>;
}
