mod container_runtime;

pub use container_runtime::{ContainerRuntime, ContainerSpec, ContainerState};
