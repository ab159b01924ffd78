use std::io::ErrorKind;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::{
    domain::errors::{ProvisioningError, ProvisioningResult},
    ports::emulator::{ContainerRuntime, ContainerSpec, ContainerState},
};

/// Container runtime backed by the `docker` command line client
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: String,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new()
    }
}

impl DockerCli {
    pub fn new() -> Self {
        Self::with_program("docker")
    }

    /// Use a different executable, e.g. `podman`
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn missing(&self, message: impl Into<String>) -> ProvisioningError {
        ProvisioningError::DependencyMissing {
            dependency: self.program.clone(),
            message: message.into(),
        }
    }

    /// Run the client and return its stdout; a non-zero exit is an error
    async fn run(&self, args: &[String]) -> ProvisioningResult<String> {
        debug!(program = %self.program, ?args, "Running container command");

        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => self.missing(format!("{} is not installed", self.program)),
                _ => ProvisioningError::from(e),
            })?;

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }

        Err(ProvisioningError::Backend {
            code: Some(self.program.clone()),
            message: format!(
                "`{} {}` failed: {}",
                self.program,
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        })
    }
}

/// Arguments for `docker run` that create and start `spec` detached
pub fn run_args(spec: &ContainerSpec) -> Vec<String> {
    let mut args = vec![
        "run".to_string(),
        "-d".to_string(),
        "--name".to_string(),
        spec.name.clone(),
    ];

    for (host, container) in &spec.ports {
        args.push("-p".to_string());
        args.push(format!("{}:{}", host, container));
    }
    for (key, value) in &spec.env {
        args.push("-e".to_string());
        args.push(format!("{}={}", key, value));
    }

    args.push(spec.image.clone());
    args.extend(spec.args.iter().cloned());
    args
}

/// Read the state of `name` from `docker ps -a --format '{{.Names}}\t{{.State}}'` output
pub fn parse_state(output: &str, name: &str) -> ContainerState {
    output
        .lines()
        .filter_map(|line| line.split_once('\t'))
        .find(|(names, _)| names.split(',').any(|n| n.trim() == name))
        .map(|(_, state)| {
            if state.trim().eq_ignore_ascii_case("running") {
                ContainerState::Running
            } else {
                ContainerState::Stopped
            }
        })
        .unwrap_or(ContainerState::Missing)
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn is_available(&self) -> bool {
        self.run(&["ps".to_string(), "-q".to_string()]).await.is_ok()
    }

    async fn container_state(&self, name: &str) -> ProvisioningResult<ContainerState> {
        let output = self
            .run(&[
                "ps".to_string(),
                "-a".to_string(),
                "--filter".to_string(),
                format!("name={}", name),
                "--format".to_string(),
                "{{.Names}}\t{{.State}}".to_string(),
            ])
            .await?;

        Ok(parse_state(&output, name))
    }

    async fn start_container(&self, name: &str) -> ProvisioningResult<()> {
        self.run(&["start".to_string(), name.to_string()]).await?;
        Ok(())
    }

    async fn run_container(&self, spec: &ContainerSpec) -> ProvisioningResult<()> {
        self.run(&run_args(spec)).await?;
        Ok(())
    }

    async fn stop_container(&self, name: &str) -> ProvisioningResult<()> {
        self.run(&["stop".to_string(), name.to_string()]).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_args_layout() {
        let spec = ContainerSpec {
            name: "basalt-minio".to_string(),
            image: "minio/minio".to_string(),
            ports: vec![(9000, 9000), (9001, 9001)],
            env: vec![
                ("MINIO_ROOT_USER".to_string(), "minioadmin".to_string()),
                ("MINIO_ROOT_PASSWORD".to_string(), "minioadmin".to_string()),
            ],
            args: vec![
                "server".to_string(),
                "/data".to_string(),
                "--console-address".to_string(),
                ":9001".to_string(),
            ],
        };

        assert_eq!(
            run_args(&spec).join(" "),
            "run -d --name basalt-minio -p 9000:9000 -p 9001:9001 \
             -e MINIO_ROOT_USER=minioadmin -e MINIO_ROOT_PASSWORD=minioadmin \
             minio/minio server /data --console-address :9001"
        );
    }

    #[test]
    fn test_parse_state() {
        let output = "basalt-minio-old\trunning\nbasalt-minio\texited\n";
        assert_eq!(parse_state(output, "basalt-minio"), ContainerState::Stopped);
        assert_eq!(parse_state(output, "basalt-minio-old"), ContainerState::Running);
        assert_eq!(parse_state(output, "other"), ContainerState::Missing);
        assert_eq!(parse_state("", "basalt-minio"), ContainerState::Missing);
    }

    #[tokio::test]
    async fn test_missing_program_is_dependency_missing() {
        let cli = DockerCli::with_program("definitely-not-a-container-runtime");
        assert!(!cli.is_available().await);

        let err = cli.stop_container("anything").await.unwrap_err();
        assert_eq!(err.kind(), "DependencyMissing");
    }
}
