use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info};

use crate::{
    domain::{
        errors::{ProvisioningError, ProvisioningResult},
        value_objects::{Credential, Endpoint},
    },
    ports::emulator::{ContainerRuntime, ContainerSpec, ContainerState},
};

const HEALTH_TIMEOUT: Duration = Duration::from_secs(2);

/// How the emulator container is created and when it counts as ready
#[derive(Debug, Clone)]
pub struct EmulatorSettings {
    pub container_name: String,
    pub image: String,
    pub api_port: u16,
    pub console_port: u16,
    pub root_user: String,
    pub root_password: String,
    pub poll_interval: Duration,
    pub max_attempts: u32,
    /// Path polled until it answers 2xx
    pub health_path: String,
}

impl Default for EmulatorSettings {
    fn default() -> Self {
        Self {
            container_name: "basalt-minio".to_string(),
            image: "minio/minio".to_string(),
            api_port: 9000,
            console_port: 9001,
            root_user: "minioadmin".to_string(),
            root_password: "minioadmin".to_string(),
            poll_interval: Duration::from_millis(500),
            max_attempts: 60,
            health_path: "/minio/health/live".to_string(),
        }
    }
}

impl EmulatorSettings {
    /// Default settings with the root account taken from `credential`
    pub fn for_credential(credential: &Credential) -> Self {
        Self {
            root_user: credential.access_key().to_string(),
            root_password: credential.secret_key().to_string(),
            ..Self::default()
        }
    }

    pub fn container_spec(&self) -> ContainerSpec {
        ContainerSpec {
            name: self.container_name.clone(),
            image: self.image.clone(),
            ports: vec![
                (self.api_port, self.api_port),
                (self.console_port, self.console_port),
            ],
            env: vec![
                ("MINIO_ROOT_USER".to_string(), self.root_user.clone()),
                ("MINIO_ROOT_PASSWORD".to_string(), self.root_password.clone()),
            ],
            args: vec![
                "server".to_string(),
                "/data".to_string(),
                "--console-address".to_string(),
                format!(":{}", self.console_port),
            ],
        }
    }
}

/// What `ensure_running` had to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmulatorStatus {
    AlreadyRunning,
    /// An existing stopped container was started
    Started,
    /// A new container was created
    Created,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    NotRunning,
}

/// Manages the local MinIO container
#[derive(Clone)]
pub struct LocalEmulator {
    runtime: Arc<dyn ContainerRuntime>,
    settings: EmulatorSettings,
    http: Client,
}

impl LocalEmulator {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, settings: EmulatorSettings) -> Self {
        Self {
            runtime,
            settings,
            http: Client::new(),
        }
    }

    pub fn settings(&self) -> &EmulatorSettings {
        &self.settings
    }

    async fn require_runtime(&self) -> ProvisioningResult<()> {
        if self.runtime.is_available().await {
            Ok(())
        } else {
            Err(ProvisioningError::DependencyMissing {
                dependency: "docker".to_string(),
                message: "Docker is not installed or not running".to_string(),
            })
        }
    }

    /// Make sure the container runs and `endpoint` serves requests
    pub async fn ensure_running(&self, endpoint: &Endpoint) -> ProvisioningResult<EmulatorStatus> {
        self.require_runtime().await?;

        let name = &self.settings.container_name;
        let status = match self.runtime.container_state(name).await? {
            ContainerState::Running => EmulatorStatus::AlreadyRunning,
            ContainerState::Stopped => {
                info!(container = %name, "Starting existing emulator container");
                self.runtime.start_container(name).await?;
                EmulatorStatus::Started
            }
            ContainerState::Missing => {
                info!(container = %name, image = %self.settings.image, "Creating emulator container");
                self.runtime
                    .run_container(&self.settings.container_spec())
                    .await?;
                EmulatorStatus::Created
            }
        };

        self.wait_until_ready(endpoint).await?;
        Ok(status)
    }

    /// Poll the health endpoint until it answers 2xx.
    ///
    /// The published port accepts TCP connections before the server inside
    /// the container is up, so only an HTTP answer counts.
    pub async fn wait_until_ready(&self, endpoint: &Endpoint) -> ProvisioningResult<()> {
        let url = format!("{}{}", endpoint.base_url(), self.settings.health_path);

        for attempt in 1..=self.settings.max_attempts {
            let response = self
                .http
                .get(&url)
                .timeout(HEALTH_TIMEOUT)
                .send()
                .await;

            match response {
                Ok(response) if response.status().is_success() => {
                    debug!(%endpoint, attempt, "Emulator is serving requests");
                    return Ok(());
                }
                Ok(response) => {
                    debug!(%endpoint, attempt, status = %response.status(), "Emulator not ready yet");
                }
                Err(err) => {
                    debug!(%endpoint, attempt, error = %err, "Emulator not ready yet");
                }
            }
            tokio::time::sleep(self.settings.poll_interval).await;
        }

        Err(ProvisioningError::BackendUnavailable {
            message: format!(
                "{} did not become healthy after {} attempts",
                endpoint, self.settings.max_attempts
            ),
        })
    }

    pub async fn stop(&self) -> ProvisioningResult<StopOutcome> {
        self.require_runtime().await?;

        let name = &self.settings.container_name;
        match self.runtime.container_state(name).await? {
            ContainerState::Running => {
                self.runtime.stop_container(name).await?;
                info!(container = %name, "Stopped emulator container");
                Ok(StopOutcome::Stopped)
            }
            ContainerState::Stopped | ContainerState::Missing => Ok(StopOutcome::NotRunning),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use httpmock::prelude::*;
    use tokio::net::TcpListener;
    use tokio::sync::Mutex;

    struct FakeRuntime {
        available: bool,
        state: Mutex<ContainerState>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeRuntime {
        fn new(available: bool, state: ContainerState) -> Arc<Self> {
            Arc::new(Self {
                available,
                state: Mutex::new(state),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ContainerRuntime for FakeRuntime {
        async fn is_available(&self) -> bool {
            self.available
        }

        async fn container_state(&self, _name: &str) -> ProvisioningResult<ContainerState> {
            Ok(*self.state.lock().await)
        }

        async fn start_container(&self, name: &str) -> ProvisioningResult<()> {
            self.calls.lock().await.push(format!("start {}", name));
            *self.state.lock().await = ContainerState::Running;
            Ok(())
        }

        async fn run_container(&self, spec: &ContainerSpec) -> ProvisioningResult<()> {
            self.calls.lock().await.push(format!("run {}", spec.name));
            *self.state.lock().await = ContainerState::Running;
            Ok(())
        }

        async fn stop_container(&self, name: &str) -> ProvisioningResult<()> {
            self.calls.lock().await.push(format!("stop {}", name));
            *self.state.lock().await = ContainerState::Stopped;
            Ok(())
        }
    }

    fn fast_settings() -> EmulatorSettings {
        EmulatorSettings {
            poll_interval: Duration::from_millis(10),
            max_attempts: 3,
            ..EmulatorSettings::default()
        }
    }

    fn endpoint_of(server: &MockServer) -> Endpoint {
        Endpoint::parse(&server.base_url(), false).unwrap()
    }

    async fn healthy_endpoint() -> (MockServer, Endpoint) {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/minio/health/live");
                then.status(200);
            })
            .await;
        let endpoint = endpoint_of(&server);
        (server, endpoint)
    }

    #[tokio::test]
    async fn test_missing_container_is_created() {
        let runtime = FakeRuntime::new(true, ContainerState::Missing);
        let emulator = LocalEmulator::new(runtime.clone(), fast_settings());
        let (_server, endpoint) = healthy_endpoint().await;

        let status = emulator.ensure_running(&endpoint).await.unwrap();

        assert_eq!(status, EmulatorStatus::Created);
        assert_eq!(*runtime.calls.lock().await, vec!["run basalt-minio"]);
    }

    #[tokio::test]
    async fn test_stopped_container_is_started() {
        let runtime = FakeRuntime::new(true, ContainerState::Stopped);
        let emulator = LocalEmulator::new(runtime.clone(), fast_settings());
        let (_server, endpoint) = healthy_endpoint().await;

        assert_eq!(
            emulator.ensure_running(&endpoint).await.unwrap(),
            EmulatorStatus::Started
        );
        assert_eq!(*runtime.calls.lock().await, vec!["start basalt-minio"]);
    }

    #[tokio::test]
    async fn test_running_container_is_left_alone() {
        let runtime = FakeRuntime::new(true, ContainerState::Running);
        let emulator = LocalEmulator::new(runtime.clone(), fast_settings());
        let (_server, endpoint) = healthy_endpoint().await;

        assert_eq!(
            emulator.ensure_running(&endpoint).await.unwrap(),
            EmulatorStatus::AlreadyRunning
        );
        assert!(runtime.calls.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_runtime_is_dependency_missing() {
        let runtime = FakeRuntime::new(false, ContainerState::Missing);
        let emulator = LocalEmulator::new(runtime, fast_settings());

        let err = emulator.ensure_running(&Endpoint::local_default()).await.unwrap_err();
        assert_eq!(err.kind(), "DependencyMissing");
        assert_eq!(emulator.stop().await.unwrap_err().kind(), "DependencyMissing");
    }

    #[tokio::test]
    async fn test_endpoint_that_never_listens_is_unavailable() {
        let runtime = FakeRuntime::new(true, ContainerState::Running);
        let emulator = LocalEmulator::new(runtime, fast_settings());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let endpoint = Endpoint::parse(&format!("127.0.0.1:{}", port), false).unwrap();

        let err = emulator.ensure_running(&endpoint).await.unwrap_err();
        assert_eq!(err.kind(), "BackendUnavailable");
    }

    #[tokio::test]
    async fn test_open_port_that_never_turns_healthy_is_unavailable() {
        let server = MockServer::start_async().await;
        let health = server
            .mock_async(|when, then| {
                when.method(GET).path("/minio/health/live");
                then.status(503);
            })
            .await;
        let emulator = LocalEmulator::new(
            FakeRuntime::new(true, ContainerState::Running),
            fast_settings(),
        );

        let err = emulator
            .wait_until_ready(&endpoint_of(&server))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "BackendUnavailable");
        health.assert_hits_async(3).await;
    }

    #[tokio::test]
    async fn test_waits_until_health_check_passes() {
        let server = MockServer::start_async().await;
        let starting = server
            .mock_async(|when, then| {
                when.method(GET).path("/minio/health/live");
                then.status(503);
            })
            .await;
        let emulator = LocalEmulator::new(
            FakeRuntime::new(true, ContainerState::Running),
            EmulatorSettings {
                poll_interval: Duration::from_millis(20),
                max_attempts: 100,
                ..EmulatorSettings::default()
            },
        );
        let endpoint = endpoint_of(&server);

        let (ready, live) = tokio::join!(emulator.wait_until_ready(&endpoint), async {
            while starting.hits_async().await < 2 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            starting.delete_async().await;
            server
                .mock_async(|when, then| {
                    when.method(GET).path("/minio/health/live");
                    then.status(200);
                })
                .await
        });

        assert!(ready.is_ok());
        live.assert_async().await;
    }

    #[tokio::test]
    async fn test_stop_reports_not_running() {
        let runtime = FakeRuntime::new(true, ContainerState::Running);
        let emulator = LocalEmulator::new(runtime.clone(), fast_settings());

        assert_eq!(emulator.stop().await.unwrap(), StopOutcome::Stopped);
        assert_eq!(emulator.stop().await.unwrap(), StopOutcome::NotRunning);
    }

    #[test]
    fn test_container_spec_uses_credential() {
        let credential = Credential::new("admin", "supersecret").unwrap();
        let spec = EmulatorSettings::for_credential(&credential).container_spec();

        assert_eq!(spec.ports, vec![(9000, 9000), (9001, 9001)]);
        assert!(spec
            .env
            .contains(&("MINIO_ROOT_PASSWORD".to_string(), "supersecret".to_string())));
        assert_eq!(spec.args.last().map(String::as_str), Some(":9001"));
    }
}
