mod local_emulator;
mod provisioning_service_impl;

pub use local_emulator::{EmulatorSettings, EmulatorStatus, LocalEmulator, StopOutcome};
pub use provisioning_service_impl::ProvisioningServiceImpl;
