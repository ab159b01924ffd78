mod docker;

pub use docker::DockerCli;
