//! S3 REST client for MinIO and other S3-compatible servers

#[allow(clippy::module_inception)]
mod minio;
pub mod signing;
mod xml;

pub use minio::MinioBucketBackend;
