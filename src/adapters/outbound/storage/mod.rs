// Infrastructure error types
pub mod error;
pub mod integrity;

// Backend implementations
pub mod in_memory;
pub mod minio;
pub mod s3;

// Re-export key types
pub use error::StoreError;
pub use in_memory::{BackendOp, InMemoryBucketBackend};
pub use minio::MinioBucketBackend;
pub use s3::{S3BucketBackend, S3Config};
