//! Cloud S3 backend built on the AWS SDK

pub mod s3_adapter;

pub use s3_adapter::{S3BucketBackend, S3Config};
