mod bucket_backend;

pub use bucket_backend::BucketBackend;
