mod bucket_name;
mod credential;
mod endpoint;
mod object_key;
mod region;

pub use bucket_name::BucketName;
pub use credential::Credential;
pub use endpoint::{DEFAULT_LOCAL_ENDPOINT, Endpoint};
pub use object_key::ObjectKey;
pub use region::{DEFAULT_REGION, Region};
