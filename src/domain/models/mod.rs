pub mod bucket_spec;
pub mod bucket_state;
pub mod operation;
pub mod policy;

pub use bucket_spec::{BucketSpec, PolicyChoice};
pub use bucket_state::{
    BucketState, BucketSummary, CreateBucketOutcome, ObjectUpload, VersioningStatus,
};
pub use operation::{OperationKind, OperationResult, Outcome, ProvisioningReport};
pub use policy::{Effect, POLICY_VERSION, PolicyDocument, PolicyStatement, Principal};
