mod provisioning_errors;
mod validation_errors;

pub use provisioning_errors::*;
pub use validation_errors::*;
