use crate::domain::errors::ValidationError;

/// Errors that can occur while provisioning a bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningError {
    /// The backend could not be reached (connectivity, DNS, TLS, timeout)
    BackendUnavailable { message: String },

    /// The backend rejected the credentials
    AuthError { message: String },

    /// The bucket name is owned by a different principal
    BucketConflict { bucket: String },

    /// The bucket does not exist
    BucketNotFound { bucket: String },

    /// A policy choice outside the supported set
    InvalidPolicyChoice { value: String },

    /// A local tool the operation depends on is missing
    DependencyMissing { dependency: String, message: String },

    /// Input failed domain validation
    Validation(ValidationError),

    /// Local filesystem error
    Io { message: String },

    /// Any other error reported by the backend
    Backend {
        code: Option<String>,
        message: String,
    },
}

impl ProvisioningError {
    /// Short machine-friendly name of the error class
    pub fn kind(&self) -> &'static str {
        match self {
            ProvisioningError::BackendUnavailable { .. } => "BackendUnavailable",
            ProvisioningError::AuthError { .. } => "AuthError",
            ProvisioningError::BucketConflict { .. } => "BucketConflict",
            ProvisioningError::BucketNotFound { .. } => "BucketNotFound",
            ProvisioningError::InvalidPolicyChoice { .. } => "InvalidPolicyChoice",
            ProvisioningError::DependencyMissing { .. } => "DependencyMissing",
            ProvisioningError::Validation(_) => "Validation",
            ProvisioningError::Io { .. } => "Io",
            ProvisioningError::Backend { .. } => "Backend",
        }
    }
}

impl std::fmt::Display for ProvisioningError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProvisioningError::BackendUnavailable { message } => {
                write!(f, "Backend unavailable: {}", message)
            }
            ProvisioningError::AuthError { message } => {
                write!(f, "Authentication failed: {}", message)
            }
            ProvisioningError::BucketConflict { bucket } => {
                write!(
                    f,
                    "Bucket '{}' already exists and is owned by another account",
                    bucket
                )
            }
            ProvisioningError::BucketNotFound { bucket } => {
                write!(f, "Bucket not found: {}", bucket)
            }
            ProvisioningError::InvalidPolicyChoice { value } => {
                write!(
                    f,
                    "Invalid policy '{}' (expected private, public-read or public-read-write)",
                    value
                )
            }
            ProvisioningError::DependencyMissing {
                dependency,
                message,
            } => {
                write!(f, "Missing dependency '{}': {}", dependency, message)
            }
            ProvisioningError::Validation(err) => write!(f, "Validation error: {}", err),
            ProvisioningError::Io { message } => write!(f, "IO error: {}", message),
            ProvisioningError::Backend { code, message } => match code {
                Some(code) => write!(f, "Backend error {}: {}", code, message),
                None => write!(f, "Backend error: {}", message),
            },
        }
    }
}

impl std::error::Error for ProvisioningError {}

impl From<ValidationError> for ProvisioningError {
    fn from(err: ValidationError) -> Self {
        ProvisioningError::Validation(err)
    }
}

impl From<std::io::Error> for ProvisioningError {
    fn from(err: std::io::Error) -> Self {
        ProvisioningError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type for provisioning operations
pub type ProvisioningResult<T> = Result<T, ProvisioningError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_the_bucket_on_conflict() {
        let err = ProvisioningError::BucketConflict {
            bucket: "shared-name".to_string(),
        };
        assert!(err.to_string().contains("shared-name"));
        assert_eq!(err.kind(), "BucketConflict");
    }

    #[test]
    fn test_backend_error_display_with_and_without_code() {
        let with_code = ProvisioningError::Backend {
            code: Some("InternalError".to_string()),
            message: "boom".to_string(),
        };
        let without_code = ProvisioningError::Backend {
            code: None,
            message: "boom".to_string(),
        };
        assert_eq!(with_code.to_string(), "Backend error InternalError: boom");
        assert_eq!(without_code.to_string(), "Backend error: boom");
    }

    #[test]
    fn test_validation_error_converts() {
        let err: ProvisioningError = ValidationError::EmptyRegion.into();
        assert_eq!(err, ProvisioningError::Validation(ValidationError::EmptyRegion));
    }
}
