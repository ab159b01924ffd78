use crate::domain::{errors::ProvisioningError, value_objects::BucketName};
use std::io;
use thiserror::Error as ThisError;

/// S3 error codes meaning the caller's credentials were rejected
const AUTH_ERROR_CODES: &[&str] = &[
    "AccessDenied",
    "InvalidAccessKeyId",
    "SignatureDoesNotMatch",
    "ExpiredToken",
    "InvalidToken",
    "InvalidSecurity",
    "AuthorizationHeaderMalformed",
];

#[derive(ThisError, Debug)]
pub enum StoreError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Service error {status}: {message}")]
    Service {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Upload integrity check failed: expected etag {expected}, got {actual}")]
    Integrity { expected: String, actual: String },

    #[error("{0}")]
    Other(String),
}

impl StoreError {
    /// S3 error code carried by a service error, if any
    pub fn code(&self) -> Option<&str> {
        match self {
            StoreError::Service { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Service { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the backend rejected the caller's credentials
    pub fn is_auth_failure(&self) -> bool {
        match self {
            StoreError::Service { status, code, .. } => match code.as_deref() {
                Some(code) => AUTH_ERROR_CODES.contains(&code),
                None => *status == 401 || *status == 403,
            },
            _ => false,
        }
    }

    /// Map into the provisioning taxonomy, naming `bucket` where the error concerns it
    pub fn into_provisioning_error(self, bucket: Option<&BucketName>) -> ProvisioningError {
        let bucket_name = || {
            bucket
                .map(|b| b.as_str().to_string())
                .unwrap_or_default()
        };

        if self.is_auth_failure() {
            return ProvisioningError::AuthError {
                message: self.service_message(),
            };
        }

        match self {
            StoreError::Connection(message) => ProvisioningError::BackendUnavailable { message },
            StoreError::Io(err) => ProvisioningError::Io {
                message: err.to_string(),
            },
            StoreError::Service { code, .. } if code.as_deref() == Some("BucketAlreadyExists") => {
                ProvisioningError::BucketConflict {
                    bucket: bucket_name(),
                }
            }
            StoreError::Service { code, .. } if code.as_deref() == Some("NoSuchBucket") => {
                ProvisioningError::BucketNotFound {
                    bucket: bucket_name(),
                }
            }
            StoreError::Service { status: 503, message, .. } => {
                ProvisioningError::BackendUnavailable { message }
            }
            StoreError::Service { code, message, .. } => ProvisioningError::Backend { code, message },
            err @ StoreError::Integrity { .. } => ProvisioningError::Backend {
                code: Some("BadDigest".to_string()),
                message: err.to_string(),
            },
            other => ProvisioningError::Backend {
                code: None,
                message: other.to_string(),
            },
        }
    }

    fn service_message(&self) -> String {
        match self {
            StoreError::Service { message, .. } if !message.is_empty() => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<StoreError> for ProvisioningError {
    fn from(err: StoreError) -> Self {
        err.into_provisioning_error(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(status: u16, code: Option<&str>) -> StoreError {
        StoreError::Service {
            status,
            code: code.map(str::to_string),
            message: "message".to_string(),
        }
    }

    fn bucket() -> BucketName {
        BucketName::new("test-bucket").unwrap()
    }

    #[test]
    fn test_auth_codes_map_to_auth_error() {
        for code in ["AccessDenied", "InvalidAccessKeyId", "SignatureDoesNotMatch"] {
            let err = service(403, Some(code)).into_provisioning_error(Some(&bucket()));
            assert_eq!(err.kind(), "AuthError", "{code}");
        }
    }

    #[test]
    fn test_bare_forbidden_maps_to_auth_error() {
        let err: ProvisioningError = service(403, None).into();
        assert_eq!(err.kind(), "AuthError");
    }

    #[test]
    fn test_bucket_already_exists_is_conflict() {
        let err = service(409, Some("BucketAlreadyExists")).into_provisioning_error(Some(&bucket()));
        assert_eq!(
            err,
            ProvisioningError::BucketConflict {
                bucket: "test-bucket".to_string()
            }
        );
    }

    #[test]
    fn test_connection_failure_is_backend_unavailable() {
        let err: ProvisioningError = StoreError::Connection("refused".to_string()).into();
        assert_eq!(
            err,
            ProvisioningError::BackendUnavailable {
                message: "refused".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_code_is_preserved() {
        let err: ProvisioningError = service(500, Some("InternalError")).into();
        assert_eq!(
            err,
            ProvisioningError::Backend {
                code: Some("InternalError".to_string()),
                message: "message".to_string()
            }
        );
    }
}
