/// Validation errors for domain value objects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    // ObjectKey validation errors
    EmptyObjectKey,
    ObjectKeyTooLong {
        actual: usize,
        max: usize,
    },
    InvalidObjectKeyCharacter(char),
    ObjectKeyStartsWithSlash,
    ObjectKeyContainsDoubleSlash,

    // BucketName validation errors
    BucketNameTooShort {
        actual: usize,
        min: usize,
    },
    BucketNameTooLong {
        actual: usize,
        max: usize,
    },
    BucketNameInvalidStart,
    BucketNameInvalidEnd,
    BucketNameInvalidCharacter(char),
    BucketNameConsecutiveHyphens,
    BucketNameConsecutiveDots,
    BucketNameLooksLikeIpAddress,

    // Endpoint validation errors
    EmptyEndpoint,
    UnsupportedScheme(String),
    InvalidPort(String),
    EndpointHasPath(String),

    // Region validation errors
    EmptyRegion,
    InvalidRegionCharacter(char),

    // Credential validation errors
    EmptyAccessKey,
    EmptySecretKey,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ObjectKey errors
            ValidationError::EmptyObjectKey => write!(f, "Object key cannot be empty"),
            ValidationError::ObjectKeyTooLong { actual, max } => {
                write!(f, "Object key too long: {} bytes (max: {})", actual, max)
            }
            ValidationError::InvalidObjectKeyCharacter(c) => {
                write!(f, "Invalid character in object key: {:?}", c)
            }
            ValidationError::ObjectKeyStartsWithSlash => {
                write!(f, "Object key cannot start with '/'")
            }
            ValidationError::ObjectKeyContainsDoubleSlash => {
                write!(f, "Object key cannot contain '//'")
            }

            // BucketName errors
            ValidationError::BucketNameTooShort { actual, min } => {
                write!(
                    f,
                    "Bucket name too short: {} characters (min: {})",
                    actual, min
                )
            }
            ValidationError::BucketNameTooLong { actual, max } => {
                write!(
                    f,
                    "Bucket name too long: {} characters (max: {})",
                    actual, max
                )
            }
            ValidationError::BucketNameInvalidStart => {
                write!(f, "Bucket name must start with lowercase letter or number")
            }
            ValidationError::BucketNameInvalidEnd => {
                write!(f, "Bucket name must end with lowercase letter or number")
            }
            ValidationError::BucketNameInvalidCharacter(c) => {
                write!(
                    f,
                    "Invalid character in bucket name: '{}'. Only lowercase letters, numbers, hyphens and dots allowed",
                    c
                )
            }
            ValidationError::BucketNameConsecutiveHyphens => {
                write!(f, "Bucket name cannot contain consecutive hyphens")
            }
            ValidationError::BucketNameConsecutiveDots => {
                write!(f, "Bucket name cannot contain consecutive dots")
            }
            ValidationError::BucketNameLooksLikeIpAddress => {
                write!(f, "Bucket name cannot be formatted as an IP address")
            }

            // Endpoint errors
            ValidationError::EmptyEndpoint => write!(f, "Endpoint cannot be empty"),
            ValidationError::UnsupportedScheme(scheme) => {
                write!(f, "Unsupported endpoint scheme '{}' (expected http or https)", scheme)
            }
            ValidationError::InvalidPort(port) => {
                write!(f, "Invalid endpoint port: '{}'", port)
            }
            ValidationError::EndpointHasPath(path) => {
                write!(f, "Endpoint must not contain a path: '{}'", path)
            }

            // Region errors
            ValidationError::EmptyRegion => write!(f, "Region cannot be empty"),
            ValidationError::InvalidRegionCharacter(c) => {
                write!(f, "Invalid character in region: '{}'", c)
            }

            // Credential errors
            ValidationError::EmptyAccessKey => write!(f, "Access key cannot be empty"),
            ValidationError::EmptySecretKey => write!(f, "Secret key cannot be empty"),
        }
    }
}

impl std::error::Error for ValidationError {}
