use crate::domain::errors::ValidationError;

/// Access key / secret key pair, passed through to the backend adapter
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    access_key: String,
    secret_key: String,
}

impl Credential {
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let access_key: String = access_key.into();
        let secret_key: String = secret_key.into();

        if access_key.trim().is_empty() {
            return Err(ValidationError::EmptyAccessKey);
        }
        if secret_key.trim().is_empty() {
            return Err(ValidationError::EmptySecretKey);
        }

        Ok(Self {
            access_key,
            secret_key,
        })
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    /// Secret key with everything but the first two characters masked
    pub fn masked_secret(&self) -> String {
        let visible: String = self.secret_key.chars().take(2).collect();
        format!("{}{}", visible, "*".repeat(6))
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secret() {
        let credential = Credential::new("minioadmin", "supersecret").unwrap();
        let debug = format!("{:?}", credential);
        assert!(debug.contains("minioadmin"));
        assert!(!debug.contains("supersecret"));
    }

    #[test]
    fn test_rejects_empty_parts() {
        assert_eq!(Credential::new("", "s"), Err(ValidationError::EmptyAccessKey));
        assert_eq!(Credential::new("a", " "), Err(ValidationError::EmptySecretKey));
    }

    #[test]
    fn test_masked_secret() {
        let credential = Credential::new("key", "minioadmin").unwrap();
        assert_eq!(credential.masked_secret(), "mi******");
    }
}
