use crate::domain::errors::ValidationError;

/// Region name S3 treats as the default; buckets there are created without a location constraint
pub const DEFAULT_REGION: &str = "us-east-1";

/// A validated region name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Region(String);

impl Region {
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value: String = value.into();
        let value = value.trim().to_ascii_lowercase();
        if value.is_empty() {
            return Err(ValidationError::EmptyRegion);
        }
        if let Some(c) = value
            .chars()
            .find(|c| !c.is_ascii_lowercase() && !c.is_ascii_digit() && *c != '-')
        {
            return Err(ValidationError::InvalidRegionCharacter(c));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_REGION
    }

    /// Location constraint to send on bucket creation.
    ///
    /// The default region must be created without one; some backends reject it.
    pub fn location_constraint(&self) -> Option<&str> {
        if self.is_default() { None } else { Some(&self.0) }
    }
}

impl Default for Region {
    fn default() -> Self {
        Self(DEFAULT_REGION.to_string())
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Region {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_region_has_no_location_constraint() {
        let region = Region::default();
        assert!(region.is_default());
        assert_eq!(region.location_constraint(), None);
        assert_eq!(Region::new("US-EAST-1").unwrap().location_constraint(), None);
    }

    #[test]
    fn test_other_regions_carry_location_constraint() {
        let region = Region::new("eu-west-1").unwrap();
        assert_eq!(region.location_constraint(), Some("eu-west-1"));
    }

    #[test]
    fn test_invalid_regions() {
        assert_eq!(Region::new(""), Err(ValidationError::EmptyRegion));
        assert_eq!(
            Region::new("eu west"),
            Err(ValidationError::InvalidRegionCharacter(' '))
        );
    }
}
