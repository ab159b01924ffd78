use crate::domain::{errors::ProvisioningError, value_objects::BucketName};

/// Step of the provisioning workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    EnsureBucket,
    EnsureVersioning,
    EnsurePolicy,
    UploadObject,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::EnsureBucket => "ensure-bucket",
            OperationKind::EnsureVersioning => "ensure-versioning",
            OperationKind::EnsurePolicy => "ensure-policy",
            OperationKind::UploadObject => "upload-object",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a step ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The step changed backend state
    Applied,
    /// The backend was already in the desired state
    AlreadySatisfied,
    Failed(ProvisioningError),
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

/// Outcome of one workflow step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationResult {
    pub kind: OperationKind,
    pub outcome: Outcome,
}

impl OperationResult {
    pub fn applied(kind: OperationKind) -> Self {
        Self {
            kind,
            outcome: Outcome::Applied,
        }
    }

    pub fn already_satisfied(kind: OperationKind) -> Self {
        Self {
            kind,
            outcome: Outcome::AlreadySatisfied,
        }
    }

    pub fn failed(kind: OperationKind, error: ProvisioningError) -> Self {
        Self {
            kind,
            outcome: Outcome::Failed(error),
        }
    }

    pub fn error(&self) -> Option<&ProvisioningError> {
        match &self.outcome {
            Outcome::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.outcome.is_failure()
    }
}

/// Ordered results of one provisioning invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningReport {
    bucket: BucketName,
    results: Vec<OperationResult>,
}

impl ProvisioningReport {
    pub fn new(bucket: BucketName) -> Self {
        Self {
            bucket,
            results: Vec::new(),
        }
    }

    pub fn bucket(&self) -> &BucketName {
        &self.bucket
    }

    pub fn push(&mut self, result: OperationResult) {
        self.results.push(result);
    }

    pub fn results(&self) -> &[OperationResult] {
        &self.results
    }

    pub fn get(&self, kind: OperationKind) -> Option<&OperationResult> {
        self.results.iter().find(|r| r.kind == kind)
    }

    pub fn outcomes(&self) -> Vec<&Outcome> {
        self.results.iter().map(|r| &r.outcome).collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = &OperationResult> {
        self.results.iter().filter(|r| r.is_failure())
    }

    /// True when every step was applied or already satisfied
    pub fn succeeded(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn exit_code(&self) -> i32 {
        if self.succeeded() { 0 } else { 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> ProvisioningReport {
        ProvisioningReport::new(BucketName::new("test-bucket").unwrap())
    }

    #[test]
    fn test_empty_report_succeeds() {
        assert!(report().succeeded());
        assert_eq!(report().exit_code(), 0);
    }

    #[test]
    fn test_any_failure_sets_exit_code() {
        let mut report = report();
        report.push(OperationResult::applied(OperationKind::EnsureBucket));
        report.push(OperationResult::failed(
            OperationKind::EnsureVersioning,
            ProvisioningError::AuthError {
                message: "denied".to_string(),
            },
        ));
        report.push(OperationResult::already_satisfied(OperationKind::EnsurePolicy));

        assert!(!report.succeeded());
        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.failures().count(), 1);
        assert!(report
            .get(OperationKind::EnsureVersioning)
            .and_then(OperationResult::error)
            .is_some());
    }
}
