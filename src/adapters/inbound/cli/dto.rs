use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{
    models::{BucketSummary, OperationResult, Outcome, ProvisioningReport},
    value_objects::{Credential, Endpoint, Region},
};

/// DTO for one workflow step
#[derive(Debug, Clone, Serialize)]
pub struct OperationResultDto {
    pub operation: String,
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// DTO for a provisioning report
#[derive(Debug, Clone, Serialize)]
pub struct ProvisioningReportDto {
    pub bucket: String,
    pub succeeded: bool,
    pub results: Vec<OperationResultDto>,
}

/// DTO for a bucket listing entry
#[derive(Debug, Clone, Serialize)]
pub struct BucketSummaryDto {
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Connection details printed after provisioning, secret masked
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionSummaryDto {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub secure: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub bucket: String,
}

impl ConnectionSummaryDto {
    pub fn new(
        endpoint: &Endpoint,
        credential: &Credential,
        region: Option<&Region>,
        bucket: &str,
    ) -> Self {
        Self {
            endpoint: endpoint.base_url(),
            access_key: credential.access_key().to_string(),
            secret_key: credential.masked_secret(),
            secure: endpoint.is_secure(),
            region: region.map(|r| r.to_string()),
            bucket: bucket.to_string(),
        }
    }
}

pub fn outcome_label(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::Applied => "applied",
        Outcome::AlreadySatisfied => "already-satisfied",
        Outcome::Failed(_) => "failed",
    }
}

// Conversion implementations

impl From<&OperationResult> for OperationResultDto {
    fn from(result: &OperationResult) -> Self {
        Self {
            operation: result.kind.to_string(),
            outcome: outcome_label(&result.outcome).to_string(),
            error_kind: result.error().map(|e| e.kind().to_string()),
            error: result.error().map(|e| e.to_string()),
        }
    }
}

impl From<&ProvisioningReport> for ProvisioningReportDto {
    fn from(report: &ProvisioningReport) -> Self {
        Self {
            bucket: report.bucket().to_string(),
            succeeded: report.succeeded(),
            results: report.results().iter().map(OperationResultDto::from).collect(),
        }
    }
}

impl From<&BucketSummary> for BucketSummaryDto {
    fn from(summary: &BucketSummary) -> Self {
        Self {
            name: summary.name.clone(),
            created_at: summary.created_at,
        }
    }
}
