use std::fmt::Write;

use crate::domain::models::{BucketSummary, Outcome, ProvisioningReport};

use super::dto::{
    outcome_label, BucketSummaryDto, ConnectionSummaryDto, ProvisioningReportDto,
};

/// How command results are written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Renders reports, listings and connection summaries in one output format
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    format: OutputFormat,
}

impl Renderer {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn report(&self, report: &ProvisioningReport) -> Result<String, serde_json::Error> {
        match self.format {
            OutputFormat::Text => Ok(report_text(report)),
            OutputFormat::Json => serde_json::to_string_pretty(&ProvisioningReportDto::from(report)),
        }
    }

    pub fn buckets(&self, buckets: &[BucketSummary]) -> Result<String, serde_json::Error> {
        match self.format {
            OutputFormat::Text => Ok(buckets_text(buckets)),
            OutputFormat::Json => {
                let dtos: Vec<BucketSummaryDto> = buckets.iter().map(BucketSummaryDto::from).collect();
                serde_json::to_string_pretty(&dtos)
            }
        }
    }

    pub fn connection(&self, summary: &ConnectionSummaryDto) -> Result<String, serde_json::Error> {
        match self.format {
            OutputFormat::Text => Ok(connection_text(summary)),
            OutputFormat::Json => serde_json::to_string_pretty(summary),
        }
    }
}

/// One line per step; failed steps carry their error class and message
pub fn report_text(report: &ProvisioningReport) -> String {
    let mut out = format!("Bucket {}\n", report.bucket());

    for result in report.results() {
        let _ = match &result.outcome {
            Outcome::Failed(err) => writeln!(
                out,
                "  {:<18} {:<18} [{}] {}",
                result.kind.as_str(),
                outcome_label(&result.outcome),
                err.kind(),
                err
            ),
            outcome => writeln!(
                out,
                "  {:<18} {}",
                result.kind.as_str(),
                outcome_label(outcome)
            ),
        };
    }

    let status = if report.succeeded() { "ok" } else { "failed" };
    let _ = writeln!(out, "Result: {}", status);
    out
}

pub fn buckets_text(buckets: &[BucketSummary]) -> String {
    if buckets.is_empty() {
        return "No buckets\n".to_string();
    }

    let width = buckets.iter().map(|b| b.name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for bucket in buckets {
        let created = bucket
            .created_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(out, "{:<width$}  {}", bucket.name, created, width = width);
    }
    out
}

pub fn connection_text(summary: &ConnectionSummaryDto) -> String {
    let mut out = String::from("Connection details\n");
    let _ = writeln!(out, "  endpoint:   {}", summary.endpoint);
    let _ = writeln!(out, "  access key: {}", summary.access_key);
    let _ = writeln!(out, "  secret key: {}", summary.secret_key);
    if let Some(region) = &summary.region {
        let _ = writeln!(out, "  region:     {}", region);
    }
    let _ = writeln!(out, "  bucket:     {}", summary.bucket);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        errors::ProvisioningError,
        models::{OperationKind, OperationResult},
        value_objects::{BucketName, Credential, Endpoint},
    };
    use chrono::{TimeZone, Utc};

    fn report() -> ProvisioningReport {
        let mut report = ProvisioningReport::new(BucketName::new("basalt-vault").unwrap());
        report.push(OperationResult::applied(OperationKind::EnsureBucket));
        report.push(OperationResult::already_satisfied(OperationKind::EnsureVersioning));
        report.push(OperationResult::failed(
            OperationKind::EnsurePolicy,
            ProvisioningError::AuthError {
                message: "denied".to_string(),
            },
        ));
        report
    }

    #[test]
    fn test_text_report_marks_each_step() {
        let text = report_text(&report());

        assert!(text.starts_with("Bucket basalt-vault\n"));
        assert!(text.contains("ensure-bucket      applied"));
        assert!(text.contains("ensure-versioning  already-satisfied"));
        assert!(text.contains("[AuthError] Authentication failed: denied"));
        assert!(text.ends_with("Result: failed\n"));
    }

    #[test]
    fn test_json_report() {
        let json = Renderer::new(OutputFormat::Json).report(&report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["bucket"], "basalt-vault");
        assert_eq!(value["succeeded"], false);
        assert_eq!(value["results"][1]["outcome"], "already-satisfied");
        assert!(value["results"][1].get("error").is_none());
        assert_eq!(value["results"][2]["error_kind"], "AuthError");
    }

    #[test]
    fn test_bucket_listing() {
        let buckets = vec![
            BucketSummary {
                name: "basalt-vault".to_string(),
                created_at: Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()),
            },
            BucketSummary {
                name: "logs".to_string(),
                created_at: None,
            },
        ];

        assert_eq!(
            buckets_text(&buckets),
            "basalt-vault  2024-01-02T03:04:05+00:00\nlogs          -\n"
        );
        assert_eq!(buckets_text(&[]), "No buckets\n");
    }

    #[test]
    fn test_connection_summary_masks_secret() {
        let summary = ConnectionSummaryDto::new(
            &Endpoint::local_default(),
            &Credential::new("minioadmin", "minioadmin").unwrap(),
            None,
            "basalt-vault",
        );
        let text = connection_text(&summary);

        assert!(text.contains("endpoint:   http://localhost:9000"));
        assert!(text.contains("secret key: mi******"));
        assert!(!text.contains("secret key: minioadmin"));
        assert!(!text.contains("region"));
    }
}
