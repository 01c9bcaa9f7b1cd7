use crate::aggregate::AggregateReport;
use crate::error::ErrorPayload;
use crate::orchestrator::RunSummary;
use serde::Serialize;
use std::path::PathBuf;

/// Schema version for output payloads.
pub const TAGCOMPARE_OUTPUT_VERSION: &str = "0.1.0";

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum TagCompareOutput {
    Compare(CompareOutput),
    Aggregate(AggregateOutput),
    Clean(CleanOutput),
    Error(ErrorOutput),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareOutput {
    pub version: String,
    pub dry_run: bool,
    #[serde(flatten)]
    pub summary: RunSummary,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateOutput {
    pub version: String,
    #[serde(flatten)]
    pub report: AggregateReport,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanOutput {
    pub version: String,
    pub build: String,
    pub path: PathBuf,
    pub removed: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorOutput {
    pub version: String,
    pub message: String,
    pub error: ErrorPayload,
}
