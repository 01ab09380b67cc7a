//! JSON run report export

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::pipeline::{MonthYear, PipelineOptions, PostprocessOptions};
use crate::report::TableStats;

/// Metadata about the binning run
#[derive(Serialize)]
pub struct RunMetadata {
    /// Timestamp of the run (ISO 8601 format)
    pub timestamp: String,
    pub taxibins_version: String,
    pub data_dir: String,
    pub output_file: String,
    /// First and last processed month
    pub start: String,
    pub end: String,
    pub months: usize,
}

/// Seconds spent per pipeline step
#[derive(Serialize, Default)]
pub struct StepTimings {
    pub bin_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postprocess_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reduce_seconds: Option<f64>,
    pub save_seconds: f64,
}

/// Complete run report
#[derive(Serialize)]
pub struct RunReport<'a> {
    pub metadata: RunMetadata,
    pub pipeline: &'a PipelineOptions,
    pub postprocess: &'a PostprocessOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reduced_pickup: Option<i64>,
    pub output: &'a TableStats,
    pub timings: StepTimings,
}

/// Parameters for a run report
pub struct ReportParams<'a> {
    pub data_dir: &'a Path,
    pub output_file: &'a Path,
    pub periods: &'a [MonthYear],
    pub pipeline: &'a PipelineOptions,
    pub postprocess: &'a PostprocessOptions,
    pub reduced_pickup: Option<i64>,
    pub stats: &'a TableStats,
    pub timings: StepTimings,
}

/// Build the report from a finished run
pub fn build_run_report(params: ReportParams<'_>) -> RunReport<'_> {
    let period_label = |period: Option<&MonthYear>| {
        period.map(|p| p.to_string()).unwrap_or_default()
    };

    RunReport {
        metadata: RunMetadata {
            timestamp: Utc::now().to_rfc3339(),
            taxibins_version: env!("CARGO_PKG_VERSION").to_string(),
            data_dir: params.data_dir.display().to_string(),
            output_file: params.output_file.display().to_string(),
            start: period_label(params.periods.first()),
            end: period_label(params.periods.last()),
            months: params.periods.len(),
        },
        pipeline: params.pipeline,
        postprocess: params.postprocess,
        reduced_pickup: params.reduced_pickup,
        output: params.stats,
        timings: params.timings,
    }
}

/// Write a run report as pretty-printed JSON
pub fn export_run_report(report: &RunReport<'_>, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize run report")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write run report: {}", path.display()))?;
    Ok(())
}
