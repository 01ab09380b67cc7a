//! Error types for the binning pipeline.
//!
//! Every variant is fatal for the operation that raised it. Nothing in the
//! pipeline retries; a failing month aborts the batch it belongs to.

use polars::prelude::PolarsError;
use thiserror::Error;

use super::schema::MonthYear;

/// Errors raised by the filter, binner, aggregator and postprocessors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The vehicle type is unknown, or known but has no implemented schema.
    #[error("Invalid vehicle type '{0}': only 'yellow' trip records are supported")]
    InvalidVehicleType(String),

    /// The requested key shape is not one of pickup, dropoff or pickup+dropoff.
    #[error("Invalid bin key [{0}]: expected pickup, dropoff, or pickup and dropoff")]
    InvalidBinKey(String),

    /// A required column is missing or has an incompatible dtype.
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    /// A month outside 1-12 or a malformed `YYYY-MM` string.
    #[error("Invalid period '{0}': expected YYYY-MM with month 1-12")]
    InvalidPeriod(String),

    /// The raw data source could not supply a month of trips.
    #[error("Failed to load trips: {0}")]
    Source(String),

    /// A single month failed inside a multi-month batch.
    #[error("Processing {period} failed: {source}")]
    Month {
        period: MonthYear,
        #[source]
        source: Box<PipelineError>,
    },

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    /// Strip any `Month` wrappers and return the underlying error.
    pub fn root(&self) -> &PipelineError {
        match self {
            PipelineError::Month { source, .. } => source.root(),
            other => other,
        }
    }
}
