//! Fare-policy adjustment and zero gap-fill for binned tables

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{PipelineError, PipelineResult};
use super::schema::{DROPOFF_LOCATION, FARE_COLUMNS, FEATURE_COLUMNS, PICKUP_LOCATION, TIME_BIN};
use super::timezone::fare_cutover_micros;

/// Multiplier applied to fares at or before the 2022-12-19 cutover
pub const FARE_POLICY_FACTOR: f64 = 1.23;

const ROW_INDEX: &str = "__row_index";

/// Which postprocessing steps to run on an aggregated table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostprocessOptions {
    pub adjust_fares: bool,
    pub gap_fill: bool,
    /// Columns grouping the gap-fill means
    pub reduction_key: Vec<String>,
}

impl Default for PostprocessOptions {
    fn default() -> Self {
        Self {
            adjust_fares: false,
            gap_fill: false,
            reduction_key: default_reduction_key(),
        }
    }
}

pub fn default_reduction_key() -> Vec<String> {
    vec![DROPOFF_LOCATION.to_string(), PICKUP_LOCATION.to_string()]
}

/// Apply the enabled steps: fare adjustment first, then gap fill, so fill
/// means are computed on the adjusted scale.
pub fn postprocess(df: &DataFrame, options: &PostprocessOptions) -> PipelineResult<DataFrame> {
    let mut out = df.clone();
    if options.adjust_fares {
        out = adjust_fares(&out)?;
    }
    if options.gap_fill {
        let key: Vec<&str> = options.reduction_key.iter().map(|s| s.as_str()).collect();
        out = gap_fill(&out, &key)?;
    }
    Ok(out)
}

/// Scale fare, total and tip by [`FARE_POLICY_FACTOR`] for every row whose
/// bucket is at or before 2022-12-19T00:00 America/New_York.
///
/// Applying this twice compounds the factor; callers run it exactly once.
/// Fare columns missing from the table are skipped.
pub fn adjust_fares(df: &DataFrame) -> PipelineResult<DataFrame> {
    match df.schema().get(TIME_BIN) {
        Some(DataType::Datetime(_, _)) => {}
        _ => {
            return Err(PipelineError::SchemaViolation(format!(
                "fare adjustment needs a datetime '{}' column",
                TIME_BIN
            )))
        }
    }

    let present: Vec<&str> = FARE_COLUMNS
        .iter()
        .copied()
        .filter(|name| df.schema().get(name).is_some())
        .collect();
    if present.is_empty() {
        return Ok(df.clone());
    }

    let before_cutover = col(TIME_BIN)
        .dt()
        .timestamp(TimeUnit::Microseconds)
        .lt_eq(lit(fare_cutover_micros()));

    let adjusted: Vec<Expr> = present
        .iter()
        .map(|name| {
            when(before_cutover.clone())
                .then(col(*name).cast(DataType::Float64) * lit(FARE_POLICY_FACTOR))
                .otherwise(col(*name).cast(DataType::Float64))
                .alias(*name)
        })
        .collect();

    Ok(df.clone().lazy().with_columns(adjusted).collect()?)
}

/// Replace exact zeros in each feature column with the mean of that column's
/// nonzero values in the same reduction-key group.
///
/// Each column is filled from the input values only. A zero stays zero when
/// its group has no nonzero value. Row and column order are preserved.
pub fn gap_fill(df: &DataFrame, reduction_key: &[&str]) -> PipelineResult<DataFrame> {
    if reduction_key.is_empty() {
        return Err(PipelineError::SchemaViolation(
            "gap fill needs at least one reduction key column".to_string(),
        ));
    }
    for name in reduction_key {
        if df.schema().get(name).is_none() {
            return Err(PipelineError::SchemaViolation(format!(
                "reduction key column '{}' is missing",
                name
            )));
        }
    }

    let features: Vec<&str> = FEATURE_COLUMNS
        .iter()
        .copied()
        .filter(|name| df.schema().get(name).is_some() && !reduction_key.contains(name))
        .collect();
    if features.is_empty() {
        return Ok(df.clone());
    }

    let keys: Vec<Expr> = reduction_key.iter().map(|name| col(*name)).collect();
    let original_order: Vec<Expr> = df
        .get_column_names()
        .iter()
        .map(|name| col(name.as_str()))
        .collect();

    let base = df.clone().lazy();
    let mut lf = base.clone().with_row_index(ROW_INDEX, None);

    for feature in &features {
        let fill_name = format!("{}__fill", feature);
        let means = base
            .clone()
            .filter(col(*feature).neq(lit(0.0)))
            .group_by(keys.clone())
            .agg([col(*feature)
                .cast(DataType::Float64)
                .mean()
                .alias(fill_name.as_str())]);

        lf = lf
            .join(means, keys.clone(), keys.clone(), JoinArgs::new(JoinType::Left))
            .with_column(
                when(
                    col(*feature)
                        .eq(lit(0.0))
                        .and(col(fill_name.as_str()).is_not_null()),
                )
                .then(col(fill_name.as_str()))
                .otherwise(col(*feature).cast(DataType::Float64))
                .alias(*feature),
            )
            .drop([fill_name.as_str()]);
    }

    let filled = lf
        .sort([ROW_INDEX], SortMultipleOptions::default())
        .select(original_order)
        .collect()?;

    debug!(
        rows = filled.height(),
        features = features.len(),
        key = ?reduction_key,
        "gap-filled zero features"
    );

    Ok(filled)
}
