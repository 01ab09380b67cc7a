//! Location reduction: collapse pickup×dropoff bins onto pickup only

use polars::prelude::*;

use super::error::{PipelineError, PipelineResult};
use super::schema::{COUNT, DROPOFF_LOCATION, FEATURE_COLUMNS, PICKUP_LOCATION, TIME_BIN};

/// Count-weighted mean of `feature` within a group.
///
/// Falls back to the plain mean when the group's counts sum to zero, so a
/// bucket with no trips still carries its (gap-filled) feature values.
fn weighted_mean(feature: &str) -> Expr {
    let weight = col(COUNT).cast(DataType::Float64);
    let total = weight.clone().sum();

    when(total.clone().eq(lit(0.0)))
        .then(col(feature).cast(DataType::Float64).mean())
        .otherwise((col(feature).cast(DataType::Float64) * weight).sum() / total)
        .alias(feature)
}

/// Reduce a pickup×dropoff table to one row per (bucket, pickup id).
///
/// With `Some(id)` only that pickup location is kept and the result has one
/// row per bucket. With `None` every pickup id is reduced. Counts are summed;
/// feature columns become count-weighted means across dropoff ids.
pub fn reduce_to_pickup(df: &DataFrame, pickup_id: Option<i64>) -> PipelineResult<DataFrame> {
    for name in [TIME_BIN, PICKUP_LOCATION, DROPOFF_LOCATION, COUNT] {
        if df.schema().get(name).is_none() {
            return Err(PipelineError::SchemaViolation(format!(
                "location reduction needs column '{}'",
                name
            )));
        }
    }

    let features: Vec<&str> = FEATURE_COLUMNS
        .iter()
        .copied()
        .filter(|name| df.schema().get(name).is_some())
        .collect();

    let mut aggs = vec![col(COUNT).sum().alias(COUNT)];
    aggs.extend(features.iter().map(|name| weighted_mean(name)));

    let mut output = vec![col(TIME_BIN), col(PICKUP_LOCATION), col(COUNT)];
    output.extend(features.iter().map(|name| col(*name)));

    let mut lf = df.clone().lazy();
    if let Some(id) = pickup_id {
        lf = lf.filter(col(PICKUP_LOCATION).eq(lit(id)));
    }

    let reduced = lf
        .group_by([col(TIME_BIN), col(PICKUP_LOCATION)])
        .agg(aggs)
        .sort([TIME_BIN, PICKUP_LOCATION], SortMultipleOptions::default())
        .select(output)
        .collect()?;

    Ok(reduced)
}
