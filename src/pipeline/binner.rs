//! Time-location binner: hourly counts and feature means on a dense grid
//!
//! Rows are bucketed by the hour of their (localized) pickup time and grouped
//! with the location key. The observed groups are then left-joined onto the
//! full cartesian grid of hours × keys so that empty combinations appear with
//! a zero count instead of being absent.

use std::collections::BTreeSet;

use polars::prelude::*;
use tracing::debug;

use super::error::{PipelineError, PipelineResult};
use super::schema::*;
use super::timezone::{hour_bucket, CIVIL_TZ_NAME, MICROS_PER_HOUR};

/// Bin filtered trips into a dense hourly table.
///
/// Output columns are `time_bin`, the key column(s), `count` and, when
/// `aggregate_features` is set, the mean of every feature column. Empty
/// (hour, key) combinations get a zero count and zero features.
///
/// Single-key tables are sorted by key then hour; the pickup×dropoff table is
/// sorted by hour, then pickup, then dropoff.
///
/// On a fall-back day the repeated 01:xx wall times are read as standard time,
/// while the grid still steps through every absolute hour. The daylight-time
/// 01:00 bucket therefore never receives a trip and has a zero count for every
/// key. [`gap_fill`](super::postprocess::gap_fill) fills its features like any
/// other unobserved bin.
pub fn bin_trips(df: &DataFrame, key: BinKey, aggregate_features: bool) -> PipelineResult<DataFrame> {
    check_binner_input(df, key, aggregate_features)?;

    let empty = || DataFrame::empty_with_schema(&binned_schema(key, aggregate_features));
    if df.height() == 0 {
        return Ok(empty());
    }

    let observed = observed_groups(df, key, aggregate_features)?;
    if observed.height() == 0 {
        return Ok(empty());
    }

    let grid = dense_grid(&observed, key)?;
    debug!(
        key = %key,
        observed_groups = observed.height(),
        grid_rows = grid.height(),
        "materialized hourly grid"
    );

    let join_on = group_exprs(key);
    let mut fills = vec![col(COUNT).fill_null(lit(0i64))];
    if aggregate_features {
        fills.extend(
            FEATURE_COLUMNS
                .iter()
                .map(|name| col(*name).fill_null(lit(0.0))),
        );
    }

    let sort_by: Vec<Expr> = if key.is_dual() {
        group_exprs(key)
    } else {
        key.columns()
            .iter()
            .map(|c| col(*c))
            .chain(std::iter::once(col(TIME_BIN)))
            .collect()
    };

    let mut output = group_exprs(key);
    output.push(col(COUNT));
    if aggregate_features {
        output.extend(FEATURE_COLUMNS.iter().map(|name| col(*name)));
    }

    let dense = grid
        .lazy()
        .join(
            observed.lazy(),
            join_on.clone(),
            join_on,
            JoinArgs::new(JoinType::Left),
        )
        .with_columns(fills)
        .sort_by_exprs(sort_by, SortMultipleOptions::default())
        .with_column(col(TIME_BIN).cast(DataType::Datetime(
            TimeUnit::Microseconds,
            Some(CIVIL_TZ_NAME.into()),
        )))
        .select(output)
        .collect()?;

    Ok(dense)
}

/// `time_bin` followed by the key columns
fn group_exprs(key: BinKey) -> Vec<Expr> {
    std::iter::once(col(TIME_BIN))
        .chain(key.columns().iter().map(|c| col(*c)))
        .collect()
}

fn check_binner_input(df: &DataFrame, key: BinKey, aggregate_features: bool) -> PipelineResult<()> {
    let schema = df.schema();

    match schema.get(PICKUP_DATETIME) {
        Some(DataType::Datetime(_, _)) => {}
        Some(other) => {
            return Err(PipelineError::SchemaViolation(format!(
                "column '{}' has dtype {}, expected datetime",
                PICKUP_DATETIME, other
            )))
        }
        None => {
            return Err(PipelineError::SchemaViolation(format!(
                "required column '{}' is missing",
                PICKUP_DATETIME
            )))
        }
    }

    for name in key.columns() {
        match schema.get(name) {
            Some(dtype) if dtype.is_integer() => {}
            _ => {
                return Err(PipelineError::SchemaViolation(format!(
                    "key column '{}' must be present and integer",
                    name
                )))
            }
        }
    }

    if aggregate_features {
        if let Some(missing) = FEATURE_COLUMNS.iter().find(|name| schema.get(name).is_none()) {
            return Err(PipelineError::SchemaViolation(format!(
                "feature column '{}' is missing; run the record filter first",
                missing
            )));
        }
    }

    Ok(())
}

/// Group rows by (hour, key) and aggregate count and feature means.
///
/// `time_bin` is left as Int64 UTC epoch microseconds here so the grid can
/// be joined on plain integers.
fn observed_groups(df: &DataFrame, key: BinKey, aggregate_features: bool) -> PipelineResult<DataFrame> {
    let pickups = df
        .column(PICKUP_DATETIME)?
        .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?
        .cast(&DataType::Int64)?;

    let buckets: Int64Chunked = pickups
        .i64()?
        .into_iter()
        .map(|micros| micros.and_then(hour_bucket))
        .collect();

    let mut selected: Vec<&str> = key.columns().to_vec();
    if aggregate_features {
        selected.extend(FEATURE_COLUMNS);
    }
    let mut work = df.select(selected)?;
    work.with_column(buckets.with_name(TIME_BIN.into()).into_series())?;

    let mut aggs = vec![len().cast(DataType::Int64).alias(COUNT)];
    if aggregate_features {
        aggs.extend(
            FEATURE_COLUMNS
                .iter()
                .map(|name| col(*name).cast(DataType::Float64).mean().alias(*name)),
        );
    }

    let not_null = group_exprs(key)
        .into_iter()
        .fold(lit(true), |acc, e| acc.and(e.is_not_null()));

    let observed = work
        .lazy()
        .filter(not_null)
        .with_columns(
            key.columns()
                .iter()
                .map(|c| col(*c).cast(DataType::Int64))
                .collect::<Vec<_>>(),
        )
        .group_by(group_exprs(key))
        .agg(aggs)
        .collect()?;

    Ok(observed)
}

/// Every hour from the first to the last observed bucket crossed with every
/// observed key (single id or pickup/dropoff pair).
fn dense_grid(observed: &DataFrame, key: BinKey) -> PipelineResult<DataFrame> {
    let bins = observed.column(TIME_BIN)?.i64()?;
    let (first, last) = match (bins.min(), bins.max()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Ok(DataFrame::empty()),
    };

    let key_arrays = key
        .columns()
        .iter()
        .map(|c| observed.column(c).and_then(|column| column.i64()))
        .collect::<PolarsResult<Vec<_>>>()?;

    let keys: BTreeSet<Vec<i64>> = (0..observed.height())
        .filter_map(|row| {
            key_arrays
                .iter()
                .map(|ca| ca.get(row))
                .collect::<Option<Vec<i64>>>()
        })
        .collect();

    let hours = ((last - first) / MICROS_PER_HOUR + 1) as usize;
    let rows = hours * keys.len();

    let mut time_bins = Vec::with_capacity(rows);
    let mut key_values: Vec<Vec<i64>> = vec![Vec::with_capacity(rows); key.columns().len()];

    for hour in 0..hours as i64 {
        let bucket = first + hour * MICROS_PER_HOUR;
        for k in &keys {
            time_bins.push(bucket);
            for (values, id) in key_values.iter_mut().zip(k) {
                values.push(*id);
            }
        }
    }

    let mut columns = vec![Column::new(TIME_BIN.into(), time_bins)];
    for (name, values) in key.columns().iter().zip(key_values) {
        columns.push(Column::new((*name).into(), values));
    }

    Ok(DataFrame::new(columns)?)
}
