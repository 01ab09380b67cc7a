//! Record filter: drops invalid trips and derives trip duration

use std::collections::HashSet;

use polars::prelude::*;
use tracing::debug;

use super::error::PipelineResult;
use super::schema::*;

const MICROS_PER_MINUTE: f64 = 60_000_000.0;

/// Open upper bounds on continuous features (lower bound is 0, exclusive,
/// except for tips where 0 is allowed)
pub const MAX_TRIP_DISTANCE: f64 = 500.0;
pub const MAX_TOTAL_AMOUNT: f64 = 5000.0;
pub const MAX_FARE_AMOUNT: f64 = 5000.0;
pub const MAX_TIP_AMOUNT: f64 = 1000.0;
pub const MAX_TRIP_DURATION: f64 = 600.0;
pub const MAX_PASSENGER_COUNT: f64 = 10.0;

/// Clean one month of raw trips.
///
/// Keeps rows whose pickup falls in `period`, whose locations are in
/// `allowed_locations` (when given) and whose features are inside their
/// plausible bounds. Output holds the canonical columns plus
/// `trip_duration` (minutes), ids as Int64 and features as Float64.
///
/// # Errors
/// * `InvalidVehicleType` for anything other than yellow cabs
/// * `SchemaViolation` if a required column is missing or mistyped
pub fn filter_trips(
    df: &DataFrame,
    period: MonthYear,
    vehicle: VehicleType,
    allowed_locations: Option<&[i64]>,
) -> PipelineResult<DataFrame> {
    vehicle.ensure_supported()?;
    validate_trip_schema(df)?;

    let input_rows = df.height();
    let df = match allowed_locations {
        Some(locations) => restrict_locations(df, locations)?,
        None => df.clone(),
    };

    let mut casts = vec![
        col(PICKUP_DATETIME).cast(DataType::Datetime(TimeUnit::Microseconds, None)),
        col(DROPOFF_DATETIME).cast(DataType::Datetime(TimeUnit::Microseconds, None)),
        col(PICKUP_LOCATION).cast(DataType::Int64),
        col(DROPOFF_LOCATION).cast(DataType::Int64),
    ];
    casts.extend(
        RAW_FEATURE_COLUMNS
            .iter()
            .map(|name| col(*name).cast(DataType::Float64)),
    );

    let duration = (col(DROPOFF_DATETIME).cast(DataType::Int64)
        - col(PICKUP_DATETIME).cast(DataType::Int64))
    .cast(DataType::Float64)
        / lit(MICROS_PER_MINUTE);

    let mut output: Vec<Expr> = [PICKUP_DATETIME, DROPOFF_DATETIME, PICKUP_LOCATION, DROPOFF_LOCATION]
        .iter()
        .chain(RAW_FEATURE_COLUMNS.iter())
        .map(|name| col(*name))
        .collect();
    output.push(col(TRIP_DURATION));

    let filtered = df
        .lazy()
        .with_columns(casts)
        .with_column(duration.alias(TRIP_DURATION))
        .filter(trip_predicate(period))
        .select(output)
        .collect()?;

    debug!(
        %period,
        input_rows,
        kept_rows = filtered.height(),
        "filtered trip records"
    );

    Ok(filtered)
}

/// Row predicate for a clean trip in `period`. Nulls never pass.
fn trip_predicate(period: MonthYear) -> Expr {
    let not_null = [PICKUP_DATETIME, DROPOFF_DATETIME, PICKUP_LOCATION, DROPOFF_LOCATION]
        .iter()
        .chain(RAW_FEATURE_COLUMNS.iter())
        .fold(lit(true), |acc, name| acc.and(col(*name).is_not_null()));

    let in_period = col(PICKUP_DATETIME)
        .dt()
        .year()
        .eq(lit(period.year))
        .and(col(PICKUP_DATETIME).dt().month().eq(lit(period.month as i32)));

    not_null
        .and(in_period)
        .and(open_range(TRIP_DISTANCE, MAX_TRIP_DISTANCE))
        .and(open_range(TOTAL_AMOUNT, MAX_TOTAL_AMOUNT))
        .and(open_range(FARE_AMOUNT, MAX_FARE_AMOUNT))
        .and(
            col(TIP_AMOUNT)
                .gt_eq(lit(0.0))
                .and(col(TIP_AMOUNT).lt(lit(MAX_TIP_AMOUNT))),
        )
        .and(open_range(TRIP_DURATION, MAX_TRIP_DURATION))
        .and(open_range(PASSENGER_COUNT, MAX_PASSENGER_COUNT))
}

/// `0 < column < upper`
fn open_range(name: &str, upper: f64) -> Expr {
    col(name).gt(lit(0.0)).and(col(name).lt(lit(upper)))
}

/// Keep rows whose pickup and dropoff ids are both in `locations`.
fn restrict_locations(df: &DataFrame, locations: &[i64]) -> PipelineResult<DataFrame> {
    let allowed: HashSet<i64> = locations.iter().copied().collect();

    let pickup = df.column(PICKUP_LOCATION)?.cast(&DataType::Int64)?;
    let dropoff = df.column(DROPOFF_LOCATION)?.cast(&DataType::Int64)?;

    let mask: BooleanChunked = pickup
        .i64()?
        .into_iter()
        .zip(dropoff.i64()?.into_iter())
        .map(|pair| match pair {
            (Some(pu), Some(dl)) => allowed.contains(&pu) && allowed.contains(&dl),
            _ => false,
        })
        .collect();

    Ok(df.filter(&mask)?)
}
