//! Shared test utilities and fixture generators

#![allow(dead_code)]

use chrono::NaiveDateTime;
use polars::prelude::*;
use std::path::PathBuf;
use taxibins::pipeline::*;
use tempfile::TempDir;

/// One raw trip record for fixture tables
#[derive(Debug, Clone)]
pub struct Trip {
    /// Local wall-clock pickup time, `YYYY-MM-DD HH:MM:SS`
    pub pickup: &'static str,
    pub minutes: i64,
    pub pu: i64,
    pub dropoff: i64,
    pub fare: f64,
    pub tip: f64,
    pub total: f64,
    pub distance: f64,
    pub passengers: f64,
}

impl Trip {
    /// A clean trip that passes every filter bound
    pub fn new(pickup: &'static str, pu: i64, dropoff: i64, fare: f64) -> Self {
        Self {
            pickup,
            minutes: 15,
            pu,
            dropoff,
            fare,
            tip: 2.0,
            total: fare + 2.0,
            distance: 3.0,
            passengers: 1.0,
        }
    }
}

/// Naive wall-clock time as epoch microseconds (no zone applied)
pub fn micros(s: &str) -> i64 {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .unwrap()
        .and_utc()
        .timestamp_micros()
}

fn naive_datetime_column(name: &str, values: Vec<i64>) -> Column {
    Int64Chunked::from_vec(name.into(), values)
        .into_datetime(TimeUnit::Microseconds, None)
        .into_series()
        .into()
}

/// Build a raw trip table in the canonical schema
pub fn trips_frame(trips: &[Trip]) -> DataFrame {
    let pickups: Vec<i64> = trips.iter().map(|t| micros(t.pickup)).collect();
    let dropoffs: Vec<i64> = trips
        .iter()
        .map(|t| micros(t.pickup) + t.minutes * 60_000_000)
        .collect();

    DataFrame::new(vec![
        naive_datetime_column(PICKUP_DATETIME, pickups),
        naive_datetime_column(DROPOFF_DATETIME, dropoffs),
        Column::new(PICKUP_LOCATION.into(), trips.iter().map(|t| t.pu).collect::<Vec<_>>()),
        Column::new(DROPOFF_LOCATION.into(), trips.iter().map(|t| t.dropoff).collect::<Vec<_>>()),
        Column::new(FARE_AMOUNT.into(), trips.iter().map(|t| t.fare).collect::<Vec<_>>()),
        Column::new(TIP_AMOUNT.into(), trips.iter().map(|t| t.tip).collect::<Vec<_>>()),
        Column::new(TOTAL_AMOUNT.into(), trips.iter().map(|t| t.total).collect::<Vec<_>>()),
        Column::new(TRIP_DISTANCE.into(), trips.iter().map(|t| t.distance).collect::<Vec<_>>()),
        Column::new(PASSENGER_COUNT.into(), trips.iter().map(|t| t.passengers).collect::<Vec<_>>()),
    ])
    .unwrap()
}

/// Build a raw trip table the way the TLC publishes it: `tpep_*` timestamps
/// and Int32 `PULocationID`/`DOLocationID`
pub fn tlc_trips_frame(trips: &[Trip]) -> DataFrame {
    let mut df = trips_frame(trips);
    for (name, vendor) in [(PICKUP_LOCATION, "PULocationID"), (DROPOFF_LOCATION, "DOLocationID")] {
        let ids = df.column(name).unwrap().cast(&DataType::Int32).unwrap();
        df.with_column(ids.with_name(vendor.into())).unwrap();
    }
    df.select([
        PICKUP_DATETIME,
        DROPOFF_DATETIME,
        "PULocationID",
        "DOLocationID",
        FARE_AMOUNT,
        TIP_AMOUNT,
        TOTAL_AMOUNT,
        TRIP_DISTANCE,
        PASSENGER_COUNT,
    ])
    .unwrap()
    .lazy()
    .rename(
        [PICKUP_DATETIME, DROPOFF_DATETIME],
        ["tpep_pickup_datetime", "tpep_dropoff_datetime"],
        true,
    )
    .collect()
    .unwrap()
}

/// Three January trips: two at 08:xx from 1→5 and one at 10:05 from 2→6
pub fn create_january_trips() -> DataFrame {
    trips_frame(&[
        Trip::new("2023-01-15 08:10:00", 1, 5, 10.0),
        Trip::new("2023-01-15 08:40:00", 1, 5, 20.0),
        Trip::new("2023-01-15 10:05:00", 2, 6, 30.0),
    ])
}

/// Create a larger random trip table for performance/stress tests
pub fn create_large_trip_dataframe(rows: usize, locations: i64) -> DataFrame {
    use rand::Rng;
    let mut rng = rand::thread_rng();

    let start = micros("2023-01-01 00:00:00");
    let month = 30 * 24 * 3_600_000_000i64;
    let pickups: Vec<i64> = (0..rows).map(|_| start + rng.gen_range(0..month)).collect();
    let dropoffs: Vec<i64> = pickups
        .iter()
        .map(|p| p + rng.gen_range(1..120) * 60_000_000)
        .collect();
    let fares: Vec<f64> = (0..rows).map(|_| rng.gen_range(3.0..80.0)).collect();

    DataFrame::new(vec![
        naive_datetime_column(PICKUP_DATETIME, pickups),
        naive_datetime_column(DROPOFF_DATETIME, dropoffs),
        Column::new(
            PICKUP_LOCATION.into(),
            (0..rows).map(|_| rng.gen_range(1..=locations)).collect::<Vec<i64>>(),
        ),
        Column::new(
            DROPOFF_LOCATION.into(),
            (0..rows).map(|_| rng.gen_range(1..=locations)).collect::<Vec<i64>>(),
        ),
        Column::new(TIP_AMOUNT.into(), fares.iter().map(|f| f * 0.15).collect::<Vec<_>>()),
        Column::new(TOTAL_AMOUNT.into(), fares.iter().map(|f| f * 1.2).collect::<Vec<_>>()),
        Column::new(FARE_AMOUNT.into(), fares),
        Column::new(
            TRIP_DISTANCE.into(),
            (0..rows).map(|_| rng.gen_range(0.1..30.0)).collect::<Vec<f64>>(),
        ),
        Column::new(
            PASSENGER_COUNT.into(),
            (0..rows).map(|_| rng.gen_range(1..5) as f64).collect::<Vec<f64>>(),
        ),
    ])
    .unwrap()
}

/// Build a small binned table with a tz-aware `time_bin` from UTC micros
pub fn binned_frame(
    utc_bins: Vec<i64>,
    pickups: Vec<i64>,
    dropoffs: Vec<i64>,
    counts: Vec<i64>,
    fares: Vec<f64>,
) -> DataFrame {
    let time_bin: Column = Int64Chunked::from_vec(TIME_BIN.into(), utc_bins)
        .into_datetime(
            TimeUnit::Microseconds,
            Some(timezone::CIVIL_TZ_NAME.into()),
        )
        .into_series()
        .into();

    DataFrame::new(vec![
        time_bin,
        Column::new(PICKUP_LOCATION.into(), pickups),
        Column::new(DROPOFF_LOCATION.into(), dropoffs),
        Column::new(COUNT.into(), counts),
        Column::new(FARE_AMOUNT.into(), fares),
    ])
    .unwrap()
}

/// Write `df` as `{vehicle}_tripdata_{period}` into a fresh directory
pub fn create_trip_dir(df: &mut DataFrame, period: MonthYear, ext: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir
        .path()
        .join(format!("{}.{}", trip_file_stem(period, VehicleType::Yellow), ext));

    let mut file = std::fs::File::create(&path).unwrap();
    match ext {
        "csv" => CsvWriter::new(&mut file).finish(df).unwrap(),
        _ => ParquetWriter::new(file).finish(df).map(|_| ()).unwrap(),
    }

    (temp_dir, path)
}

/// Time-bin column as UTC epoch microseconds
pub fn bins_as_micros(df: &DataFrame) -> Vec<i64> {
    df.column(TIME_BIN)
        .unwrap()
        .cast(&DataType::Int64)
        .unwrap()
        .i64()
        .unwrap()
        .into_no_null_iter()
        .collect()
}

pub fn i64_values(df: &DataFrame, name: &str) -> Vec<i64> {
    df.column(name)
        .unwrap()
        .i64()
        .unwrap()
        .into_no_null_iter()
        .collect()
}

pub fn f64_values(df: &DataFrame, name: &str) -> Vec<f64> {
    df.column(name)
        .unwrap()
        .f64()
        .unwrap()
        .into_no_null_iter()
        .collect()
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}

/// Assert that a DataFrame contains specific columns
pub fn assert_has_columns(df: &DataFrame, expected_cols: &[&str]) {
    let actual_cols: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for col in expected_cols {
        assert!(
            actual_cols.contains(&col.to_string()),
            "Missing expected column: '{}'. Actual columns: {:?}",
            col,
            actual_cols
        );
    }
}
