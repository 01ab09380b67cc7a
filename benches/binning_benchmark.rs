//! Benchmark the record filter and hourly binner on synthetic trips
//!
//! Run with: cargo bench --bench binning_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use polars::prelude::*;
use rand::prelude::*;
use rand::SeedableRng;

use taxibins::pipeline::*;

const MICROS_PER_MINUTE: i64 = 60_000_000;

/// Generate one month of clean-ish trips over `locations` zones
fn generate_trips(n_rows: usize, locations: i64, seed: u64) -> DataFrame {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);

    // 2023-01-01T00:00:00 as naive epoch micros
    let start = 1_672_531_200_000_000i64;
    let month = 31 * 24 * 60 * MICROS_PER_MINUTE;

    let pickups: Vec<i64> = (0..n_rows).map(|_| start + rng.gen_range(0..month)).collect();
    let dropoffs: Vec<i64> = pickups
        .iter()
        .map(|p| p + rng.gen_range(1..90) * MICROS_PER_MINUTE)
        .collect();
    let fares: Vec<f64> = (0..n_rows).map(|_| rng.gen_range(3.0..70.0)).collect();

    let datetime = |name: &str, values: Vec<i64>| -> Column {
        Int64Chunked::from_vec(name.into(), values)
            .into_datetime(TimeUnit::Microseconds, None)
            .into_series()
            .into()
    };

    DataFrame::new(vec![
        datetime(PICKUP_DATETIME, pickups),
        datetime(DROPOFF_DATETIME, dropoffs),
        Column::new(
            PICKUP_LOCATION.into(),
            (0..n_rows).map(|_| rng.gen_range(1..=locations)).collect::<Vec<i64>>(),
        ),
        Column::new(
            DROPOFF_LOCATION.into(),
            (0..n_rows).map(|_| rng.gen_range(1..=locations)).collect::<Vec<i64>>(),
        ),
        Column::new(TIP_AMOUNT.into(), fares.iter().map(|f| f * 0.18).collect::<Vec<_>>()),
        Column::new(TOTAL_AMOUNT.into(), fares.iter().map(|f| f * 1.25).collect::<Vec<_>>()),
        Column::new(FARE_AMOUNT.into(), fares),
        Column::new(
            TRIP_DISTANCE.into(),
            (0..n_rows).map(|_| rng.gen_range(0.2..25.0)).collect::<Vec<f64>>(),
        ),
        Column::new(
            PASSENGER_COUNT.into(),
            (0..n_rows).map(|_| rng.gen_range(1..5) as f64).collect::<Vec<f64>>(),
        ),
    ])
    .expect("Failed to create DataFrame")
}

fn january() -> MonthYear {
    MonthYear::new(2023, 1).expect("valid month")
}

/// Filter throughput for growing month sizes
fn benchmark_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_trips");

    for n_rows in [10_000, 100_000] {
        let df = generate_trips(n_rows, 50, 42);
        group.throughput(Throughput::Elements(n_rows as u64));

        group.bench_with_input(BenchmarkId::from_parameter(n_rows), &df, |b, df| {
            b.iter(|| {
                let _ = filter_trips(black_box(df), january(), VehicleType::Yellow, None);
            });
        });
    }

    group.finish();
}

/// Binner cost per key shape; the dual key materializes the largest grid
fn benchmark_bin_keys(c: &mut Criterion) {
    let mut group = c.benchmark_group("bin_trips_keys");

    let df = filter_trips(&generate_trips(50_000, 30, 7), january(), VehicleType::Yellow, None)
        .expect("filter succeeds on synthetic trips");
    group.throughput(Throughput::Elements(df.height() as u64));

    for (name, key) in [
        ("pickup", BinKey::Pickup),
        ("dropoff", BinKey::Dropoff),
        ("pickup_dropoff", BinKey::PickupDropoff),
    ] {
        group.bench_with_input(BenchmarkId::new(name, df.height()), &df, |b, df| {
            b.iter(|| {
                let _ = bin_trips(black_box(df), black_box(key), black_box(true));
            });
        });
    }

    group.finish();
}

/// Count-only binning vs full feature means
fn benchmark_features(c: &mut Criterion) {
    let mut group = c.benchmark_group("bin_trips_features");

    let df = filter_trips(&generate_trips(50_000, 30, 11), january(), VehicleType::Yellow, None)
        .expect("filter succeeds on synthetic trips");

    for aggregate_features in [false, true] {
        group.bench_with_input(
            BenchmarkId::new("features", aggregate_features),
            &df,
            |b, df| {
                b.iter(|| {
                    let _ = bin_trips(
                        black_box(df),
                        BinKey::PickupDropoff,
                        black_box(aggregate_features),
                    );
                });
            },
        );
    }

    group.finish();
}

/// Gap fill and reduction on an already binned table
fn benchmark_postprocess(c: &mut Criterion) {
    let mut group = c.benchmark_group("postprocess");

    let trips = filter_trips(&generate_trips(50_000, 20, 3), january(), VehicleType::Yellow, None)
        .expect("filter succeeds on synthetic trips");
    let binned = bin_trips(&trips, BinKey::PickupDropoff, true).expect("binning succeeds");
    group.throughput(Throughput::Elements(binned.height() as u64));

    group.bench_function("gap_fill", |b| {
        b.iter(|| {
            let _ = gap_fill(black_box(&binned), &[DROPOFF_LOCATION, PICKUP_LOCATION]);
        });
    });

    group.bench_function("reduce_to_pickup", |b| {
        b.iter(|| {
            let _ = reduce_to_pickup(black_box(&binned), None);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_filter,
    benchmark_bin_keys,
    benchmark_features,
    benchmark_postprocess,
);
criterion_main!(benches);
