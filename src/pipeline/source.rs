//! Raw trip sources: local CSV/Parquet files in TLC layout

use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::debug;

use super::error::{PipelineError, PipelineResult};
use super::schema::{
    MonthYear, VehicleType, DROPOFF_DATETIME, DROPOFF_LOCATION, PICKUP_DATETIME, PICKUP_LOCATION,
};

/// Vendor column names and their canonical replacements
const COLUMN_ALIASES: [(&str, &str); 6] = [
    ("tpep_pickup_datetime", PICKUP_DATETIME),
    ("tpep_dropoff_datetime", DROPOFF_DATETIME),
    ("lpep_pickup_datetime", PICKUP_DATETIME),
    ("lpep_dropoff_datetime", DROPOFF_DATETIME),
    ("PULocationID", PICKUP_LOCATION),
    ("DOLocationID", DROPOFF_LOCATION),
];

/// Supplies one month of raw trip rows in the canonical schema.
pub trait TripSource: Sync {
    fn load(&self, period: MonthYear, vehicle: VehicleType) -> PipelineResult<DataFrame>;
}

/// Reads `{vehicle}_tripdata_{YYYY}-{MM}.parquet` (or `.csv`) from a directory.
#[derive(Debug, Clone)]
pub struct LocalTripSource {
    root: PathBuf,
}

impl LocalTripSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the file for a month, preferring Parquet over CSV.
    pub fn path_for(&self, period: MonthYear, vehicle: VehicleType) -> PipelineResult<PathBuf> {
        let stem = trip_file_stem(period, vehicle);
        ["parquet", "csv"]
            .iter()
            .map(|ext| self.root.join(format!("{}.{}", stem, ext)))
            .find(|p| p.exists())
            .ok_or_else(|| {
                PipelineError::Source(format!(
                    "no {}.parquet or {}.csv in {}",
                    stem,
                    stem,
                    self.root.display()
                ))
            })
    }
}

impl TripSource for LocalTripSource {
    fn load(&self, period: MonthYear, vehicle: VehicleType) -> PipelineResult<DataFrame> {
        let path = self.path_for(period, vehicle)?;
        debug!(path = %path.display(), %period, "loading trip file");
        let lf = normalize_trip_columns(load_dataset(&path)?)?;
        Ok(lf.collect()?)
    }
}

/// File stem used by the TLC for a month of trips
pub fn trip_file_stem(period: MonthYear, vehicle: VehicleType) -> String {
    format!(
        "{}_tripdata_{:04}-{:02}",
        vehicle.as_str(),
        period.year,
        period.month
    )
}

/// Load a dataset from a file (CSV or Parquet based on extension)
pub fn load_dataset(path: &Path) -> PipelineResult<LazyFrame> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let lf = match extension.as_str() {
        "csv" => LazyCsvReader::new(path)
            .with_try_parse_dates(true)
            .finish()
            .map_err(|e| {
                PipelineError::Source(format!("failed to read CSV {}: {}", path.display(), e))
            })?,
        "parquet" => LazyFrame::scan_parquet(path, Default::default()).map_err(|e| {
            PipelineError::Source(format!("failed to read Parquet {}: {}", path.display(), e))
        })?,
        _ => {
            return Err(PipelineError::Source(format!(
                "unsupported file format '{}' for {}; supported formats: csv, parquet",
                extension,
                path.display()
            )))
        }
    };

    Ok(lf)
}

/// Rename TLC vendor columns to the canonical trip schema.
///
/// The renames are part of the lazy plan, so the collected frame's schema
/// carries the canonical names. Columns already in canonical form are left
/// alone, and only the first vendor alias of a canonical name is used.
pub fn normalize_trip_columns(mut lf: LazyFrame) -> PipelineResult<LazyFrame> {
    let schema = lf.collect_schema()?;

    let mut existing: Vec<&str> = Vec::new();
    let mut renamed: Vec<&str> = Vec::new();
    for (vendor, canonical) in COLUMN_ALIASES {
        if schema.contains(vendor) && !schema.contains(canonical) && !renamed.contains(&canonical)
        {
            existing.push(vendor);
            renamed.push(canonical);
        }
    }

    if existing.is_empty() {
        return Ok(lf);
    }
    debug!(columns = ?existing, "renaming vendor columns");
    Ok(lf.rename(existing, renamed, true))
}
