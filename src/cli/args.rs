//! Command-line argument definitions using clap

use clap::Parser;
use std::path::PathBuf;

use crate::pipeline::{
    BinKey, MonthYear, PipelineOptions, PipelineResult, PostprocessOptions, VehicleType,
};

/// taxibins - Turn monthly taxi-trip records into dense hourly location panels
#[derive(Parser, Debug)]
#[command(name = "taxibins")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding {vehicle}_tripdata_{YYYY}-{MM}.parquet (or .csv) files
    #[arg(short, long)]
    pub data_dir: PathBuf,

    /// Vehicle type: yellow, green, fhv or fhvhv.
    /// Only yellow trip records can currently be binned.
    #[arg(long, default_value = "yellow", value_parser = parse_vehicle)]
    pub vehicle: VehicleType,

    /// First month to process (YYYY-MM)
    #[arg(short, long, value_parser = parse_month)]
    pub start: MonthYear,

    /// Last month to process, inclusive (YYYY-MM). Defaults to --start.
    #[arg(short, long, value_parser = parse_month)]
    pub end: Option<MonthYear>,

    /// Location key columns to bin by (comma-separated).
    /// Options: pu_location_id, do_location_id, or both.
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "pu_location_id,do_location_id",
        value_parser = parse_key_column
    )]
    pub bin_key: Vec<String>,

    /// Only count trips; skip the mean feature columns
    #[arg(long, default_value = "false")]
    pub no_features: bool,

    /// Keep only trips whose pickup and dropoff are in these location ids (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub locations: Vec<i64>,

    /// Scale fare, tip and total by 1.23 for buckets up to 2022-12-19 (one-time fare change)
    #[arg(long, default_value = "false")]
    pub adjust_fares: bool,

    /// Replace zero feature values with the mean of nonzero values per reduction-key group
    #[arg(long, default_value = "false")]
    pub gap_fill: bool,

    /// Columns grouping the gap-fill means (comma-separated)
    #[arg(long, value_delimiter = ',', default_value = "do_location_id,pu_location_id")]
    pub reduction_key: Vec<String>,

    /// Collapse the pickup/dropoff table onto this pickup location id
    #[arg(long)]
    pub reduce_pickup: Option<i64>,

    /// Process months in parallel (uses more memory; output order is unchanged)
    #[arg(long, default_value = "false")]
    pub parallel: bool,

    /// Output file path (CSV or Parquet, determined by extension).
    /// Defaults to {data-dir}/{vehicle}_binned_{start}_{end}.parquet
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write a JSON run report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Skip interactive confirmation prompts
    #[arg(long, default_value = "false")]
    pub no_confirm: bool,
}

impl Cli {
    /// Every month from --start to --end, inclusive
    pub fn periods(&self) -> Vec<MonthYear> {
        MonthYear::range(self.start, self.end.unwrap_or(self.start))
    }

    pub fn bin_key(&self) -> PipelineResult<BinKey> {
        BinKey::from_columns(self.bin_key.as_slice())
    }

    pub fn pipeline_options(&self) -> PipelineResult<PipelineOptions> {
        Ok(PipelineOptions {
            vehicle: self.vehicle,
            bin_key: self.bin_key()?,
            aggregate_features: !self.no_features,
            allowed_locations: if self.locations.is_empty() {
                None
            } else {
                Some(self.locations.clone())
            },
            parallel: self.parallel,
            show_progress: true,
        })
    }

    pub fn postprocess_options(&self) -> PostprocessOptions {
        PostprocessOptions {
            adjust_fares: self.adjust_fares,
            gap_fill: self.gap_fill,
            reduction_key: self.reduction_key.clone(),
        }
    }

    /// Get the output path, deriving it from the data directory if not explicitly provided.
    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            let end = self.end.unwrap_or(self.start);
            self.data_dir.join(format!(
                "{}_binned_{}_{}.parquet",
                self.vehicle, self.start, end
            ))
        })
    }
}

/// Validator for vehicle type names
fn parse_vehicle(s: &str) -> Result<VehicleType, String> {
    s.parse::<VehicleType>().map_err(|e| e.to_string())
}

/// Validator for a single location key column name
fn parse_key_column(s: &str) -> Result<String, String> {
    BinKey::from_columns(&[s])
        .map(|_| s.trim().to_string())
        .map_err(|e| e.to_string())
}

/// Validator for YYYY-MM months
fn parse_month(s: &str) -> Result<MonthYear, String> {
    s.parse::<MonthYear>().map_err(|e| e.to_string())
}
