//! Canonical trip schema, vehicle types, bin keys and batch periods

use std::fmt;
use std::str::FromStr;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::error::{PipelineError, PipelineResult};

pub const PICKUP_DATETIME: &str = "pickup_datetime";
pub const DROPOFF_DATETIME: &str = "dropoff_datetime";
pub const PICKUP_LOCATION: &str = "pu_location_id";
pub const DROPOFF_LOCATION: &str = "do_location_id";

pub const FARE_AMOUNT: &str = "fare_amount";
pub const TIP_AMOUNT: &str = "tip_amount";
pub const TOTAL_AMOUNT: &str = "total_amount";
pub const TRIP_DISTANCE: &str = "trip_distance";
pub const PASSENGER_COUNT: &str = "passenger_count";
pub const TRIP_DURATION: &str = "trip_duration";

/// Hourly bucket column of every binned table
pub const TIME_BIN: &str = "time_bin";
/// Trip count column of every binned table
pub const COUNT: &str = "count";

/// Continuous features, in output column order
pub const FEATURE_COLUMNS: [&str; 6] = [
    TOTAL_AMOUNT,
    TIP_AMOUNT,
    FARE_AMOUNT,
    TRIP_DISTANCE,
    PASSENGER_COUNT,
    TRIP_DURATION,
];

/// Columns rescaled by the fare-policy adjustment
pub const FARE_COLUMNS: [&str; 3] = [FARE_AMOUNT, TOTAL_AMOUNT, TIP_AMOUNT];

/// Raw columns the data source must supply (duration is derived)
pub const RAW_FEATURE_COLUMNS: [&str; 5] = [
    FARE_AMOUNT,
    TIP_AMOUNT,
    TOTAL_AMOUNT,
    TRIP_DISTANCE,
    PASSENGER_COUNT,
];

/// Vehicle categories published by the TLC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    Yellow,
    Green,
    Fhv,
    Fhvhv,
}

impl VehicleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Yellow => "yellow",
            VehicleType::Green => "green",
            VehicleType::Fhv => "fhv",
            VehicleType::Fhvhv => "fhvhv",
        }
    }

    /// Only yellow-cab records have an implemented cleaning schema.
    pub fn ensure_supported(&self) -> PipelineResult<()> {
        match self {
            VehicleType::Yellow => Ok(()),
            other => Err(PipelineError::InvalidVehicleType(other.as_str().to_string())),
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleType {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yellow" => Ok(VehicleType::Yellow),
            "green" => Ok(VehicleType::Green),
            "fhv" => Ok(VehicleType::Fhv),
            "fhvhv" | "hvfhv" => Ok(VehicleType::Fhvhv),
            _ => Err(PipelineError::InvalidVehicleType(s.to_string())),
        }
    }
}

/// Location dimension(s) a table is binned by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinKey {
    Pickup,
    Dropoff,
    PickupDropoff,
}

impl BinKey {
    /// Resolve a list of key names into a supported key shape.
    ///
    /// Accepts canonical column names (`pu_location_id`), TLC names
    /// (`PULocationID`) and the short forms `pickup`/`dropoff`. Order does
    /// not matter; duplicates and anything else are rejected.
    pub fn from_columns<S: AsRef<str>>(names: &[S]) -> PipelineResult<Self> {
        let mut pickup = false;
        let mut dropoff = false;

        for name in names {
            let slot = match name.as_ref().trim() {
                "pickup" | PICKUP_LOCATION | "PULocationID" => &mut pickup,
                "dropoff" | DROPOFF_LOCATION | "DOLocationID" => &mut dropoff,
                _ => return Err(invalid_key(names)),
            };
            if *slot {
                return Err(invalid_key(names));
            }
            *slot = true;
        }

        match (pickup, dropoff) {
            (true, false) => Ok(BinKey::Pickup),
            (false, true) => Ok(BinKey::Dropoff),
            (true, true) => Ok(BinKey::PickupDropoff),
            (false, false) => Err(invalid_key(names)),
        }
    }

    /// Key columns in canonical (pickup, dropoff) order
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            BinKey::Pickup => &[PICKUP_LOCATION],
            BinKey::Dropoff => &[DROPOFF_LOCATION],
            BinKey::PickupDropoff => &[PICKUP_LOCATION, DROPOFF_LOCATION],
        }
    }

    pub fn is_dual(&self) -> bool {
        matches!(self, BinKey::PickupDropoff)
    }
}

impl fmt::Display for BinKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.columns().join(","))
    }
}

fn invalid_key<S: AsRef<str>>(names: &[S]) -> PipelineError {
    let joined = names
        .iter()
        .map(|n| n.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    PipelineError::InvalidBinKey(joined)
}

/// A (year, month) batch unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthYear {
    pub year: i32,
    pub month: u32,
}

impl MonthYear {
    pub fn new(year: i32, month: u32) -> PipelineResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(PipelineError::InvalidPeriod(format!("{}-{}", year, month)));
        }
        Ok(Self { year, month })
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Every month from `start` to `end`, both inclusive. Empty if `end < start`.
    pub fn range(start: MonthYear, end: MonthYear) -> Vec<MonthYear> {
        let mut periods = Vec::new();
        let mut current = start;
        while current <= end {
            periods.push(current);
            current = current.next();
        }
        periods
    }
}

impl fmt::Display for MonthYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthYear {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PipelineError::InvalidPeriod(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        MonthYear::new(year, month).map_err(|_| invalid())
    }
}

/// Check that a raw trip table carries every required column with a usable dtype.
pub fn validate_trip_schema(df: &DataFrame) -> PipelineResult<()> {
    let schema = df.schema();

    let require = |name: &str, ok: fn(&DataType) -> bool, expected: &str| {
        match schema.get(name) {
            None => Err(PipelineError::SchemaViolation(format!(
                "required column '{}' is missing",
                name
            ))),
            Some(dtype) if !ok(dtype) => Err(PipelineError::SchemaViolation(format!(
                "column '{}' has dtype {}, expected {}",
                name, dtype, expected
            ))),
            Some(_) => Ok(()),
        }
    };

    for name in [PICKUP_DATETIME, DROPOFF_DATETIME] {
        require(name, |dt| matches!(dt, DataType::Datetime(_, _)), "datetime")?;
    }
    for name in [PICKUP_LOCATION, DROPOFF_LOCATION] {
        require(name, |dt| dt.is_integer(), "integer")?;
    }
    for name in RAW_FEATURE_COLUMNS {
        require(name, |dt| dt.is_primitive_numeric(), "numeric")?;
    }

    Ok(())
}

/// Output schema of a binned table for the given key shape
pub fn binned_schema(key: BinKey, aggregate_features: bool) -> Schema {
    let mut fields = vec![Field::new(
        TIME_BIN.into(),
        DataType::Datetime(TimeUnit::Microseconds, Some(super::timezone::CIVIL_TZ_NAME.into())),
    )];
    for name in key.columns() {
        fields.push(Field::new((*name).into(), DataType::Int64));
    }
    fields.push(Field::new(COUNT.into(), DataType::Int64));
    if aggregate_features {
        for name in FEATURE_COLUMNS {
            fields.push(Field::new(name.into(), DataType::Float64));
        }
    }
    Schema::from_iter(fields)
}
