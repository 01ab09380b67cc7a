//! Multi-month aggregation: filter and bin each month, then concatenate

use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::binner::bin_trips;
use super::error::{PipelineError, PipelineResult};
use super::filter::filter_trips;
use super::schema::{binned_schema, BinKey, MonthYear, VehicleType};
use super::source::TripSource;
use crate::utils::create_month_bar;

/// Options shared by every month of a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOptions {
    pub vehicle: VehicleType,
    pub bin_key: BinKey,
    /// Include mean feature columns next to the counts
    pub aggregate_features: bool,
    /// Only keep trips starting and ending in these location ids
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_locations: Option<Vec<i64>>,
    /// Process months on the rayon pool instead of one after another
    pub parallel: bool,
    #[serde(skip)]
    pub show_progress: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            vehicle: VehicleType::Yellow,
            bin_key: BinKey::PickupDropoff,
            aggregate_features: true,
            allowed_locations: None,
            parallel: false,
            show_progress: false,
        }
    }
}

/// Load, filter and bin a single month.
pub fn process_month<S: TripSource + ?Sized>(
    source: &S,
    period: MonthYear,
    options: &PipelineOptions,
) -> PipelineResult<DataFrame> {
    options.vehicle.ensure_supported()?;

    let filtered = {
        let raw = source.load(period, options.vehicle)?;
        filter_trips(
            &raw,
            period,
            options.vehicle,
            options.allowed_locations.as_deref(),
        )?
    };

    let binned = bin_trips(&filtered, options.bin_key, options.aggregate_features)?;
    info!(
        %period,
        trips = filtered.height(),
        binned_rows = binned.height(),
        "binned month"
    );
    Ok(binned)
}

/// Run the filter and binner for every period and stack the results.
///
/// Blocks appear in the order of `periods`, whether or not months were
/// processed in parallel. A failing month aborts the batch. When several
/// months fail, the error of the earliest one in `periods` is returned in both
/// modes. An empty `periods` slice gives an empty table with the binned schema.
pub fn aggregate_months<S: TripSource + ?Sized>(
    source: &S,
    periods: &[MonthYear],
    options: &PipelineOptions,
) -> PipelineResult<DataFrame> {
    let pb = create_month_bar(periods.len(), options.show_progress);

    let run = |period: &MonthYear| -> PipelineResult<DataFrame> {
        let result = process_month(source, *period, options).map_err(|e| PipelineError::Month {
            period: *period,
            source: Box::new(e),
        });
        pb.inc(1);
        result
    };

    let frames: Vec<DataFrame> = if options.parallel {
        let results: Vec<PipelineResult<DataFrame>> = periods.par_iter().map(run).collect();
        results.into_iter().collect::<PipelineResult<Vec<_>>>()?
    } else {
        let mut frames = Vec::with_capacity(periods.len());
        for period in periods {
            frames.push(run(period)?);
        }
        frames
    };

    pb.finish_with_message(format!("Binned {} month(s)", periods.len()));

    let mut out = DataFrame::empty_with_schema(&binned_schema(
        options.bin_key,
        options.aggregate_features,
    ));
    for frame in &frames {
        out.vstack_mut(frame)?;
    }
    out.as_single_chunk();

    Ok(out)
}
