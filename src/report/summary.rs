//! Summary display using comfy-table

use std::collections::HashSet;
use std::time::Duration;

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;
use polars::prelude::*;
use serde::Serialize;

use crate::pipeline::{PipelineResult, COUNT, DROPOFF_LOCATION, PICKUP_LOCATION, TIME_BIN};

/// Shape statistics of a binned table
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableStats {
    pub rows: usize,
    pub buckets: usize,
    pub locations: usize,
    pub trips: i64,
    pub empty_bins: usize,
}

impl TableStats {
    /// Collect statistics from any table with `time_bin` and `count` columns.
    /// Location keys are counted over whichever of pickup/dropoff are present.
    pub fn from_frame(df: &DataFrame) -> PipelineResult<Self> {
        if df.height() == 0 {
            return Ok(Self::default());
        }

        let counts = df.column(COUNT)?.cast(&DataType::Int64)?;
        let counts = counts.i64()?;
        let trips = counts.sum().unwrap_or(0);
        let empty_bins = counts.into_iter().filter(|c| *c == Some(0)).count();
        let buckets = df.column(TIME_BIN)?.n_unique()?;

        let key_columns = [PICKUP_LOCATION, DROPOFF_LOCATION]
            .iter()
            .filter_map(|name| df.column(name).ok())
            .map(|column| column.cast(&DataType::Int64))
            .collect::<PolarsResult<Vec<_>>>()?;
        let key_arrays = key_columns
            .iter()
            .map(|column| column.i64())
            .collect::<PolarsResult<Vec<_>>>()?;
        let locations: HashSet<Vec<Option<i64>>> = (0..df.height())
            .map(|row| key_arrays.iter().map(|ca| ca.get(row)).collect())
            .collect();

        Ok(Self {
            rows: df.height(),
            buckets,
            locations: if key_arrays.is_empty() { 0 } else { locations.len() },
            trips,
            empty_bins,
        })
    }

    /// Share of rows with no observed trips
    pub fn empty_share(&self) -> f64 {
        if self.rows == 0 {
            0.0
        } else {
            self.empty_bins as f64 / self.rows as f64
        }
    }
}

/// Summary of a binning run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub months: usize,
    pub stats: TableStats,
    pub bin_time: Option<Duration>,
    pub postprocess_time: Option<Duration>,
    pub reduce_time: Option<Duration>,
    pub save_time: Option<Duration>,
}

impl RunSummary {
    pub fn new(months: usize) -> Self {
        Self {
            months,
            ..Default::default()
        }
    }

    pub fn set_stats(&mut self, stats: TableStats) {
        self.stats = stats;
    }

    pub fn set_bin_time(&mut self, elapsed: Duration) {
        self.bin_time = Some(elapsed);
    }

    pub fn set_postprocess_time(&mut self, elapsed: Duration) {
        self.postprocess_time = Some(elapsed);
    }

    pub fn set_reduce_time(&mut self, elapsed: Duration) {
        self.reduce_time = Some(elapsed);
    }

    pub fn set_save_time(&mut self, elapsed: Duration) {
        self.save_time = Some(elapsed);
    }

    pub fn total_time(&self) -> Duration {
        [
            self.bin_time,
            self.postprocess_time,
            self.reduce_time,
            self.save_time,
        ]
        .iter()
        .flatten()
        .sum()
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style("RUN SUMMARY").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![Cell::new("📅 Months"), Cell::new(self.months)]);
        table.add_row(vec![Cell::new("🕐 Hourly Buckets"), Cell::new(self.stats.buckets)]);
        table.add_row(vec![Cell::new("📍 Locations"), Cell::new(self.stats.locations)]);
        table.add_row(vec![
            Cell::new("🚕 Trips Binned"),
            Cell::new(self.stats.trips)
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);
        table.add_row(vec![Cell::new("🧮 Output Rows"), Cell::new(self.stats.rows)]);

        let empty_pct = self.stats.empty_share() * 100.0;
        let color = if empty_pct > 75.0 {
            Color::Red
        } else if empty_pct > 40.0 {
            Color::Yellow
        } else {
            Color::Cyan
        };
        table.add_row(vec![
            Cell::new("🕳️  Empty Bins"),
            Cell::new(format!("{} ({:.1}%)", self.stats.empty_bins, empty_pct)).fg(color),
        ]);

        table.add_row(vec![
            Cell::new("⏱  Total Time"),
            Cell::new(format!("{:.2}s", self.total_time().as_secs_f64())),
        ]);

        // Indent the table
        for line in table.to_string().lines() {
            println!("    {}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_stats_counts_empty_bins_and_pairs() {
        let df = df! {
            TIME_BIN => [0i64, 0, 1, 1],
            PICKUP_LOCATION => [1i64, 2, 1, 2],
            DROPOFF_LOCATION => [5i64, 5, 5, 5],
            COUNT => [3i64, 0, 0, 1],
        }
        .unwrap();

        let stats = TableStats::from_frame(&df).unwrap();
        assert_eq!(stats.rows, 4);
        assert_eq!(stats.buckets, 2);
        assert_eq!(stats.locations, 2);
        assert_eq!(stats.trips, 4);
        assert_eq!(stats.empty_bins, 2);
        assert!((stats.empty_share() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_total_time_sums_recorded_steps() {
        let mut summary = RunSummary::new(2);
        summary.set_bin_time(Duration::from_millis(1500));
        summary.set_save_time(Duration::from_millis(500));
        assert_eq!(summary.total_time(), Duration::from_secs(2));
    }
}
