//! taxibins: Hourly Taxi-Trip Binning CLI
//!
//! A command-line tool that turns monthly taxi-trip files into dense
//! hourly location panels.

mod cli;
mod pipeline;
mod report;
mod utils;

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use polars::prelude::*;
use tracing_subscriber::EnvFilter;

use cli::{confirm_batch, confirm_overwrite, Cli};
use pipeline::{aggregate_months, postprocess, reduce_to_pickup, LocalTripSource};
use report::{build_run_report, export_run_report, ReportParams, RunSummary, StepTimings, TableStats};
use utils::{
    create_spinner, finish_with_success, print_banner, print_completion, print_config,
    print_info, print_step_header, print_step_time, print_success,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let periods = cli.periods();
    if periods.is_empty() {
        anyhow::bail!(
            "--end ({}) is before --start ({})",
            cli.end.map(|e| e.to_string()).unwrap_or_default(),
            cli.start
        );
    }
    let options = cli.pipeline_options()?;
    let post = cli.postprocess_options();
    let output_path = cli.output_path();

    if cli.reduce_pickup.is_some() && !options.bin_key.is_dual() {
        anyhow::bail!(
            "--reduce-pickup needs a pickup and dropoff bin key, got '{}'",
            options.bin_key
        );
    }

    if !cli.no_confirm {
        let proceed = (!output_path.exists() || confirm_overwrite(&output_path)?)
            && confirm_batch(&periods, options.parallel)?;
        if !proceed {
            println!("Cancelled by user.");
            return Ok(());
        }
    }

    // Print styled banner
    print_banner(env!("CARGO_PKG_VERSION"));

    // Print configuration card
    print_config(&cli.data_dir, &periods, &output_path, &options, &post);

    let mut summary = RunSummary::new(periods.len());
    let mut timings = StepTimings::default();

    // Step 1: Filter and bin every month
    print_step_header(1, "Filter & Bin Trips");

    let step_start = Instant::now();
    let source = LocalTripSource::new(&cli.data_dir);
    let mut df = aggregate_months(&source, &periods, &options)?;
    print_success(&format!(
        "Binned {} month(s) into {} rows",
        periods.len(),
        df.height()
    ));
    let bin_elapsed = step_start.elapsed();
    summary.set_bin_time(bin_elapsed);
    timings.bin_seconds = bin_elapsed.as_secs_f64();
    print_step_time(bin_elapsed);

    // Step 2: Fare adjustment and gap filling
    print_step_header(2, "Post-process");

    if post.adjust_fares || post.gap_fill {
        let step_start = Instant::now();
        let spinner = create_spinner("Adjusting binned values...");
        df = postprocess(&df, &post)?;
        finish_with_success(&spinner, "Post-processing complete");
        let post_elapsed = step_start.elapsed();
        summary.set_postprocess_time(post_elapsed);
        timings.postprocess_seconds = Some(post_elapsed.as_secs_f64());
        print_step_time(post_elapsed);
    } else {
        print_info("No post-processing requested");
    }

    // Step 3: Optional pickup reduction
    print_step_header(3, "Location Reduction");

    if let Some(pickup) = cli.reduce_pickup {
        let step_start = Instant::now();
        df = reduce_to_pickup(&df, Some(pickup))?;
        print_success(&format!(
            "Reduced to pickup location {} ({} rows)",
            style(pickup).yellow(),
            df.height()
        ));
        let reduce_elapsed = step_start.elapsed();
        summary.set_reduce_time(reduce_elapsed);
        timings.reduce_seconds = Some(reduce_elapsed.as_secs_f64());
        print_step_time(reduce_elapsed);
    } else {
        print_info("Keeping the full location table");
    }

    let stats = TableStats::from_frame(&df)?;
    summary.set_stats(stats.clone());

    // Step 4: Save output
    print_step_header(4, "Save Results");

    let step_start = Instant::now();
    let spinner = create_spinner("Writing output file...");
    save_dataset(&mut df, &output_path)?;
    finish_with_success(&spinner, &format!("Saved to {}", output_path.display()));
    let save_elapsed = step_start.elapsed();
    summary.set_save_time(save_elapsed);
    timings.save_seconds = save_elapsed.as_secs_f64();
    print_step_time(save_elapsed);

    if let Some(report_path) = &cli.report {
        let report = build_run_report(ReportParams {
            data_dir: &cli.data_dir,
            output_file: &output_path,
            periods: &periods,
            pipeline: &options,
            postprocess: &post,
            reduced_pickup: cli.reduce_pickup,
            stats: &stats,
            timings,
        });
        export_run_report(&report, report_path)?;
        print_success(&format!("Run report written to {}", report_path.display()));
    }

    // Display summary
    summary.display();

    // Final completion message
    print_completion();

    Ok(())
}

/// Save dataset to file (CSV or Parquet based on extension)
fn save_dataset(df: &mut DataFrame, path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "csv" => {
            let mut file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            CsvWriter::new(&mut file)
                .finish(df)
                .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;
        }
        "parquet" => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            ParquetWriter::new(file)
                .finish(df)
                .with_context(|| format!("Failed to write Parquet file: {}", path.display()))?;
        }
        _ => anyhow::bail!(
            "Unsupported output format: {}. Supported formats: csv, parquet",
            extension
        ),
    }

    Ok(())
}
