//! Terminal styling utilities for the binning CLI

use console::{style, Emoji};
use std::path::Path;

use crate::pipeline::{MonthYear, PipelineOptions, PostprocessOptions};

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");
pub static CALENDAR: Emoji<'_, '_> = Emoji("📅 ", "");
pub static TAXI: Emoji<'_, '_> = Emoji("🚕 ", "");
pub static SAVE: Emoji<'_, '_> = Emoji("💾 ", "");
pub static PIN: Emoji<'_, '_> = Emoji("📍 ", "");

/// Print the application banner
pub fn print_banner(version: &str) {
    let banner = r#"
    ╔╦╗╔═╗═╗ ╦╦  ╔╗ ╦╔╗╔╔═╗
     ║ ╠═╣╔╩╦╝║  ╠╩╗║║║║╚═╗
     ╩ ╩ ╩╩ ╚═╩  ╚═╝╩╝╚╝╚═╝
    "#;

    println!();
    println!("{}", style(banner).yellow().bold());
    println!(
        "    {}",
        style("Hourly taxi-trip panels by location").dim()
    );
    println!("    {}", style(format!("v{}", version)).dim());
    println!("    {}", style("━".repeat(50)).dim());
    println!();
}

/// Print configuration card
pub fn print_config(
    data_dir: &Path,
    periods: &[MonthYear],
    output: &Path,
    options: &PipelineOptions,
    post: &PostprocessOptions,
) {
    let box_width = 56;
    let line = "─".repeat(box_width - 2);

    let range = match (periods.first(), periods.last()) {
        (Some(first), Some(last)) if first != last => format!("{} → {}", first, last),
        (Some(first), _) => first.to_string(),
        _ => "-".to_string(),
    };
    let steps = [
        (post.adjust_fares, "fares"),
        (post.gap_fill, "gap-fill"),
    ]
    .iter()
    .filter(|(on, _)| *on)
    .map(|(_, name)| *name)
    .collect::<Vec<_>>()
    .join(", ");

    println!("    ┌{}┐", line);
    println!(
        "    │ {}{}│",
        style("⚙️  Configuration").cyan().bold(),
        " ".repeat(box_width - 20)
    );
    println!("    ├{}┤", line);
    println!(
        "    │  {} Data:    {:<38}│",
        FOLDER,
        truncate_path(data_dir, 37)
    );
    println!("    │  {} Months:  {:<38}│", CALENDAR, truncate_string(&range, 37));
    println!(
        "    │  {} Output:  {:<38}│",
        SAVE,
        truncate_path(output, 37)
    );
    println!("    ├{}┤", line);
    println!(
        "    │  {} Vehicle: {:<38}│",
        TAXI,
        style(options.vehicle.as_str()).yellow()
    );
    println!(
        "    │  {} Key:     {:<38}│",
        PIN,
        style(truncate_string(&options.bin_key.to_string(), 37)).yellow()
    );
    if !steps.is_empty() {
        println!("    │     Post:    {:<38}│", style(steps).yellow());
    }
    println!("    └{}┘", line);
    println!();
}

/// Print a step header with styling
pub fn print_step_header(step_num: u8, title: &str) {
    println!();
    println!(
        "    {} {} {}",
        style(format!("STEP {}", step_num)).cyan().bold(),
        style("│").dim(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("    {} {}", style("✓").green().bold(), style(message).green());
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("    {} {}", INFO, message);
}

/// Print elapsed time for a step
pub fn print_step_time(elapsed: std::time::Duration) {
    println!(
        "    {}",
        style(format!("⏱  {:.2}s", elapsed.as_secs_f64())).dim()
    );
}

/// Print the final completion message
pub fn print_completion() {
    println!();
    println!(
        "    {} {}",
        ROCKET,
        style("Binning complete!").green().bold()
    );
    println!();
}

// Helper functions

fn truncate_path(path: &Path, max_len: usize) -> String {
    let path_str = path.display().to_string();
    truncate_string(&path_str, max_len)
}

fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let tail: String = s
            .chars()
            .rev()
            .take(max_len - 3)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("...{}", tail)
    }
}
