//! Interactive prompts using dialoguer

use std::path::Path;

use anyhow::Result;
use dialoguer::Confirm;

use crate::pipeline::MonthYear;

/// Batches longer than this ask before starting
pub const LARGE_BATCH_MONTHS: usize = 12;

fn ask(message: &str, default: bool) -> Result<bool> {
    Ok(Confirm::new()
        .with_prompt(message)
        .default(default)
        .interact()?)
}

/// Ask before replacing an existing output file. Defaults to no.
pub fn confirm_overwrite(path: &Path) -> Result<bool> {
    ask(
        &format!("{} already exists. Overwrite it?", path.display()),
        false,
    )
}

/// Ask before binning a long run of months. Short batches never prompt.
pub fn confirm_batch(periods: &[MonthYear], parallel: bool) -> Result<bool> {
    if periods.len() <= LARGE_BATCH_MONTHS {
        return Ok(true);
    }
    let mode = if parallel { "in parallel" } else { "one at a time" };
    ask(
        &format!("Bin {} months {}?", periods.len(), mode),
        true,
    )
}
