//! taxibins: Hourly Taxi-Trip Binning Library
//!
//! Filters monthly taxi-trip tables, bins them into dense hourly
//! location panels, and post-processes the result (fare-policy
//! adjustment, gap filling and pickup-location reduction).

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod utils;
