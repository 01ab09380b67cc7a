//! Pipeline module - filter, bin, aggregate and postprocess trip tables

pub mod aggregate;
pub mod binner;
pub mod error;
pub mod filter;
pub mod postprocess;
pub mod reduce;
pub mod schema;
pub mod source;
pub mod timezone;

pub use aggregate::*;
pub use binner::*;
pub use error::*;
pub use filter::*;
pub use postprocess::*;
pub use reduce::*;
pub use schema::*;
pub use source::*;
