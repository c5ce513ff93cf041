//! # tandem-core
//!
//! Shared building blocks for the tandem simulator: the crate-wide error type,
//! the alignment and read records that flow between training and simulation,
//! and small I/O and DNA helpers.
pub mod errors;
pub mod models;
pub mod utils;

pub use errors::{Result, TandemError};
