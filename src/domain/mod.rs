//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - input configuration (`RunConfig`, `Criterion`)
//! - dataset partitioning (`Partition`)
//! - fit outputs (`Formula`, `FittedModel`, `SelectionResult`, `AccuracyReport`)

pub mod types;

pub use types::*;
