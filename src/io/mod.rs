//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - predictions CSV and model JSON exports (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
