//! Deterministic ASCII diagnostics.

pub mod ascii;

pub use ascii::*;
