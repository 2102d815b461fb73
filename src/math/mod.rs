//! Mathematical utilities: least squares and PCA.

pub mod ols;
pub mod pca;

pub use ols::*;
pub use pca::*;
