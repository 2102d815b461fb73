//! Principal component analysis of the encoded predictor matrix.
//!
//! Exploratory output only: the run report prints an explained-variance table
//! so the predictor space can be eyeballed, but no pipeline decision depends
//! on it. Implemented as a thin call into nalgebra's SVD on the standardized
//! (zero-mean, unit-variance) predictor columns.

use nalgebra::DMatrix;

use crate::data::table::DataTable;
use crate::error::AppError;

/// Explained-variance summary, one entry per component, sorted descending.
#[derive(Debug, Clone)]
pub struct PcaSummary {
    /// Names of the columns that entered the analysis (zero-variance columns
    /// are excluded; they carry no direction).
    pub columns: Vec<String>,
    /// Fraction of total variance per component.
    pub explained: Vec<f64>,
    /// Running total of `explained`.
    pub cumulative: Vec<f64>,
}

/// Compute explained-variance ratios for the given columns of `table`.
pub fn explained_variance(table: &DataTable, columns: &[String]) -> Result<PcaSummary, AppError> {
    let n = table.n_rows();
    if n < 2 {
        return Err(AppError::insufficient_data(
            "PCA requires at least two rows.",
        ));
    }

    // Standardize each column; drop zero-variance columns instead of dividing
    // by zero. Exploratory output tolerates the reduced set.
    let mut kept: Vec<String> = Vec::new();
    let mut standardized: Vec<Vec<f64>> = Vec::new();
    for name in columns {
        let col = table
            .column(name)
            .ok_or_else(|| AppError::schema_mismatch(format!("PCA column `{name}` is absent.")))?;

        let mean = col.iter().sum::<f64>() / n as f64;
        let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n as f64 - 1.0);
        if var <= 0.0 {
            continue;
        }
        let sd = var.sqrt();
        kept.push(name.clone());
        standardized.push(col.iter().map(|v| (v - mean) / sd).collect());
    }

    if kept.is_empty() {
        return Err(AppError::insufficient_data(
            "PCA found no columns with nonzero variance.",
        ));
    }

    let m = kept.len();
    let x = DMatrix::from_fn(n, m, |r, c| standardized[c][r]);

    // Singular values come back sorted descending; σ² is proportional to the
    // component variance.
    let svd = x.svd(false, false);
    let squared: Vec<f64> = svd.singular_values.iter().map(|s| s * s).collect();
    let total: f64 = squared.iter().sum();
    if !(total.is_finite() && total > 0.0) {
        return Err(AppError::internal("PCA produced a degenerate spectrum."));
    }

    let explained: Vec<f64> = squared.iter().map(|s| s / total).collect();
    let mut cumulative = Vec::with_capacity(explained.len());
    let mut acc = 0.0;
    for e in &explained {
        acc += e;
        cumulative.push(acc);
    }

    Ok(PcaSummary {
        columns: kept,
        explained,
        cumulative,
    })
}
