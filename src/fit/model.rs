//! Ordinary least squares fitting for a single formula.
//!
//! Given a training table and a `Formula`, we:
//!
//! - guard against rank deficiency (rows < predictors + 1) and degenerate
//!   predictors (zero variance on the training rows)
//! - assemble the design matrix with an intercept column
//! - solve via SVD and summarize the fit (RSS, R², adjusted R², residual SE)
//!
//! Prediction restricts itself to columns present in the target table and
//! fails loudly on a missing one; it never substitutes a default.

use nalgebra::{DMatrix, DVector};

use crate::data::table::DataTable;
use crate::domain::{Coefficient, FittedModel, Formula};
use crate::error::AppError;
use crate::math::solve_least_squares;

/// Fit `formula` on `table` by ordinary least squares.
pub fn fit(table: &DataTable, formula: &Formula) -> Result<FittedModel, AppError> {
    let n = table.n_rows();
    let p = formula.predictors.len();

    if n < p + 1 {
        return Err(AppError::fit(format!(
            "{formula}: {n} training rows for {p} predictors (need at least {}).",
            p + 1
        )));
    }

    let y_col = table.column(&formula.response).ok_or_else(|| {
        AppError::schema_mismatch(format!(
            "Response column `{}` is absent from the training set.",
            formula.response
        ))
    })?;
    let cols = table.columns_for(&formula.predictors)?;

    for (name, col) in formula.predictors.iter().zip(&cols) {
        if is_constant(col) {
            return Err(AppError::fit(format!(
                "{formula}: predictor `{name}` has zero variance in the training set."
            )));
        }
    }

    let x = DMatrix::from_fn(n, p + 1, |r, c| if c == 0 { 1.0 } else { cols[c - 1][r] });
    let y = DVector::from_column_slice(y_col);

    let beta = solve_least_squares(&x, &y).ok_or_else(|| {
        AppError::fit(format!(
            "{formula}: design matrix is too ill-conditioned to solve."
        ))
    })?;

    let fitted = &x * &beta;
    let rss: f64 = (&y - &fitted).iter().map(|e| e * e).sum();

    let mean = y.iter().sum::<f64>() / n as f64;
    let tss: f64 = y.iter().map(|v| (v - mean).powi(2)).sum();
    if !(tss.is_finite() && tss > 0.0) {
        return Err(AppError::fit(format!(
            "{formula}: response has zero variance in the training set."
        )));
    }

    let r_squared = 1.0 - rss / tss;
    let residual_df = n - p - 1;
    let adj_r_squared = if residual_df > 0 {
        1.0 - (1.0 - r_squared) * (n as f64 - 1.0) / residual_df as f64
    } else {
        f64::NAN
    };
    let residual_se = if residual_df > 0 {
        (rss / residual_df as f64).sqrt()
    } else {
        f64::NAN
    };

    let coefficients = formula
        .predictors
        .iter()
        .enumerate()
        .map(|(i, name)| Coefficient {
            name: name.clone(),
            value: beta[i + 1],
        })
        .collect();

    Ok(FittedModel {
        formula: formula.clone(),
        intercept: beta[0],
        coefficients,
        n_obs: n,
        rss,
        r_squared,
        adj_r_squared,
        residual_df,
        residual_se,
    })
}

/// Predict the response for every row of `table`.
///
/// Fails with a `SchemaMismatch` error if any predictor column is absent.
pub fn predict_rows(model: &FittedModel, table: &DataTable) -> Result<Vec<f64>, AppError> {
    let cols = table.columns_for(&model.formula.predictors)?;

    let mut out = Vec::with_capacity(table.n_rows());
    for r in 0..table.n_rows() {
        let mut y = model.intercept;
        for (coef, col) in model.coefficients.iter().zip(&cols) {
            y += coef.value * col[r];
        }
        out.push(y);
    }
    Ok(out)
}

fn is_constant(col: &[f64]) -> bool {
    let Some(&first) = col.first() else {
        return true;
    };
    col.iter().all(|&v| v == first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn line_table() -> DataTable {
        // y = 2 + 3x, exact.
        DataTable::from_columns(vec![
            ("x".to_string(), vec![0.0, 1.0, 2.0, 3.0]),
            ("y".to_string(), vec![2.0, 5.0, 8.0, 11.0]),
        ])
        .unwrap()
    }

    #[test]
    fn recovers_exact_line() {
        let model = fit(&line_table(), &Formula::new("y", vec!["x".into()])).unwrap();
        assert!((model.intercept - 2.0).abs() < 1e-9);
        assert!((model.coefficient("x").unwrap() - 3.0).abs() < 1e-9);
        assert!(model.rss < 1e-12);
        assert!((model.r_squared - 1.0).abs() < 1e-12);
        assert_eq!(model.residual_df, 2);
    }

    #[test]
    fn intercept_only_fits_the_mean() {
        let model = fit(&line_table(), &Formula::intercept_only("y")).unwrap();
        assert!((model.intercept - 6.5).abs() < 1e-9);
        assert!(model.coefficients.is_empty());
        assert!((model.r_squared - 0.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_zero_variance_predictor() {
        let table = DataTable::from_columns(vec![
            ("x".to_string(), vec![1.0, 1.0, 1.0]),
            ("y".to_string(), vec![1.0, 2.0, 3.0]),
        ])
        .unwrap();
        let err = fit(&table, &Formula::new("y", vec!["x".into()])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Fit);
        assert!(err.to_string().contains("zero variance"));
    }

    #[test]
    fn rejects_more_predictors_than_rows() {
        let table = DataTable::from_columns(vec![
            ("a".to_string(), vec![1.0, 2.0]),
            ("b".to_string(), vec![2.0, 1.0]),
            ("y".to_string(), vec![1.0, 3.0]),
        ])
        .unwrap();
        let err = fit(&table, &Formula::new("y", vec!["a".into(), "b".into()])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Fit);
    }

    #[test]
    fn adjusted_r_squared_penalizes_extra_parameters() {
        // x2 is noise; adding it must not raise adjusted R² above the
        // single-predictor model on this near-exact line.
        let table = DataTable::from_columns(vec![
            ("x1".to_string(), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]),
            ("x2".to_string(), vec![0.3, -0.1, 0.2, -0.4, 0.1, 0.05]),
            (
                "y".to_string(),
                vec![1.01, 3.02, 4.98, 7.0, 9.03, 10.99],
            ),
        ])
        .unwrap();

        let small = fit(&table, &Formula::new("y", vec!["x1".into()])).unwrap();
        let big = fit(&table, &Formula::new("y", vec!["x1".into(), "x2".into()])).unwrap();
        assert!(big.r_squared >= small.r_squared - 1e-12);
        assert!(small.adj_r_squared > 0.99);
        assert!(big.adj_r_squared <= big.r_squared);
    }

    #[test]
    fn predict_fails_on_missing_column() {
        let model = fit(&line_table(), &Formula::new("y", vec!["x".into()])).unwrap();
        let other = DataTable::from_columns(vec![("z".to_string(), vec![1.0])]).unwrap();
        let err = predict_rows(&model, &other).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
    }

    #[test]
    fn predict_applies_coefficients() {
        let model = fit(&line_table(), &Formula::new("y", vec!["x".into()])).unwrap();
        let eval = DataTable::from_columns(vec![("x".to_string(), vec![10.0, -1.0])]).unwrap();
        let pred = predict_rows(&model, &eval).unwrap();
        assert!((pred[0] - 32.0).abs() < 1e-9);
        assert!((pred[1] - (-1.0)).abs() < 1e-9);
    }
}
