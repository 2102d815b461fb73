//! Out-of-sample evaluation: predictions and forecast-accuracy metrics.

pub mod format;

use crate::data::table::DataTable;
use crate::domain::{AccuracyReport, FittedModel};
use crate::error::AppError;
use crate::fit::model::predict_rows;

/// One evaluated row.
#[derive(Debug, Clone)]
pub struct PredictionPoint {
    pub predicted: f64,
    pub actual: f64,
    /// `actual - predicted` (what the model missed).
    pub residual: f64,
}

/// Apply `model` to every row of `eval_set` and compute the accuracy report.
///
/// Fails with `EmptyEvaluationSet` on zero rows and `SchemaMismatch` if the
/// response or any required predictor column is absent.
pub fn evaluate(model: &FittedModel, eval_set: &DataTable) -> Result<AccuracyReport, AppError> {
    if eval_set.n_rows() == 0 {
        return Err(AppError::empty_evaluation_set(format!(
            "{}: evaluation set has zero rows.",
            model.formula
        )));
    }

    let predicted = predict_rows(model, eval_set)?;
    let actual = eval_set.column(&model.formula.response).ok_or_else(|| {
        AppError::schema_mismatch(format!(
            "Response column `{}` is absent from the evaluation set.",
            model.formula.response
        ))
    })?;

    accuracy(&predicted, actual)
}

/// Per-row predictions for plotting and exports.
pub fn compute_predictions(
    model: &FittedModel,
    eval_set: &DataTable,
) -> Result<Vec<PredictionPoint>, AppError> {
    let predicted = predict_rows(model, eval_set)?;
    let actual = eval_set.column(&model.formula.response).ok_or_else(|| {
        AppError::schema_mismatch(format!(
            "Response column `{}` is absent from the evaluation set.",
            model.formula.response
        ))
    })?;

    Ok(predicted
        .into_iter()
        .zip(actual)
        .map(|(p, &a)| PredictionPoint {
            predicted: p,
            actual: a,
            residual: a - p,
        })
        .collect())
}

/// The five standard metrics over equal-length (predicted, actual) sequences.
///
/// Error convention: `e_i = predicted_i - actual_i`. MPE and MAPE divide by
/// the actual value, so they are only meaningful when actuals are nonzero
/// (the pipeline filters zero-popularity tracks upstream).
pub fn accuracy(predicted: &[f64], actual: &[f64]) -> Result<AccuracyReport, AppError> {
    if predicted.len() != actual.len() {
        return Err(AppError::internal(format!(
            "Accuracy over mismatched lengths: {} predicted vs {} actual.",
            predicted.len(),
            actual.len()
        )));
    }
    let n = predicted.len();
    if n == 0 {
        return Err(AppError::empty_evaluation_set(
            "Accuracy over zero (predicted, actual) pairs.",
        ));
    }

    let n_f = n as f64;
    let mut sum_e = 0.0;
    let mut sum_sq = 0.0;
    let mut sum_abs = 0.0;
    let mut sum_pe = 0.0;
    let mut sum_ape = 0.0;
    for (&p, &a) in predicted.iter().zip(actual) {
        let e = p - a;
        sum_e += e;
        sum_sq += e * e;
        sum_abs += e.abs();
        sum_pe += e / a;
        sum_ape += (e / a).abs();
    }

    Ok(AccuracyReport {
        n,
        me: sum_e / n_f,
        rmse: (sum_sq / n_f).sqrt(),
        mae: sum_abs / n_f,
        mpe: 100.0 * sum_pe / n_f,
        mape: 100.0 * sum_ape / n_f,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Formula;
    use crate::error::ErrorKind;
    use crate::fit::model::fit;

    #[test]
    fn accuracy_worked_example() {
        let predicted = [10.0, 20.0, 30.0];
        let actual = [12.0, 18.0, 33.0];
        let report = accuracy(&predicted, &actual).unwrap();

        assert_eq!(report.n, 3);
        assert!((report.me - (-1.0)).abs() < 1e-12);
        assert!((report.rmse - (17.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert!((report.mae - 7.0 / 3.0).abs() < 1e-12);
        // MPE: 100 * mean(-2/12, 2/18, -3/33)
        let mpe = 100.0 * (-2.0 / 12.0 + 2.0 / 18.0 - 3.0 / 33.0) / 3.0;
        assert!((report.mpe - mpe).abs() < 1e-9);
        let mape = 100.0 * (2.0 / 12.0 + 2.0 / 18.0 + 3.0 / 33.0) / 3.0;
        assert!((report.mape - mape).abs() < 1e-9);
    }

    #[test]
    fn perfect_predictions_zero_out_every_metric() {
        let v = [5.0, 10.0, 15.0];
        let report = accuracy(&v, &v).unwrap();
        assert_eq!(report.me, 0.0);
        assert_eq!(report.rmse, 0.0);
        assert_eq!(report.mae, 0.0);
        assert_eq!(report.mape, 0.0);
    }

    #[test]
    fn empty_pairs_are_rejected() {
        let err = accuracy(&[], &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyEvaluationSet);
    }

    fn trained_model() -> FittedModel {
        let table = DataTable::from_columns(vec![
            ("tempo".to_string(), vec![0.0, 1.0, 2.0, 3.0]),
            ("popularity".to_string(), vec![1.0, 3.0, 5.0, 7.0]),
        ])
        .unwrap();
        fit(&table, &Formula::new("popularity", vec!["tempo".into()])).unwrap()
    }

    #[test]
    fn evaluate_empty_set_fails() {
        let model = trained_model();
        let empty = DataTable::from_columns(vec![
            ("tempo".to_string(), vec![]),
            ("popularity".to_string(), vec![]),
        ])
        .unwrap();
        let err = evaluate(&model, &empty).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyEvaluationSet);
    }

    #[test]
    fn evaluate_missing_predictor_is_schema_mismatch() {
        let model = trained_model();
        let eval = DataTable::from_columns(vec![(
            "popularity".to_string(),
            vec![1.0, 2.0],
        )])
        .unwrap();
        let err = evaluate(&model, &eval).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
        assert!(err.to_string().contains("tempo"));
    }

    #[test]
    fn evaluate_exact_model_on_exact_data() {
        let model = trained_model();
        let eval = DataTable::from_columns(vec![
            ("tempo".to_string(), vec![4.0, 5.0]),
            ("popularity".to_string(), vec![9.0, 11.0]),
        ])
        .unwrap();
        let report = evaluate(&model, &eval).unwrap();
        assert!(report.rmse < 1e-9);
    }

    #[test]
    fn prediction_points_carry_residuals() {
        let model = trained_model();
        let eval = DataTable::from_columns(vec![
            ("tempo".to_string(), vec![4.0]),
            ("popularity".to_string(), vec![10.0]),
        ])
        .unwrap();
        let points = compute_predictions(&model, &eval).unwrap();
        assert_eq!(points.len(), 1);
        assert!((points[0].predicted - 9.0).abs() < 1e-9);
        assert!((points[0].residual - 1.0).abs() < 1e-9);
    }
}
