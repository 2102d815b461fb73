//! Export per-row predictions to CSV and chosen models to JSON.
//!
//! The CSV export is meant to be easy to consume in spreadsheets or
//! downstream scripts, and `popfit plot` reads it back to re-render the
//! diagnostic plots without re-running the pipeline.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::ModelFile;
use crate::error::AppError;
use crate::report::PredictionPoint;

/// Write held-out predictions to a CSV file.
pub fn write_predictions_csv(path: &Path, points: &[PredictionPoint]) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::data_load(format!(
            "Failed to create predictions CSV '{}': {e}",
            path.display()
        ))
    })?;

    writeln!(file, "predicted,actual,residual")
        .map_err(|e| AppError::data_load(format!("Failed to write predictions header: {e}")))?;

    for p in points {
        writeln!(file, "{:.6},{:.6},{:.6}", p.predicted, p.actual, p.residual)
            .map_err(|e| AppError::data_load(format!("Failed to write predictions row: {e}")))?;
    }

    Ok(())
}

/// Read a predictions CSV produced by [`write_predictions_csv`].
pub fn read_predictions_csv(path: &Path) -> Result<Vec<PredictionPoint>, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::data_load(format!(
            "Failed to open predictions CSV '{}': {e}",
            path.display()
        ))
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::data_load(format!("Failed to read predictions headers: {e}")))?
        .clone();
    for (idx, expected) in ["predicted", "actual", "residual"].iter().enumerate() {
        if headers.get(idx).map(str::trim) != Some(*expected) {
            return Err(AppError::data_load(format!(
                "'{}' is not a predictions CSV (expected `{expected}` in column {idx}).",
                path.display()
            )));
        }
    }

    let mut points = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record =
            result.map_err(|e| AppError::data_load(format!("CSV parse error: {e}")))?;
        let parse = |idx: usize| -> Result<f64, AppError> {
            record
                .get(idx)
                .and_then(|s| s.trim().parse::<f64>().ok())
                .ok_or_else(|| {
                    AppError::data_load(format!("Invalid value on predictions row {}.", i + 2))
                })
        };
        points.push(PredictionPoint {
            predicted: parse(0)?,
            actual: parse(1)?,
            residual: parse(2)?,
        });
    }

    Ok(points)
}

/// Write the chosen model (parameters + accuracy + run metadata) to JSON.
pub fn write_model_json(path: &Path, model_file: &ModelFile) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::data_load(format!(
            "Failed to create model JSON '{}': {e}",
            path.display()
        ))
    })?;

    serde_json::to_writer_pretty(file, model_file)
        .map_err(|e| AppError::data_load(format!("Failed to write model JSON: {e}")))?;

    Ok(())
}
