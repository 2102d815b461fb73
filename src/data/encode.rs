//! Column encoding: declared schema -> numeric table.
//!
//! The selector and fitter only ever see numeric matrices, so all semantic
//! column types are resolved here, once:
//!
//! - numeric columns pass through
//! - booleans become a single 0/1 column
//! - categoricals are one-hot expanded, dropping the first observed level as
//!   the baseline (the intercept absorbs it, keeping the design full-rank)

use crate::data::table::DataTable;
use crate::error::AppError;

/// An unencoded column paired with its declared kind.
#[derive(Debug, Clone)]
pub enum RawColumn {
    Numeric { name: String, values: Vec<f64> },
    Boolean { name: String, values: Vec<bool> },
    Categorical { name: String, values: Vec<String> },
}

/// Encode a set of raw columns into a numeric `DataTable`.
///
/// Dummy columns are named `{column}_{level}` and appear in first-observed
/// level order, which keeps the encoding deterministic for a given input.
pub fn encode_columns(raw: Vec<RawColumn>) -> Result<DataTable, AppError> {
    let mut out: Vec<(String, Vec<f64>)> = Vec::new();

    for col in raw {
        match col {
            RawColumn::Numeric { name, values } => out.push((name, values)),
            RawColumn::Boolean { name, values } => {
                let encoded = values.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect();
                out.push((name, encoded));
            }
            RawColumn::Categorical { name, values } => {
                for (dummy_name, dummy) in one_hot(&name, &values) {
                    out.push((dummy_name, dummy));
                }
            }
        }
    }

    DataTable::from_columns(out)
}

/// One-hot expansion with the first observed level dropped.
///
/// A single-level column expands to nothing (it carries no information beyond
/// the intercept).
fn one_hot(name: &str, values: &[String]) -> Vec<(String, Vec<f64>)> {
    let mut levels: Vec<&str> = Vec::new();
    for v in values {
        if !levels.contains(&v.as_str()) {
            levels.push(v);
        }
    }

    levels
        .iter()
        .skip(1)
        .map(|level| {
            let dummy = values
                .iter()
                .map(|v| if v == level { 1.0 } else { 0.0 })
                .collect();
            (format!("{name}_{level}"), dummy)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_and_boolean_pass_through() {
        let table = encode_columns(vec![
            RawColumn::Numeric {
                name: "tempo".to_string(),
                values: vec![120.0, 90.0],
            },
            RawColumn::Boolean {
                name: "explicit".to_string(),
                values: vec![true, false],
            },
        ])
        .unwrap();

        assert_eq!(table.column("tempo").unwrap(), &[120.0, 90.0]);
        assert_eq!(table.column("explicit").unwrap(), &[1.0, 0.0]);
    }

    #[test]
    fn one_hot_drops_first_level() {
        let values: Vec<String> = ["4", "3", "4", "5"].iter().map(|s| s.to_string()).collect();
        let table = encode_columns(vec![RawColumn::Categorical {
            name: "time_signature".to_string(),
            values,
        }])
        .unwrap();

        // Levels observed: 4 (baseline, dropped), 3, 5.
        assert!(!table.has_column("time_signature_4"));
        assert_eq!(table.column("time_signature_3").unwrap(), &[0.0, 1.0, 0.0, 0.0]);
        assert_eq!(table.column("time_signature_5").unwrap(), &[0.0, 0.0, 0.0, 1.0]);
        assert_eq!(table.n_cols(), 2);
    }

    #[test]
    fn dummies_sum_to_at_most_one_per_row() {
        let values: Vec<String> = ["0", "7", "2", "7", "0"].iter().map(|s| s.to_string()).collect();
        let table = encode_columns(vec![RawColumn::Categorical {
            name: "key".to_string(),
            values,
        }])
        .unwrap();

        for row in 0..table.n_rows() {
            let sum: f64 = table
                .column_names()
                .iter()
                .map(|n| table.column(n).unwrap()[row])
                .sum();
            assert!(sum <= 1.0);
        }
    }

    #[test]
    fn single_level_column_encodes_to_nothing() {
        let values: Vec<String> = vec!["4".to_string(); 3];
        let table = encode_columns(vec![RawColumn::Categorical {
            name: "time_signature".to_string(),
            values,
        }])
        .unwrap();
        assert_eq!(table.n_cols(), 0);
    }
}
