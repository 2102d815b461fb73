//! Column-major numeric table.
//!
//! After encoding, every dataset in the pipeline is one of these: named
//! numeric columns of equal length. Tables are immutable; row selection and
//! filtering produce new values, which keeps partitions and derived datasets
//! honest about never mutating their source.

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct DataTable {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
    n_rows: usize,
}

impl DataTable {
    /// Build a table from `(name, values)` pairs.
    ///
    /// Fails if names repeat or column lengths differ.
    pub fn from_columns(columns: Vec<(String, Vec<f64>)>) -> Result<Self, AppError> {
        let n_rows = columns.first().map(|(_, v)| v.len()).unwrap_or(0);

        let mut names = Vec::with_capacity(columns.len());
        let mut data = Vec::with_capacity(columns.len());
        for (name, values) in columns {
            if values.len() != n_rows {
                return Err(AppError::internal(format!(
                    "Column `{name}` has {} rows; expected {n_rows}.",
                    values.len()
                )));
            }
            if names.contains(&name) {
                return Err(AppError::internal(format!("Duplicate column name `{name}`.")));
            }
            names.push(name);
            data.push(values);
        }

        Ok(Self {
            names,
            columns: data,
            n_rows,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.names.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        let idx = self.names.iter().position(|n| n == name)?;
        Some(&self.columns[idx])
    }

    /// Resolve several columns at once, failing with a `SchemaMismatch` error
    /// naming the first missing column. Never substitutes a default.
    pub fn columns_for(&self, names: &[String]) -> Result<Vec<&[f64]>, AppError> {
        names
            .iter()
            .map(|name| {
                self.column(name).ok_or_else(|| {
                    AppError::schema_mismatch(format!("Required column `{name}` is absent."))
                })
            })
            .collect()
    }

    /// New table containing the given rows, in the given order.
    pub fn select_rows(&self, rows: &[usize]) -> Result<DataTable, AppError> {
        if let Some(&bad) = rows.iter().find(|&&r| r >= self.n_rows) {
            return Err(AppError::internal(format!(
                "Row index {bad} out of range (table has {} rows).",
                self.n_rows
            )));
        }

        let columns = self
            .columns
            .iter()
            .map(|col| rows.iter().map(|&r| col[r]).collect())
            .collect();

        Ok(DataTable {
            names: self.names.clone(),
            columns,
            n_rows: rows.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_table() -> DataTable {
        DataTable::from_columns(vec![
            ("a".to_string(), vec![1.0, 2.0, 3.0]),
            ("b".to_string(), vec![4.0, 5.0, 6.0]),
        ])
        .unwrap()
    }

    #[test]
    fn lookup_by_name() {
        let t = small_table();
        assert_eq!(t.n_rows(), 3);
        assert_eq!(t.column("b").unwrap(), &[4.0, 5.0, 6.0]);
        assert!(t.column("c").is_none());
    }

    #[test]
    fn select_rows_copies_in_order() {
        let t = small_table();
        let s = t.select_rows(&[2, 0]).unwrap();
        assert_eq!(s.n_rows(), 2);
        assert_eq!(s.column("a").unwrap(), &[3.0, 1.0]);
        // The source is untouched.
        assert_eq!(t.column("a").unwrap(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn select_rows_rejects_out_of_range() {
        let t = small_table();
        assert!(t.select_rows(&[0, 3]).is_err());
    }

    #[test]
    fn duplicate_names_rejected() {
        let r = DataTable::from_columns(vec![
            ("a".to_string(), vec![1.0]),
            ("a".to_string(), vec![2.0]),
        ]);
        assert!(r.is_err());
    }

    #[test]
    fn ragged_columns_rejected() {
        let r = DataTable::from_columns(vec![
            ("a".to_string(), vec![1.0, 2.0]),
            ("b".to_string(), vec![3.0]),
        ]);
        assert!(r.is_err());
    }

    #[test]
    fn columns_for_reports_missing() {
        let t = small_table();
        let err = t
            .columns_for(&["a".to_string(), "zz".to_string()])
            .unwrap_err();
        assert!(err.to_string().contains("zz"));
    }
}
