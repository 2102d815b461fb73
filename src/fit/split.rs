//! Deterministic train/validation/test partitioning.
//!
//! The contract:
//!
//! - seed a generator, draw `round(N * train_frac)` indices without
//!   replacement -> train
//! - draw `round(N * valid_frac)` indices from the complement -> validation
//! - whatever remains -> test
//!
//! Test size is always the residual, never an independently sampled fraction,
//! so the three sets cover the row set exactly once. Fractions need not sum
//! to 1 (the default 0.6 + 0.3 leaves ~10% for test).
//!
//! Determinism: the generator is consumed in a single fixed order (train draw,
//! then validation draw), so the same seed and row count always reproduce the
//! same split.

use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;

use crate::domain::Partition;
use crate::error::AppError;

/// Split `n_rows` row indices into train/validation/test sets.
pub fn partition(
    n_rows: usize,
    seed: u64,
    train_frac: f64,
    valid_frac: f64,
) -> Result<Partition, AppError> {
    if n_rows == 0 {
        return Err(AppError::insufficient_data("Cannot partition an empty dataset."));
    }
    if !(train_frac.is_finite() && train_frac > 0.0) {
        return Err(AppError::config(format!(
            "Invalid train fraction {train_frac} (must be finite and > 0)."
        )));
    }
    if !(valid_frac.is_finite() && valid_frac > 0.0) {
        return Err(AppError::config(format!(
            "Invalid validation fraction {valid_frac} (must be finite and > 0)."
        )));
    }
    if train_frac + valid_frac > 1.0 {
        return Err(AppError::config(format!(
            "Fractions sum to {} (must be <= 1).",
            train_frac + valid_frac
        )));
    }

    // Rounding can push the two sample sizes past N together; clamp the
    // second draw so the partition invariant always holds.
    let n_train = ((n_rows as f64 * train_frac).round() as usize).min(n_rows);
    let n_valid = ((n_rows as f64 * valid_frac).round() as usize).min(n_rows - n_train);

    let mut rng = StdRng::seed_from_u64(seed);

    let mut train = index::sample(&mut rng, n_rows, n_train).into_vec();

    let mut in_train = vec![false; n_rows];
    for &i in &train {
        in_train[i] = true;
    }
    let remaining: Vec<usize> = (0..n_rows).filter(|&i| !in_train[i]).collect();

    let picks = index::sample(&mut rng, remaining.len(), n_valid).into_vec();
    let mut in_valid = vec![false; remaining.len()];
    for &p in &picks {
        in_valid[p] = true;
    }

    let mut valid = Vec::with_capacity(n_valid);
    let mut test = Vec::with_capacity(remaining.len() - n_valid);
    for (pos, &row) in remaining.iter().enumerate() {
        if in_valid[pos] {
            valid.push(row);
        } else {
            test.push(row);
        }
    }

    train.sort_unstable();
    // `valid` and `test` inherit ascending order from `remaining`.

    Ok(Partition { train, valid, test })
}
