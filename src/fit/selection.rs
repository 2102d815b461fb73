//! Variable selection over a fixed predictor universe.
//!
//! Four policies, all operating on a training table:
//!
//! - exhaustive: best subset per size by RSS, best size by adjusted R²
//! - forward: greedy additions from the intercept-only model
//! - backward: greedy removals from the full model
//! - stepwise: removals and re-additions from the full model, with a cycle
//!   guard on revisited predictor sets
//!
//! Selection rules:
//! 1. Exhaustive ties in adjusted R² go to the smaller subset (the size loop
//!    ascends and only a strict improvement replaces the incumbent).
//! 2. Stepwise moves must strictly lower the information criterion; the
//!    first-listed candidate wins ties (strict `<` during the scan).
//! 3. Subsets the solver rejects (collinear dummies) are skipped, not fatal;
//!    a policy fails only when nothing at all can be fitted.

use std::cmp::Ordering;
use std::collections::HashSet;

use rayon::prelude::*;

use crate::data::table::DataTable;
use crate::domain::{
    Criterion, Formula, SelectionPolicy, SelectionResult, SelectionStep, StepAction,
};
use crate::error::AppError;
use crate::fit::model::fit;

/// Information criterion for a fitted subset: `n·ln(RSS/n) + penalty·k`,
/// where `k` counts estimated parameters (predictors + intercept).
pub fn criterion_score(n: usize, rss: f64, n_params: usize, criterion: Criterion) -> f64 {
    let n_f = n as f64;
    let rss_per = (rss / n_f).max(1e-12);
    n_f * rss_per.ln() + criterion.penalty(n) * n_params as f64
}

/// Exhaustive best-subset search.
///
/// For each size `k = 1..=min(nvmax, p)` the lowest-RSS subset of size `k` is
/// found (parallel scan over all combinations); across sizes the subset with
/// the highest adjusted R² wins, smaller `k` on ties.
pub fn exhaustive(
    table: &DataTable,
    response: &str,
    universe: &[String],
    nvmax: usize,
) -> Result<SelectionResult, AppError> {
    check_universe(table, response, universe)?;
    let kmax = nvmax.min(universe.len()).max(1);

    let mut steps = Vec::new();
    let mut best: Option<(Vec<String>, f64)> = None;

    for k in 1..=kmax {
        let combos = combinations(universe.len(), k);

        // Lowest RSS of size k; ties break to the earliest combination so the
        // scan stays deterministic under rayon's reduction order.
        let size_best = combos
            .par_iter()
            .enumerate()
            .filter_map(|(i, combo)| {
                let predictors: Vec<String> =
                    combo.iter().map(|&j| universe[j].clone()).collect();
                fit(table, &Formula::new(response, predictors))
                    .ok()
                    .map(|m| (i, m))
            })
            .min_by(|a, b| {
                a.1.rss
                    .partial_cmp(&b.1.rss)
                    .unwrap_or(Ordering::Equal)
                    .then(a.0.cmp(&b.0))
            });

        let Some((_, model)) = size_best else {
            continue; // every subset of this size was unfit-able
        };

        steps.push(SelectionStep {
            action: StepAction::Size,
            term: model.formula.predictors.join(" + "),
            score: model.adj_r_squared,
        });

        if model.adj_r_squared.is_finite() {
            let improves = match &best {
                None => true,
                Some((_, incumbent)) => model.adj_r_squared > *incumbent,
            };
            if improves {
                best = Some((model.formula.predictors.clone(), model.adj_r_squared));
            }
        }
    }

    let (predictors, score) = best.ok_or_else(|| {
        AppError::fit("Exhaustive search could not fit any predictor subset.")
    })?;

    Ok(SelectionResult {
        policy: SelectionPolicy::Exhaustive,
        formula: Formula::new(response, predictors),
        score,
        steps,
    })
}

/// Forward stepwise selection from the intercept-only model.
pub fn forward(
    table: &DataTable,
    response: &str,
    universe: &[String],
    criterion: Criterion,
) -> Result<SelectionResult, AppError> {
    check_universe(table, response, universe)?;
    let n = table.n_rows();

    let base = fit(table, &Formula::intercept_only(response))?;
    let mut current: Vec<String> = Vec::new();
    let mut current_score = criterion_score(n, base.rss, 1, criterion);
    let mut steps = Vec::new();

    loop {
        let mut best_move: Option<(usize, f64)> = None;
        for (i, cand) in universe.iter().enumerate() {
            if current.contains(cand) {
                continue;
            }
            let mut trial = current.clone();
            trial.push(cand.clone());
            let Ok(model) = fit(table, &Formula::new(response, trial)) else {
                continue;
            };
            let score = criterion_score(n, model.rss, model.coefficients.len() + 1, criterion);
            if best_move.is_none_or(|(_, s)| score < s) {
                best_move = Some((i, score));
            }
        }

        match best_move {
            Some((i, score)) if score < current_score => {
                current.push(universe[i].clone());
                current_score = score;
                steps.push(SelectionStep {
                    action: StepAction::Add,
                    term: universe[i].clone(),
                    score,
                });
            }
            _ => break,
        }
    }

    Ok(SelectionResult {
        policy: SelectionPolicy::Forward,
        formula: Formula::new(response, current),
        score: current_score,
        steps,
    })
}

/// Backward elimination from the full model.
pub fn backward(
    table: &DataTable,
    response: &str,
    universe: &[String],
    criterion: Criterion,
) -> Result<SelectionResult, AppError> {
    check_universe(table, response, universe)?;
    let n = table.n_rows();

    let full = fit(table, &Formula::new(response, universe.to_vec()))?;
    let mut current: Vec<String> = universe.to_vec();
    let mut current_score = criterion_score(n, full.rss, current.len() + 1, criterion);
    let mut steps = Vec::new();

    loop {
        let mut best_move: Option<(usize, f64)> = None;
        for i in 0..current.len() {
            let mut trial = current.clone();
            trial.remove(i);
            let Ok(model) = fit(table, &Formula::new(response, trial)) else {
                continue;
            };
            let score = criterion_score(n, model.rss, model.coefficients.len() + 1, criterion);
            if best_move.is_none_or(|(_, s)| score < s) {
                best_move = Some((i, score));
            }
        }

        match best_move {
            Some((i, score)) if score < current_score => {
                let dropped = current.remove(i);
                current_score = score;
                steps.push(SelectionStep {
                    action: StepAction::Drop,
                    term: dropped,
                    score,
                });
            }
            _ => break,
        }
    }

    Ok(SelectionResult {
        policy: SelectionPolicy::Backward,
        formula: Formula::new(response, current),
        score: current_score,
        steps,
    })
}

/// Both-direction stepwise selection from the full model.
///
/// Each step considers every single-predictor removal and every re-addition
/// of a previously removed predictor; removals are scanned first, so they win
/// exact ties. A move into an already-visited predictor set is a fatal
/// `SelectionCycle` error: strict descent makes a revisit impossible in exact
/// arithmetic, so reaching one means the criterion comparison has gone bad
/// and looping must be flagged rather than continued.
pub fn stepwise(
    table: &DataTable,
    response: &str,
    universe: &[String],
    criterion: Criterion,
) -> Result<SelectionResult, AppError> {
    check_universe(table, response, universe)?;
    let n = table.n_rows();

    let full = fit(table, &Formula::new(response, universe.to_vec()))?;
    let mut current: Vec<String> = universe.to_vec();
    let mut current_score = criterion_score(n, full.rss, current.len() + 1, criterion);

    let mut visited: HashSet<Vec<String>> = HashSet::new();
    visited.insert(sorted_key(&current));
    let mut steps = Vec::new();

    loop {
        let mut best_move: Option<(StepAction, usize, f64)> = None;

        for i in 0..current.len() {
            let mut trial = current.clone();
            trial.remove(i);
            let Ok(model) = fit(table, &Formula::new(response, trial)) else {
                continue;
            };
            let score = criterion_score(n, model.rss, model.coefficients.len() + 1, criterion);
            if best_move.is_none_or(|(_, _, s)| score < s) {
                best_move = Some((StepAction::Drop, i, score));
            }
        }

        for (j, cand) in universe.iter().enumerate() {
            if current.contains(cand) {
                continue;
            }
            let mut trial = current.clone();
            trial.push(cand.clone());
            let Ok(model) = fit(table, &Formula::new(response, trial)) else {
                continue;
            };
            let score = criterion_score(n, model.rss, model.coefficients.len() + 1, criterion);
            if best_move.is_none_or(|(_, _, s)| score < s) {
                best_move = Some((StepAction::Add, j, score));
            }
        }

        match best_move {
            Some((action, idx, score)) if score < current_score => {
                let term = match action {
                    StepAction::Drop => current.remove(idx),
                    StepAction::Add => {
                        current.push(universe[idx].clone());
                        universe[idx].clone()
                    }
                    StepAction::Size => unreachable!("stepwise never records sizes"),
                };

                if !visited.insert(sorted_key(&current)) {
                    return Err(AppError::selection_cycle(format!(
                        "Stepwise selection revisited predictor set {{{}}}.",
                        current.join(", ")
                    )));
                }

                current_score = score;
                steps.push(SelectionStep { action, term, score });
            }
            _ => break,
        }
    }

    Ok(SelectionResult {
        policy: SelectionPolicy::Stepwise,
        formula: Formula::new(response, current),
        score: current_score,
        steps,
    })
}

/// The trivial "selection": every predictor in the universe.
pub fn full(
    table: &DataTable,
    response: &str,
    universe: &[String],
    criterion: Criterion,
) -> Result<SelectionResult, AppError> {
    check_universe(table, response, universe)?;
    let model = fit(table, &Formula::new(response, universe.to_vec()))?;
    let score = criterion_score(
        table.n_rows(),
        model.rss,
        model.coefficients.len() + 1,
        criterion,
    );

    Ok(SelectionResult {
        policy: SelectionPolicy::Full,
        formula: model.formula,
        score,
        steps: Vec::new(),
    })
}

fn check_universe(table: &DataTable, response: &str, universe: &[String]) -> Result<(), AppError> {
    if universe.is_empty() {
        return Err(AppError::config("Predictor universe is empty."));
    }
    // Missing columns are a schema problem, not a skippable bad subset.
    if !table.has_column(response) {
        return Err(AppError::schema_mismatch(format!(
            "Response column `{response}` is absent from the training set."
        )));
    }
    table.columns_for(universe).map(|_| ())
}

fn sorted_key(predictors: &[String]) -> Vec<String> {
    let mut key = predictors.to_vec();
    key.sort_unstable();
    key
}

/// All k-element index combinations of `0..n`, lexicographic.
fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    if k == 0 || k > n {
        return Vec::new();
    }

    let mut out = Vec::new();
    let mut idx: Vec<usize> = (0..k).collect();
    loop {
        out.push(idx.clone());

        // Advance the rightmost position that has room.
        let mut i = k;
        let advanced = loop {
            if i == 0 {
                break false;
            }
            i -= 1;
            if idx[i] < i + n - k {
                idx[i] += 1;
                for j in i + 1..k {
                    idx[j] = idx[j - 1] + 1;
                }
                break true;
            }
        };
        if !advanced {
            return out;
        }
    }
}
