//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting and selection
//! - exported to JSON/CSV
//! - reloaded later for plotting or comparisons

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Information criterion used by the stepwise selection policies.
///
/// Both use the form `n·ln(RSS/n) + penalty·k` where `k` counts estimated
/// parameters (predictors + intercept). Lower is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    /// Akaike: penalty 2 per parameter.
    Aic,
    /// Bayesian: penalty ln(n) per parameter.
    Bic,
}

impl Criterion {
    pub fn display_name(self) -> &'static str {
        match self {
            Criterion::Aic => "AIC",
            Criterion::Bic => "BIC",
        }
    }

    /// Per-parameter penalty at sample size `n`.
    pub fn penalty(self, n: usize) -> f64 {
        match self {
            Criterion::Aic => 2.0,
            Criterion::Bic => (n as f64).ln(),
        }
    }
}

/// Variable-selection policy for a candidate model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionPolicy {
    /// All predictors, no selection.
    Full,
    /// Best subset per size by RSS, best size by adjusted R².
    Exhaustive,
    /// Greedy additions from the intercept-only model.
    Forward,
    /// Greedy removals from the full model.
    Backward,
    /// Removals and re-additions from the full model.
    Stepwise,
}

impl SelectionPolicy {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            SelectionPolicy::Full => "full",
            SelectionPolicy::Exhaustive => "exhaustive",
            SelectionPolicy::Forward => "forward",
            SelectionPolicy::Backward => "backward",
            SelectionPolicy::Stepwise => "stepwise",
        }
    }

    /// Candidate order used by the driver (also the tie-break order when
    /// validation RMSE is equal).
    pub fn all() -> [SelectionPolicy; 5] {
        [
            SelectionPolicy::Full,
            SelectionPolicy::Exhaustive,
            SelectionPolicy::Forward,
            SelectionPolicy::Backward,
            SelectionPolicy::Stepwise,
        ]
    }
}

/// Dataset variant compared by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantKind {
    /// Track features only.
    Baseline,
    /// Track features plus the merged artist-popularity feature.
    WithArtistPopularity,
}

impl VariantKind {
    pub fn display_name(self) -> &'static str {
        match self {
            VariantKind::Baseline => "baseline",
            VariantKind::WithArtistPopularity => "with-artist-popularity",
        }
    }
}

/// A response column plus an ordered set of predictor column names.
///
/// Order affects display only; OLS coefficients do not depend on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formula {
    pub response: String,
    pub predictors: Vec<String>,
}

impl Formula {
    pub fn new(response: impl Into<String>, predictors: Vec<String>) -> Self {
        Self {
            response: response.into(),
            predictors,
        }
    }

    pub fn intercept_only(response: impl Into<String>) -> Self {
        Self::new(response, Vec::new())
    }
}

impl std::fmt::Display for Formula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.predictors.is_empty() {
            write!(f, "{} ~ 1", self.response)
        } else {
            write!(f, "{} ~ {}", self.response, self.predictors.join(" + "))
        }
    }
}

/// Disjoint train/validation/test row-index sets covering a dataset exactly once.
///
/// Indices are stored sorted ascending; the draw order inside each set is not
/// part of the contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub train: Vec<usize>,
    pub valid: Vec<usize>,
    pub test: Vec<usize>,
}

impl Partition {
    pub fn sizes(&self) -> (usize, usize, usize) {
        (self.train.len(), self.valid.len(), self.test.len())
    }
}

/// A single estimated coefficient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coefficient {
    pub name: String,
    pub value: f64,
}

/// An OLS fit: formula, coefficients, and the training-set summary statistics
/// needed to score the fit. Read-only after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedModel {
    pub formula: Formula,
    pub intercept: f64,
    pub coefficients: Vec<Coefficient>,
    /// Number of training rows.
    pub n_obs: usize,
    /// Residual sum of squares on the training set.
    pub rss: f64,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    /// `n_obs - predictors - 1`.
    pub residual_df: usize,
    /// `sqrt(RSS / residual_df)`, NaN when the fit is saturated (df = 0).
    pub residual_se: f64,
}

impl FittedModel {
    pub fn coefficient(&self, name: &str) -> Option<f64> {
        self.coefficients
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value)
    }
}

/// One move taken (or size examined) by a selection policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionStep {
    pub action: StepAction,
    /// Predictor added/dropped, or the best subset at this size for
    /// exhaustive search.
    pub term: String,
    /// Criterion value after the move (adjusted R² for exhaustive).
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepAction {
    Add,
    Drop,
    /// Best-subset record for one size k (exhaustive search only).
    Size,
}

impl StepAction {
    pub fn symbol(self) -> &'static str {
        match self {
            StepAction::Add => "+",
            StepAction::Drop => "-",
            StepAction::Size => "k",
        }
    }
}

/// Output of one selection policy: the chosen formula, the score that ranked
/// it, and the trail of moves that led there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionResult {
    pub policy: SelectionPolicy,
    pub formula: Formula,
    /// Final criterion value (adjusted R² for exhaustive search, where higher
    /// is better; information criterion otherwise, where lower is better).
    pub score: f64,
    pub steps: Vec<SelectionStep>,
}

/// Fixed set of forecast-accuracy metrics over (predicted, actual) pairs.
///
/// Error convention: `e_i = predicted_i - actual_i`. MPE/MAPE are percentages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccuracyReport {
    pub n: usize,
    /// Mean error.
    pub me: f64,
    /// Root-mean-squared error.
    pub rmse: f64,
    /// Mean absolute error.
    pub mae: f64,
    /// Mean percentage error.
    pub mpe: f64,
    /// Mean absolute percentage error.
    pub mape: f64,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults); there is no process-wide
/// state anywhere else.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub tracks_path: Option<PathBuf>,
    pub artists_path: Option<PathBuf>,

    /// Generate a synthetic dataset instead of reading CSVs.
    pub demo: bool,
    pub demo_count: usize,

    /// Seed for the train/validation/test partition (and demo generation).
    pub seed: u64,
    pub train_frac: f64,
    pub valid_frac: f64,

    pub criterion: Criterion,
    /// Largest subset size examined by exhaustive search.
    pub nvmax: usize,

    /// Keep only tracks released in this year or later.
    pub min_year: i32,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_predictions: Option<PathBuf>,
    pub export_model: Option<PathBuf>,
}

/// A raw, validated row of the tracks CSV.
///
/// This mirrors the platform's export schema and lets us perform row-level
/// validation with good error messages before any encoding happens.
#[derive(Debug, Clone)]
pub struct TrackRow {
    pub id: String,
    /// Popularity score, 0-100.
    pub popularity: f64,
    pub duration_ms: f64,
    pub explicit: bool,
    pub danceability: f64,
    pub energy: f64,
    /// Pitch class, 0-11. Categorical despite the numeric coding.
    pub key: i64,
    pub loudness: f64,
    pub speechiness: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    pub valence: f64,
    pub tempo: f64,
    /// Beats per bar. Categorical despite the numeric coding.
    pub time_signature: i64,
    pub release_year: i32,
    pub artist_ids: Vec<String>,
}

/// A raw, validated row of the artists CSV.
///
/// Columns beyond id/popularity (name, genre list, follower counts) are
/// ignored at ingest.
#[derive(Debug, Clone)]
pub struct ArtistRow {
    pub id: String,
    /// Artist popularity score, 0-100.
    pub popularity: f64,
}

/// The portable JSON representation of a chosen model (`--export-model`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFile {
    pub tool: String,
    pub variant: VariantKind,
    pub policy: SelectionPolicy,
    pub criterion: Criterion,
    pub seed: u64,
    pub model: FittedModel,
    pub validation: AccuracyReport,
    pub test: AccuracyReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formula_display() {
        let f = Formula::new("popularity", vec!["energy".into(), "tempo".into()]);
        assert_eq!(f.to_string(), "popularity ~ energy + tempo");
        assert_eq!(
            Formula::intercept_only("popularity").to_string(),
            "popularity ~ 1"
        );
    }

    #[test]
    fn criterion_penalties() {
        assert_eq!(Criterion::Aic.penalty(100), 2.0);
        assert!((Criterion::Bic.penalty(100) - 100f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn policy_order_starts_with_full() {
        assert_eq!(SelectionPolicy::all()[0], SelectionPolicy::Full);
    }
}
