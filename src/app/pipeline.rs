//! Shared pipeline logic used by the CLI front-end.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! ingest -> encode -> PCA -> partition -> select/fit -> validate -> test -> compare
//!
//! The CLI can then focus on presentation (printing, plots, exports).

use crate::data::synthetic;
use crate::data::table::DataTable;
use crate::domain::{
    AccuracyReport, FittedModel, RunConfig, SelectionPolicy, SelectionResult, VariantKind,
};
use crate::error::AppError;
use crate::fit::selection;
use crate::fit::{model::fit, split::partition};
use crate::io::ingest::{self, ARTIST_POPULARITY, IngestedData, RESPONSE};
use crate::math::pca::{PcaSummary, explained_variance};
use crate::report::{PredictionPoint, compute_predictions, evaluate};

/// One candidate model: how it was selected, the fit, and its validation
/// accuracy.
#[derive(Debug, Clone)]
pub struct CandidateOutput {
    pub policy: SelectionPolicy,
    pub selection: SelectionResult,
    pub model: FittedModel,
    pub validation: AccuracyReport,
}

/// Everything computed for one dataset variant.
#[derive(Debug, Clone)]
pub struct VariantOutput {
    pub variant: VariantKind,
    pub universe: Vec<String>,
    pub partition_sizes: (usize, usize, usize),
    pub candidates: Vec<CandidateOutput>,
    /// Policies that failed, and why (for diagnostics).
    pub skipped: Vec<(SelectionPolicy, String)>,
    /// Index into `candidates` of the lowest validation RMSE.
    pub best: usize,
    /// Held-out accuracy of the chosen candidate.
    pub test: AccuracyReport,
    pub test_points: Vec<PredictionPoint>,
}

impl VariantOutput {
    pub fn chosen(&self) -> &CandidateOutput {
        &self.candidates[self.best]
    }
}

/// All computed outputs of a single `popfit run`.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub ingest: IngestedData,
    pub pca: PcaSummary,
    pub variants: Vec<VariantOutput>,
    pub winner: VariantKind,
}

/// Execute the full pipeline and return the computed outputs.
pub fn run_pipeline(config: &RunConfig) -> Result<RunOutput, AppError> {
    // 1) Ingest (or generate) the merged, encoded dataset.
    let ingest = if config.demo {
        let (tracks, artists) = synthetic::generate(config.seed, config.demo_count)?;
        let (tracks_read, artists_read) = (tracks.len(), artists.len());
        ingest::assemble(tracks, artists, Vec::new(), tracks_read, artists_read, config)?
    } else {
        ingest::load_dataset(config)?
    };

    // 2) Exploratory PCA over the full predictor universe.
    let pca = explained_variance(&ingest.table, &ingest.predictors)?;

    // 3) Fit and evaluate both variants.
    let mut variants = Vec::with_capacity(2);
    for variant in [VariantKind::Baseline, VariantKind::WithArtistPopularity] {
        let universe: Vec<String> = match variant {
            VariantKind::Baseline => ingest
                .predictors
                .iter()
                .filter(|p| p.as_str() != ARTIST_POPULARITY)
                .cloned()
                .collect(),
            VariantKind::WithArtistPopularity => ingest.predictors.clone(),
        };

        let output = run_variant(&ingest.table, universe, variant, config)
            .map_err(|e| e.context(variant.display_name()))?;
        variants.push(output);
    }

    // 4) Compare held-out accuracy; ties keep the simpler baseline.
    let winner = if variants[0].test.rmse <= variants[1].test.rmse {
        VariantKind::Baseline
    } else {
        VariantKind::WithArtistPopularity
    };

    Ok(RunOutput {
        ingest,
        pca,
        variants,
        winner,
    })
}

/// Partition, fit every candidate policy, validate, and test the winner.
fn run_variant(
    table: &DataTable,
    universe: Vec<String>,
    variant: VariantKind,
    config: &RunConfig,
) -> Result<VariantOutput, AppError> {
    let part = partition(
        table.n_rows(),
        config.seed,
        config.train_frac,
        config.valid_frac,
    )?;
    let train = table.select_rows(&part.train)?;
    let valid = table.select_rows(&part.valid)?;
    let test = table.select_rows(&part.test)?;

    let mut candidates = Vec::new();
    let mut skipped = Vec::new();
    for policy in SelectionPolicy::all() {
        match run_candidate(policy, &train, &valid, &universe, config) {
            Ok(c) => candidates.push(c),
            // A candidate-scoped failure excludes this policy from the
            // comparison; the rest of the run continues.
            Err(e) if e.is_candidate_scoped() => {
                skipped.push((policy, e.to_string()));
            }
            Err(e) => return Err(e.context(policy.display_name())),
        }
    }

    if candidates.is_empty() {
        return Err(AppError::insufficient_data(
            "No candidate policy produced a fit-able model.",
        ));
    }

    // Lowest validation RMSE wins; the strict `<` keeps the earliest policy
    // on exact ties.
    let mut best = 0;
    for (i, c) in candidates.iter().enumerate().skip(1) {
        if c.validation.rmse < candidates[best].validation.rmse {
            best = i;
        }
    }

    let chosen = &candidates[best];
    let test_report = evaluate(&chosen.model, &test)
        .map_err(|e| e.context(format!("test evaluation ({})", chosen.policy.display_name())))?;
    let test_points = compute_predictions(&chosen.model, &test)?;

    Ok(VariantOutput {
        variant,
        universe,
        partition_sizes: part.sizes(),
        candidates,
        skipped,
        best,
        test: test_report,
        test_points,
    })
}

fn run_candidate(
    policy: SelectionPolicy,
    train: &DataTable,
    valid: &DataTable,
    universe: &[String],
    config: &RunConfig,
) -> Result<CandidateOutput, AppError> {
    let selection = match policy {
        SelectionPolicy::Full => selection::full(train, RESPONSE, universe, config.criterion)?,
        SelectionPolicy::Exhaustive => {
            selection::exhaustive(train, RESPONSE, universe, config.nvmax)?
        }
        SelectionPolicy::Forward => {
            selection::forward(train, RESPONSE, universe, config.criterion)?
        }
        SelectionPolicy::Backward => {
            selection::backward(train, RESPONSE, universe, config.criterion)?
        }
        SelectionPolicy::Stepwise => {
            selection::stepwise(train, RESPONSE, universe, config.criterion)?
        }
    };

    let model = fit(train, &selection.formula)?;
    let validation = evaluate(&model, valid)?;

    Ok(CandidateOutput {
        policy,
        selection,
        model,
        validation,
    })
}
