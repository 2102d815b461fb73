//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/selection code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::app::pipeline::{CandidateOutput, RunOutput, VariantOutput};
use crate::domain::{RunConfig, StepAction};
use crate::io::ingest::IngestedData;
use crate::math::pca::PcaSummary;

/// How many row-level ingest errors to spell out before summarizing.
const MAX_ROW_ERRORS_SHOWN: usize = 5;

/// How many principal components to list.
const MAX_PCA_COMPONENTS: usize = 10;

/// Format the full run summary.
pub fn format_run_summary(run: &RunOutput, config: &RunConfig) -> String {
    let mut out = String::new();

    out.push_str("=== popfit - Song Popularity Regression Screener ===\n");
    out.push_str(&format!("Seed: {}\n", config.seed));
    out.push_str(&format!(
        "Criterion: {} | nvmax: {}\n",
        config.criterion.display_name(),
        config.nvmax
    ));

    out.push_str(&format_ingest(&run.ingest));
    out.push('\n');
    out.push_str(&format_pca(&run.pca));

    for variant in &run.variants {
        out.push('\n');
        out.push_str(&format_variant(variant));
    }

    out.push('\n');
    out.push_str("Variant comparison (held-out test RMSE):\n");
    for variant in &run.variants {
        let marker = if variant.variant == run.winner { "*" } else { " " };
        out.push_str(&format!(
            "{marker} {:<24} RMSE={:.3}\n",
            variant.variant.display_name(),
            variant.test.rmse
        ));
    }

    out
}

/// Dataset stats + row-level diagnostics.
pub fn format_ingest(ingest: &IngestedData) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Rows: read={} used={} filtered={} | artists={}\n",
        ingest.tracks_read, ingest.stats.rows_used, ingest.rows_filtered, ingest.artists_read
    ));
    out.push_str(&format!(
        "Popularity: [{:.0}, {:.0}] mean={:.1} | years: [{}, {}] | predictors: {}\n",
        ingest.stats.popularity_min,
        ingest.stats.popularity_max,
        ingest.stats.popularity_mean,
        ingest.stats.year_min,
        ingest.stats.year_max,
        ingest.stats.n_predictors,
    ));

    if !ingest.row_errors.is_empty() {
        out.push_str(&format!("Row errors: {}\n", ingest.row_errors.len()));
        for err in ingest.row_errors.iter().take(MAX_ROW_ERRORS_SHOWN) {
            let id = err.id.as_deref().unwrap_or("-");
            out.push_str(&format!("  line {:>6} [{id}] {}\n", err.line, err.message));
        }
        if ingest.row_errors.len() > MAX_ROW_ERRORS_SHOWN {
            out.push_str(&format!(
                "  ... and {} more\n",
                ingest.row_errors.len() - MAX_ROW_ERRORS_SHOWN
            ));
        }
    }

    out
}

/// Explained-variance table.
pub fn format_pca(pca: &PcaSummary) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "PCA over {} standardized predictors:\n",
        pca.columns.len()
    ));
    out.push_str(&format!(
        "{:<6} {:>10} {:>12}\n",
        "comp", "explained", "cumulative"
    ));
    for (i, (e, c)) in pca.explained.iter().zip(&pca.cumulative).enumerate() {
        if i >= MAX_PCA_COMPONENTS {
            out.push_str(&format!(
                "  ... {} more components\n",
                pca.explained.len() - MAX_PCA_COMPONENTS
            ));
            break;
        }
        out.push_str(&format!("PC{:<4} {:>9.1}% {:>11.1}%\n", i + 1, e * 100.0, c * 100.0));
    }

    out
}

/// One variant: partition, candidate table, chosen model, test accuracy.
pub fn format_variant(variant: &VariantOutput) -> String {
    let mut out = String::new();

    let (n_train, n_valid, n_test) = variant.partition_sizes;
    out.push_str(&format!(
        "--- Variant: {} ({} predictors) ---\n",
        variant.variant.display_name(),
        variant.universe.len()
    ));
    out.push_str(&format!(
        "Partition: train={n_train} valid={n_valid} test={n_test}\n"
    ));

    out.push_str("\nValidation accuracy:\n");
    out.push_str(&format!(
        "{:<12} {:>4} {:>9} {:>9} {:>9} {:>9} {:>9}\n",
        "policy", "p", "ME", "RMSE", "MAE", "MPE%", "MAPE%"
    ));
    for (i, c) in variant.candidates.iter().enumerate() {
        let marker = if i == variant.best { "*" } else { " " };
        out.push_str(&format!(
            "{marker}{:<11} {:>4} {:>9.3} {:>9.3} {:>9.3} {:>9.2} {:>9.2}\n",
            c.policy.display_name(),
            c.model.coefficients.len(),
            c.validation.me,
            c.validation.rmse,
            c.validation.mae,
            c.validation.mpe,
            c.validation.mape,
        ));
    }
    for (policy, reason) in &variant.skipped {
        out.push_str(&format!("  (skipped {}) {reason}\n", policy.display_name()));
    }

    out.push_str(&format_chosen(variant.chosen()));

    out.push_str(&format!(
        "\nTest accuracy ({}): ME={:.3} RMSE={:.3} MAE={:.3} MPE={:.2}% MAPE={:.2}%\n",
        variant.chosen().policy.display_name(),
        variant.test.me,
        variant.test.rmse,
        variant.test.mae,
        variant.test.mpe,
        variant.test.mape,
    ));

    out
}

fn format_chosen(chosen: &CandidateOutput) -> String {
    let mut out = String::new();

    out.push_str("\nChosen model:\n");
    out.push_str(&format!("- {}\n", chosen.model.formula));
    out.push_str(&format!(
        "- R²={:.4} adjR²={:.4} RSE={:.3} (df={})\n",
        chosen.model.r_squared,
        chosen.model.adj_r_squared,
        chosen.model.residual_se,
        chosen.model.residual_df,
    ));

    if !chosen.selection.steps.is_empty() {
        out.push_str("- selection trail:\n");
        for step in &chosen.selection.steps {
            match step.action {
                StepAction::Size => {
                    out.push_str(&format!("    k: {}  adjR²={:.4}\n", step.term, step.score));
                }
                _ => {
                    out.push_str(&format!(
                        "    {} {}  score={:.3}\n",
                        step.action.symbol(),
                        step.term,
                        step.score
                    ));
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::run_pipeline;
    use crate::domain::Criterion;

    fn demo_run() -> (RunOutput, RunConfig) {
        let config = RunConfig {
            tracks_path: None,
            artists_path: None,
            demo: true,
            demo_count: 120,
            seed: 7,
            train_frac: 0.6,
            valid_frac: 0.3,
            criterion: Criterion::Aic,
            nvmax: 1,
            min_year: 2000,
            plot: false,
            plot_width: 80,
            plot_height: 20,
            export_predictions: None,
            export_model: None,
        };
        (run_pipeline(&config).unwrap(), config)
    }

    #[test]
    fn summary_mentions_both_variants_and_the_winner() {
        let (run, config) = demo_run();
        let text = format_run_summary(&run, &config);

        assert!(text.contains("baseline"));
        assert!(text.contains("with-artist-popularity"));
        assert!(text.contains("Variant comparison"));
        assert!(text.contains("Validation accuracy"));
        // Exactly one winner marker in the comparison block.
        let comparison = text.split("Variant comparison").nth(1).unwrap();
        assert_eq!(comparison.matches('*').count(), 1);
    }

    #[test]
    fn pca_table_is_percentages() {
        let (run, _) = demo_run();
        let text = format_pca(&run.pca);
        assert!(text.contains("PC1"));
        assert!(text.contains('%'));
    }
}
