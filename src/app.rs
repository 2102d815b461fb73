//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - runs the ingest/selection/evaluation pipeline
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;

use crate::cli::{Command, PlotArgs, RunArgs};
use crate::domain::{ModelFile, RunConfig};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `popfit` binary.
pub fn run() -> Result<(), AppError> {
    // We want `popfit --demo` to behave like `popfit run --demo`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of
    // the argv list before parsing. This preserves a clean clap structure
    // while keeping the common invocation short.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Plot(args) => handle_plot(args),
    }
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args)?;
    let run = pipeline::run_pipeline(&config)?;

    println!("{}", crate::report::format::format_run_summary(&run, &config));

    let winner = run
        .variants
        .iter()
        .find(|v| v.variant == run.winner)
        .ok_or_else(|| AppError::internal("Winning variant missing from outputs."))?;

    if config.plot {
        if let Some(popularity) = run.ingest.table.column(crate::io::ingest::RESPONSE) {
            println!(
                "{}",
                crate::plot::render_histogram(
                    popularity,
                    config.plot_width,
                    config.plot_height,
                    "Popularity"
                )
            );
        }
        println!(
            "{}",
            crate::plot::render_residual_scatter(
                &winner.test_points,
                config.plot_width,
                config.plot_height
            )
        );
        let residuals: Vec<f64> = winner.test_points.iter().map(|p| p.residual).collect();
        println!(
            "{}",
            crate::plot::render_histogram(
                &residuals,
                config.plot_width,
                config.plot_height,
                "Test residuals"
            )
        );
    }

    if let Some(path) = &config.export_predictions {
        crate::io::export::write_predictions_csv(path, &winner.test_points)?;
    }
    if let Some(path) = &config.export_model {
        let chosen = winner.chosen();
        let model_file = ModelFile {
            tool: "popfit".to_string(),
            variant: winner.variant,
            policy: chosen.policy,
            criterion: config.criterion,
            seed: config.seed,
            model: chosen.model.clone(),
            validation: chosen.validation.clone(),
            test: winner.test.clone(),
        };
        crate::io::export::write_model_json(path, &model_file)?;
    }

    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let points = crate::io::export::read_predictions_csv(&args.predictions)?;

    println!(
        "{}",
        crate::plot::render_residual_scatter(&points, args.width, args.height)
    );
    let residuals: Vec<f64> = points.iter().map(|p| p.residual).collect();
    println!(
        "{}",
        crate::plot::render_histogram(&residuals, args.width, args.height, "Residuals")
    );

    Ok(())
}

pub fn run_config_from_args(args: &RunArgs) -> Result<RunConfig, AppError> {
    if !args.demo && (args.tracks.is_none() || args.artists.is_none()) {
        return Err(AppError::config(
            "Provide --tracks and --artists, or use --demo.",
        ));
    }

    Ok(RunConfig {
        tracks_path: args.tracks.clone(),
        artists_path: args.artists.clone(),
        demo: args.demo,
        demo_count: args.demo_count,
        seed: args.seed,
        train_frac: args.train_frac,
        valid_frac: args.valid_frac,
        criterion: args.criterion,
        nvmax: args.nvmax,
        min_year: args.min_year,
        plot: args.plot && !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export_predictions: args.export.clone(),
        export_model: args.export_model.clone(),
    })
}

/// Rewrite argv so `popfit` defaults to `popfit run`.
///
/// Rules:
/// - `popfit`                    -> `popfit run`
/// - `popfit --demo ...`         -> `popfit run --demo ...`
/// - `popfit --help/--version`   -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("run".to_string());
        return argv;
    };

    let is_top_level_help_or_version =
        matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "run" | "plot");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "run flags".
    if arg1.starts_with('-') {
        argv.insert(1, "run".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        std::iter::once("popfit")
            .chain(args.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn bare_invocation_becomes_run() {
        assert_eq!(rewrite_args(argv(&[])), argv(&["run"]));
    }

    #[test]
    fn leading_flag_is_treated_as_run_flags() {
        assert_eq!(rewrite_args(argv(&["--demo"])), argv(&["run", "--demo"]));
    }

    #[test]
    fn subcommands_and_help_pass_through() {
        assert_eq!(rewrite_args(argv(&["plot"])), argv(&["plot"]));
        assert_eq!(rewrite_args(argv(&["--help"])), argv(&["--help"]));
    }

    #[test]
    fn config_requires_paths_unless_demo() {
        let cli = crate::cli::Cli::parse_from(["popfit", "run"]);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert!(run_config_from_args(&args).is_err());

        let cli = crate::cli::Cli::parse_from(["popfit", "run", "--demo"]);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        let config = run_config_from_args(&args).unwrap();
        assert!(config.demo);
        assert_eq!(config.seed, 42);
    }
}
