//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - sets up logging
//! - runs the rating pipeline
//! - prints reports
//! - writes optional exports

use clap::Parser;
use log::info;

use crate::cli::{Command, FitArgs, RatingArgs, ShowArgs, SimulateArgs};
use crate::data::{SampleConfig, generate_event};
use crate::domain::OprConfig;
use crate::error::AppError;
use crate::io::ingest::IngestedData;

pub mod pipeline;

/// Entry point for the `opr` binary.
pub fn run() -> Result<(), AppError> {
    // A missing `.env` is fine; a malformed one is not silently ignored.
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(AppError::new(2, format!("Failed to load .env: {e}")));
        }
    }

    // `opr event.csv` is shorthand for `opr fit --input event.csv`. Clap requires
    // a subcommand name, so argv is rewritten before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    init_logging(cli.verbose);

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Show(args) => handle_show(args),
        Command::Simulate(args) => handle_simulate(args),
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    // `RUST_LOG` wins over `-v`; a second init (tests) is harmless.
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .try_init();
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = config_from_args(&args);
    let run = pipeline::run_opr(&config)?;
    report_run(&run, &config)
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    let file = crate::io::ratings::read_ratings_json(&args.ratings)?;
    print!("{}", crate::report::format_ratings_header(&file));
    println!();
    print!("{}", crate::report::format_ratings_table(&file.teams, &file.categories, args.sort));
    Ok(())
}

fn handle_simulate(args: SimulateArgs) -> Result<(), AppError> {
    let sample_config = SampleConfig {
        teams: args.teams,
        matches: args.matches,
        teams_per_alliance: args.rating.teams_per_alliance,
        seed: args.seed,
        first_team: args.first_team,
        mean_offense: args.mean_offense,
        offense_spread: args.offense_spread,
        noise: args.noise,
        foul_rate: args.foul_rate,
        unscored: args.unscored,
    };
    let sample = generate_event(&sample_config)?;
    crate::io::export::write_event_csv(&args.output, &sample.event)?;
    info!(
        "wrote {} matches for {} teams to '{}'",
        sample.event.matches.len(),
        sample.true_offense.len(),
        args.output.display()
    );
    println!(
        "Wrote {} matches ({} scored) to {}",
        sample.event.matches.len(),
        sample.event.scored_count(),
        args.output.display()
    );

    if !args.fit {
        return Ok(());
    }

    let config = rating_config(args.output.clone(), false, &args.rating);
    let rows = sample.event.matches.len();
    let ingest = IngestedData {
        event: sample.event,
        row_errors: Vec::new(),
        rows_read: rows,
        rows_filtered: 0,
    };
    let run = pipeline::run_opr_on_ingest(&config, ingest)?;
    report_run(&run, &config)
}

/// Print and export a finished run.
fn report_run(run: &pipeline::RunOutput, config: &OprConfig) -> Result<(), AppError> {
    let columns = run.columns();

    if config.summary {
        println!("{}", crate::report::format_run_summary(run, config));
    }
    print!(
        "{}",
        crate::report::format_ratings_table(run.index.teams(), &columns, config.sort)
    );

    // Optional exports.
    if let Some(path) = &config.export_csv {
        crate::io::export::write_ratings_csv(path, run.index.teams(), &columns)?;
        info!("exported ratings CSV to '{}'", path.display());
    }
    if let Some(path) = &config.export_json {
        let file = crate::io::ratings::ratings_file(
            config.mmse,
            config.teams_per_alliance,
            run.index.teams(),
            &columns,
        );
        crate::io::ratings::write_ratings_json(path, &file)?;
        info!("exported ratings JSON to '{}'", path.display());
    }

    if run.all_failed() {
        let reasons: Vec<String> = run
            .results
            .iter()
            .filter_map(|r| r.outcome.as_ref().err().map(|e| format!("{:?}: {e}", r.category)))
            .collect();
        return Err(AppError::new(
            4,
            format!("No ratings could be computed ({}).", reasons.join("; ")),
        ));
    }
    Ok(())
}

pub fn config_from_args(args: &FitArgs) -> OprConfig {
    rating_config(args.input.clone(), !args.all_matches, &args.rating)
}

fn rating_config(input: std::path::PathBuf, quals_only: bool, args: &RatingArgs) -> OprConfig {
    OprConfig {
        input,
        mmse: args.mmse,
        teams_per_alliance: args.teams_per_alliance,
        quals_only,
        categories: args.categories.clone(),
        sort: args.sort,
        summary: !args.no_summary,
        export_csv: args.export.clone(),
        export_json: args.export_json.clone(),
    }
}

/// Rewrite argv so a bare results file runs `fit`.
///
/// Rules:
/// - `opr`                          -> `opr --help`
/// - `opr event.csv ...`            -> `opr fit --input event.csv ...`
/// - `opr -m 2 ...` (leading flag)  -> `opr fit -m 2 ...`
/// - `opr --help/--version/-h/-V`   -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("--help".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "fit" | "show" | "simulate");
    if is_subcommand {
        return argv;
    }

    // `-v` is global and may precede a subcommand.
    if arg1.starts_with('-') {
        let rest_has_subcommand = argv
            .iter()
            .skip(1)
            .any(|a| matches!(a.as_str(), "fit" | "show" | "simulate"));
        if !rest_has_subcommand {
            argv.insert(1, "fit".to_string());
        }
        return argv;
    }

    argv.splice(1..1, ["fit".to_string(), "--input".to_string()]);
    argv
}
