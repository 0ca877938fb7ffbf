//! Command-line parsing for the OPR calculator.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the regression code.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::domain::{ScoreCategory, SortOrder};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "opr", version, about = "MMSE Offensive Power Ratings from alliance match results")]
pub struct Cli {
    /// More log output (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compute ratings from a match-results CSV, print them, and optionally export.
    Fit(FitArgs),
    /// Print a previously exported ratings JSON.
    Show(ShowArgs),
    /// Generate a synthetic event with known team strengths.
    Simulate(SimulateArgs),
}

/// Regression options shared by `fit` and `simulate`.
#[derive(Debug, Parser, Clone)]
pub struct RatingArgs {
    /// MMSE regularization parameter (0 = classical least-squares OPR).
    #[arg(short = 'm', long, env = "OPR_MMSE", default_value_t = 1.0)]
    pub mmse: f64,

    /// Teams per alliance.
    #[arg(short = 't', long, env = "OPR_TEAMS_PER_ALLIANCE", default_value_t = 2)]
    pub teams_per_alliance: usize,

    /// Score categories to rate (comma separated).
    #[arg(
        short = 'c',
        long = "category",
        value_enum,
        value_delimiter = ',',
        default_values_t = ScoreCategory::ALL
    )]
    pub categories: Vec<ScoreCategory>,

    /// Table row order.
    #[arg(long, value_enum, default_value_t = SortOrder::Team)]
    pub sort: SortOrder,

    /// Print only the rating table.
    #[arg(long)]
    pub no_summary: bool,

    /// Export per-team ratings to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export ratings (plus run metadata) to JSON.
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Match-results CSV.
    #[arg(short = 'i', long, value_name = "CSV")]
    pub input: PathBuf,

    /// Use playoff matches too (default: qualification matches only).
    #[arg(long)]
    pub all_matches: bool,

    #[command(flatten)]
    pub rating: RatingArgs,
}

/// Options for printing a saved ratings file.
#[derive(Debug, Parser)]
pub struct ShowArgs {
    /// Ratings JSON produced by `opr fit --export-json`.
    #[arg(long, value_name = "JSON")]
    pub ratings: PathBuf,

    /// Table row order.
    #[arg(long, value_enum, default_value_t = SortOrder::Team)]
    pub sort: SortOrder,
}

#[derive(Debug, Parser, Clone)]
pub struct SimulateArgs {
    /// Where to write the generated match-results CSV.
    #[arg(short = 'o', long, value_name = "CSV")]
    pub output: PathBuf,

    /// Number of teams.
    #[arg(long, default_value_t = 24)]
    pub teams: usize,

    /// Number of matches.
    #[arg(long, default_value_t = 60)]
    pub matches: usize,

    /// Trailing matches left unscored.
    #[arg(long, default_value_t = 0)]
    pub unscored: usize,

    /// Random seed (same seed, same event).
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Number of the first team; the rest are numbered consecutively.
    #[arg(long, default_value_t = 1000)]
    pub first_team: u32,

    /// Average true offense per team.
    #[arg(long, default_value_t = 40.0)]
    pub mean_offense: f64,

    /// Standard deviation of true offense across teams.
    #[arg(long, default_value_t = 15.0)]
    pub offense_spread: f64,

    /// Standard deviation of per-alliance score noise.
    #[arg(long, default_value_t = 10.0)]
    pub noise: f64,

    /// Probability an alliance is awarded foul points in a match.
    #[arg(long, default_value_t = 0.1)]
    pub foul_rate: f64,

    /// Also compute and print ratings for the generated event.
    #[arg(long)]
    pub fit: bool,

    #[command(flatten)]
    pub rating: RatingArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_defaults() {
        let cli = Cli::parse_from(["opr", "fit", "--input", "event.csv"]);
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert!(!args.all_matches);
        assert_eq!(args.rating.categories, ScoreCategory::ALL.to_vec());
        assert_eq!(args.rating.sort, SortOrder::Team);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn categories_are_comma_separated() {
        let cli = Cli::parse_from([
            "opr", "-vv", "fit", "-i", "e.csv", "-m", "0", "-t", "3", "-c", "total,penalty-against",
        ]);
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.rating.mmse, 0.0);
        assert_eq!(args.rating.teams_per_alliance, 3);
        assert_eq!(
            args.rating.categories,
            vec![ScoreCategory::Total, ScoreCategory::PenaltyAgainst]
        );
        assert_eq!(cli.verbose, 2);
    }
}
