//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during the regression
//! - exported to JSON/CSV
//! - reloaded later for display

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// A competing team's number.
///
/// Team numbers are plain non-negative integers. `0` is a valid team; an empty
/// alliance slot is modeled as `Option::None`, never as a reserved number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub u32);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TeamId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u32>().map(TeamId)
    }
}

/// Which side of the field an alliance plays on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllianceColor {
    Red,
    Blue,
}

impl AllianceColor {
    pub const BOTH: [AllianceColor; 2] = [AllianceColor::Red, AllianceColor::Blue];
}

impl fmt::Display for AllianceColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllianceColor::Red => f.write_str("red"),
            AllianceColor::Blue => f.write_str("blue"),
        }
    }
}

/// Team slots of one alliance as read from the source data.
///
/// `None` marks an explicitly empty slot. Unscored matches may also carry
/// fewer slots than the configured alliance size.
pub type AllianceSlots = Vec<Option<TeamId>>;

/// The two alliances of a single match.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatchTeams {
    pub red: AllianceSlots,
    pub blue: AllianceSlots,
}

impl MatchTeams {
    /// Build a match from fully populated alliances.
    pub fn new(red: &[u32], blue: &[u32]) -> Self {
        Self {
            red: red.iter().map(|&t| Some(TeamId(t))).collect(),
            blue: blue.iter().map(|&t| Some(TeamId(t))).collect(),
        }
    }

    pub fn alliance(&self, color: AllianceColor) -> &[Option<TeamId>] {
        match color {
            AllianceColor::Red => &self.red,
            AllianceColor::Blue => &self.blue,
        }
    }

    /// Every team present in either alliance (absent slots skipped).
    pub fn teams(&self) -> impl Iterator<Item = TeamId> + '_ {
        self.red.iter().chain(self.blue.iter()).flatten().copied()
    }
}

/// One value per alliance.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AlliancePair {
    pub red: f64,
    pub blue: f64,
}

impl AlliancePair {
    pub fn new(red: f64, blue: f64) -> Self {
        Self { red, blue }
    }

    pub fn get(self, color: AllianceColor) -> f64 {
        match color {
            AllianceColor::Red => self.red,
            AllianceColor::Blue => self.blue,
        }
    }
}

/// Per-alliance score sheet for one scored match.
///
/// `penalty` holds the penalty points *awarded to* each alliance (i.e. caused by
/// fouls of the opposing alliance).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoreBreakdown {
    pub total: AlliancePair,
    pub auto: AlliancePair,
    pub teleop: AlliancePair,
    pub endgame: AlliancePair,
    pub penalty: AlliancePair,
}

impl ScoreBreakdown {
    /// Extract the pair of alliance values for one score category.
    pub fn category(&self, category: ScoreCategory) -> AlliancePair {
        match category {
            ScoreCategory::Total => self.total,
            ScoreCategory::Auto => self.auto,
            ScoreCategory::Teleop => self.teleop,
            ScoreCategory::Endgame => self.endgame,
            ScoreCategory::PenaltyFor => self.penalty,
            // Penalties against an alliance are the points its opponent was awarded.
            ScoreCategory::PenaltyAgainst => AlliancePair::new(self.penalty.blue, self.penalty.red),
        }
    }
}

/// Score categories an OPR can be computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ScoreCategory {
    Total,
    Auto,
    Teleop,
    Endgame,
    PenaltyFor,
    PenaltyAgainst,
}

impl ScoreCategory {
    pub const ALL: [ScoreCategory; 6] = [
        ScoreCategory::Total,
        ScoreCategory::Auto,
        ScoreCategory::Teleop,
        ScoreCategory::Endgame,
        ScoreCategory::PenaltyFor,
        ScoreCategory::PenaltyAgainst,
    ];

    /// Short column header for terminal tables.
    pub fn display_name(self) -> &'static str {
        match self {
            ScoreCategory::Total => "OPR",
            ScoreCategory::Auto => "Auto",
            ScoreCategory::Teleop => "Teleop",
            ScoreCategory::Endgame => "Endgame",
            ScoreCategory::PenaltyFor => "PenFor",
            ScoreCategory::PenaltyAgainst => "PenAgst",
        }
    }

    /// Column name used in CSV exports.
    pub fn column_name(self) -> &'static str {
        match self {
            ScoreCategory::Total => "opr_total",
            ScoreCategory::Auto => "opr_auto",
            ScoreCategory::Teleop => "opr_teleop",
            ScoreCategory::Endgame => "opr_endgame",
            ScoreCategory::PenaltyFor => "opr_penalty_for",
            ScoreCategory::PenaltyAgainst => "opr_penalty_against",
        }
    }
}

/// One match as read from the results file.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    /// Match label, e.g. `Q-12` or `SF-1-2`.
    pub name: String,
    pub teams: MatchTeams,
    /// `None` for matches that have not been scored yet.
    pub scores: Option<ScoreBreakdown>,
}

impl MatchRecord {
    pub fn is_scored(&self) -> bool {
        self.scores.is_some()
    }

    /// Qualification matches are labelled `Q-<n>`.
    pub fn is_qualification(&self) -> bool {
        self.name
            .get(..2)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("Q-"))
    }
}

/// All matches of one event plus the alliance size they were played with.
#[derive(Debug, Clone, PartialEq)]
pub struct EventData {
    pub teams_per_alliance: usize,
    pub matches: Vec<MatchRecord>,
}

impl EventData {
    pub fn scored_count(&self) -> usize {
        self.matches.iter().filter(|m| m.is_scored()).count()
    }

    /// Team lists of every match, in match order.
    pub fn match_teams(&self) -> Vec<MatchTeams> {
        self.matches.iter().map(|m| m.teams.clone()).collect()
    }

    /// Team lists of scored matches only.
    pub fn scored_match_teams(&self) -> impl Iterator<Item = &MatchTeams> + '_ {
        self.matches.iter().filter(|m| m.is_scored()).map(|m| &m.teams)
    }

    /// Alliance values of one category for every match (`None` when unscored).
    ///
    /// Scored-ness is always decided by the total score, so every category sees
    /// the same subset of matches.
    pub fn category_scores(&self, category: ScoreCategory) -> Vec<Option<AlliancePair>> {
        self.matches
            .iter()
            .map(|m| m.scores.as_ref().map(|s| s.category(category)))
            .collect()
    }
}

/// How the rating table is ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending team number.
    Team,
    /// Descending total OPR (falls back to team order when unavailable).
    Opr,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus environment and defaults).
#[derive(Debug, Clone)]
pub struct OprConfig {
    pub input: PathBuf,
    /// MMSE regularization parameter (0 = classical least-squares OPR).
    pub mmse: f64,
    pub teams_per_alliance: usize,
    /// Keep only qualification matches (`Q-*`).
    pub quals_only: bool,
    pub categories: Vec<ScoreCategory>,
    pub sort: SortOrder,
    pub summary: bool,

    pub export_csv: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
}

/// Ratings (or the reason they are missing) for one score category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingColumn {
    pub category: ScoreCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratings: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A saved ratings file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingsFile {
    pub tool: String,
    pub computed_at: DateTime<Utc>,
    pub mmse: f64,
    pub teams_per_alliance: usize,
    pub teams: Vec<TeamId>,
    pub categories: Vec<RatingColumn>,
}
