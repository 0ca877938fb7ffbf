//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - team and match records (`TeamId`, `MatchTeams`, `MatchRecord`, `EventData`)
//! - per-category score values (`AlliancePair`, `ScoreBreakdown`, `ScoreCategory`)
//! - run configuration and saved outputs (`OprConfig`, `RatingsFile`)

pub mod types;

pub use types::*;
