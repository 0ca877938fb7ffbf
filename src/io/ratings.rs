//! Read/write ratings JSON files.
//!
//! A ratings file is the portable result of one run: the team order, the MMSE
//! parameter, and per category either the rating vector or the reason it is
//! missing. The schema is defined by `domain::RatingsFile`.

use std::fs::File;
use std::path::Path;

use chrono::Utc;

use crate::domain::{RatingColumn, RatingsFile, TeamId};
use crate::error::AppError;

/// Assemble the JSON artifact for a finished run.
pub fn ratings_file(mmse: f64, teams_per_alliance: usize, teams: &[TeamId], columns: &[RatingColumn]) -> RatingsFile {
    RatingsFile {
        tool: "opr".to_string(),
        computed_at: Utc::now(),
        mmse,
        teams_per_alliance,
        teams: teams.to_vec(),
        categories: columns.to_vec(),
    }
}

/// Write a ratings JSON file.
pub fn write_ratings_json(path: &Path, ratings: &RatingsFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create ratings JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, ratings)
        .map_err(|e| AppError::new(2, format!("Failed to write ratings JSON: {e}")))
}

/// Read a ratings JSON file.
///
/// Rating vectors must line up with the team list.
pub fn read_ratings_json(path: &Path) -> Result<RatingsFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open ratings JSON '{}': {e}", path.display())))?;
    let ratings: RatingsFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid ratings JSON: {e}")))?;

    for column in &ratings.categories {
        if let Some(values) = &column.ratings {
            if values.len() != ratings.teams.len() {
                return Err(AppError::new(
                    2,
                    format!(
                        "Invalid ratings JSON: {:?} has {} ratings for {} teams.",
                        column.category,
                        values.len(),
                        ratings.teams.len()
                    ),
                ));
            }
        }
    }
    Ok(ratings)
}
