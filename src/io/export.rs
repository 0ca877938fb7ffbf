//! CSV writers: per-team ratings and full match results.
//!
//! The ratings export is meant to be easy to consume in spreadsheets; the
//! match-results writer produces files `ingest` reads back.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{EventData, RatingColumn, TeamId};
use crate::error::AppError;

/// Write one row per team with a column per score category.
///
/// Categories that could not be computed are left empty.
pub fn write_ratings_csv(path: &Path, teams: &[TeamId], columns: &[RatingColumn]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_ratings(file, teams, columns)
}

fn write_ratings<W: Write>(out: W, teams: &[TeamId], columns: &[RatingColumn]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(out);

    let mut header = vec!["team".to_string()];
    header.extend(columns.iter().map(|c| c.category.column_name().to_string()));
    writer
        .write_record(&header)
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for (i, team) in teams.iter().enumerate() {
        let mut row = vec![team.to_string()];
        for column in columns {
            let cell = column
                .ratings
                .as_ref()
                .and_then(|r| r.get(i))
                .map(|v| format!("{v:.4}"))
                .unwrap_or_default();
            row.push(cell);
        }
        writer
            .write_record(&row)
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))
}

/// Write match results in the ingest schema.
pub fn write_event_csv(path: &Path, event: &EventData) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create match CSV '{}': {e}", path.display())))?;
    write_event(file, event)
}

fn write_event<W: Write>(out: W, event: &EventData) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(out);
    writer
        .write_record([
            "match",
            "red_teams",
            "blue_teams",
            "red_total",
            "blue_total",
            "red_auto",
            "blue_auto",
            "red_teleop",
            "blue_teleop",
            "red_endgame",
            "blue_endgame",
            "red_penalty",
            "blue_penalty",
        ])
        .map_err(|e| AppError::new(2, format!("Failed to write match CSV header: {e}")))?;

    for m in &event.matches {
        let mut row = vec![m.name.clone(), join_slots(&m.teams.red), join_slots(&m.teams.blue)];
        match &m.scores {
            Some(s) => {
                for pair in [s.total, s.auto, s.teleop, s.endgame, s.penalty] {
                    row.push(format!("{}", pair.red));
                    row.push(format!("{}", pair.blue));
                }
            }
            None => {
                row.push("-1".to_string());
                row.push("-1".to_string());
                row.extend(std::iter::repeat_n(String::new(), 8));
            }
        }
        writer
            .write_record(&row)
            .map_err(|e| AppError::new(2, format!("Failed to write match CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush match CSV: {e}")))
}

fn join_slots(slots: &[Option<TeamId>]) -> String {
    let parts: Vec<String> = slots
        .iter()
        .map(|s| s.map(|t| t.to_string()).unwrap_or_else(|| "-".to_string()))
        .collect();
    parts.join(" ")
}
