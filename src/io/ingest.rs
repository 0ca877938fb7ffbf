//! CSV ingest of match results.
//!
//! Turns a results export into `EventData` that is safe to feed the regression.
//!
//! Schema (header names are case-insensitive):
//!
//! | column | required | notes |
//! | - | - | - |
//! | `match` | yes | label; qualification matches start with `Q-` |
//! | `red_teams`, `blue_teams` | yes | whitespace-separated team numbers, `*` suffix ignored, `-` = empty slot; scored matches need full alliances |
//! | `red_total`, `blue_total` | yes | empty or negative `red_total` = not played yet |
//! | `red_auto`, `red_teleop`, `red_endgame`, `red_penalty` | no | default 0 |
//! | `blue_auto`, `blue_teleop`, `blue_endgame`, `blue_penalty` | no | default 0 |
//!
//! `*_penalty` is the penalty points awarded to that alliance.
//!
//! Bad rows are skipped and reported; they never abort the whole file.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;

use csv::StringRecord;

use crate::domain::{
    AllianceColor, AllianceSlots, AlliancePair, EventData, MatchRecord, MatchTeams, OprConfig, ScoreBreakdown,
    TeamId,
};
use crate::error::AppError;

const REQUIRED_COLUMNS: [&str; 5] = ["match", "red_teams", "blue_teams", "red_total", "blue_total"];

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub match_name: Option<String>,
    pub message: String,
}

/// Ingest output: the event + bookkeeping about what was read.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub event: EventData,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    /// Valid rows dropped by the qualification filter.
    pub rows_filtered: usize,
}

impl IngestedData {
    pub fn rows_used(&self) -> usize {
        self.event.matches.len()
    }
}

/// Load match results from `config.input`.
pub fn load_event(config: &OprConfig) -> Result<IngestedData, AppError> {
    let file = File::open(&config.input).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to open match results '{}': {e}", config.input.display()),
        )
    })?;
    read_event(file, config.teams_per_alliance, config.quals_only)
}

/// Parse match results from any reader.
pub fn read_event<R: Read>(
    reader: R,
    teams_per_alliance: usize,
    quals_only: bool,
) -> Result<IngestedData, AppError> {
    if teams_per_alliance == 0 {
        return Err(AppError::new(2, "Teams per alliance must be at least 1."));
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    for name in REQUIRED_COLUMNS {
        if !header_map.contains_key(name) {
            return Err(AppError::new(2, format!("Missing required column: `{name}`")));
        }
    }

    let mut matches = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;
    let mut rows_filtered = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: header is line 1, records are 1-based after it.
        let line = idx + 2;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                rows_read += 1;
                row_errors.push(RowError {
                    line,
                    match_name: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        // Some exports separate rounds with blank rows.
        if record.iter().all(str::is_empty) {
            continue;
        }
        rows_read += 1;

        match parse_row(&record, &header_map, teams_per_alliance) {
            Ok(m) if quals_only && !m.is_qualification() => rows_filtered += 1,
            Ok(m) => matches.push(m),
            Err(message) => row_errors.push(RowError {
                line,
                match_name: get_optional(&record, &header_map, "match").map(str::to_string),
                message,
            }),
        }
    }

    if matches.is_empty() {
        let hint = if rows_filtered > 0 {
            " (all valid rows were non-qualification matches; try --all-matches)"
        } else {
            ""
        };
        return Err(AppError::new(3, format!("No valid match rows found{hint}.")));
    }

    Ok(IngestedData {
        event: EventData {
            teams_per_alliance,
            matches,
        },
        row_errors,
        rows_read,
        rows_filtered,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports may prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_row(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    teams_per_alliance: usize,
) -> Result<MatchRecord, String> {
    let name = get_required(record, header_map, "match")?.to_string();
    let red = parse_alliance(get_required(record, header_map, "red_teams")?, teams_per_alliance)?;
    let blue = parse_alliance(get_required(record, header_map, "blue_teams")?, teams_per_alliance)?;

    let red_total = get_optional(record, header_map, "red_total")
        .map(|s| parse_score(s, "red_total"))
        .transpose()?;

    // A negative red total is the "not played yet" marker.
    let scores = match red_total {
        Some(r) if r >= 0.0 => Some(parse_scores(record, header_map)?),
        _ => None,
    };

    let teams = MatchTeams { red, blue };
    // Short alliances and empty slots only make sense for matches that are not rated.
    if scores.is_some() {
        for color in AllianceColor::BOTH {
            let slots = teams.alliance(color);
            if slots.len() < teams_per_alliance {
                return Err(format!(
                    "Scored match: {color} alliance has {} teams, expected {teams_per_alliance}.",
                    slots.len()
                ));
            }
            if slots.iter().any(Option::is_none) {
                return Err(format!("Scored match: {color} alliance has an empty team slot."));
            }
        }
    }

    Ok(MatchRecord { name, teams, scores })
}

fn parse_scores(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<ScoreBreakdown, String> {
    let pair = |field: &str, required: bool| -> Result<AlliancePair, String> {
        let red_col = format!("red_{field}");
        let blue_col = format!("blue_{field}");
        let red = score_column(record, header_map, &red_col, required)?;
        let blue = score_column(record, header_map, &blue_col, required)?;
        Ok(AlliancePair::new(red, blue))
    };

    Ok(ScoreBreakdown {
        total: pair("total", true)?,
        auto: pair("auto", false)?,
        teleop: pair("teleop", false)?,
        endgame: pair("endgame", false)?,
        penalty: pair("penalty", false)?,
    })
}

fn score_column(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
    required: bool,
) -> Result<f64, String> {
    match get_optional(record, header_map, name) {
        Some(s) => parse_score(s, name),
        None if required => Err(format!("Missing required value: `{name}`")),
        None => Ok(0.0),
    }
}

fn parse_score(s: &str, name: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("Invalid `{name}` value '{s}'.")),
    }
}

/// Parse a team list such as `"5012 7*"` into at most `teams_per_alliance` slots.
fn parse_alliance(s: &str, teams_per_alliance: usize) -> Result<AllianceSlots, String> {
    let mut slots = AllianceSlots::new();
    for token in s.split_whitespace() {
        let token = token.trim_end_matches('*');
        if token == "-" {
            slots.push(None);
            continue;
        }
        let team = token
            .parse::<TeamId>()
            .map_err(|_| format!("Invalid team number '{token}'."))?;
        slots.push(Some(team));
    }

    if slots.len() > teams_per_alliance {
        return Err(format!(
            "Alliance '{s}' has {} teams, more than the configured {teams_per_alliance}.",
            slots.len()
        ));
    }
    Ok(slots)
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    get_optional(record, header_map, name).ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}
