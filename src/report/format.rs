//! Formatted terminal output.
//!
//! Formatting lives in one place so the regression code stays free of
//! presentation concerns and output changes stay localized.

use crate::app::pipeline::RunOutput;
use crate::domain::{OprConfig, RatingColumn, RatingsFile, SortOrder, TeamId};

use super::table_order;

const TEAM_WIDTH: usize = 8;
const VALUE_WIDTH: usize = 10;

/// Format the run summary (dataset stats + per-category diagnostics).
pub fn format_run_summary(run: &RunOutput, config: &OprConfig) -> String {
    let mut out = String::new();
    let ingest = &run.ingest;

    out.push_str("=== opr - MMSE Offensive Power Ratings ===\n");
    out.push_str(&format!("Input: {}\n", config.input.display()));
    out.push_str(&format!(
        "Rows: read={} used={} filtered={} rejected={}\n",
        ingest.rows_read,
        ingest.rows_used(),
        ingest.rows_filtered,
        ingest.row_errors.len()
    ));
    out.push_str(&format!(
        "Matches: scored={} | teams={} | teams/alliance={}\n",
        ingest.event.scored_count(),
        run.index.len(),
        ingest.event.teams_per_alliance
    ));
    out.push_str(&format!("MMSE: {}\n", config.mmse));

    out.push_str("\nCategory diagnostics:\n");
    for r in &run.results {
        match &r.outcome {
            Ok(sol) => {
                let rmse = r.rmse.map(|v| format!("{v:.3}")).unwrap_or_else(|| "n/a".to_string());
                out.push_str(&format!(
                    "  {:<8} mean={:.3} RMSE={rmse}\n",
                    r.category.display_name(),
                    sol.mean_team_offense
                ));
            }
            Err(e) => {
                out.push_str(&format!("  {:<8} failed: {e}\n", r.category.display_name()));
            }
        }
    }

    if !ingest.row_errors.is_empty() {
        out.push_str("\nSkipped rows:\n");
        for e in &ingest.row_errors {
            out.push_str(&format!(
                "  line {} ({}): {}\n",
                e.line,
                truncate(e.match_name.as_deref().unwrap_or("?"), 12),
                e.message
            ));
        }
    }

    out
}

/// Header lines for a ratings file loaded by `opr show`.
pub fn format_ratings_header(file: &RatingsFile) -> String {
    format!(
        "Ratings by {} at {} | mmse={} | teams/alliance={} | teams={}\n",
        file.tool,
        file.computed_at.format("%Y-%m-%d %H:%M:%S UTC"),
        file.mmse,
        file.teams_per_alliance,
        file.teams.len()
    )
}

/// Format the team x category rating table.
///
/// A category that failed is shown as `n/a` in every row.
pub fn format_ratings_table(teams: &[TeamId], columns: &[RatingColumn], sort: SortOrder) -> String {
    let mut out = String::new();

    let mut header = format!("{:<TEAM_WIDTH$}", "team");
    let mut rule = format!("{:-<TEAM_WIDTH$}", "");
    for c in columns {
        header.push_str(&format!(" {:>VALUE_WIDTH$}", c.category.display_name()));
        rule.push_str(&format!(" {:-<VALUE_WIDTH$}", ""));
    }
    out.push_str(header.trim_end());
    out.push('\n');
    out.push_str(&rule);
    out.push('\n');

    for i in table_order(teams, columns, sort) {
        let mut line = format!("{:<TEAM_WIDTH$}", truncate(&teams[i].to_string(), TEAM_WIDTH));
        for c in columns {
            let cell = c
                .ratings
                .as_ref()
                .and_then(|r| r.get(i))
                .map(|v| format!("{v:.2}"))
                .unwrap_or_else(|| "n/a".to_string());
            line.push_str(&format!(" {cell:>VALUE_WIDTH$}"));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
