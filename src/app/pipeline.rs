//! Shared "rating pipeline" logic used by the `fit` and `simulate` commands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! ingest -> team index -> one regression per score category -> fit statistics
//!
//! The commands can then focus on presentation (printing vs exporting).

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::domain::{EventData, OprConfig, RatingColumn, ScoreCategory};
use crate::error::AppError;
use crate::io::ingest::IngestedData;
use crate::opr::{OprError, OprSolution, TeamIndex, compute_mmse};

/// Ratings for one score category, or why they are missing.
#[derive(Debug, Clone)]
pub struct CategoryResult {
    pub category: ScoreCategory,
    pub outcome: Result<OprSolution, OprError>,
    /// RMSE of predicted vs observed alliance scores (successful fits only).
    pub rmse: Option<f64>,
}

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub ingest: IngestedData,
    pub index: TeamIndex,
    pub results: Vec<CategoryResult>,
}

impl RunOutput {
    /// Per-category columns aligned with `index`, as exported/printed.
    pub fn columns(&self) -> Vec<RatingColumn> {
        self.results
            .iter()
            .map(|r| match &r.outcome {
                Ok(sol) => RatingColumn {
                    category: r.category,
                    ratings: Some(sol.ratings.clone()),
                    error: None,
                },
                Err(e) => RatingColumn {
                    category: r.category,
                    ratings: None,
                    error: Some(e.to_string()),
                },
            })
            .collect()
    }

    pub fn all_failed(&self) -> bool {
        self.results.iter().all(|r| r.outcome.is_err())
    }

    pub fn result(&self, category: ScoreCategory) -> Option<&CategoryResult> {
        self.results.iter().find(|r| r.category == category)
    }
}

/// Check the parts of the config the core would otherwise reject per category.
pub fn validate_config(config: &OprConfig) -> Result<(), AppError> {
    if !(config.mmse.is_finite() && config.mmse >= 0.0) {
        return Err(AppError::new(
            2,
            format!("MMSE parameter must be finite and >= 0 (got {}).", config.mmse),
        ));
    }
    if config.teams_per_alliance == 0 {
        return Err(AppError::new(2, "Teams per alliance must be at least 1."));
    }
    if config.categories.is_empty() {
        return Err(AppError::new(2, "Select at least one score category."));
    }
    Ok(())
}

/// Execute the full pipeline: read the results file and compute every category.
pub fn run_opr(config: &OprConfig) -> Result<RunOutput, AppError> {
    validate_config(config)?;
    let ingest = crate::io::ingest::load_event(config)?;
    info!(
        "read {} rows from '{}': {} matches used, {} filtered, {} rejected",
        ingest.rows_read,
        config.input.display(),
        ingest.rows_used(),
        ingest.rows_filtered,
        ingest.row_errors.len()
    );
    for e in &ingest.row_errors {
        warn!(
            "line {} ({}): {}",
            e.line,
            e.match_name.as_deref().unwrap_or("?"),
            e.message
        );
    }
    run_opr_on_ingest(config, ingest)
}

/// Execute the pipeline on already-ingested data.
pub fn run_opr_on_ingest(config: &OprConfig, ingest: IngestedData) -> Result<RunOutput, AppError> {
    validate_config(config)?;
    let event = &ingest.event;
    if event.scored_count() == 0 {
        return Err(AppError::from(OprError::NoScoredMatches));
    }

    // Only scored matches define the team universe.
    let index = TeamIndex::build(event.scored_match_teams());
    info!(
        "{} scored matches, {} teams, mmse={}",
        event.scored_count(),
        index.len(),
        config.mmse
    );

    let results = compute_categories(event, &index, config.mmse, &config.categories);
    for r in &results {
        match &r.outcome {
            Ok(sol) => debug!(
                "{:?}: mean team offense {:.3}, rmse {:.3}",
                r.category,
                sol.mean_team_offense,
                r.rmse.unwrap_or(f64::NAN)
            ),
            Err(e) => warn!("{:?}: {e}", r.category),
        }
    }

    Ok(RunOutput { ingest, index, results })
}

/// Run the regression for each category against the same team index.
///
/// Categories are independent, so they are solved in parallel; one failing
/// category never affects the others.
pub fn compute_categories(
    event: &EventData,
    index: &TeamIndex,
    mmse: f64,
    categories: &[ScoreCategory],
) -> Vec<CategoryResult> {
    let teams = event.match_teams();
    categories
        .par_iter()
        .map(|&category| {
            let scores = event.category_scores(category);
            let outcome = compute_mmse(mmse, index, event.teams_per_alliance, &teams, &scores);
            let rmse = outcome
                .as_ref()
                .ok()
                .and_then(|sol| crate::report::alliance_rmse(index, &teams, &scores, &sol.ratings));
            CategoryResult {
                category,
                outcome,
                rmse,
            }
        })
        .collect()
}
