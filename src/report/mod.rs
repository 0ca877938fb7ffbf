//! Reporting utilities: fit statistics, ordering, and formatted terminal output.

use std::cmp::Ordering;

use crate::domain::{AllianceColor, AlliancePair, MatchTeams, RatingColumn, ScoreCategory, SortOrder, TeamId};
use crate::opr::TeamIndex;

pub mod format;

pub use format::*;

/// Predicted alliance score: the sum of its members' ratings.
///
/// Returns `None` when a member is not in the index.
pub fn predict_alliance(index: &TeamIndex, slots: &[Option<TeamId>], ratings: &[f64]) -> Option<f64> {
    slots
        .iter()
        .flatten()
        .map(|&team| index.position(team).and_then(|i| ratings.get(i).copied()))
        .sum()
}

/// Root-mean-square error of predicted vs observed alliance scores over the
/// scored matches.
pub fn alliance_rmse(
    index: &TeamIndex,
    matches: &[MatchTeams],
    scores: &[Option<AlliancePair>],
    ratings: &[f64],
) -> Option<f64> {
    let mut sse = 0.0;
    let mut n = 0usize;
    for (teams, score) in matches.iter().zip(scores) {
        let Some(score) = score else { continue };
        for color in AllianceColor::BOTH {
            let predicted = predict_alliance(index, teams.alliance(color), ratings)?;
            let r = score.get(color) - predicted;
            sse += r * r;
            n += 1;
        }
    }
    if n == 0 {
        return None;
    }
    Some((sse / n as f64).sqrt())
}

/// Row order for a rating table.
///
/// `SortOrder::Opr` ranks by the total category (highest first) and falls back
/// to team order when that column is missing or failed.
pub fn table_order(teams: &[TeamId], columns: &[RatingColumn], sort: SortOrder) -> Vec<usize> {
    let mut order: Vec<usize> = (0..teams.len()).collect();
    order.sort_by_key(|&i| teams[i]);

    if sort == SortOrder::Opr {
        let total = columns
            .iter()
            .find(|c| c.category == ScoreCategory::Total)
            .and_then(|c| c.ratings.as_ref());
        if let Some(values) = total {
            // Stable sort keeps team order among ties.
            order.sort_by(|&a, &b| {
                let va = values.get(a).copied().unwrap_or(f64::NEG_INFINITY);
                let vb = values.get(b).copied().unwrap_or(f64::NEG_INFINITY);
                vb.partial_cmp(&va).unwrap_or(Ordering::Equal)
            });
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(category: ScoreCategory, ratings: Option<Vec<f64>>) -> RatingColumn {
        let error = ratings.is_none().then(|| "failed".to_string());
        RatingColumn {
            category,
            ratings,
            error,
        }
    }

    #[test]
    fn rmse_is_zero_for_an_exact_fit() {
        let matches = vec![MatchTeams::new(&[1, 2], &[3, 4]), MatchTeams::new(&[1, 3], &[2, 4])];
        let index = TeamIndex::build(&matches);
        let ratings = [10.0, 20.0, 30.0, 40.0];
        let scores = vec![Some(AlliancePair::new(30.0, 70.0)), Some(AlliancePair::new(40.0, 60.0))];
        assert_eq!(alliance_rmse(&index, &matches, &scores, &ratings), Some(0.0));

        // Off by 2 on every alliance; unscored matches do not count.
        let scores = vec![Some(AlliancePair::new(32.0, 68.0)), None];
        let rmse = alliance_rmse(&index, &matches, &scores, &ratings).unwrap();
        assert!((rmse - 2.0).abs() < 1e-12);

        assert_eq!(alliance_rmse(&index, &matches, &[None, None], &ratings), None);
    }

    #[test]
    fn absent_slots_do_not_contribute() {
        let matches = vec![MatchTeams {
            red: vec![Some(TeamId(5)), None],
            blue: vec![Some(TeamId(6)), Some(TeamId(7))],
        }];
        let index = TeamIndex::build(&matches);
        assert_eq!(predict_alliance(&index, &matches[0].red, &[4.0, 5.0, 6.0]), Some(4.0));
        assert_eq!(predict_alliance(&index, &[Some(TeamId(99))], &[4.0, 5.0, 6.0]), None);
    }

    #[test]
    fn opr_order_ranks_by_total_then_team() {
        let teams = [TeamId(30), TeamId(10), TeamId(20)];
        let columns = vec![column(ScoreCategory::Total, Some(vec![5.0, 9.0, 5.0]))];
        assert_eq!(table_order(&teams, &columns, SortOrder::Team), vec![1, 2, 0]);
        assert_eq!(table_order(&teams, &columns, SortOrder::Opr), vec![1, 2, 0]);

        let columns = vec![column(ScoreCategory::Total, Some(vec![50.0, 9.0, 5.0]))];
        assert_eq!(table_order(&teams, &columns, SortOrder::Opr), vec![0, 1, 2]);

        let failed = vec![column(ScoreCategory::Total, None)];
        assert_eq!(table_order(&teams, &failed, SortOrder::Opr), vec![1, 2, 0]);
    }
}
