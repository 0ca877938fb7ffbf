//! MMSE (ridge-regularized) Offensive Power Rating regression.
//!
//! Each scored match contributes two observations, one per alliance:
//!
//! ```text
//! score(alliance) ≈ Σ opr(team)   for team in alliance
//! ```
//!
//! Stacking them gives `A x ≈ b` with a `2n × T` 0/1 membership matrix `A`
//! (red rows first, then blue rows). Classical OPR is the least-squares solution
//! of that system. It becomes unsolvable (or wildly unstable) when there are few
//! matches or when teams always play together, so we solve the MMSE form instead:
//!
//! ```text
//! (AᵗA + λI) x = Aᵗ(b - mean alliance score)
//! opr = x + mean team offense
//! ```
//!
//! Centering first means the regularization pulls every team towards the
//! average team instead of towards zero. `λ = 0` reproduces classical OPR; the
//! ratings converge to the classical values as the number of matches grows.
//! The more random the scores of a game, the larger λ should be; 1–3 suits most
//! games.

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

use crate::domain::{AllianceColor, AlliancePair, MatchTeams, TeamId};
use crate::math::solve_regularized;
use crate::opr::TeamIndex;

/// Why a rating vector could not be produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OprError {
    #[error("invalid teams per alliance: {0}")]
    InvalidTeamsPerAlliance(usize),

    #[error("MMSE parameter must be finite and >= 0 (got {0})")]
    InvalidRegularization(f64),

    #[error("got team lists for {matches} matches but scores for {scores}")]
    DimensionMismatch { matches: usize, scores: usize },

    #[error("no scored matches to compute ratings from")]
    NoScoredMatches,

    #[error("match #{match_index}: {color} alliance has {found} team slots, expected {expected}")]
    AllianceSize {
        match_index: usize,
        color: AllianceColor,
        expected: usize,
        found: usize,
    },

    #[error("match #{match_index}: {color} alliance has an empty team slot")]
    AbsentTeam { match_index: usize, color: AllianceColor },

    #[error("match #{match_index}: team {team} is not in the team index")]
    UnknownTeam { match_index: usize, team: TeamId },

    #[error("match #{match_index}: team {team} appears twice in the {color} alliance")]
    DuplicateTeam {
        match_index: usize,
        color: AllianceColor,
        team: TeamId,
    },

    #[error("match #{match_index}: {color} score is not a finite number")]
    NonFiniteScore { match_index: usize, color: AllianceColor },

    #[error("ratings undetermined: match matrix is singular (rcond={rcond:.2e}); use an MMSE parameter > 0 or more matches")]
    Singular { rcond: f64 },
}

impl OprError {
    /// Numerical failure on otherwise well-formed input.
    pub fn is_singular(&self) -> bool {
        matches!(self, OprError::Singular { .. })
    }

    /// Malformed input; no choice of λ can fix it.
    pub fn is_precondition(&self) -> bool {
        !self.is_singular()
    }
}

/// A solved rating vector plus the quantities it was derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct OprSolution {
    /// One rating per team, aligned with the team index.
    pub ratings: Vec<f64>,
    /// Average per-team share of an alliance score over the scored matches.
    pub mean_team_offense: f64,
    pub scored_matches: usize,
}

/// Compute MMSE OPRs for one score category.
///
/// `scores[i]` belongs to `matches[i]`; `None` marks an unscored match, which is
/// left out of the regression. Every scored match must have exactly
/// `teams_per_alliance` teams per alliance, all present in `index`.
pub fn compute_mmse(
    mmse: f64,
    index: &TeamIndex,
    teams_per_alliance: usize,
    matches: &[MatchTeams],
    scores: &[Option<AlliancePair>],
) -> Result<OprSolution, OprError> {
    if teams_per_alliance == 0 {
        return Err(OprError::InvalidTeamsPerAlliance(teams_per_alliance));
    }
    if !(mmse.is_finite() && mmse >= 0.0) {
        return Err(OprError::InvalidRegularization(mmse));
    }
    if matches.len() != scores.len() {
        return Err(OprError::DimensionMismatch {
            matches: matches.len(),
            scores: scores.len(),
        });
    }

    let scored: Vec<(usize, &MatchTeams, AlliancePair)> = matches
        .iter()
        .zip(scores)
        .enumerate()
        .filter_map(|(i, (teams, score))| score.map(|s| (i, teams, s)))
        .collect();
    if scored.is_empty() {
        return Err(OprError::NoScoredMatches);
    }

    let n = scored.len();
    let observations = n
        .checked_mul(2)
        .and_then(|rows| rows.checked_mul(teams_per_alliance))
        .ok_or(OprError::InvalidTeamsPerAlliance(teams_per_alliance))?;
    let mut a = DMatrix::<f64>::zeros(2 * n, index.len());
    let mut b = DVector::<f64>::zeros(2 * n);

    for (row, &(match_index, teams, score)) in scored.iter().enumerate() {
        for (offset, color) in AllianceColor::BOTH.into_iter().enumerate() {
            let r = row + offset * n;
            for col in alliance_columns(index, teams_per_alliance, match_index, color, teams.alliance(color))? {
                a[(r, col)] = 1.0;
            }
            let value = score.get(color);
            if !value.is_finite() {
                return Err(OprError::NonFiniteScore { match_index, color });
            }
            b[r] = value;
        }
    }

    let mean_team_offense = b.sum() / observations as f64;
    // Each row sums `teams_per_alliance` ratings, so the mean alliance score is
    // `teams_per_alliance` mean teams.
    b.add_scalar_mut(-(teams_per_alliance as f64) * mean_team_offense);

    let x = solve_regularized(&a, &b, mmse).map_err(|e| OprError::Singular { rcond: e.rcond })?;

    Ok(OprSolution {
        ratings: x.iter().map(|v| v + mean_team_offense).collect(),
        mean_team_offense,
        scored_matches: n,
    })
}

/// Classical least-squares OPR (`λ = 0`).
pub fn compute_opr(
    index: &TeamIndex,
    teams_per_alliance: usize,
    matches: &[MatchTeams],
    scores: &[Option<AlliancePair>],
) -> Result<OprSolution, OprError> {
    compute_mmse(0.0, index, teams_per_alliance, matches, scores)
}

/// Resolve one alliance to design-matrix columns.
fn alliance_columns(
    index: &TeamIndex,
    teams_per_alliance: usize,
    match_index: usize,
    color: AllianceColor,
    slots: &[Option<TeamId>],
) -> Result<Vec<usize>, OprError> {
    if slots.len() != teams_per_alliance {
        return Err(OprError::AllianceSize {
            match_index,
            color,
            expected: teams_per_alliance,
            found: slots.len(),
        });
    }

    let mut cols = Vec::with_capacity(slots.len());
    for slot in slots {
        let team = slot.ok_or(OprError::AbsentTeam { match_index, color })?;
        let col = index
            .position(team)
            .ok_or(OprError::UnknownTeam { match_index, team })?;
        if cols.contains(&col) {
            return Err(OprError::DuplicateTeam {
                match_index,
                color,
                team,
            });
        }
        cols.push(col);
    }
    Ok(cols)
}

#[cfg(test)]
mod tests {
    use rand::prelude::*;
    use rand::rngs::StdRng;

    use super::*;

    fn scored(pairs: &[(f64, f64)]) -> Vec<Option<AlliancePair>> {
        pairs.iter().map(|&(r, b)| Some(AlliancePair::new(r, b))).collect()
    }

    /// Four teams, every pairing once.
    fn round_robin() -> (Vec<MatchTeams>, Vec<Option<AlliancePair>>) {
        let matches = vec![
            MatchTeams::new(&[1, 2], &[3, 4]),
            MatchTeams::new(&[1, 3], &[2, 4]),
            MatchTeams::new(&[1, 4], &[2, 3]),
        ];
        let scores = scored(&[(50.0, 30.0), (45.0, 40.0), (55.0, 25.0)]);
        (matches, scores)
    }

    fn variance(v: &[f64]) -> f64 {
        let mean = v.iter().sum::<f64>() / v.len() as f64;
        v.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / v.len() as f64
    }

    #[test]
    fn classical_opr_on_round_robin() {
        let (matches, scores) = round_robin();
        let index = TeamIndex::build(&matches);
        let sol = compute_opr(&index, 2, &matches, &scores).unwrap();

        let expected = [205.0 / 6.0, 50.0 / 3.0, 55.0 / 6.0, 65.0 / 3.0];
        for (got, want) in sol.ratings.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9, "got {got}, want {want}");
        }
        assert_eq!(sol.scored_matches, 3);
        assert!((sol.mean_team_offense - 245.0 / 12.0).abs() < 1e-12);

        // Every team plays three times, so the ratings sum to 4 mean teams.
        let sum: f64 = sol.ratings.iter().sum();
        assert!((sum - 4.0 * sol.mean_team_offense).abs() < 1e-9);
    }

    #[test]
    fn zero_lambda_satisfies_normal_equations() {
        let (matches, scores) = round_robin();
        let index = TeamIndex::build(&matches);
        let sol = compute_mmse(0.0, &index, 2, &matches, &scores).unwrap();

        // Aᵗ(Ax - b) = 0 on the uncentered problem.
        let mut grad = [0.0; 4];
        for (m, s) in matches.iter().zip(&scores) {
            let s = s.unwrap();
            for color in AllianceColor::BOTH {
                let cols: Vec<usize> = m
                    .alliance(color)
                    .iter()
                    .map(|t| index.position(t.unwrap()).unwrap())
                    .collect();
                let residual: f64 = cols.iter().map(|&c| sol.ratings[c]).sum::<f64>() - s.get(color);
                for c in cols {
                    grad[c] += residual;
                }
            }
        }
        assert!(grad.iter().all(|g| g.abs() < 1e-9), "{grad:?}");
    }

    #[test]
    fn known_mmse_values() {
        let (matches, scores) = round_robin();
        let index = TeamIndex::build(&matches);
        let sol = compute_mmse(1.0, &index, 2, &matches, &scores).unwrap();
        let expected = [355.0 / 12.0, 215.0 / 12.0, 155.0 / 12.0, 85.0 / 4.0];
        for (got, want) in sol.ratings.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9, "got {got}, want {want}");
        }
    }

    #[test]
    fn larger_lambda_shrinks_spread() {
        let (matches, scores) = round_robin();
        let index = TeamIndex::build(&matches);

        let spreads: Vec<f64> = [0.0, 0.5, 1.0, 3.0, 10.0]
            .iter()
            .map(|&l| variance(&compute_mmse(l, &index, 2, &matches, &scores).unwrap().ratings))
            .collect();
        assert!(spreads.windows(2).all(|w| w[1] < w[0]), "{spreads:?}");

        let sol = compute_mmse(1e12, &index, 2, &matches, &scores).unwrap();
        for r in &sol.ratings {
            assert!((r - sol.mean_team_offense).abs() < 1e-6);
        }
    }

    #[test]
    fn appearance_weighted_mean_is_preserved() {
        // Unbalanced schedule: team 1 plays more often than the others.
        let matches = vec![
            MatchTeams::new(&[1, 2], &[3, 4]),
            MatchTeams::new(&[1, 3], &[2, 5]),
            MatchTeams::new(&[1, 4], &[3, 5]),
            MatchTeams::new(&[1, 5], &[2, 4]),
            MatchTeams::new(&[2, 3], &[4, 5]),
        ];
        let scores = scored(&[(60.0, 35.0), (52.0, 41.0), (48.0, 30.0), (66.0, 38.0), (27.0, 33.0)]);
        let index = TeamIndex::build(&matches);
        let sol = compute_opr(&index, 2, &matches, &scores).unwrap();

        let mut appearances = vec![0.0; index.len()];
        for team in matches.iter().flat_map(|m| m.teams()) {
            appearances[index.position(team).unwrap()] += 1.0;
        }
        let weighted: f64 = appearances.iter().zip(&sol.ratings).map(|(w, r)| w * r).sum();
        let mean = weighted / appearances.iter().sum::<f64>();
        assert!((mean - sol.mean_team_offense).abs() < 1e-9);
    }

    #[test]
    fn three_team_alliances_recover_exact_offense() {
        let truth: [f64; 7] = [12.0, 30.0, 7.0, 22.0, 15.0, 40.0, 9.0];
        let mut rng = StdRng::seed_from_u64(7);
        let ids: Vec<u32> = (0..7).map(|i| 100 + i).collect();

        let mut matches = Vec::new();
        let mut scores = Vec::new();
        for _ in 0..30 {
            let picked: Vec<usize> = (0..7).choose_multiple(&mut rng, 6);
            let red: Vec<u32> = picked[..3].iter().map(|&i| ids[i]).collect();
            let blue: Vec<u32> = picked[3..].iter().map(|&i| ids[i]).collect();
            let red_score: f64 = picked[..3].iter().map(|&i| truth[i]).sum();
            let blue_score: f64 = picked[3..].iter().map(|&i| truth[i]).sum();
            matches.push(MatchTeams::new(&red, &blue));
            scores.push(Some(AlliancePair::new(red_score, blue_score)));
        }

        let index = TeamIndex::build(&matches);
        assert_eq!(index.len(), 7);
        let sol = compute_opr(&index, 3, &matches, &scores).unwrap();
        for (got, want) in sol.ratings.iter().zip(truth) {
            assert!((got - want).abs() < 1e-8, "got {got}, want {want}");
        }
    }

    #[test]
    fn unscored_matches_are_ignored() {
        let (mut matches, mut scores) = round_robin();
        let index = TeamIndex::build(&matches);
        let baseline = compute_mmse(1.0, &index, 2, &matches, &scores).unwrap();

        matches.push(MatchTeams::new(&[2, 1], &[4, 3]));
        scores.push(None);
        let with_pending = compute_mmse(1.0, &index, 2, &matches, &scores).unwrap();
        assert_eq!(baseline, with_pending);
    }

    #[test]
    fn inseparable_teams_are_singular_without_regularization() {
        // Teams 1 and 2 always play together.
        let matches = vec![
            MatchTeams::new(&[1, 2], &[3, 4]),
            MatchTeams::new(&[1, 2], &[3, 5]),
            MatchTeams::new(&[1, 2], &[4, 5]),
            MatchTeams::new(&[3, 4], &[5, 6]),
            MatchTeams::new(&[3, 6], &[4, 5]),
        ];
        let scores = scored(&[(40.0, 30.0), (42.0, 28.0), (39.0, 33.0), (25.0, 31.0), (29.0, 27.0)]);
        let index = TeamIndex::build(&matches);

        let err = compute_opr(&index, 2, &matches, &scores).unwrap_err();
        assert!(err.is_singular(), "{err}");

        let sol = compute_mmse(1.0, &index, 2, &matches, &scores).unwrap();
        assert!(sol.ratings.iter().all(|r| r.is_finite()));
        // Indistinguishable teams share the same rating.
        assert!((sol.ratings[0] - sol.ratings[1]).abs() < 1e-9);
    }

    #[test]
    fn identical_inputs_give_identical_outputs() {
        let (matches, scores) = round_robin();
        let index = TeamIndex::build(&matches);
        let a = compute_mmse(2.0, &index, 2, &matches, &scores).unwrap();
        let b = compute_mmse(2.0, &index, 2, &matches, &scores).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn malformed_input_is_a_precondition_error() {
        let (matches, scores) = round_robin();
        let index = TeamIndex::build(&matches);

        let err = compute_mmse(1.0, &index, 0, &matches, &scores).unwrap_err();
        assert_eq!(err, OprError::InvalidTeamsPerAlliance(0));

        let err = compute_mmse(-0.5, &index, 2, &matches, &scores).unwrap_err();
        assert_eq!(err, OprError::InvalidRegularization(-0.5));

        let err = compute_mmse(1.0, &index, 2, &matches, &scores[..2]).unwrap_err();
        assert_eq!(err, OprError::DimensionMismatch { matches: 3, scores: 2 });

        let err = compute_mmse(1.0, &index, 3, &matches, &scores).unwrap_err();
        assert!(matches!(err, OprError::AllianceSize { expected: 3, found: 2, .. }));

        // 3 matches x 2 alliances x huge alliances overflows the observation count.
        let huge = usize::MAX / 2;
        let err = compute_mmse(1.0, &index, huge, &matches, &scores).unwrap_err();
        assert_eq!(err, OprError::InvalidTeamsPerAlliance(huge));

        let err = compute_mmse(1.0, &index, 2, &matches, &[None, None, None]).unwrap_err();
        assert_eq!(err, OprError::NoScoredMatches);

        // Index built from the first red alliance only.
        let red_only = MatchTeams {
            red: matches[0].red.clone(),
            blue: vec![None, None],
        };
        let partial = TeamIndex::build([&red_only]);
        let err = compute_mmse(1.0, &partial, 2, &matches, &scores).unwrap_err();
        assert_eq!(err, OprError::UnknownTeam { match_index: 0, team: TeamId(3) });

        assert!(err.is_precondition());
    }

    #[test]
    fn absent_and_duplicate_slots_are_rejected() {
        let index = TeamIndex::build(&[MatchTeams::new(&[1, 2], &[3, 4])]);
        let scores = scored(&[(10.0, 20.0)]);

        let short = vec![MatchTeams {
            red: vec![Some(TeamId(1)), None],
            blue: vec![Some(TeamId(3)), Some(TeamId(4))],
        }];
        let err = compute_mmse(1.0, &index, 2, &short, &scores).unwrap_err();
        assert_eq!(err, OprError::AbsentTeam { match_index: 0, color: AllianceColor::Red });

        let doubled = vec![MatchTeams::new(&[1, 2], &[4, 4])];
        let err = compute_mmse(1.0, &index, 2, &doubled, &scores).unwrap_err();
        assert_eq!(
            err,
            OprError::DuplicateTeam { match_index: 0, color: AllianceColor::Blue, team: TeamId(4) }
        );
    }

    #[test]
    fn non_finite_scores_are_rejected() {
        let matches = vec![MatchTeams::new(&[1, 2], &[3, 4])];
        let index = TeamIndex::build(&matches);
        let err = compute_mmse(1.0, &index, 2, &matches, &scored(&[(10.0, f64::NAN)])).unwrap_err();
        assert_eq!(err, OprError::NonFiniteScore { match_index: 0, color: AllianceColor::Blue });
    }
}
