//! Synthetic event generation.
//!
//! Each team gets a hidden "true" offense; alliance scores are the sum of their
//! members' offense plus Gaussian noise, split into game phases. Because the
//! truth is known, generated events are handy for demos and for checking how
//! well (and how stably) the regression recovers team strength.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{AlliancePair, EventData, MatchRecord, MatchTeams, ScoreBreakdown, TeamId};
use crate::error::AppError;

/// Share of the non-penalty score credited to the autonomous period.
const AUTO_SHARE: f64 = 0.3;
/// Share of the non-penalty score credited to the endgame.
const ENDGAME_SHARE: f64 = 0.2;
/// Points an alliance is awarded per opposing foul.
const FOUL_POINTS: f64 = 10.0;

#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub teams: usize,
    pub matches: usize,
    pub teams_per_alliance: usize,
    pub seed: u64,
    /// Number assigned to the first team; the rest follow consecutively.
    pub first_team: u32,
    /// Average true offense per team.
    pub mean_offense: f64,
    /// Standard deviation of true offense across teams.
    pub offense_spread: f64,
    /// Standard deviation of the per-alliance score noise.
    pub noise: f64,
    /// Probability that an alliance is awarded foul points in a match.
    pub foul_rate: f64,
    /// Trailing matches left unscored (not played yet).
    pub unscored: usize,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            teams: 24,
            matches: 60,
            teams_per_alliance: 2,
            seed: 42,
            first_team: 1000,
            mean_offense: 40.0,
            offense_spread: 15.0,
            noise: 10.0,
            foul_rate: 0.1,
            unscored: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SampleEvent {
    pub event: EventData,
    /// True offense per team, ascending by team number.
    pub true_offense: Vec<(TeamId, f64)>,
}

pub fn generate_event(config: &SampleConfig) -> Result<SampleEvent, AppError> {
    if config.teams_per_alliance == 0 {
        return Err(AppError::new(2, "Teams per alliance must be at least 1."));
    }
    let per_match = config
        .teams_per_alliance
        .checked_mul(2)
        .ok_or_else(|| {
            AppError::new(
                2,
                format!("Invalid teams per alliance: {}.", config.teams_per_alliance),
            )
        })?;
    if config.teams < per_match {
        return Err(AppError::new(
            2,
            format!("Need at least {per_match} teams to fill a match, got {}.", config.teams),
        ));
    }
    if config.matches == 0 || config.unscored > config.matches {
        return Err(AppError::new(2, "Match count must be > 0 and cover the unscored matches."));
    }
    if !(config.foul_rate.is_finite() && (0.0..=1.0).contains(&config.foul_rate)) {
        return Err(AppError::new(2, "Foul rate must be within [0, 1]."));
    }
    let numbers_fit = u32::try_from(config.teams)
        .ok()
        .and_then(|n| config.first_team.checked_add(n))
        .is_some();
    if !numbers_fit {
        return Err(AppError::new(2, "Team numbers overflow."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let offense_dist = Normal::new(config.mean_offense, config.offense_spread)
        .map_err(|e| AppError::new(2, format!("Invalid offense distribution: {e}")))?;
    let noise_dist =
        Normal::new(0.0, config.noise).map_err(|e| AppError::new(2, format!("Invalid noise distribution: {e}")))?;

    let true_offense: Vec<(TeamId, f64)> = (0..config.teams)
        .map(|i| {
            let team = TeamId(config.first_team + i as u32);
            (team, offense_dist.sample(&mut rng).max(0.0))
        })
        .collect();

    // Deal teams from a shuffled deck so everyone plays about equally often.
    let mut deck: Vec<usize> = Vec::new();
    let mut matches = Vec::with_capacity(config.matches);
    let scored_matches = config.matches - config.unscored;

    for m in 0..config.matches {
        if deck.len() < per_match {
            deck = (0..config.teams).collect();
            deck.shuffle(&mut rng);
        }
        let drawn: Vec<usize> = deck.split_off(deck.len() - per_match);
        let (red, blue) = drawn.split_at(config.teams_per_alliance);

        let teams = MatchTeams {
            red: red.iter().map(|&i| Some(true_offense[i].0)).collect(),
            blue: blue.iter().map(|&i| Some(true_offense[i].0)).collect(),
        };

        let scores = if m < scored_matches {
            let red_base = alliance_score(red, &true_offense, &noise_dist, &mut rng);
            let blue_base = alliance_score(blue, &true_offense, &noise_dist, &mut rng);
            let red_fouls = foul_points(config.foul_rate, &mut rng);
            let blue_fouls = foul_points(config.foul_rate, &mut rng);
            Some(split_phases(
                AlliancePair::new(red_base, blue_base),
                AlliancePair::new(red_fouls, blue_fouls),
            ))
        } else {
            None
        };

        matches.push(MatchRecord {
            name: format!("Q-{}", m + 1),
            teams,
            scores,
        });
    }

    Ok(SampleEvent {
        event: EventData {
            teams_per_alliance: config.teams_per_alliance,
            matches,
        },
        true_offense,
    })
}

fn alliance_score(members: &[usize], offense: &[(TeamId, f64)], noise: &Normal<f64>, rng: &mut StdRng) -> f64 {
    let expected: f64 = members.iter().map(|&i| offense[i].1).sum();
    (expected + noise.sample(rng)).round().max(0.0)
}

fn foul_points(rate: f64, rng: &mut StdRng) -> f64 {
    if rng.gen_bool(rate) { FOUL_POINTS } else { 0.0 }
}

/// Split played points into auto/teleop/endgame and add the foul points.
fn split_phases(base: AlliancePair, penalty: AlliancePair) -> ScoreBreakdown {
    let split = |v: f64| {
        let auto = (v * AUTO_SHARE).round();
        let endgame = (v * ENDGAME_SHARE).round();
        (auto, v - auto - endgame, endgame)
    };
    let (red_auto, red_teleop, red_endgame) = split(base.red);
    let (blue_auto, blue_teleop, blue_endgame) = split(base.blue);

    ScoreBreakdown {
        total: AlliancePair::new(base.red + penalty.red, base.blue + penalty.blue),
        auto: AlliancePair::new(red_auto, blue_auto),
        teleop: AlliancePair::new(red_teleop, blue_teleop),
        endgame: AlliancePair::new(red_endgame, blue_endgame),
        penalty,
    }
}
