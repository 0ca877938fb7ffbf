//! Team index: the fixed column ordering shared by every regression of a run.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::{MatchTeams, TeamId};

/// Sorted, de-duplicated list of team numbers.
///
/// Position `i` in the index is column `i` of the design matrix and entry `i`
/// of every rating vector computed with it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamIndex {
    teams: Vec<TeamId>,
}

impl TeamIndex {
    /// Collect every team appearing in any alliance slot of `matches`.
    ///
    /// Absent slots are ignored. The result does not depend on match order.
    pub fn build<'a>(matches: impl IntoIterator<Item = &'a MatchTeams>) -> Self {
        let set: BTreeSet<TeamId> = matches.into_iter().flat_map(|m| m.teams()).collect();
        Self {
            teams: set.into_iter().collect(),
        }
    }

    pub fn teams(&self) -> &[TeamId] {
        &self.teams
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    /// Column of `team`, if it is part of the index.
    pub fn position(&self, team: TeamId) -> Option<usize> {
        self.teams.binary_search(&team).ok()
    }
}
