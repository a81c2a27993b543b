//! Coverage Planner - arc-complete episode selection for one season
//!
//! ## Algorithm
//! Greedy set cover with a hard cap:
//! 1. `budget` comes from the budget policy for the immersion level (always >= 1)
//! 2. `uncovered` starts as the season's required arcs
//! 3. Until `budget` episodes are picked or no candidates remain, pick the
//!    candidate with the largest `|arcs ∩ uncovered|`; ties go to the higher
//!    score, then to the earlier candidate in input order
//! 4. Once every required arc is covered the gain is 0 for everyone, so the
//!    same loop becomes a pure relevance fill
//!
//! Unsatisfiable requirements are never an error: the planner returns a best
//! effort selection and `CoverageReport` tells the caller what is missing.

use crate::budget::{BudgetPolicy, ImmersionLevel};
use data_loader::{ArcTag, Episode};
use scoring::ScoredEpisode;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use tracing::{debug, instrument};

/// What to do once the required arcs are covered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillPolicy {
    /// Keep picking the most relevant episodes until the budget is used up
    #[default]
    FillToBudget,

    /// Stop as soon as no candidate adds a required arc. At least one
    /// episode is still picked for any season with candidates.
    StopWhenCovered,
}

/// One selected episode plus the required arcs it was first to cover
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedEpisode {
    pub scored: ScoredEpisode,
    pub newly_covered: BTreeSet<ArcTag>,
}

impl PlannedEpisode {
    pub fn episode(&self) -> &Episode {
        &self.scored.episode
    }

    pub fn score(&self) -> f32 {
        self.scored.score
    }
}

/// Which required arcs a selection covers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoverageReport {
    pub covered: BTreeSet<ArcTag>,
    pub uncovered: BTreeSet<ArcTag>,
}

impl CoverageReport {
    /// Check a selection against a set of required arcs
    pub fn of<'a, I>(episodes: I, required: &BTreeSet<ArcTag>) -> Self
    where
        I: IntoIterator<Item = &'a Episode>,
    {
        let mut uncovered = required.clone();
        for episode in episodes {
            uncovered.retain(|arc| !episode.has_arc(arc));
        }
        let covered = required.difference(&uncovered).cloned().collect();
        Self { covered, uncovered }
    }

    pub fn is_complete(&self) -> bool {
        self.uncovered.is_empty()
    }
}

/// Greedy per-season planner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoveragePlanner {
    budget_policy: BudgetPolicy,
    fill_policy: FillPolicy,
}

impl CoveragePlanner {
    /// Planner with the default budget table and fill-to-budget
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_budget_policy(mut self, policy: BudgetPolicy) -> Self {
        self.budget_policy = policy;
        self
    }

    pub fn with_fill_policy(mut self, policy: FillPolicy) -> Self {
        self.fill_policy = policy;
        self
    }

    pub fn budget_policy(&self) -> &BudgetPolicy {
        &self.budget_policy
    }

    pub fn fill_policy(&self) -> FillPolicy {
        self.fill_policy
    }

    /// Budget for a season with `season_size` candidates, never below 1
    pub fn budget_for(&self, immersion: ImmersionLevel, season_size: usize) -> usize {
        self.budget_policy.budget_for(immersion, season_size).max(1)
    }

    /// Select episodes for one season.
    ///
    /// `scored` is expected in score order (descending); that order is the
    /// final tie-break and is never rearranged. Returns at most `budget`
    /// episodes in pick order.
    #[instrument(
        skip(self, scored, required_arcs),
        fields(candidates = scored.len(), required = required_arcs.len(), immersion = %immersion)
    )]
    pub fn select_for_season(
        &self,
        scored: &[ScoredEpisode],
        required_arcs: &BTreeSet<ArcTag>,
        immersion: ImmersionLevel,
    ) -> Vec<PlannedEpisode> {
        let budget = self.budget_for(immersion, scored.len());
        let mut uncovered = required_arcs.clone();
        let mut remaining: Vec<&ScoredEpisode> = scored.iter().collect();
        let mut selected = Vec::with_capacity(budget.min(scored.len()));

        while selected.len() < budget && !remaining.is_empty() {
            let (best, gain) = best_candidate(&remaining, &uncovered);

            if gain == 0
                && !selected.is_empty()
                && self.fill_policy == FillPolicy::StopWhenCovered
            {
                break;
            }

            let chosen = remaining.remove(best);
            let newly_covered: BTreeSet<ArcTag> = chosen
                .episode
                .arcs
                .intersection(&uncovered)
                .cloned()
                .collect();
            for arc in &newly_covered {
                uncovered.remove(arc);
            }

            selected.push(PlannedEpisode {
                scored: chosen.clone(),
                newly_covered,
            });
        }

        debug!(
            "Selected {} of {} episodes (budget {}, {} required arcs left uncovered)",
            selected.len(),
            scored.len(),
            budget,
            uncovered.len()
        );
        selected
    }
}

/// Index and gain of the best remaining candidate.
///
/// Comparisons are strict so the earliest candidate wins a full tie.
fn best_candidate(remaining: &[&ScoredEpisode], uncovered: &BTreeSet<ArcTag>) -> (usize, usize) {
    let mut best = 0;
    let mut best_gain = gain(remaining[0], uncovered);
    for (i, candidate) in remaining.iter().enumerate().skip(1) {
        let candidate_gain = gain(candidate, uncovered);
        let better = match candidate_gain.cmp(&best_gain) {
            Ordering::Greater => true,
            Ordering::Equal => {
                candidate.score.total_cmp(&remaining[best].score) == Ordering::Greater
            }
            Ordering::Less => false,
        };
        if better {
            best = i;
            best_gain = candidate_gain;
        }
    }
    (best, best_gain)
}

fn gain(candidate: &ScoredEpisode, uncovered: &BTreeSet<ArcTag>) -> usize {
    if uncovered.is_empty() {
        return 0;
    }
    candidate
        .episode
        .arcs
        .iter()
        .filter(|arc| uncovered.contains(*arc))
        .count()
}
