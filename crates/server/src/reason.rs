//! Human-readable reasons attached to each pick.
//!
//! Coverage beats relevance: an episode that was first to cover a required
//! arc says so, everything else is described by its relevance bucket.

use pipeline::PlannedEpisode;
use serde::{Deserialize, Serialize};

/// Fallback reason for picks that neither cover an arc nor score well
pub const CONTEXT_REASON: &str = "Selected for context";

/// Score cut-offs for the relevance buckets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasonThresholds {
    /// At or above: "Highly relevant"
    pub high: f32,
    /// At or above (and below `high`): "Relevant"
    pub moderate: f32,
}

impl Default for ReasonThresholds {
    fn default() -> Self {
        Self {
            high: 0.25,
            moderate: 0.05,
        }
    }
}

impl ReasonThresholds {
    pub fn validate(&self) -> Result<(), String> {
        if !self.high.is_finite() || !self.moderate.is_finite() {
            return Err("reason thresholds must be finite".to_string());
        }
        if self.moderate > self.high {
            return Err(format!(
                "reasons.moderate ({}) is above reasons.high ({})",
                self.moderate, self.high
            ));
        }
        Ok(())
    }
}

/// Reason string for one planned episode
pub fn reason_for(planned: &PlannedEpisode, thresholds: &ReasonThresholds) -> String {
    if !planned.newly_covered.is_empty() {
        let arcs: Vec<&str> = planned.newly_covered.iter().map(String::as_str).collect();
        return format!("Covers required arcs: {}", arcs.join(", "));
    }

    let score = planned.score();
    if score >= thresholds.high {
        format!("Highly relevant to the upcoming season (score {:.2})", score)
    } else if score >= thresholds.moderate {
        format!("Relevant to the upcoming season (score {:.2})", score)
    } else {
        CONTEXT_REASON.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::Episode;
    use scoring::ScoredEpisode;
    use std::collections::BTreeSet;

    fn planned(score: f32, newly_covered: &[&str]) -> PlannedEpisode {
        PlannedEpisode {
            scored: ScoredEpisode::new(Episode::new(1, 1), score),
            newly_covered: newly_covered.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
        }
    }

    #[test]
    fn test_covered_arcs_are_named_in_order() {
        let picked = planned(0.9, &["White Walkers", "Stark Family"]);
        let reason = reason_for(&picked, &ReasonThresholds::default());
        assert_eq!(reason, "Covers required arcs: Stark Family, White Walkers");
    }

    #[test]
    fn test_relevance_buckets() {
        let thresholds = ReasonThresholds::default();
        assert!(reason_for(&planned(0.4, &[]), &thresholds).starts_with("Highly relevant"));
        assert!(reason_for(&planned(0.1, &[]), &thresholds).starts_with("Relevant"));
        assert_eq!(reason_for(&planned(-0.2, &[]), &thresholds), CONTEXT_REASON);
    }

    #[test]
    fn test_validate() {
        assert!(ReasonThresholds::default().validate().is_ok());
        let inverted = ReasonThresholds { high: 0.1, moderate: 0.2 };
        assert!(inverted.validate().is_err());
    }
}
