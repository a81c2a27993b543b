//! Text construction for embedding.
//!
//! Both sides of the similarity come from here: the canonical text of an
//! episode and the query text describing the season a viewer is about to
//! start.

use crate::types::ScoringConfig;
use data_loader::{Episode, SeasonNumber};

/// Canonical text for an episode without a precomputed vector.
///
/// Sections appear in fixed order (title, summary, arcs), one per line, each
/// with a label. A section is omitted when its field is empty or its weight
/// is zero. Arcs are space-joined in sorted order.
pub fn episode_text(episode: &Episode, config: &ScoringConfig) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(3);

    if config.title_weight > 0.0 && !episode.title.is_empty() {
        parts.push(format!("title: {}", episode.title));
    }
    if config.summary_weight > 0.0 && !episode.summary.is_empty() {
        parts.push(format!("summary: {}", episode.summary));
    }
    if config.arcs_weight > 0.0 && !episode.arcs.is_empty() {
        // BTreeSet iterates in sorted order
        let arcs: Vec<&str> = episode.arcs.iter().map(String::as_str).collect();
        parts.push(format!("arcs: {}", arcs.join(" ")));
    }

    parts.join("\n")
}

/// Query text for one recommendation request.
///
/// Lines: `show: <id>` when known, `target season: <n>`, and
/// `key arcs: a, b` when any arcs are required. `arcs` must already be
/// sorted and deduplicated.
pub fn build_query_text<S: AsRef<str>>(
    target_season: SeasonNumber,
    show_id: Option<&str>,
    arcs: &[S],
) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(3);

    if let Some(show) = show_id.filter(|s| !s.is_empty()) {
        parts.push(format!("show: {}", show));
    }
    parts.push(format!("target season: {}", target_season));
    if !arcs.is_empty() {
        let arcs: Vec<&str> = arcs.iter().map(AsRef::as_ref).collect();
        parts.push(format!("key arcs: {}", arcs.join(", ")));
    }

    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_episode_text_orders_and_labels_sections() {
        let episode = Episode::new(1, 1)
            .with_title("Winter Is Coming")
            .with_summary("Introduces the Starks")
            .with_arcs(["White Walkers", "Stark Family"]);

        let text = episode_text(&episode, &ScoringConfig::default());
        assert_eq!(
            text,
            "title: Winter Is Coming\nsummary: Introduces the Starks\narcs: Stark Family White Walkers"
        );
    }

    #[test]
    fn test_episode_text_skips_empty_fields() {
        let episode = Episode::new(1, 1).with_summary("Only a summary");
        assert_eq!(
            episode_text(&episode, &ScoringConfig::default()),
            "summary: Only a summary"
        );
        assert_eq!(episode_text(&Episode::new(1, 2), &ScoringConfig::default()), "");
    }

    #[test]
    fn test_episode_text_skips_zero_weight_sections() {
        let episode = Episode::new(1, 1)
            .with_title("T")
            .with_summary("S")
            .with_arcs(["A"]);
        let config = ScoringConfig {
            title_weight: 0.0,
            arcs_weight: 0.0,
            ..ScoringConfig::default()
        };
        assert_eq!(episode_text(&episode, &config), "summary: S");
    }

    #[test]
    fn test_query_text() {
        assert_eq!(
            build_query_text(6, Some("got"), &["Stark Family", "White Walkers"]),
            "show: got\ntarget season: 6\nkey arcs: Stark Family, White Walkers"
        );
        assert_eq!(build_query_text::<&str>(2, None, &[]), "target season: 2");
        assert_eq!(build_query_text::<&str>(2, Some(""), &[]), "target season: 2");
    }
}
