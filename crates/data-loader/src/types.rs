//! Core domain types for episode catalogs.
//!
//! This module defines the fundamental data structures used throughout the system:
//! - Type aliases for domain clarity (SeasonNumber, EpisodeNumber, ArcTag)
//! - The normalized `Episode` record every other crate consumes
//! - `RequiredArcs`, the per-season arc requirement map
//! - `EpisodeCatalog`, the in-memory index over a loaded show

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// Type Aliases
// =============================================================================

/// Season number, starting at 1
pub type SeasonNumber = u32;

/// Episode number within a season, starting at 1
pub type EpisodeNumber = u32;

/// Opaque narrative-thread tag. Equality is exact string match.
pub type ArcTag = String;

/// Unique identifier of an episode within a catalog
pub type EpisodeId = String;

// =============================================================================
// Episode
// =============================================================================

/// A single normalized episode record.
///
/// Loaders may accept several input layouts, but by the time an `Episode`
/// exists every field has been coerced into this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: EpisodeId,
    pub season: SeasonNumber,
    pub number: EpisodeNumber,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    /// Arc tags, kept sorted so that text built from them is stable
    #[serde(default)]
    pub arcs: BTreeSet<ArcTag>,
    /// Precomputed embedding. When absent, one is derived from the text fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl Episode {
    /// Create an episode with an id synthesized from its season and number.
    pub fn new(season: SeasonNumber, number: EpisodeNumber) -> Self {
        Self {
            id: default_episode_id(season, number),
            season,
            number,
            title: String::new(),
            summary: String::new(),
            arcs: BTreeSet::new(),
            embedding: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn with_arcs<I, S>(mut self, arcs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arcs = arcs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// True if this episode carries the given arc tag
    pub fn has_arc(&self, arc: &str) -> bool {
        self.arcs.contains(arc)
    }
}

/// Identifier used when a record does not carry its own, e.g. `S01E05`
pub fn default_episode_id(season: SeasonNumber, number: EpisodeNumber) -> EpisodeId {
    format!("S{:02}E{:02}", season, number)
}

// =============================================================================
// Arc requirements
// =============================================================================

/// Arcs that must be covered per season. An absent season has no requirements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequiredArcs(BTreeMap<SeasonNumber, BTreeSet<ArcTag>>);

impl RequiredArcs {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Add one required arc for a season
    pub fn insert(&mut self, season: SeasonNumber, arc: impl Into<String>) {
        self.0.entry(season).or_default().insert(arc.into());
    }

    /// Builder-style variant of `insert` for a set of arcs
    pub fn with_season<I, S>(mut self, season: SeasonNumber, arcs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self.0.entry(season).or_default();
        entry.extend(arcs.into_iter().map(Into::into));
        self
    }

    /// Required arcs for a season; empty when the season has none
    pub fn for_season(&self, season: SeasonNumber) -> BTreeSet<ArcTag> {
        self.0.get(&season).cloned().unwrap_or_default()
    }

    /// Sorted union of arcs across every season
    pub fn union(&self) -> BTreeSet<ArcTag> {
        self.0.values().flatten().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|arcs| arcs.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SeasonNumber, &BTreeSet<ArcTag>)> {
        self.0.iter()
    }
}

impl FromIterator<(SeasonNumber, BTreeSet<ArcTag>)> for RequiredArcs {
    fn from_iter<T: IntoIterator<Item = (SeasonNumber, BTreeSet<ArcTag>)>>(iter: T) -> Self {
        let mut required = RequiredArcs::new();
        for (season, arcs) in iter {
            required.0.entry(season).or_default().extend(arcs);
        }
        required
    }
}

// =============================================================================
// Loading diagnostics
// =============================================================================

/// A record the loader could not turn into an `Episode`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    /// Position of the record in its source list
    pub position: usize,
    pub reason: String,
}

// =============================================================================
// EpisodeCatalog - in-memory index over one show
// =============================================================================

/// Holds every episode of one show plus lookup indices.
///
/// Episodes keep their source order; indices store positions into that list.
#[derive(Debug, Clone, Default)]
pub struct EpisodeCatalog {
    pub(crate) show_id: Option<String>,
    pub(crate) title: Option<String>,
    /// Show-level arcs a viewer is expected to follow
    pub(crate) core_arcs: BTreeSet<ArcTag>,

    pub(crate) episodes: Vec<Episode>,

    /// Positions of episodes per season, in source order
    pub(crate) season_index: BTreeMap<SeasonNumber, Vec<usize>>,
    /// Positions of episodes per arc tag
    pub(crate) arc_index: BTreeMap<ArcTag, Vec<usize>>,

    /// Records dropped while loading
    pub(crate) skipped: Vec<SkippedRecord>,
}

impl EpisodeCatalog {
    /// Creates a new, empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show_id(&self) -> Option<&str> {
        self.show_id.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn core_arcs(&self) -> &BTreeSet<ArcTag> {
        &self.core_arcs
    }

    /// All episodes in source order
    pub fn episodes(&self) -> &[Episode] {
        &self.episodes
    }

    /// Season numbers present in the catalog, ascending
    pub fn seasons(&self) -> impl Iterator<Item = SeasonNumber> + '_ {
        self.season_index.keys().copied()
    }

    /// Episodes of one season in source order
    pub fn season_episodes(&self, season: SeasonNumber) -> Vec<&Episode> {
        self.season_index
            .get(&season)
            .map(|positions| positions.iter().map(|&i| &self.episodes[i]).collect())
            .unwrap_or_default()
    }

    /// Episodes tagged with an arc, in source order
    pub fn episodes_with_arc(&self, arc: &str) -> Vec<&Episode> {
        self.arc_index
            .get(arc)
            .map(|positions| positions.iter().map(|&i| &self.episodes[i]).collect())
            .unwrap_or_default()
    }

    /// Every arc tag used by at least one episode, with its episode count
    pub fn arc_counts(&self) -> impl Iterator<Item = (&str, usize)> {
        self.arc_index
            .iter()
            .map(|(arc, positions)| (arc.as_str(), positions.len()))
    }

    pub fn get_episode(&self, season: SeasonNumber, number: EpisodeNumber) -> Option<&Episode> {
        self.season_index
            .get(&season)?
            .iter()
            .map(|&i| &self.episodes[i])
            .find(|episode| episode.number == number)
    }

    pub fn skipped(&self) -> &[SkippedRecord] {
        &self.skipped
    }

    /// (seasons, episodes, distinct arcs)
    pub fn counts(&self) -> (usize, usize, usize) {
        (
            self.season_index.len(),
            self.episodes.len(),
            self.arc_index.len(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }
}
