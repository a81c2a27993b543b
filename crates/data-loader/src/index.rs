//! EpisodeCatalog building and indexing logic.
//!
//! This module builds the EpisodeCatalog from parsed records:
//! - Drop duplicate ids and duplicate (season, number) pairs, first one wins
//! - Build the season and arc indices
//! - Drop precomputed embeddings that disagree with the catalog's dimension,
//!   so those episodes get embedded from text instead

use crate::error::{DataLoadError, Result};
use crate::parser::{self, ParsedCatalog};
use crate::types::*;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

impl EpisodeCatalog {
    /// Load a catalog from a JSON file.
    ///
    /// Steps:
    /// 1. Read and decode the file
    /// 2. Flatten whichever layout it uses into episode records
    /// 3. Build indices, dropping duplicates
    /// 4. Drop embeddings of the wrong dimension and validate
    pub fn load_from_file(path: &Path, show: Option<&str>) -> Result<Self> {
        if !path.exists() {
            return Err(DataLoadError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let json = fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&json, show)?;

        let (seasons, episodes, arcs) = catalog.counts();
        info!(
            "Loaded {} episodes across {} seasons ({} arcs, {} records skipped) from {}",
            episodes,
            seasons,
            arcs,
            catalog.skipped.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Build a catalog from JSON text in any supported layout
    pub fn from_json_str(json: &str, show: Option<&str>) -> Result<Self> {
        let parsed = parser::parse_catalog_str(json, show)?;
        Self::from_parsed(parsed)
    }

    /// Build a catalog from already-normalized episodes
    pub fn from_episodes(episodes: Vec<Episode>) -> Result<Self> {
        Self::from_parsed(ParsedCatalog {
            episodes,
            ..ParsedCatalog::default()
        })
    }

    /// Attach show metadata (builder pattern)
    pub fn with_show(mut self, show_id: impl Into<String>) -> Self {
        self.show_id = Some(show_id.into());
        self
    }

    pub fn with_core_arcs<I, S>(mut self, arcs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.core_arcs = arcs.into_iter().map(Into::into).collect();
        self
    }

    fn from_parsed(parsed: ParsedCatalog) -> Result<Self> {
        let mut catalog = EpisodeCatalog {
            show_id: parsed.show_id,
            title: parsed.title,
            core_arcs: parsed.core_arcs,
            skipped: parsed.skipped,
            ..EpisodeCatalog::default()
        };

        let mut seen_ids: HashSet<EpisodeId> = HashSet::new();
        let mut seen_slots: HashSet<(SeasonNumber, EpisodeNumber)> = HashSet::new();

        for (position, episode) in parsed.episodes.into_iter().enumerate() {
            if !seen_slots.insert((episode.season, episode.number)) {
                warn!(
                    "Duplicate episode S{}E{} ({}), keeping the first record",
                    episode.season, episode.number, episode.id
                );
                catalog.skipped.push(SkippedRecord {
                    position,
                    reason: format!("duplicate episode S{}E{}", episode.season, episode.number),
                });
                continue;
            }
            if !seen_ids.insert(episode.id.clone()) {
                warn!("Duplicate episode id {}, keeping the first record", episode.id);
                catalog.skipped.push(SkippedRecord {
                    position,
                    reason: format!("duplicate episode id {}", episode.id),
                });
                continue;
            }
            catalog.episodes.push(episode);
        }

        catalog.build_indices();
        catalog.drop_mismatched_embeddings();
        catalog.validate()?;
        Ok(catalog)
    }

    /// Rebuild the season and arc indices from the episode list
    pub fn build_indices(&mut self) {
        self.season_index.clear();
        self.arc_index.clear();

        for (position, episode) in self.episodes.iter().enumerate() {
            self.season_index
                .entry(episode.season)
                .or_default()
                .push(position);

            for arc in &episode.arcs {
                self.arc_index.entry(arc.clone()).or_default().push(position);
            }
        }
    }

    /// Make precomputed embeddings agree on one dimension.
    ///
    /// The most common non-zero dimension wins (the earliest one on a tie).
    /// Empty vectors and vectors of any other dimension are discarded with a
    /// warning; those episodes fall back to text embedding at scoring time.
    /// Returns how many vectors were discarded.
    pub fn drop_mismatched_embeddings(&mut self) -> usize {
        let mut counts: HashMap<usize, (usize, usize)> = HashMap::new();
        for (position, embedding) in self
            .episodes
            .iter()
            .filter_map(|e| e.embedding.as_ref())
            .enumerate()
        {
            if !embedding.is_empty() {
                counts.entry(embedding.len()).or_insert((0, position)).0 += 1;
            }
        }
        let dimension = counts
            .iter()
            .max_by(|a, b| a.1.0.cmp(&b.1.0).then(b.1.1.cmp(&a.1.1)))
            .map(|(dimension, _)| *dimension);

        let mut dropped = 0;
        for episode in &mut self.episodes {
            let Some(embedding) = &episode.embedding else {
                continue;
            };
            if Some(embedding.len()) == dimension {
                continue;
            }
            match dimension {
                Some(expected) => warn!(
                    "Episode {} has a {}-dimensional embedding, expected {}; dropping it",
                    episode.id,
                    embedding.len(),
                    expected
                ),
                None => warn!("Episode {} has an empty embedding; dropping it", episode.id),
            }
            episode.embedding = None;
            dropped += 1;
        }
        dropped
    }

    /// Validate data integrity
    ///
    /// Check that:
    /// - No episode uses season or number 0
    /// - Precomputed embeddings are non-empty and share one dimension
    ///   (`drop_mismatched_embeddings` guarantees this for loaded catalogs)
    pub fn validate(&self) -> Result<()> {
        let mut dimension: Option<usize> = None;

        for episode in &self.episodes {
            if episode.season == 0 || episode.number == 0 {
                return Err(DataLoadError::InvalidValue {
                    field: "season/number".to_string(),
                    value: format!("S{}E{}", episode.season, episode.number),
                });
            }

            let Some(embedding) = &episode.embedding else {
                continue;
            };
            match dimension {
                None => dimension = Some(embedding.len()),
                Some(expected) if expected != embedding.len() => {
                    return Err(DataLoadError::ValidationError(format!(
                        "episode {} has a {}-dimensional embedding, expected {}",
                        episode.id,
                        embedding.len(),
                        expected
                    )));
                }
                Some(_) => {}
            }
        }

        if dimension == Some(0) {
            return Err(DataLoadError::ValidationError(
                "precomputed embeddings must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_episodes() -> Vec<Episode> {
        vec![
            Episode::new(1, 1).with_arcs(["A", "B"]),
            Episode::new(1, 2).with_arcs(["B"]),
            Episode::new(2, 1).with_arcs(["C"]),
        ]
    }

    #[test]
    fn test_indices_are_built() {
        let catalog = EpisodeCatalog::from_episodes(sample_episodes()).unwrap();

        assert_eq!(catalog.counts(), (2, 3, 3));
        assert_eq!(catalog.seasons().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(catalog.season_episodes(1).len(), 2);
        assert_eq!(catalog.episodes_with_arc("B").len(), 2);
        assert!(catalog.episodes_with_arc("missing").is_empty());
        assert_eq!(catalog.get_episode(2, 1).map(|e| e.id.as_str()), Some("S02E01"));
        assert!(catalog.get_episode(3, 1).is_none());
    }

    #[test]
    fn test_duplicates_keep_first_record() {
        let mut episodes = sample_episodes();
        episodes.push(Episode::new(1, 1).with_title("Replayed"));
        episodes.push(Episode::new(3, 1).with_id("S01E02"));

        let catalog = EpisodeCatalog::from_episodes(episodes).unwrap();

        assert_eq!(catalog.episodes().len(), 3);
        assert_eq!(catalog.get_episode(1, 1).map(|e| e.title.as_str()), Some(""));
        assert_eq!(catalog.skipped().len(), 2);
    }

    #[test]
    fn test_minority_embedding_dimension_is_dropped() {
        let episodes = vec![
            Episode::new(1, 1).with_embedding(vec![1.0, 0.0]),
            Episode::new(1, 2).with_embedding(vec![1.0, 0.0, 0.0]),
            Episode::new(1, 3).with_embedding(vec![0.0, 1.0, 0.0]),
            Episode::new(1, 4).with_embedding(Vec::new()),
            Episode::new(1, 5),
        ];

        let catalog = EpisodeCatalog::from_episodes(episodes).unwrap();

        let dims: Vec<Option<usize>> = catalog
            .episodes()
            .iter()
            .map(|e| e.embedding.as_ref().map(Vec::len))
            .collect();
        assert_eq!(dims, vec![None, Some(3), Some(3), None, None]);
        assert!(catalog.validate().is_ok());
    }

    #[test]
    fn test_embedding_dimension_tie_keeps_the_earliest() {
        let mut catalog = EpisodeCatalog::from_episodes(vec![
            Episode::new(1, 1).with_embedding(vec![1.0, 0.0, 0.0]),
            Episode::new(1, 2).with_embedding(vec![1.0, 0.0]),
        ])
        .unwrap();

        assert_eq!(catalog.episodes()[0].embedding.as_ref().map(Vec::len), Some(3));
        assert!(catalog.episodes()[1].embedding.is_none());
        assert_eq!(catalog.drop_mismatched_embeddings(), 0);
    }

    #[test]
    fn test_validate_rejects_mixed_dimensions() {
        let mut catalog = EpisodeCatalog::from_episodes(vec![
            Episode::new(1, 1).with_embedding(vec![1.0, 0.0]),
            Episode::new(1, 2),
        ])
        .unwrap();
        catalog.episodes[1].embedding = Some(vec![1.0, 0.0, 0.0]);

        assert!(matches!(catalog.validate(), Err(DataLoadError::ValidationError(_))));
        assert_eq!(catalog.drop_mismatched_embeddings(), 1);
        assert!(catalog.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"title": "Demo", "core_arcs": ["A"], "episodes": [
                {{"season": 1, "episode": 1, "arcs": ["A"]}},
                {{"season": 1}}
            ]}}"#
        )
        .unwrap();

        let catalog = EpisodeCatalog::load_from_file(file.path(), None).unwrap();

        assert_eq!(catalog.title(), Some("Demo"));
        assert!(catalog.core_arcs().contains("A"));
        assert_eq!(catalog.episodes().len(), 1);
        assert_eq!(catalog.skipped().len(), 1);
    }

    #[test]
    fn test_missing_file() {
        let result = EpisodeCatalog::load_from_file(Path::new("/no/such/catalog.json"), None);
        assert!(matches!(result, Err(DataLoadError::FileNotFound { .. })));
    }
}
