//! # Recommendation Orchestrator
//!
//! This module coordinates the entire recommendation pipeline:
//! 1. Filter the catalog to valid, prior-season, de-duplicated episodes
//! 2. Build one query text for the whole request
//! 3. Score every eligible episode once
//! 4. Group by season, keeping score order
//! 5. Plan each season under its budget (seasons in parallel)
//! 6. Attach reasons and order by season, then episode number
//!
//! Nothing eligible means an empty result and no embedding calls at all.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, instrument};

use data_loader::{ArcTag, Episode, EpisodeId, EpisodeNumber, SeasonNumber};
use embeddings::{EmbeddingProvider, HashEmbedder};
use pipeline::{
    CoveragePlanner, CoverageReport, FilterPipeline, ImmersionLevel, PlannedEpisode,
    ViewerContext,
};
use scoring::{ScoredEpisode, SimilarityScorer, build_query_text};

use crate::config::RecommenderConfig;
use crate::reason::{ReasonThresholds, reason_for};
use crate::response::{RecommendationItem, RecommendationResponse};

/// One episode the viewer should watch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub season: SeasonNumber,
    pub episode: EpisodeNumber,
    pub episode_id: EpisodeId,
    pub title: String,
    pub arcs: Vec<ArcTag>,
    pub reason: String,
    /// Relevance to the request's query, for diagnostics
    pub score: f32,
}

impl Recommendation {
    fn from_planned(planned: &PlannedEpisode, thresholds: &ReasonThresholds) -> Self {
        let episode = planned.episode();
        Self {
            season: episode.season,
            episode: episode.number,
            episode_id: episode.id.clone(),
            title: episode.title.clone(),
            arcs: episode.arcs.iter().cloned().collect(),
            reason: reason_for(planned, thresholds),
            score: planned.score(),
        }
    }
}

/// Result of one `recommend` call.
///
/// Seasons ascend, episodes within a season ascend by number. Seasons with no
/// eligible episodes are absent, never present with an empty list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendations {
    pub target_season: SeasonNumber,
    pub immersion: ImmersionLevel,
    pub show_id: Option<String>,
    seasons: BTreeMap<SeasonNumber, Vec<Recommendation>>,
    #[serde(skip)]
    coverage: BTreeMap<SeasonNumber, CoverageReport>,
}

impl Recommendations {
    fn empty(context: &ViewerContext) -> Self {
        Self {
            target_season: context.target_season,
            immersion: context.immersion,
            show_id: context.show_id.clone(),
            seasons: BTreeMap::new(),
            coverage: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.seasons.is_empty()
    }

    /// Total number of recommended episodes
    pub fn len(&self) -> usize {
        self.seasons.values().map(Vec::len).sum()
    }

    pub fn seasons(&self) -> impl Iterator<Item = SeasonNumber> + '_ {
        self.seasons.keys().copied()
    }

    pub fn season(&self, season: SeasonNumber) -> Option<&[Recommendation]> {
        self.seasons.get(&season).map(Vec::as_slice)
    }

    /// Every recommendation, in output order
    pub fn iter(&self) -> impl Iterator<Item = &Recommendation> {
        self.seasons.values().flatten()
    }

    /// Which of the season's required arcs the selection covers
    pub fn coverage(&self, season: SeasonNumber) -> Option<&CoverageReport> {
        self.coverage.get(&season)
    }

    /// True when every planned season covered all of its required arcs
    pub fn is_fully_covered(&self) -> bool {
        self.coverage.values().all(CoverageReport::is_complete)
    }

    /// Flatten into the wire shape
    pub fn to_response(&self) -> RecommendationResponse {
        let items = self
            .iter()
            .map(|rec| RecommendationItem {
                season: rec.season,
                episode: rec.episode,
                title: (!rec.title.is_empty()).then(|| rec.title.clone()),
                arcs: rec.arcs.clone(),
                reason: rec.reason.clone(),
            })
            .collect();

        RecommendationResponse {
            show_id: self.show_id.clone(),
            target_season: self.target_season,
            immersion: self.immersion.get(),
            items,
        }
    }
}

/// The plan for one season before it is turned into recommendations
struct SeasonPlan {
    season: SeasonNumber,
    picks: Vec<PlannedEpisode>,
    report: CoverageReport,
}

/// Main orchestrator that coordinates the recommendation pipeline
#[derive(Clone)]
pub struct RecommendationOrchestrator {
    filter_pipeline: Arc<FilterPipeline>,
    scorer: SimilarityScorer,
    planner: CoveragePlanner,
    reasons: ReasonThresholds,
    parallel_seasons: bool,
}

impl RecommendationOrchestrator {
    /// Create an orchestrator around an embedding backend, with default
    /// weights, budgets and reasons
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            filter_pipeline: Arc::new(FilterPipeline::standard()),
            scorer: SimilarityScorer::new(embedder),
            planner: CoveragePlanner::new(),
            reasons: ReasonThresholds::default(),
            parallel_seasons: true,
        }
    }

    /// Build every component from a validated config
    pub fn from_config(config: &RecommenderConfig) -> Result<Self> {
        config.validate().context("Invalid recommender config")?;
        let embedder = config
            .build_embedder()
            .context("Failed to build embedder")?;
        Self::from_config_with_embedder(config, embedder)
    }

    /// Like `from_config`, but over an embedder the caller already holds
    /// (for example to read cache statistics afterwards)
    pub fn from_config_with_embedder(
        config: &RecommenderConfig,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        config.validate().context("Invalid recommender config")?;

        info!(
            "Using {} embeddings ({} dimensions, cache {})",
            embedder.model_name(),
            embedder.dimension(),
            if config.embedding.cache { "on" } else { "off" }
        );

        Ok(Self::new(embedder)
            .with_scorer_config(config)
            .with_planner(config.planner())
            .with_reason_thresholds(config.reasons)
            .with_parallel_seasons(config.parallel_seasons))
    }

    /// Orchestrator over the default offline embedder
    pub fn offline() -> Self {
        Self::new(Arc::new(HashEmbedder::default()))
    }

    fn with_scorer_config(mut self, config: &RecommenderConfig) -> Self {
        self.scorer = self.scorer.with_config(config.scoring);
        self
    }

    pub fn with_planner(mut self, planner: CoveragePlanner) -> Self {
        self.planner = planner;
        self
    }

    pub fn with_reason_thresholds(mut self, reasons: ReasonThresholds) -> Self {
        self.reasons = reasons;
        self
    }

    pub fn with_parallel_seasons(mut self, parallel: bool) -> Self {
        self.parallel_seasons = parallel;
        self
    }

    /// Main entry point: catch-up episodes for the viewer's target season
    ///
    /// # Arguments
    /// * `episodes` - The full catalog, in catalog order
    /// * `context` - Target season, immersion, required arcs and show id
    ///
    /// # Errors
    /// Only embedding failures are errors. Malformed records are skipped and
    /// unsatisfiable arc requirements produce a partial selection.
    #[instrument(
        skip(self, episodes, context),
        fields(target_season = context.target_season, immersion = %context.immersion)
    )]
    pub fn recommend(
        &self,
        episodes: &[Episode],
        context: &ViewerContext,
    ) -> Result<Recommendations> {
        let start_time = Instant::now();

        let eligible = self.apply_filters(episodes.to_vec(), context)?;
        if eligible.is_empty() {
            info!(
                "No episodes before season {}, nothing to recommend",
                context.target_season
            );
            return Ok(Recommendations::empty(context));
        }

        let query = self.build_query(context);
        debug!("Query text: {:?}", query);

        let ranked = self
            .scorer
            .score(eligible, &query)
            .context("Failed to score episodes")?;

        let by_season = group_by_season(ranked);
        info!("Planning {} seasons", by_season.len());

        let plans = self.plan_seasons(by_season, context);

        let mut result = Recommendations::empty(context);
        for plan in plans {
            if plan.picks.is_empty() {
                continue;
            }
            let mut recommendations: Vec<Recommendation> = plan
                .picks
                .iter()
                .map(|planned| Recommendation::from_planned(planned, &self.reasons))
                .collect();
            recommendations.sort_by_key(|rec| rec.episode);

            result.seasons.insert(plan.season, recommendations);
            result.coverage.insert(plan.season, plan.report);
        }

        info!(
            "Recommended {} episodes across {} seasons in {:.2?}",
            result.len(),
            result.seasons.len(),
            start_time.elapsed()
        );
        Ok(result)
    }

    /// Apply the eligibility filters
    fn apply_filters(
        &self,
        episodes: Vec<Episode>,
        context: &ViewerContext,
    ) -> Result<Vec<Episode>> {
        let total = episodes.len();
        let eligible = self
            .filter_pipeline
            .apply(episodes, context)
            .context("Failed to apply filters")?;
        debug!("{} of {} episodes are eligible", eligible.len(), total);
        Ok(eligible)
    }

    /// One query for the whole request, from the sorted union of required arcs
    fn build_query(&self, context: &ViewerContext) -> String {
        let arcs: Vec<ArcTag> = context.required_arcs.union().into_iter().collect();
        build_query_text(context.target_season, context.show_id.as_deref(), &arcs)
    }

    /// Run the planner for every season.
    ///
    /// Seasons are independent, so they may run on the rayon pool; each
    /// season's greedy loop stays sequential.
    fn plan_seasons(
        &self,
        by_season: BTreeMap<SeasonNumber, Vec<ScoredEpisode>>,
        context: &ViewerContext,
    ) -> Vec<SeasonPlan> {
        let plan_one = |(season, ranked): (SeasonNumber, Vec<ScoredEpisode>)| {
            let required = context.required_for(season);
            let picks = self
                .planner
                .select_for_season(&ranked, &required, context.immersion);
            let report = CoverageReport::of(picks.iter().map(PlannedEpisode::episode), &required);
            if !report.is_complete() {
                info!(
                    "Season {} leaves required arcs uncovered: {:?}",
                    season, report.uncovered
                );
            }
            SeasonPlan {
                season,
                picks,
                report,
            }
        };

        if self.parallel_seasons {
            by_season.into_par_iter().map(plan_one).collect()
        } else {
            by_season.into_iter().map(plan_one).collect()
        }
    }
}

/// Group ranked episodes by season; each group keeps score order
fn group_by_season(ranked: Vec<ScoredEpisode>) -> BTreeMap<SeasonNumber, Vec<ScoredEpisode>> {
    let mut by_season: BTreeMap<SeasonNumber, Vec<ScoredEpisode>> = BTreeMap::new();
    for scored in ranked {
        by_season.entry(scored.episode.season).or_default().push(scored);
    }
    by_season
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::RequiredArcs;
    use embeddings::{EmbeddingError, EmbeddingResult};
    use std::sync::atomic::{AtomicUsize, Ordering};

    // ============================================================================
    // Test Fixtures
    // ============================================================================

    /// Counts calls that reach the embedding backend
    #[derive(Default)]
    struct CountingEmbedder {
        inner: HashEmbedder,
        calls: AtomicUsize,
    }

    impl EmbeddingProvider for CountingEmbedder {
        fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.embed(text)
        }

        fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.embed_batch(texts)
        }

        fn dimension(&self) -> usize {
            self.inner.dimension()
        }

        fn model_name(&self) -> &str {
            "counting"
        }
    }

    struct UnreachableEmbedder;

    impl EmbeddingProvider for UnreachableEmbedder {
        fn embed(&self, _text: &str) -> EmbeddingResult<Vec<f32>> {
            Err(EmbeddingError::Backend("model server unreachable".to_string()))
        }

        fn dimension(&self) -> usize {
            8
        }

        fn model_name(&self) -> &str {
            "unreachable"
        }
    }

    fn build_test_catalog() -> Vec<Episode> {
        vec![
            Episode::new(1, 2).with_title("The Kingsroad").with_arcs(["Night's Watch"]),
            Episode::new(1, 1)
                .with_title("Winter Is Coming")
                .with_arcs(["Stark Family", "White Walkers"]),
            Episode::new(1, 3).with_title("Lord Snow"),
            Episode::new(2, 9)
                .with_title("Blackwater")
                .with_arcs(["War of the Five Kings"]),
            Episode::new(2, 1).with_title("The North Remembers"),
            Episode::new(3, 9).with_title("The Rains of Castamere"),
        ]
    }

    // ============================================================================
    // Unit Tests: recommend
    // ============================================================================

    #[test]
    fn test_empty_eligible_set_skips_embedding() {
        let embedder = Arc::new(CountingEmbedder::default());
        let orchestrator = RecommendationOrchestrator::new(embedder.clone());

        let result = orchestrator
            .recommend(&build_test_catalog(), &ViewerContext::new(1))
            .unwrap();

        assert!(result.is_empty());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_one_query_and_one_batch_per_request() {
        let embedder = Arc::new(CountingEmbedder::default());
        let orchestrator = RecommendationOrchestrator::new(embedder.clone());

        orchestrator
            .recommend(&build_test_catalog(), &ViewerContext::new(3))
            .unwrap();

        assert_eq!(embedder.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_output_ordered_by_season_then_number() {
        let orchestrator = RecommendationOrchestrator::offline();
        let context = ViewerContext::new(4).with_immersion(5);

        let result = orchestrator.recommend(&build_test_catalog(), &context).unwrap();

        assert_eq!(result.seasons().collect::<Vec<_>>(), vec![1, 2, 3]);
        let season_one: Vec<_> = result.season(1).unwrap().iter().map(|r| r.episode).collect();
        assert_eq!(season_one, vec![1, 2, 3]);
        let season_two: Vec<_> = result.season(2).unwrap().iter().map(|r| r.episode).collect();
        assert_eq!(season_two, vec![1, 9]);
    }

    #[test]
    fn test_reasons_name_newly_covered_arcs() {
        let orchestrator = RecommendationOrchestrator::offline();
        let required = RequiredArcs::new().with_season(1, ["White Walkers", "Night's Watch"]);
        let context = ViewerContext::new(2)
            .with_immersion(2)
            .with_required_arcs(required);

        let result = orchestrator.recommend(&build_test_catalog(), &context).unwrap();
        let season_one = result.season(1).unwrap();

        assert_eq!(season_one.len(), 2);
        assert_eq!(season_one[0].reason, "Covers required arcs: White Walkers");
        assert_eq!(season_one[1].reason, "Covers required arcs: Night's Watch");
        assert!(result.coverage(1).unwrap().is_complete());
        assert!(result.is_fully_covered());
    }

    #[test]
    fn test_sequential_and_parallel_planning_agree() {
        let context = ViewerContext::new(4)
            .with_immersion(2)
            .with_required_arcs(RequiredArcs::new().with_season(2, ["War of the Five Kings"]));

        let parallel = RecommendationOrchestrator::offline()
            .recommend(&build_test_catalog(), &context)
            .unwrap();
        let sequential = RecommendationOrchestrator::offline()
            .with_parallel_seasons(false)
            .recommend(&build_test_catalog(), &context)
            .unwrap();

        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_embedding_failure_is_an_error() {
        let orchestrator = RecommendationOrchestrator::new(Arc::new(UnreachableEmbedder));

        let result = orchestrator.recommend(&build_test_catalog(), &ViewerContext::new(3));

        let err = result.unwrap_err();
        assert!(format!("{:#}", err).contains("model server unreachable"));
    }

    #[test]
    fn test_to_response_flattens_in_order() {
        let orchestrator = RecommendationOrchestrator::offline();
        let context = ViewerContext::new(3).with_immersion(1).with_show("got");

        let response = orchestrator
            .recommend(&build_test_catalog(), &context)
            .unwrap()
            .to_response();

        assert_eq!(response.show_id.as_deref(), Some("got"));
        assert_eq!(response.target_season, 3);
        assert_eq!(response.immersion, 1);
        let seasons: Vec<_> = response.items.iter().map(|i| i.season).collect();
        assert_eq!(seasons, vec![1, 2]);
        assert!(response.items.iter().all(|i| i.title.is_some()));

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["targetSeason"], 3);
        assert_eq!(json["items"][0]["season"], 1);
    }

    #[test]
    fn test_from_config() {
        let config = RecommenderConfig::from_json_str(
            r#"{ "embedding": { "dimension": 16 }, "fill_policy": "stop_when_covered" }"#,
        )
        .unwrap();
        let orchestrator = RecommendationOrchestrator::from_config(&config).unwrap();
        let context = ViewerContext::new(2)
            .with_immersion(5)
            .with_required_arcs(RequiredArcs::new().with_season(1, ["Night's Watch"]));

        let result = orchestrator.recommend(&build_test_catalog(), &context).unwrap();

        let season_one = result.season(1).unwrap();
        assert_eq!(season_one.len(), 1);
        assert_eq!(season_one[0].episode, 2);
    }
}
