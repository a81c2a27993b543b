//! Benchmarks for episode scoring
//!
//! Run with: cargo bench --package scoring
//!
//! Uses a synthetic catalog so no data files are needed.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use data_loader::Episode;
use embeddings::{CachedEmbedder, HashEmbedder};
use scoring::{SimilarityScorer, build_query_text};
use std::sync::Arc;

fn synthetic_episodes(seasons: u32, per_season: u32) -> Vec<Episode> {
    let mut episodes = Vec::new();
    for season in 1..=seasons {
        for number in 1..=per_season {
            episodes.push(
                Episode::new(season, number)
                    .with_title(format!("Season {} part {}", season, number))
                    .with_summary(format!("Events of episode {} in season {}", number, season))
                    .with_arcs([format!("arc-{}", number % 7), format!("arc-{}", season)]),
            );
        }
    }
    episodes
}

fn bench_score_uncached(c: &mut Criterion) {
    let scorer = SimilarityScorer::new(Arc::new(HashEmbedder::default()));
    let episodes = synthetic_episodes(8, 10);
    let query = build_query_text(9, Some("bench"), &["arc-1", "arc-2"]);

    c.bench_function("score_80_episodes_uncached", |b| {
        b.iter(|| {
            let scored = scorer
                .score(black_box(episodes.clone()), black_box(&query))
                .unwrap();
            black_box(scored)
        })
    });
}

fn bench_score_cached(c: &mut Criterion) {
    let scorer = SimilarityScorer::new(Arc::new(CachedEmbedder::new(HashEmbedder::default())));
    let episodes = synthetic_episodes(8, 10);
    let query = build_query_text(9, Some("bench"), &["arc-1", "arc-2"]);

    c.bench_function("score_80_episodes_cached", |b| {
        b.iter(|| {
            let scored = scorer
                .score(black_box(episodes.clone()), black_box(&query))
                .unwrap();
            black_box(scored)
        })
    });
}

criterion_group!(benches, bench_score_uncached, bench_score_cached);
criterion_main!(benches);
