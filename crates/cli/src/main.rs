use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::{EpisodeCatalog, RequiredArcs, SeasonNumber};
use embeddings::{CachedEmbedder, HashEmbedder};
use pipeline::ViewerContext;
use server::{RecommendationOrchestrator, Recommendations, RecommenderConfig, derive_required_arcs};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::info;

/// tes-recs - catch-up episode recommender
#[derive(Parser)]
#[command(name = "tes-recs")]
#[command(about = "Pick the episodes to rewatch before starting a new season", long_about = None)]
struct Cli {
    /// Path to the episode catalog (JSON)
    #[arg(short, long, default_value = "data/catalog.json")]
    catalog: PathBuf,

    /// Show to load from a multi-show catalog
    #[arg(short, long)]
    show: Option<String>,

    /// Recommender config file (JSON); defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend episodes to watch before a season
    Recommend {
        /// Season the viewer is about to start
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        target_season: u32,

        /// How deep to go, 1 (bare minimum) to 5 (thorough); clamped
        #[arg(long, default_value_t = 3, allow_negative_numbers = true)]
        immersion: i64,

        /// Required arc for a season, as SEASON:ARC (repeatable)
        #[arg(long = "require", value_parser = parse_requirement)]
        requirements: Vec<(SeasonNumber, String)>,

        /// Also require the show's core arcs in every season they appear in
        #[arg(long)]
        core_arcs: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Show scores and per-season coverage
        #[arg(long)]
        explain: bool,
    },

    /// List episodes in the catalog
    Episodes {
        /// Only list this season
        #[arg(long)]
        season: Option<SeasonNumber>,
    },

    /// List arcs and how many episodes carry each
    Arcs,

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let start = Instant::now();
    let catalog = Arc::new(
        EpisodeCatalog::load_from_file(&cli.catalog, cli.show.as_deref())
            .with_context(|| format!("Failed to load catalog {}", cli.catalog.display()))?,
    );
    let (seasons, episodes, _) = catalog.counts();
    eprintln!(
        "{} Loaded {} ({} episodes across {} seasons) in {:?}",
        "✓".green(),
        catalog.title().or(catalog.show_id()).unwrap_or("catalog"),
        episodes,
        seasons,
        start.elapsed()
    );

    let config = match &cli.config {
        Some(path) => RecommenderConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => RecommenderConfig::default(),
    };

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Recommend {
            target_season,
            immersion,
            requirements,
            core_arcs,
            json,
            explain,
        } => {
            let request = RecommendRequest {
                target_season,
                immersion,
                requirements,
                core_arcs,
            };
            handle_recommend(&catalog, &config, request, json, explain)?
        }
        Commands::Episodes { season } => handle_episodes(&catalog, season)?,
        Commands::Arcs => handle_arcs(&catalog),
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(catalog, &config, requests, concurrent).await?,
    }

    Ok(())
}

/// Parse `SEASON:ARC`, e.g. `5:White Walkers`
fn parse_requirement(raw: &str) -> Result<(SeasonNumber, String), String> {
    let (season, arc) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected SEASON:ARC, got '{}'", raw))?;
    let season: SeasonNumber = season
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a season number", season))?;
    if season == 0 {
        return Err("seasons start at 1".to_string());
    }
    let arc = arc.trim();
    if arc.is_empty() {
        return Err(format!("missing arc name in '{}'", raw));
    }
    Ok((season, arc.to_string()))
}

struct RecommendRequest {
    target_season: SeasonNumber,
    immersion: i64,
    requirements: Vec<(SeasonNumber, String)>,
    core_arcs: bool,
}

/// Build the viewer context: explicit requirements plus, optionally, core arcs
fn build_context(catalog: &EpisodeCatalog, request: &RecommendRequest) -> ViewerContext {
    let mut required = if request.core_arcs {
        derive_required_arcs(catalog, catalog.core_arcs(), request.target_season)
    } else {
        RequiredArcs::new()
    };
    for (season, arc) in &request.requirements {
        required.insert(*season, arc.clone());
    }

    let mut context = ViewerContext::new(request.target_season)
        .with_immersion(request.immersion)
        .with_required_arcs(required);
    if let Some(show_id) = catalog.show_id() {
        context = context.with_show(show_id);
    }
    context
}

/// Handle the 'recommend' command
fn handle_recommend(
    catalog: &EpisodeCatalog,
    config: &RecommenderConfig,
    request: RecommendRequest,
    json: bool,
    explain: bool,
) -> Result<()> {
    let context = build_context(catalog, &request);
    let orchestrator = RecommendationOrchestrator::from_config(config)?;

    let recommendations = orchestrator.recommend(catalog.episodes(), &context)?;

    if json {
        let output = serde_json::to_string_pretty(&recommendations.to_response())
            .context("Failed to serialize recommendations")?;
        println!("{}", output);
    } else {
        print_recommendations(&recommendations, explain);
    }
    Ok(())
}

/// Handle the 'episodes' command
fn handle_episodes(catalog: &EpisodeCatalog, season: Option<SeasonNumber>) -> Result<()> {
    let seasons: Vec<SeasonNumber> = match season {
        Some(season) => {
            if catalog.season_episodes(season).is_empty() {
                return Err(anyhow!("Season {} not found in catalog", season));
            }
            vec![season]
        }
        None => catalog.seasons().collect(),
    };

    for season in seasons {
        println!("{}", format!("Season {}", season).bold().blue());
        for episode in catalog.season_episodes(season) {
            let arcs = episode.arcs.iter().cloned().collect::<Vec<_>>().join(", ");
            println!(
                "  {} {} {}",
                format!("E{:02}", episode.number).green(),
                episode.title,
                if arcs.is_empty() {
                    String::new()
                } else {
                    format!("[{}]", arcs).dimmed().to_string()
                }
            );
        }
    }
    Ok(())
}

/// Handle the 'arcs' command
fn handle_arcs(catalog: &EpisodeCatalog) {
    let mut counts: Vec<(&str, usize)> = catalog.arc_counts().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    println!("{}", "Arcs:".bold().blue());
    for (arc, count) in counts {
        let marker = if catalog.core_arcs().contains(arc) {
            "core".yellow().to_string()
        } else {
            String::new()
        };
        println!("  {} ({} episodes) {}", arc, count, marker);
    }
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    catalog: Arc<EpisodeCatalog>,
    config: &RecommenderConfig,
    requests: usize,
    concurrent: usize,
) -> Result<()> {
    if requests == 0 {
        return Err(anyhow!("--requests must be at least 1"));
    }
    let last_season = catalog
        .seasons()
        .last()
        .ok_or_else(|| anyhow!("Catalog has no episodes to benchmark"))?;

    // Keep a handle on the cache so its hit rate can be reported
    let (orchestrator, cache) = if config.embedding.cache {
        let cache = Arc::new(CachedEmbedder::new(HashEmbedder::new(
            config.embedding.dimension,
        )?));
        let orchestrator =
            RecommendationOrchestrator::from_config_with_embedder(config, cache.clone())?;
        (orchestrator, Some(cache))
    } else {
        (RecommendationOrchestrator::from_config(config)?, None)
    };
    let permits = Arc::new(Semaphore::new(concurrent.max(1)));
    info!(
        "Running {} requests with up to {} in flight",
        requests,
        concurrent.max(1)
    );

    // Random target seasons and immersion levels
    let contexts: Vec<ViewerContext> = (0..requests)
        .map(|_| {
            let target = rand::random_range(2..=last_season + 1);
            let immersion = rand::random_range(1..=5);
            ViewerContext::new(target).with_immersion(immersion)
        })
        .collect();

    let wall_clock = Instant::now();
    let mut handles = vec![];
    for context in contexts {
        let orchestrator = orchestrator.clone();
        let catalog = catalog.clone();
        let permit = permits.clone().acquire_owned().await?;
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let start = Instant::now();
            orchestrator.recommend(catalog.episodes(), &context)?;
            Ok::<_, anyhow::Error>(start.elapsed())
        });
        handles.push(handle);
    }

    // Wait for all tasks to complete and collect timings
    let mut timings = vec![];
    for handle in handles {
        let elapsed = handle.await.context("Benchmark task panicked")??;
        timings.push(elapsed);
    }
    let total_time = wall_clock.elapsed();

    timings.sort();
    let latency_sum: Duration = timings.iter().sum();
    let avg_latency = latency_sum / (timings.len() as u32);
    let percentile = |p: f32| timings[((timings.len() as f32 * p) as usize).min(timings.len() - 1)];
    let throughput = requests as f32 / total_time.as_secs_f32();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Total time: {:?}", total_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!("Throughput: {:.2} requests/second", throughput);
    if let Some(cache) = cache {
        let stats = cache.stats();
        println!(
            "Embedding cache: {} hits, {} misses, {} entries",
            stats.hits, stats.misses, stats.entries
        );
    }

    Ok(())
}

/// Helper function to format and print recommendations
fn print_recommendations(recommendations: &Recommendations, explain: bool) {
    let header = match &recommendations.show_id {
        Some(show) => format!(
            "Before {} season {} (immersion {}):",
            show, recommendations.target_season, recommendations.immersion
        ),
        None => format!(
            "Before season {} (immersion {}):",
            recommendations.target_season, recommendations.immersion
        ),
    };
    println!("{}", header.bold().blue());

    if recommendations.is_empty() {
        println!("  Nothing to catch up on.");
        return;
    }

    for season in recommendations.seasons() {
        println!("{}", format!("Season {}", season).bold());
        for rec in recommendations.season(season).unwrap_or_default() {
            println!(
                "  {} {} - {}",
                format!("E{:02}", rec.episode).green(),
                rec.title,
                rec.reason
            );
            if explain {
                println!(
                    "      score {:.3}  arcs [{}]",
                    rec.score,
                    rec.arcs.join(", ")
                );
            }
        }

        if explain {
            if let Some(report) = recommendations.coverage(season) {
                if report.is_complete() {
                    println!("  {} all required arcs covered", "✓".green());
                } else {
                    let missing: Vec<&str> = report.uncovered.iter().map(String::as_str).collect();
                    println!("  {} uncovered: {}", "!".yellow(), missing.join(", "));
                }
            }
        }
    }
}
