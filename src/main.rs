//! @ai:module:intent CLI for the allergen detection benchmark
//! @ai:module:layer presentation

use allergen_bench::{
    allergen::EMPTY_SENTINEL,
    config::{BenchmarkConfig, EngineKind, FilterConfig, MatchingMode},
    dataset::{DatasetLoader, DatasetLoaderTrait, FoodItem},
    leaderboard::LeaderboardRanker,
    metrics::{BenchmarkResults, MetricsAggregator},
    report::ReportGenerator,
    runner::{
        BenchmarkOrchestrator, CancellationToken, CommandInferenceEngine, HttpInferenceEngine,
        InferenceEngine, MockInferenceEngine, RunOutcome, SysinfoMemorySampler,
    },
    store::{normalize_all, BenchmarkRecord, JsonlRecordStore, MemoryRecordStore, RecordStore},
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "allergen-bench")]
#[command(about = "Benchmark small language models on food allergen detection")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one model over the dataset, then evaluate all stored records
    Run {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Model reference passed to the engine (e.g. a GGUF path)
        #[arg(short, long)]
        model: Option<String>,

        /// Display name stored with each record
        #[arg(long)]
        name: Option<String>,

        /// Inference engine to use
        #[arg(long, value_parser = ["command", "http", "mock"])]
        engine: Option<String>,

        /// Label matching mode
        #[arg(long, value_parser = ["lexical", "tokens"])]
        matching: Option<String>,

        /// Filter by item IDs (comma-separated)
        #[arg(long)]
        items: Option<String>,

        /// Maximum number of items to run
        #[arg(long)]
        limit: Option<usize>,

        /// Run against a mock engine and an in-memory store
        #[arg(long)]
        dry_run: bool,

        /// Output directory for reports
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Evaluate stored records and regenerate reports
    Evaluate {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Record store file (JSON lines)
        #[arg(short, long)]
        store: Option<PathBuf>,

        /// Output directory for reports
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List dataset items
    List {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Validate dataset files for errors
    Validate {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = "benchmark.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("allergen_bench=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            model,
            name,
            engine,
            matching,
            items,
            limit,
            dry_run,
            output,
        } => {
            run_benchmark(RunArgs {
                config,
                model,
                name,
                engine,
                matching,
                items,
                limit,
                dry_run,
                output,
            })
            .await
        }
        Commands::Evaluate {
            config,
            store,
            output,
        } => evaluate(config, store, output),
        Commands::List { config } => list_items(config),
        Commands::Validate { config } => validate(config),
        Commands::Init { output } => init_config(output),
    }
}

struct RunArgs {
    config: Option<PathBuf>,
    model: Option<String>,
    name: Option<String>,
    engine: Option<String>,
    matching: Option<String>,
    items: Option<String>,
    limit: Option<usize>,
    dry_run: bool,
    output: Option<PathBuf>,
}

/// @ai:intent Run one model over the dataset and report on the whole store
/// @ai:effects network, fs:read, fs:write
async fn run_benchmark(args: RunArgs) -> Result<()> {
    let mut config = load_or_default_config(args.config)?;

    if let Some(model) = args.model {
        config.run.model_ref = model;
    }
    if args.name.is_some() {
        config.run.model_name = args.name;
    }
    if let Some(kind) = args.engine.as_deref() {
        config.engine.kind = parse_engine_kind(kind);
    }
    if let Some(mode) = args.matching.as_deref() {
        config.run.matching = parse_matching(mode);
    }
    if args.items.is_some() || args.limit.is_some() {
        config.run.filter = build_filter(args.items, args.limit);
    }
    config.run.dry_run |= args.dry_run;

    tracing::info!("Loading dataset from {}", config.paths.dataset_dir.display());

    let loader = DatasetLoader::new();
    let items = loader.load_filtered(&config.paths.dataset_dir, &config.run.filter)?;

    if items.is_empty() {
        tracing::warn!("No dataset items match the filter criteria");
        return Ok(());
    }

    tracing::info!("Found {} items to run", items.len());

    let store: Arc<dyn RecordStore> = if config.run.dry_run {
        Arc::new(MemoryRecordStore::new())
    } else {
        Arc::new(JsonlRecordStore::new(&config.paths.store_file))
    };

    let token = CancellationToken::new();
    let signal_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; stopping after the current item");
            signal_token.cancel();
        }
    });

    let outcome = if config.run.dry_run {
        tracing::info!("[DRY RUN] Using mock engine; nothing is persisted to disk");
        let engine = Arc::new(MockInferenceEngine::new(EMPTY_SENTINEL));
        execute(engine, &config, &items, store.clone(), token).await?
    } else {
        match config.engine.kind {
            EngineKind::Command => {
                let engine = Arc::new(CommandInferenceEngine::new(&config.engine)?);
                execute(engine, &config, &items, store.clone(), token).await?
            }
            EngineKind::Http => {
                let engine = Arc::new(HttpInferenceEngine::new(&config.engine)?);
                execute(engine, &config, &items, store.clone(), token).await?
            }
            EngineKind::Mock => {
                let engine = Arc::new(MockInferenceEngine::new(EMPTY_SENTINEL));
                execute(engine, &config, &items, store.clone(), token).await?
            }
        }
    };

    print_run_summary(&outcome);

    let output_dir = args.output.unwrap_or_else(|| config.paths.results_dir.clone());
    evaluate_store(store.as_ref(), &config, output_dir)
}

/// @ai:intent Drive the orchestrator with a concrete engine
/// @ai:effects network, fs:write
async fn execute<E: InferenceEngine>(
    engine: Arc<E>,
    config: &BenchmarkConfig,
    items: &[FoodItem],
    store: Arc<dyn RecordStore>,
    token: CancellationToken,
) -> Result<RunOutcome> {
    let orchestrator = BenchmarkOrchestrator::new(engine, config.run.clone())
        .with_memory_sampler(Arc::new(SysinfoMemorySampler::new()))
        .with_cancellation(token);

    orchestrator.run(items, store).await
}

/// @ai:intent Evaluate a JSON-lines record store
/// @ai:effects fs:read, fs:write
fn evaluate(config: Option<PathBuf>, store: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let config = load_or_default_config(config)?;
    let store_path = store.unwrap_or_else(|| config.paths.store_file.clone());

    if !store_path.exists() {
        anyhow::bail!("Record store not found: {}", store_path.display());
    }

    let store = JsonlRecordStore::new(store_path);
    let output_dir = output.unwrap_or_else(|| config.paths.results_dir.clone());

    evaluate_store(&store, &config, output_dir)
}

/// @ai:intent Normalize, aggregate, rank and export every stored record
/// @ai:effects fs:read, fs:write
fn evaluate_store(store: &dyn RecordStore, config: &BenchmarkConfig, output_dir: PathBuf) -> Result<()> {
    let documents = store.load_all().context("Failed to load benchmark records")?;
    let records: Vec<BenchmarkRecord> = normalize_all(documents);

    if records.is_empty() {
        tracing::warn!("No benchmark records to evaluate");
        return Ok(());
    }

    let ranker = LeaderboardRanker::new(config.scoring);
    let results = MetricsAggregator::new().evaluate(&records, &ranker);

    print_leaderboard(&results);

    let outcome = ReportGenerator::new().generate_all(&results, &records, &output_dir);

    if outcome.is_complete() {
        println!("Reports generated in {}", output_dir.display());
    } else {
        println!("Some reports could not be written:");
        for failure in &outcome.failures {
            println!("  {}", failure);
        }
    }

    Ok(())
}

/// @ai:intent List dataset items
/// @ai:effects fs:read
fn list_items(config: Option<PathBuf>) -> Result<()> {
    let config = load_or_default_config(config)?;
    let items = DatasetLoader::new().load_all(&config.paths.dataset_dir)?;

    println!("Dataset items ({}):", items.len());
    println!();
    println!("{:<12} {:<32} {:<30}", "ID", "Name", "Allergens");
    println!("{}", "-".repeat(76));

    for item in &items {
        let allergens = if item.allergens_mapped.trim().is_empty() {
            "-"
        } else {
            item.allergens_mapped.as_str()
        };
        println!("{:<12} {:<32} {:<30}", item.id, truncate(&item.name, 32), allergens);
    }

    Ok(())
}

/// @ai:intent Validate every dataset file strictly
/// @ai:effects fs:read
fn validate(config: Option<PathBuf>) -> Result<()> {
    let config = load_or_default_config(config)?;
    let items = DatasetLoader::new().validate(&config.paths.dataset_dir)?;

    println!("Dataset validation passed!");
    println!("Total items: {}", items.len());

    let without_allergens = items.iter().filter(|i| i.ground_truth().is_empty()).count();
    println!("Items without allergens: {}", without_allergens);

    Ok(())
}

/// @ai:intent Initialize default configuration file
/// @ai:effects fs:write
fn init_config(output: PathBuf) -> Result<()> {
    let config = BenchmarkConfig::default();
    config.save(&output)?;
    println!("Configuration saved to {}", output.display());
    Ok(())
}

/// @ai:intent Load configuration or use defaults
/// @ai:effects fs:read
fn load_or_default_config(path: Option<PathBuf>) -> Result<BenchmarkConfig> {
    match path {
        Some(p) => BenchmarkConfig::load(&p)
            .with_context(|| format!("Failed to load config from {}", p.display())),
        None => {
            let default_path = PathBuf::from("benchmark.toml");

            if default_path.exists() {
                BenchmarkConfig::load(&default_path)
            } else {
                Ok(BenchmarkConfig::default())
            }
        }
    }
}

/// @ai:intent Build filter from CLI arguments
/// @ai:effects pure
fn build_filter(items: Option<String>, limit: Option<usize>) -> FilterConfig {
    FilterConfig {
        item_ids: items.map(|s| s.split(',').map(|t| t.trim().to_string()).collect()),
        limit,
    }
}

fn parse_engine_kind(value: &str) -> EngineKind {
    match value {
        "http" => EngineKind::Http,
        "mock" => EngineKind::Mock,
        _ => EngineKind::Command,
    }
}

fn parse_matching(value: &str) -> MatchingMode {
    match value {
        "tokens" => MatchingMode::Tokens,
        _ => MatchingMode::Lexical,
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

/// @ai:intent Print the outcome of a single model run
/// @ai:effects io
fn print_run_summary(outcome: &RunOutcome) {
    let q = &outcome.quality;

    println!();
    println!("Run Summary: {}", outcome.model);
    println!("{}", "=".repeat(60));
    println!("State:            {:?}", outcome.state);
    println!("Records:          {}", outcome.records.len());
    println!("Engine failures:  {}", outcome.engine_failures);
    println!(
        "Persisted:        {} ({} failed)",
        outcome.persistence.written, outcome.persistence.failed
    );
    println!();
    println!(
        "Precision {:.1}%  Recall {:.1}%  Micro-F1 {:.3}  Macro-F1 {:.3}",
        q.precision * 100.0,
        q.recall * 100.0,
        q.micro_f1,
        q.macro_f1
    );
    println!(
        "Exact match {:.1}%  Abstention {:.1}%  FNR {:.1}%",
        q.exact_match_rate * 100.0,
        q.abstention_rate * 100.0,
        q.fnr * 100.0
    );

    for error in &outcome.persistence.errors {
        println!("  persistence error: {}", error);
    }
}

/// @ai:intent Print the ranked leaderboard
/// @ai:effects io
fn print_leaderboard(results: &BenchmarkResults) {
    println!();
    println!("Leaderboard ({} records)", results.record_count);
    println!("{}", "=".repeat(78));
    println!(
        "{:<4} {:<28} {:>8} {:>10} {:>10}  {}",
        "#", "Model", "Score", "Accuracy", "Latency", "Badges"
    );
    println!("{}", "-".repeat(78));

    for entry in &results.leaderboard.entries {
        let latency = results
            .models
            .iter()
            .find(|m| m.model == entry.model)
            .map(|m| m.avg_latency_ms)
            .unwrap_or_default();

        let badges = entry
            .badges
            .iter()
            .map(|b| b.label())
            .collect::<Vec<_>>()
            .join(", ");

        println!(
            "{:<4} {:<28} {:>8.3} {:>9.1}% {:>8.0}ms  {}",
            entry.position,
            truncate(&entry.model, 28),
            entry.score,
            entry.accuracy * 100.0,
            latency,
            badges
        );
    }

    println!();
}
