//! @ai:module:intent Configuration structs for the allergen benchmark
//! @ai:module:layer infrastructure
//! @ai:module:public_api BenchmarkConfig, EngineConfig, RunConfig, ScoringWeights, PathConfig, FilterConfig
//! @ai:module:stateless true

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// @ai:intent Main configuration for the benchmark system
/// @ai:effects pure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub scoring: ScoringWeights,
    #[serde(default)]
    pub paths: PathConfig,
}

/// @ai:intent Which inference engine adapter to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Command,
    Http,
    Mock,
}

/// @ai:intent Inference engine configuration
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_engine_kind")]
    pub kind: EngineKind,
    /// Program spawned by the command engine
    #[serde(default = "default_command")]
    pub command: String,
    /// Arguments with `{model}` and `{prompt}` placeholders
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    /// Base URL of a llama.cpp compatible server
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// @ai:intent How predicted labels are derived from the prediction text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchingMode {
    /// Substring scan for each vocabulary phrase
    #[default]
    Lexical,
    /// Comma-separated tokens taken as-is
    Tokens,
}

/// @ai:intent Run configuration for benchmark execution
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Model reference handed to the engine (usually a GGUF path)
    #[serde(default = "default_model_ref")]
    pub model_ref: String,
    /// Display name stored in records; defaults to the model file stem
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub matching: MatchingMode,
    #[serde(default = "default_write_queue_capacity")]
    pub write_queue_capacity: usize,
    #[serde(default)]
    pub filter: FilterConfig,
}

/// @ai:intent Weights of the composite leaderboard score
/// @ai:effects pure
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub accuracy: f64,
    pub latency: f64,
    pub hallucination: f64,
    pub over_prediction: f64,
}

/// @ai:intent Path configuration for input/output locations
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    pub dataset_dir: PathBuf,
    pub store_file: PathBuf,
    pub results_dir: PathBuf,
}

/// @ai:intent Filter configuration for selecting dataset items
/// @ai:effects pure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    pub item_ids: Option<Vec<String>>,
    pub limit: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            kind: default_engine_kind(),
            command: default_command(),
            args: default_args(),
            endpoint: default_endpoint(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            model_ref: default_model_ref(),
            model_name: None,
            dry_run: false,
            matching: MatchingMode::default(),
            write_queue_capacity: default_write_queue_capacity(),
            filter: FilterConfig::default(),
        }
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            accuracy: 0.5,
            latency: 0.2,
            hallucination: 0.2,
            over_prediction: 0.1,
        }
    }
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            dataset_dir: PathBuf::from("datasets"),
            store_file: PathBuf::from("results/benchmarks.jsonl"),
            results_dir: PathBuf::from("results"),
        }
    }
}

fn default_engine_kind() -> EngineKind {
    EngineKind::Command
}

fn default_command() -> String {
    "llama-cli".to_string()
}

fn default_args() -> Vec<String> {
    [
        "-m", "{model}", "-p", "{prompt}", "-n", "64", "--temp", "0", "-no-cnv",
        "--no-display-prompt",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_endpoint() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_max_tokens() -> u32 {
    64
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_model_ref() -> String {
    "models/model.gguf".to_string()
}

fn default_write_queue_capacity() -> usize {
    64
}

impl BenchmarkConfig {
    /// @ai:intent Load configuration from a TOML file
    /// @ai:pre path exists and is readable
    /// @ai:effects fs:read
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// @ai:intent Save configuration to a TOML file
    /// @ai:effects fs:write
    pub fn save(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl RunConfig {
    /// @ai:intent Name recorded for the model under test
    /// @ai:effects pure
    pub fn resolved_model_name(&self) -> String {
        if let Some(name) = self.model_name.as_ref().filter(|n| !n.trim().is_empty()) {
            return name.clone();
        }

        std::path::Path::new(&self.model_ref)
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .filter(|stem| !stem.is_empty())
            .unwrap_or_else(|| "External Model".to_string())
    }
}

impl FilterConfig {
    /// @ai:intent Check if filter matches an item id
    /// @ai:effects pure
    pub fn matches(&self, id: &str) -> bool {
        self.item_ids
            .as_ref()
            .map(|ids| ids.iter().any(|item_id| item_id == id))
            .unwrap_or(true)
    }
}
