//! @ai:module:intent Allergen detection benchmark library
//! @ai:module:layer application
//! @ai:module:public_api allergen, codec, config, dataset, leaderboard, metrics, report, runner, store

pub mod allergen;
pub mod codec;
pub mod config;
pub mod dataset;
pub mod error;
pub mod leaderboard;
pub mod metrics;
pub mod report;
pub mod runner;
pub mod store;

pub use allergen::{extract, AllergenLabel, AllergenSet};
pub use codec::{InferenceOutput, ResultCodec, TimingMetrics};
pub use config::BenchmarkConfig;
pub use dataset::{DatasetLoader, FoodItem};
pub use error::{Error, Result};
pub use leaderboard::{Leaderboard, LeaderboardRanker};
pub use metrics::{BenchmarkResults, MetricsAggregator, MetricsEngine, ModelSummary, QualityResult};
pub use report::ReportGenerator;
pub use runner::{BenchmarkOrchestrator, InferenceEngine, RunOutcome};
pub use store::{BenchmarkRecord, JsonlRecordStore, RecordStore, StoredRecord};
