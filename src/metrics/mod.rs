//! @ai:module:intent Quality statistics and per-model aggregation
//! @ai:module:layer application
//! @ai:module:public_api MetricsEngine, QualityResult, MetricsAggregator, ModelSummary, BenchmarkResults

pub mod aggregator;
pub mod quality;
pub mod types;

pub use aggregator::{MetricsAggregator, MetricsAggregatorTrait};
pub use quality::{LabelPair, MetricsEngine, QualityCounts, QualityResult};
pub use types::{BenchmarkResults, EfficiencySummary, ModelSummary};
