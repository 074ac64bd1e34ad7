//! @ai:module:intent Per-model summary types produced by aggregation
//! @ai:module:layer domain
//! @ai:module:public_api ModelSummary, EfficiencySummary, BenchmarkResults
//! @ai:module:stateless true

use crate::leaderboard::Leaderboard;
use crate::metrics::quality::QualityResult;
use serde::{Deserialize, Serialize};

/// @ai:intent Efficiency averages over available samples only
///
/// `None` means no record of the model carried a usable (> 0) value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EfficiencySummary {
    pub avg_ttft_ms: Option<f64>,
    pub avg_itps: Option<f64>,
    pub avg_otps: Option<f64>,
    pub avg_oet_ms: Option<f64>,
    pub total_time_ms: Option<f64>,
    pub avg_java_heap_kb: Option<f64>,
    pub avg_native_heap_kb: Option<f64>,
    pub avg_pss_kb: Option<f64>,
}

/// @ai:intent Aggregated view of one model across all its trials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub model: String,
    pub total: usize,
    /// Trials whose predicted string equals the mapped ground-truth string
    pub correct: usize,
    pub accuracy: f64,
    /// Share of trials predicting at least one label absent from the ground truth
    pub document_hallucination_rate: f64,
    /// Share of trials predicting more labels than the ground truth holds
    pub document_over_prediction_rate: f64,
    pub quality: QualityResult,
    pub avg_latency_ms: f64,
    pub efficiency: EfficiencySummary,
    /// Latency divided by the slowest model's latency; set by ranking
    pub latency_norm: f64,
    /// Composite leaderboard score; set by ranking
    pub score: f64,
}

impl ModelSummary {
    /// @ai:intent Average time to first token, if any trial reported it
    /// @ai:effects pure
    pub fn avg_ttft_ms(&self) -> Option<f64> {
        self.efficiency.avg_ttft_ms
    }
}

/// @ai:intent Complete evaluation output written by the report generators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResults {
    pub timestamp: String,
    pub record_count: usize,
    pub models: Vec<ModelSummary>,
    pub leaderboard: Leaderboard,
}
