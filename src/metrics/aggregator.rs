//! @ai:module:intent Groups normalized records by model and summarizes each group
//! @ai:module:layer application
//! @ai:module:public_api MetricsAggregator, MetricsAggregatorTrait
//! @ai:module:stateless true

use crate::leaderboard::LeaderboardRanker;
use crate::metrics::quality::{LabelPair, MetricsEngine};
use crate::metrics::types::{BenchmarkResults, EfficiencySummary, ModelSummary};
use crate::store::BenchmarkRecord;

/// @ai:intent Trait for metrics aggregation
pub trait MetricsAggregatorTrait: Send + Sync {
    /// @ai:intent Summarize records per model, in order of first appearance
    fn summarize(&self, records: &[BenchmarkRecord]) -> Vec<ModelSummary>;
}

/// @ai:intent Aggregates benchmark records into per-model summaries
pub struct MetricsAggregator;

impl MetricsAggregator {
    /// @ai:intent Create a new metrics aggregator
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Summarize, score and rank records in one pass
    /// @ai:effects pure
    pub fn evaluate(&self, records: &[BenchmarkRecord], ranker: &LeaderboardRanker) -> BenchmarkResults {
        let summaries = self.summarize(records);
        let (models, leaderboard) = ranker.rank(summaries);

        BenchmarkResults {
            timestamp: chrono::Utc::now().to_rfc3339(),
            record_count: records.len(),
            models,
            leaderboard,
        }
    }

    /// @ai:intent Group records by model keeping first-appearance order
    /// @ai:effects pure
    fn group_by_model(records: &[BenchmarkRecord]) -> Vec<(&str, Vec<&BenchmarkRecord>)> {
        let mut groups: Vec<(&str, Vec<&BenchmarkRecord>)> = Vec::new();

        for record in records {
            match groups.iter_mut().find(|(model, _)| *model == record.model) {
                Some((_, members)) => members.push(record),
                None => groups.push((record.model.as_str(), vec![record])),
            }
        }

        groups
    }

    /// @ai:intent Build the summary of a single model group
    /// @ai:pre records is non-empty
    /// @ai:effects pure
    fn summarize_model(model: &str, records: &[&BenchmarkRecord]) -> ModelSummary {
        let total = records.len();
        let pairs: Vec<LabelPair> = records
            .iter()
            .map(|r| (r.ground_truth(), r.predicted()))
            .collect();

        let correct = records.iter().filter(|r| r.is_string_match()).count();

        let hallucinated = pairs
            .iter()
            .filter(|(gt, pr)| !pr.is_empty() && pr.iter().any(|label| !gt.contains(label)))
            .count();

        let over_predicted = pairs.iter().filter(|(gt, pr)| pr.len() > gt.len()).count();

        let avg_latency_ms = average(records.iter().map(|r| r.latency_ms as f64));

        ModelSummary {
            model: model.to_string(),
            total,
            correct,
            accuracy: fraction(correct, total),
            document_hallucination_rate: fraction(hallucinated, total),
            document_over_prediction_rate: fraction(over_predicted, total),
            quality: MetricsEngine::evaluate(&pairs),
            avg_latency_ms,
            efficiency: Self::efficiency(records, avg_latency_ms),
            latency_norm: 0.0,
            score: 0.0,
        }
    }

    /// @ai:intent Average the efficiency fields that were actually measured
    /// @ai:effects pure
    fn efficiency(records: &[&BenchmarkRecord], avg_latency_ms: f64) -> EfficiencySummary {
        let avg_oet_ms = average_available(records.iter().map(|r| r.timing.oet_ms));

        EfficiencySummary {
            avg_ttft_ms: average_available(records.iter().map(|r| r.timing.ttft_ms)),
            avg_itps: average_available(records.iter().map(|r| r.timing.itps)),
            avg_otps: average_available(records.iter().map(|r| r.timing.otps)),
            avg_oet_ms,
            total_time_ms: total_time(avg_latency_ms, avg_oet_ms),
            avg_java_heap_kb: average_available(records.iter().map(|r| r.memory.java_heap_kb)),
            avg_native_heap_kb: average_available(records.iter().map(|r| r.memory.native_heap_kb)),
            avg_pss_kb: average_available(records.iter().map(|r| r.memory.pss_kb)),
        }
    }
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsAggregatorTrait for MetricsAggregator {
    /// @ai:effects pure
    fn summarize(&self, records: &[BenchmarkRecord]) -> Vec<ModelSummary> {
        Self::group_by_model(records)
            .into_iter()
            .map(|(model, members)| Self::summarize_model(model, &members))
            .collect()
    }
}

/// @ai:intent End-to-end time per trial, unavailable when nothing was timed
/// @ai:effects pure
fn total_time(avg_latency_ms: f64, avg_oet_ms: Option<f64>) -> Option<f64> {
    if avg_latency_ms == 0.0 && avg_oet_ms.is_none() {
        return None;
    }

    Some(avg_latency_ms + avg_oet_ms.unwrap_or(0.0))
}

/// @ai:intent Calculate average of an iterator of f64
/// @ai:effects pure
fn average<I: Iterator<Item = f64>>(iter: I) -> f64 {
    let (sum, count) = iter.fold((0.0, 0u32), |(s, c), v| (s + v, c + 1));

    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// @ai:intent Average of strictly positive samples, None when there are none
/// @ai:effects pure
fn average_available<I: Iterator<Item = i64>>(iter: I) -> Option<f64> {
    let (sum, count) = iter
        .filter(|v| *v > 0)
        .fold((0.0, 0u32), |(s, c), v| (s + v as f64, c + 1));

    (count > 0).then(|| sum / count as f64)
}

fn fraction(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}
