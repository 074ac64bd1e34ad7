//! @ai:module:intent Composite scoring, overall ranking, per-metric rankings and badges
//! @ai:module:layer domain
//! @ai:module:public_api LeaderboardRanker, Leaderboard, LeaderboardEntry, MetricRanking, RankedMetric
//! @ai:module:stateless true
//!
//! All sorts are stable, so ties keep the order models were summarized in.

use crate::config::ScoringWeights;
use crate::metrics::ModelSummary;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Rank at or above which a model earns a badge for a metric.
pub const BADGE_CUTOFF: usize = 3;

/// @ai:intent Metrics that get their own ranking and badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankedMetric {
    Latency,
    Ttft,
    Accuracy,
    Hallucination,
    OverPrediction,
}

impl RankedMetric {
    pub const ALL: [RankedMetric; 5] = [
        RankedMetric::Latency,
        RankedMetric::Ttft,
        RankedMetric::Accuracy,
        RankedMetric::Hallucination,
        RankedMetric::OverPrediction,
    ];

    /// @ai:intent Human-readable label used in reports
    /// @ai:effects pure
    pub fn label(&self) -> &'static str {
        match self {
            RankedMetric::Latency => "Latency",
            RankedMetric::Ttft => "TTFT",
            RankedMetric::Accuracy => "Accuracy",
            RankedMetric::Hallucination => "Hallucination",
            RankedMetric::OverPrediction => "Over-prediction",
        }
    }

    /// @ai:intent Order two summaries best-first for this metric
    /// @ai:effects pure
    fn compare(&self, a: &ModelSummary, b: &ModelSummary) -> Ordering {
        match self {
            RankedMetric::Latency => a.avg_latency_ms.total_cmp(&b.avg_latency_ms),
            RankedMetric::Ttft => match (a.avg_ttft_ms(), b.avg_ttft_ms()) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            RankedMetric::Accuracy => b.accuracy.total_cmp(&a.accuracy),
            RankedMetric::Hallucination => a
                .document_hallucination_rate
                .total_cmp(&b.document_hallucination_rate),
            RankedMetric::OverPrediction => a
                .document_over_prediction_rate
                .total_cmp(&b.document_over_prediction_rate),
        }
    }
}

impl fmt::Display for RankedMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// @ai:intent A model's 1-based rank within one metric ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricPlacement {
    pub metric: RankedMetric,
    pub rank: usize,
}

/// @ai:intent One row of the overall leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub position: usize,
    pub model: String,
    pub score: f64,
    pub accuracy: f64,
    pub latency_norm: f64,
    pub placements: Vec<MetricPlacement>,
    pub badges: Vec<RankedMetric>,
}

/// @ai:intent Models ordered best-first for a single metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRanking {
    pub metric: RankedMetric,
    pub models: Vec<String>,
}

impl MetricRanking {
    /// @ai:intent 1-based rank of a model, if it was ranked
    /// @ai:effects pure
    pub fn rank_of(&self, model: &str) -> Option<usize> {
        self.models.iter().position(|m| m == model).map(|i| i + 1)
    }
}

/// @ai:intent Ranked and badged view over all models
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardEntry>,
    pub rankings: Vec<MetricRanking>,
}

impl Leaderboard {
    /// @ai:intent Look up the ranking for one metric
    /// @ai:effects pure
    pub fn ranking(&self, metric: RankedMetric) -> Option<&MetricRanking> {
        self.rankings.iter().find(|r| r.metric == metric)
    }
}

/// @ai:intent Scores summaries and derives every ranking from them
#[derive(Debug, Clone, Default)]
pub struct LeaderboardRanker {
    weights: ScoringWeights,
}

impl LeaderboardRanker {
    /// @ai:intent Create a ranker with the given score weights
    /// @ai:effects pure
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    /// @ai:intent Composite score of one summary
    /// @ai:pre latency_norm already set
    /// @ai:effects pure
    pub fn score(&self, summary: &ModelSummary) -> f64 {
        let w = &self.weights;
        w.accuracy * summary.accuracy
            - w.latency * summary.latency_norm
            - w.hallucination * summary.document_hallucination_rate
            - w.over_prediction * summary.document_over_prediction_rate
    }

    /// @ai:intent Fill in latency_norm and score, then build the leaderboard
    /// @ai:post returned summaries keep their input order
    /// @ai:effects pure
    pub fn rank(&self, mut summaries: Vec<ModelSummary>) -> (Vec<ModelSummary>, Leaderboard) {
        let max_latency = summaries
            .iter()
            .map(|s| s.avg_latency_ms)
            .fold(0.0_f64, f64::max);

        for summary in summaries.iter_mut() {
            summary.latency_norm = if max_latency > 0.0 {
                summary.avg_latency_ms / max_latency
            } else {
                0.0
            };
            summary.score = self.score(summary);
        }

        let rankings: Vec<MetricRanking> = RankedMetric::ALL
            .iter()
            .map(|metric| {
                let mut ordered: Vec<&ModelSummary> = summaries.iter().collect();
                ordered.sort_by(|a, b| metric.compare(a, b));

                MetricRanking {
                    metric: *metric,
                    models: ordered.iter().map(|s| s.model.clone()).collect(),
                }
            })
            .collect();

        let mut overall: Vec<&ModelSummary> = summaries.iter().collect();
        overall.sort_by(|a, b| b.score.total_cmp(&a.score));

        let entries = overall
            .iter()
            .enumerate()
            .map(|(i, summary)| {
                let placements: Vec<MetricPlacement> = rankings
                    .iter()
                    .filter_map(|r| {
                        r.rank_of(&summary.model).map(|rank| MetricPlacement {
                            metric: r.metric,
                            rank,
                        })
                    })
                    .collect();

                let badges = placements
                    .iter()
                    .filter(|p| p.rank <= BADGE_CUTOFF)
                    .map(|p| p.metric)
                    .collect();

                LeaderboardEntry {
                    position: i + 1,
                    model: summary.model.clone(),
                    score: summary.score,
                    accuracy: summary.accuracy,
                    latency_norm: summary.latency_norm,
                    placements,
                    badges,
                }
            })
            .collect();

        tracing::debug!("Ranked {} models", summaries.len());

        (summaries, Leaderboard { entries, rankings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{EfficiencySummary, QualityResult};

    fn summary(
        model: &str,
        accuracy: f64,
        latency: f64,
        hallucination: f64,
        over_prediction: f64,
        ttft: Option<f64>,
    ) -> ModelSummary {
        ModelSummary {
            model: model.to_string(),
            total: 10,
            correct: (accuracy * 10.0) as usize,
            accuracy,
            document_hallucination_rate: hallucination,
            document_over_prediction_rate: over_prediction,
            quality: QualityResult::default(),
            avg_latency_ms: latency,
            efficiency: EfficiencySummary {
                avg_ttft_ms: ttft,
                ..Default::default()
            },
            latency_norm: 0.0,
            score: 0.0,
        }
    }

    #[test]
    fn test_two_model_scenario() {
        let ranker = LeaderboardRanker::default();
        let (models, board) = ranker.rank(vec![
            summary("model-2", 0.6, 200.0, 0.2, 0.1, None),
            summary("model-1", 0.8, 100.0, 0.1, 0.0, None),
        ]);

        assert!((models[1].latency_norm - 0.5).abs() < 1e-9);
        assert!((models[1].score - 0.28).abs() < 1e-9);
        assert!((models[0].score - 0.05).abs() < 1e-9);
        assert!(models[1].score > models[0].score);

        assert_eq!(board.entries[0].model, "model-1");
        assert_eq!(board.entries[0].position, 1);
        assert_eq!(board.entries[1].model, "model-2");
    }

    #[test]
    fn test_zero_latency_normalizes_to_zero() {
        let (models, _) = LeaderboardRanker::default().rank(vec![summary("a", 1.0, 0.0, 0.0, 0.0, None)]);
        assert_eq!(models[0].latency_norm, 0.0);
        assert!((models[0].score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_fourth_everywhere_earns_no_badges() {
        let (_, board) = LeaderboardRanker::default().rank(vec![
            summary("a", 0.9, 100.0, 0.0, 0.0, Some(10.0)),
            summary("b", 0.8, 110.0, 0.1, 0.1, Some(20.0)),
            summary("c", 0.7, 120.0, 0.2, 0.2, Some(30.0)),
            summary("d", 0.1, 900.0, 0.9, 0.9, None),
        ]);

        let last = board.entries.iter().find(|e| e.model == "d").unwrap();
        assert!(last.placements.iter().all(|p| p.rank == 4));
        assert!(last.badges.is_empty());

        let first = board.entries.iter().find(|e| e.model == "a").unwrap();
        assert_eq!(first.badges.len(), RankedMetric::ALL.len());
    }

    #[test]
    fn test_ttft_missing_ranks_last() {
        let (_, board) = LeaderboardRanker::default().rank(vec![
            summary("none", 0.5, 100.0, 0.0, 0.0, None),
            summary("slow", 0.5, 100.0, 0.0, 0.0, Some(500.0)),
            summary("fast", 0.5, 100.0, 0.0, 0.0, Some(50.0)),
        ]);

        let ttft = board.ranking(RankedMetric::Ttft).unwrap();
        assert_eq!(ttft.models, vec!["fast", "slow", "none"]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let (_, board) = LeaderboardRanker::default().rank(vec![
            summary("first", 0.5, 100.0, 0.0, 0.0, None),
            summary("second", 0.5, 100.0, 0.0, 0.0, None),
        ]);

        assert_eq!(board.entries[0].model, "first");
        assert_eq!(board.ranking(RankedMetric::Accuracy).unwrap().models, vec!["first", "second"]);
    }

    #[test]
    fn test_custom_weights() {
        let ranker = LeaderboardRanker::new(ScoringWeights {
            accuracy: 1.0,
            latency: 0.0,
            hallucination: 0.0,
            over_prediction: 0.0,
        });
        let (models, _) = ranker.rank(vec![summary("a", 0.75, 100.0, 0.5, 0.5, None)]);
        assert!((models[0].score - 0.75).abs() < 1e-9);
    }
}
