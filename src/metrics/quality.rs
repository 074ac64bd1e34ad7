//! @ai:module:intent Multi-label quality and safety statistics for one model
//! @ai:module:layer domain
//! @ai:module:public_api MetricsEngine, QualityResult, QualityCounts, LabelPair
//! @ai:module:stateless true
//!
//! All ratios are guarded: a zero denominator yields 0.0.

use crate::allergen::{AllergenLabel, AllergenSet};
use serde::{Deserialize, Serialize};

/// One trial's (ground truth, prediction) label sets.
pub type LabelPair = (AllergenSet, AllergenSet);

/// @ai:intent Pooled counts behind a QualityResult
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityCounts {
    pub total: usize,
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub exact_matches: usize,
    pub abstentions: usize,
    pub hamming_sum: usize,
}

/// @ai:intent Quality and safety bundle; every rate lies in [0, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityResult {
    pub precision: f64,
    pub recall: f64,
    pub micro_f1: f64,
    pub macro_f1: f64,
    /// False-negative rate, fn / (tp + fn)
    pub fnr: f64,
    /// Label-level hallucination, fp / (fp + tp)
    pub hallucination_rate: f64,
    /// False positives per trial, fp / total. Not bounded by 1: a trial
    /// can carry several false positives.
    pub over_prediction_rate: f64,
    pub abstention_rate: f64,
    pub exact_match_rate: f64,
    pub hamming_loss: f64,
    pub counts: QualityCounts,
}

#[derive(Debug, Clone, Copy, Default)]
struct LabelCounts {
    tp: usize,
    fp: usize,
    fn_: usize,
}

impl LabelCounts {
    fn f1(&self) -> f64 {
        ratio(2 * self.tp, 2 * self.tp + self.fp + self.fn_)
    }
}

/// @ai:intent Guarded division
/// @ai:effects pure
fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// @ai:intent Computes the QualityResult for one model's label pairs
pub struct MetricsEngine;

impl MetricsEngine {
    /// @ai:intent Compute quality statistics over all pairs of one model
    /// @ai:pre pairs belong to a single model
    /// @ai:post empty input yields the zero result
    /// @ai:effects pure
    pub fn evaluate(pairs: &[LabelPair]) -> QualityResult {
        if pairs.is_empty() {
            return QualityResult::default();
        }

        let mut counts = QualityCounts {
            total: pairs.len(),
            ..Default::default()
        };
        let mut per_label = [LabelCounts::default(); AllergenLabel::ALL.len()];

        for (gt, pr) in pairs {
            let correct = gt.intersection(pr).count();
            let union = gt.union(pr).count();

            counts.true_positives += correct;
            counts.false_positives += pr.len() - correct;
            counts.false_negatives += gt.len() - correct;
            counts.hamming_sum += union - correct;

            if gt == pr {
                counts.exact_matches += 1;
            }
            if pr.is_empty() {
                counts.abstentions += 1;
            }

            for (slot, label) in per_label.iter_mut().zip(AllergenLabel::ALL) {
                match (gt.contains(label.as_str()), pr.contains(label.as_str())) {
                    (true, true) => slot.tp += 1,
                    (false, true) => slot.fp += 1,
                    (true, false) => slot.fn_ += 1,
                    (false, false) => {}
                }
            }
        }

        let tp = counts.true_positives;
        let fp = counts.false_positives;
        let fn_ = counts.false_negatives;
        let total = counts.total;

        let macro_f1 =
            per_label.iter().map(LabelCounts::f1).sum::<f64>() / AllergenLabel::ALL.len() as f64;

        QualityResult {
            precision: ratio(tp, tp + fp),
            recall: ratio(tp, tp + fn_),
            micro_f1: ratio(2 * tp, 2 * tp + fp + fn_),
            macro_f1,
            fnr: ratio(fn_, tp + fn_),
            hallucination_rate: ratio(fp, fp + tp),
            over_prediction_rate: ratio(fp, total),
            abstention_rate: ratio(counts.abstentions, total),
            exact_match_rate: ratio(counts.exact_matches, total),
            hamming_loss: ratio(counts.hamming_sum, total),
            counts,
        }
    }
}
