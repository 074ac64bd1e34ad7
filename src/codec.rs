//! @ai:module:intent Decode and encode raw inference engine output
//! @ai:module:layer domain
//! @ai:module:public_api ResultCodec, InferenceOutput, TimingMetrics
//! @ai:module:stateless true
//!
//! Wire form is `METRICS|PREDICTION`. The metrics segment always comes
//! first; a string without `|` carries no metrics at all.

use serde::{Deserialize, Serialize};

/// Separator between the metrics segment and the prediction text.
pub const SEGMENT_SEPARATOR: char = '|';

/// Value used for any metric that is missing or unparsable.
pub const UNAVAILABLE: i64 = -1;

pub const KEY_TTFT_MS: &str = "TTFT_MS";
pub const KEY_ITPS: &str = "ITPS";
pub const KEY_OTPS: &str = "OTPS";
pub const KEY_OET_MS: &str = "OET_MS";

/// @ai:intent Timing metrics reported by the engine for one call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingMetrics {
    pub ttft_ms: i64,
    pub itps: i64,
    pub otps: i64,
    pub oet_ms: i64,
}

impl Default for TimingMetrics {
    fn default() -> Self {
        Self {
            ttft_ms: UNAVAILABLE,
            itps: UNAVAILABLE,
            otps: UNAVAILABLE,
            oet_ms: UNAVAILABLE,
        }
    }
}

impl TimingMetrics {
    /// @ai:intent Look up a metric by its wire key
    /// @ai:effects pure
    pub fn get(&self, key: &str) -> Option<i64> {
        match key {
            KEY_TTFT_MS => Some(self.ttft_ms),
            KEY_ITPS => Some(self.itps),
            KEY_OTPS => Some(self.otps),
            KEY_OET_MS => Some(self.oet_ms),
            _ => None,
        }
    }

    /// @ai:intent Parse a `KEY=VALUE;KEY=VALUE` segment
    /// @ai:post unknown keys are ignored, bad values stay -1
    /// @ai:effects pure
    fn from_segment(segment: &str) -> Self {
        let mut metrics = Self::default();

        for pair in segment.split(';') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            let value = value.trim().parse::<i64>().unwrap_or(UNAVAILABLE);

            match key.trim() {
                KEY_TTFT_MS => metrics.ttft_ms = value,
                KEY_ITPS => metrics.itps = value,
                KEY_OTPS => metrics.otps = value,
                KEY_OET_MS => metrics.oet_ms = value,
                other => tracing::debug!("Ignoring unknown metric key {:?}", other),
            }
        }

        metrics
    }

    fn to_segment(self) -> String {
        format!(
            "{}={};{}={};{}={};{}={}",
            KEY_TTFT_MS, self.ttft_ms, KEY_ITPS, self.itps, KEY_OTPS, self.otps, KEY_OET_MS, self.oet_ms
        )
    }
}

/// @ai:intent Prediction text plus timing metrics for one inference call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceOutput {
    pub prediction: String,
    pub metrics: TimingMetrics,
}

/// @ai:intent Codec for the engine's `METRICS|PREDICTION` result string
pub struct ResultCodec;

impl ResultCodec {
    /// @ai:intent Split a raw engine result into prediction and metrics
    /// @ai:post never fails; missing metrics are -1
    /// @ai:example ("TTFT_MS=120;ITPS=30|milk, egg") -> prediction "milk, egg", ttft 120, itps 30
    /// @ai:example ("x") -> prediction "x", all metrics -1
    /// @ai:effects pure
    pub fn decode(raw: &str) -> InferenceOutput {
        match raw.split_once(SEGMENT_SEPARATOR) {
            Some((metrics, prediction)) => InferenceOutput {
                prediction: prediction.to_string(),
                metrics: TimingMetrics::from_segment(metrics),
            },
            None => InferenceOutput {
                prediction: raw.to_string(),
                metrics: TimingMetrics::default(),
            },
        }
    }

    /// @ai:intent Produce the canonical wire form
    /// @ai:effects pure
    pub fn encode(prediction: &str, metrics: &TimingMetrics) -> String {
        format!("{}{}{}", metrics.to_segment(), SEGMENT_SEPARATOR, prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_without_separator() {
        let output = ResultCodec::decode("x");
        assert_eq!(output.prediction, "x");
        assert_eq!(output.metrics, TimingMetrics::default());
    }

    #[test]
    fn test_decode_partial_metrics() {
        let output = ResultCodec::decode("TTFT_MS=120;ITPS=30|milk, egg");
        assert_eq!(output.prediction, "milk, egg");
        assert_eq!(output.metrics.get(KEY_TTFT_MS), Some(120));
        assert_eq!(output.metrics.get(KEY_ITPS), Some(30));
        assert_eq!(output.metrics.get(KEY_OTPS), Some(-1));
        assert_eq!(output.metrics.get(KEY_OET_MS), Some(-1));
    }

    #[test]
    fn test_decode_unparsable_value_only_affects_its_key() {
        let output = ResultCodec::decode("TTFT_MS=abc;OTPS=12;garbage|soy");
        assert_eq!(output.metrics.ttft_ms, -1);
        assert_eq!(output.metrics.otps, 12);
        assert_eq!(output.prediction, "soy");
    }

    #[test]
    fn test_decode_splits_at_first_separator() {
        let output = ResultCodec::decode("OET_MS=5|milk|egg");
        assert_eq!(output.prediction, "milk|egg");
        assert_eq!(output.metrics.oet_ms, 5);
    }

    #[test]
    fn test_encode_is_decodable() {
        let metrics = TimingMetrics {
            ttft_ms: 80,
            itps: 40,
            otps: 12,
            oet_ms: 900,
        };
        let raw = ResultCodec::encode("wheat", &metrics);
        assert_eq!(raw, "TTFT_MS=80;ITPS=40;OTPS=12;OET_MS=900|wheat");
        assert_eq!(ResultCodec::decode(&raw).metrics, metrics);
    }
}
