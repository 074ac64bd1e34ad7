//! @ai:module:intent Benchmark record types and document normalization
//! @ai:module:layer domain
//! @ai:module:public_api BenchmarkRecord, StoredRecord, MemorySnapshot
//! @ai:module:stateless true

use crate::allergen::{extract, AllergenSet, EMPTY_SENTINEL};
use crate::codec::{TimingMetrics, UNAVAILABLE};
use serde::{Deserialize, Serialize};

/// @ai:intent Process memory sampled right after an inference call, in KB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySnapshot {
    pub java_heap_kb: i64,
    pub native_heap_kb: i64,
    pub pss_kb: i64,
}

impl MemorySnapshot {
    /// @ai:intent Snapshot where nothing could be measured
    /// @ai:effects pure
    pub fn unavailable() -> Self {
        Self {
            java_heap_kb: UNAVAILABLE,
            native_heap_kb: UNAVAILABLE,
            pss_kb: UNAVAILABLE,
        }
    }
}

/// @ai:intent One fully-defaulted (model, food item) trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    pub model: String,
    pub item_id: String,
    pub food_name: String,
    pub ingredients: String,
    pub raw_allergens: String,
    pub mapped_allergens: String,
    pub predicted_allergens: String,
    pub latency_ms: i64,
    pub timing: TimingMetrics,
    pub memory: MemorySnapshot,
    pub timestamp_ms: i64,
    /// Document keys that were absent and received a default
    #[serde(skip)]
    pub defaulted_fields: Vec<&'static str>,
}

impl BenchmarkRecord {
    /// @ai:intent Ground-truth label set
    /// @ai:effects pure
    pub fn ground_truth(&self) -> AllergenSet {
        extract(Some(&self.mapped_allergens))
    }

    /// @ai:intent Predicted label set
    /// @ai:effects pure
    pub fn predicted(&self) -> AllergenSet {
        extract(Some(&self.predicted_allergens))
    }

    /// @ai:intent Whether the predicted set equals the ground-truth set
    /// @ai:effects pure
    pub fn is_set_match(&self) -> bool {
        self.ground_truth() == self.predicted()
    }

    /// @ai:intent Whether the mapped and predicted strings are identical
    ///
    /// This string-level notion backs leaderboard accuracy and is stricter
    /// than set equality: "egg, milk" does not match "milk, egg".
    /// @ai:effects pure
    pub fn is_string_match(&self) -> bool {
        !self.mapped_allergens.trim().is_empty() && self.mapped_allergens == self.predicted_allergens
    }

    /// @ai:intent Whether a field was filled in by normalization
    /// @ai:effects pure
    pub fn was_defaulted(&self, key: &str) -> bool {
        self.defaulted_fields.iter().any(|k| *k == key)
    }
}

/// @ai:intent Schemaless document shape held by a record store
///
/// Every field is optional so partially written or older documents still
/// load; [`StoredRecord::normalize`] is the single place defaults apply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub food_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_allergens: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapped_allergens: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_allergens: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttft_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub itps: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otps: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oet_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub java_heap_kb: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native_heap_kb: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pss_kb: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

/// Tracks which keys were missing while a document is normalized.
struct Defaults {
    missing: Vec<&'static str>,
}

impl Defaults {
    fn text(&mut self, key: &'static str, value: Option<String>, fallback: &str) -> String {
        value.unwrap_or_else(|| {
            self.missing.push(key);
            fallback.to_string()
        })
    }

    fn number(&mut self, key: &'static str, value: Option<i64>, fallback: i64) -> i64 {
        value.unwrap_or_else(|| {
            self.missing.push(key);
            fallback
        })
    }
}

impl StoredRecord {
    /// @ai:intent Resolve absent fields to their documented defaults
    /// @ai:post identifiers default to "Unknown"/"UNKNOWN", prediction to "EMPTY",
    ///          latency to 0, timing, throughput and memory to -1
    /// @ai:effects pure
    pub fn normalize(self) -> BenchmarkRecord {
        let mut d = Defaults {
            missing: Vec::new(),
        };

        let record = BenchmarkRecord {
            model: d.text("modelName", self.model_name, "Unknown"),
            item_id: d.text("dataId", self.data_id, "UNKNOWN"),
            food_name: d.text("foodName", self.food_name, "Unknown"),
            ingredients: d.text("ingredients", self.ingredients, ""),
            raw_allergens: d.text("rawAllergens", self.raw_allergens, ""),
            mapped_allergens: d.text("mappedAllergens", self.mapped_allergens, ""),
            predicted_allergens: d.text("predictedAllergens", self.predicted_allergens, EMPTY_SENTINEL),
            latency_ms: d.number("latencyMs", self.latency_ms, 0),
            timing: TimingMetrics {
                ttft_ms: d.number("ttftMs", self.ttft_ms, UNAVAILABLE),
                itps: d.number("itps", self.itps, UNAVAILABLE),
                otps: d.number("otps", self.otps, UNAVAILABLE),
                oet_ms: d.number("oetMs", self.oet_ms, UNAVAILABLE),
            },
            memory: MemorySnapshot {
                java_heap_kb: d.number("javaHeapKb", self.java_heap_kb, UNAVAILABLE),
                native_heap_kb: d.number("nativeHeapKb", self.native_heap_kb, UNAVAILABLE),
                pss_kb: d.number("pssKb", self.pss_kb, UNAVAILABLE),
            },
            timestamp_ms: d.number("timestamp", self.timestamp, 0),
            defaulted_fields: Vec::new(),
        };

        BenchmarkRecord {
            defaulted_fields: d.missing,
            ..record
        }
    }
}

impl From<&BenchmarkRecord> for StoredRecord {
    fn from(record: &BenchmarkRecord) -> Self {
        Self {
            model_name: Some(record.model.clone()),
            data_id: Some(record.item_id.clone()),
            food_name: Some(record.food_name.clone()),
            ingredients: Some(record.ingredients.clone()),
            raw_allergens: Some(record.raw_allergens.clone()),
            mapped_allergens: Some(record.mapped_allergens.clone()),
            predicted_allergens: Some(record.predicted_allergens.clone()),
            latency_ms: Some(record.latency_ms),
            ttft_ms: Some(record.timing.ttft_ms),
            itps: Some(record.timing.itps),
            otps: Some(record.timing.otps),
            oet_ms: Some(record.timing.oet_ms),
            java_heap_kb: Some(record.memory.java_heap_kb),
            native_heap_kb: Some(record.memory.native_heap_kb),
            pss_kb: Some(record.memory.pss_kb),
            timestamp: Some(record.timestamp_ms),
        }
    }
}

/// @ai:intent Normalize a batch of stored documents
/// @ai:effects pure
pub fn normalize_all(documents: Vec<StoredRecord>) -> Vec<BenchmarkRecord> {
    let records: Vec<BenchmarkRecord> = documents.into_iter().map(StoredRecord::normalize).collect();

    let defaulted = records
        .iter()
        .filter(|r| !r.defaulted_fields.is_empty())
        .count();

    if defaulted > 0 {
        tracing::warn!("{} of {} records had missing fields filled with defaults", defaulted, records.len());
    }

    records
}
