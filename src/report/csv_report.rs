//! @ai:module:intent CSV exports of per-item predictions and per-model metrics
//! @ai:module:layer infrastructure
//! @ai:module:public_api CsvReporter, CsvReporterTrait, METRICS_COLUMNS
//! @ai:module:stateless true

use crate::metrics::ModelSummary;
use crate::store::BenchmarkRecord;
use anyhow::{Context, Result};
use std::fmt::Write as FmtWrite;
use std::path::Path;

/// Every metrics-export row is padded to this many fields.
pub const METRICS_COLUMNS: usize = 10;

const PREDICTION_HEADER: [&str; 8] = [
    "ID",
    "Model",
    "FoodName",
    "Ingredients",
    "RawAllergens",
    "MappedAllergens",
    "PredictedAllergens",
    "Outcome",
];

/// @ai:intent Trait for CSV report generation
pub trait CsvReporterTrait: Send + Sync {
    /// @ai:intent Write one row per benchmark record
    fn generate_predictions(&self, records: &[BenchmarkRecord], output_path: &Path) -> Result<()>;

    /// @ai:intent Write the stacked safety, quality and efficiency sections
    fn generate_metrics(&self, models: &[ModelSummary], output_path: &Path) -> Result<()>;
}

/// @ai:intent Generates CSV exports
pub struct CsvReporter;

impl CsvReporter {
    /// @ai:intent Create a new CSV reporter
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Render the prediction export
    /// @ai:effects pure
    pub fn render_predictions(records: &[BenchmarkRecord]) -> String {
        let mut output = String::new();
        push_row(&mut output, &PREDICTION_HEADER);

        for record in records {
            let outcome = if record.is_set_match() { "MATCH" } else { "MISMATCH" };

            push_row(
                &mut output,
                &[
                    record.item_id.as_str(),
                    record.model.as_str(),
                    record.food_name.as_str(),
                    record.ingredients.as_str(),
                    record.raw_allergens.as_str(),
                    record.mapped_allergens.as_str(),
                    record.predicted_allergens.as_str(),
                    outcome,
                ],
            );
        }

        output
    }

    /// @ai:intent Render the metrics export
    /// @ai:effects pure
    pub fn render_metrics(models: &[ModelSummary]) -> String {
        let mut output = String::new();

        push_padded(&mut output, vec!["Safety".into()]);
        push_padded(
            &mut output,
            header(&["Model", "HallucinationRate%", "OverPredictionRate%", "AbstentionRate%"]),
        );
        for m in models {
            push_padded(
                &mut output,
                vec![
                    m.model.clone(),
                    percent(m.document_hallucination_rate),
                    percent(m.quality.over_prediction_rate),
                    percent(m.quality.abstention_rate),
                ],
            );
        }

        push_padded(&mut output, Vec::new());
        push_padded(&mut output, vec!["Quality".into()]);
        push_padded(
            &mut output,
            header(&[
                "Model", "Precision%", "Recall%", "MicroF1", "MacroF1", "ExactMatch%", "HammingLoss",
                "FNR%",
            ]),
        );
        for m in models {
            let q = &m.quality;
            push_padded(
                &mut output,
                vec![
                    m.model.clone(),
                    percent(q.precision),
                    percent(q.recall),
                    format!("{:.4}", q.micro_f1),
                    format!("{:.4}", q.macro_f1),
                    percent(q.exact_match_rate),
                    format!("{:.4}", q.hamming_loss),
                    percent(q.fnr),
                ],
            );
        }

        push_padded(&mut output, Vec::new());
        push_padded(&mut output, vec!["Efficiency".into()]);
        push_padded(
            &mut output,
            header(&[
                "Model", "LatencyMs", "TTFTms", "ITPS", "OTPS", "OETms", "TotalTimeMs", "JavaHeapKB",
                "NativeHeapKB", "PSSKB",
            ]),
        );
        for m in models {
            let e = &m.efficiency;
            push_padded(
                &mut output,
                vec![
                    m.model.clone(),
                    format!("{:.0}", m.avg_latency_ms),
                    or_na(e.avg_ttft_ms),
                    or_na(e.avg_itps),
                    or_na(e.avg_otps),
                    or_na(e.avg_oet_ms),
                    or_na(e.total_time_ms),
                    or_na(e.avg_java_heap_kb),
                    or_na(e.avg_native_heap_kb),
                    or_na(e.avg_pss_kb),
                ],
            );
        }

        output
    }
}

impl Default for CsvReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvReporterTrait for CsvReporter {
    /// @ai:effects fs:write
    fn generate_predictions(&self, records: &[BenchmarkRecord], output_path: &Path) -> Result<()> {
        std::fs::write(output_path, Self::render_predictions(records))
            .with_context(|| format!("Failed to write {}", output_path.display()))
    }

    /// @ai:effects fs:write
    fn generate_metrics(&self, models: &[ModelSummary], output_path: &Path) -> Result<()> {
        std::fs::write(output_path, Self::render_metrics(models))
            .with_context(|| format!("Failed to write {}", output_path.display()))
    }
}

/// @ai:intent Quote a field when it holds a delimiter, quote or line break
/// @ai:effects pure
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn push_row<S: AsRef<str>>(output: &mut String, fields: &[S]) {
    let line = fields
        .iter()
        .map(|f| escape_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    writeln!(output, "{}", line).unwrap();
}

fn push_padded(output: &mut String, mut fields: Vec<String>) {
    fields.resize(fields.len().max(METRICS_COLUMNS), String::new());
    push_row(output, &fields);
}

fn header(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn percent(rate: f64) -> String {
    format!("{:.2}", rate * 100.0)
}

fn or_na(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.0}", v))
        .unwrap_or_else(|| "N/A".to_string())
}
