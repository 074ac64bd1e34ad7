//! @ai:module:intent Report generation for benchmark results
//! @ai:module:layer infrastructure
//! @ai:module:public_api ReportGenerator, ReportOutcome, CsvReporter, JsonReporter, MarkdownReporter, ChartGenerator

pub mod charts;
pub mod csv_report;
pub mod json_report;
pub mod markdown_report;

pub use charts::{ChartGenerator, ChartGeneratorTrait};
pub use csv_report::{CsvReporter, CsvReporterTrait, METRICS_COLUMNS};
pub use json_report::{JsonReporter, JsonReporterTrait};
pub use markdown_report::{MarkdownReporter, MarkdownReporterTrait};

use crate::error::Error;
use crate::metrics::BenchmarkResults;
use crate::store::BenchmarkRecord;
use std::path::{Path, PathBuf};

pub const PREDICTIONS_FILE: &str = "predictions.csv";
pub const METRICS_FILE: &str = "metrics.csv";
pub const JSON_FILE: &str = "results.json";
pub const MARKDOWN_FILE: &str = "results.md";

/// @ai:intent Which reports were written and which failed
#[derive(Debug, Default)]
pub struct ReportOutcome {
    pub written: Vec<PathBuf>,
    pub failures: Vec<Error>,
}

impl ReportOutcome {
    /// @ai:intent Whether every report was written
    /// @ai:effects pure
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, report: &str, path: PathBuf, result: anyhow::Result<()>) {
        match result {
            Ok(()) => self.written.push(path),
            Err(e) => {
                tracing::error!("Failed to write {}: {:#}", report, e);
                self.failures.push(Error::Export {
                    report: report.to_string(),
                    message: format!("{:#}", e),
                });
            }
        }
    }
}

/// @ai:intent Combined report generator
pub struct ReportGenerator {
    csv: CsvReporter,
    json: JsonReporter,
    markdown: MarkdownReporter,
    charts: ChartGenerator,
}

impl ReportGenerator {
    /// @ai:intent Create a new report generator
    /// @ai:effects pure
    pub fn new() -> Self {
        Self {
            csv: CsvReporter::new(),
            json: JsonReporter::new(),
            markdown: MarkdownReporter::new(),
            charts: ChartGenerator::new(),
        }
    }

    /// @ai:intent Generate every report, continuing past individual failures
    /// @ai:post results are never modified; failures are listed in the outcome
    /// @ai:effects fs:write
    pub fn generate_all(
        &self,
        results: &BenchmarkResults,
        records: &[BenchmarkRecord],
        output_dir: &Path,
    ) -> ReportOutcome {
        let mut outcome = ReportOutcome::default();

        if let Err(e) = std::fs::create_dir_all(output_dir) {
            outcome.failures.push(Error::file_access(output_dir, e));
            return outcome;
        }

        let path = output_dir.join(PREDICTIONS_FILE);
        let result = self.csv.generate_predictions(records, &path);
        outcome.record("prediction CSV", path, result);

        let path = output_dir.join(METRICS_FILE);
        let result = self.csv.generate_metrics(&results.models, &path);
        outcome.record("metrics CSV", path, result);

        let path = output_dir.join(JSON_FILE);
        let result = self.json.generate(results, &path);
        outcome.record("JSON report", path, result);

        let path = output_dir.join(MARKDOWN_FILE);
        let result = self.markdown.generate(results, &path);
        outcome.record("Markdown report", path, result);

        match self.charts.generate_all(results, output_dir) {
            Ok(files) => outcome
                .written
                .extend(files.into_iter().map(|f| output_dir.join(f))),
            Err(e) => {
                tracing::error!("Failed to draw charts: {:#}", e);
                outcome.failures.push(Error::Export {
                    report: "charts".to_string(),
                    message: format!("{:#}", e),
                });
            }
        }

        tracing::info!(
            "{} reports written to {} ({} failed)",
            outcome.written.len(),
            output_dir.display(),
            outcome.failures.len()
        );

        outcome
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}
