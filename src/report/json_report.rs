//! @ai:module:intent JSON report generation
//! @ai:module:layer infrastructure
//! @ai:module:public_api JsonReporter
//! @ai:module:stateless true

use crate::metrics::BenchmarkResults;
use anyhow::{Context, Result};
use std::path::Path;

/// @ai:intent Trait for JSON report generation
pub trait JsonReporterTrait: Send + Sync {
    /// @ai:intent Generate JSON report from results
    fn generate(&self, results: &BenchmarkResults, output_path: &Path) -> Result<()>;
}

/// @ai:intent Generates JSON reports from benchmark results
pub struct JsonReporter;

impl JsonReporter {
    /// @ai:intent Create a new JSON reporter
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonReporterTrait for JsonReporter {
    /// @ai:intent Write summaries and leaderboard as pretty JSON
    /// @ai:post parent directories exist afterwards
    /// @ai:effects fs:write
    fn generate(&self, results: &BenchmarkResults, output_path: &Path) -> Result<()> {
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(results)
            .with_context(|| format!("serializing {} model summaries", results.models.len()))?;
        std::fs::write(output_path, json)
            .with_context(|| format!("writing {}", output_path.display()))?;

        tracing::debug!("JSON report written to {}", output_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::LeaderboardRanker;
    use crate::metrics::MetricsAggregator;
    use crate::store::StoredRecord;
    use tempfile::TempDir;

    #[test]
    fn test_generate_json_report() {
        let reporter = JsonReporter::new();
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("results.json");

        let records = vec![StoredRecord {
            model_name: Some("gemma-2b-it-q4".to_string()),
            mapped_allergens: Some("milk".to_string()),
            predicted_allergens: Some("milk".to_string()),
            latency_ms: Some(320),
            ..Default::default()
        }
        .normalize()];
        let results = MetricsAggregator::new().evaluate(&records, &LeaderboardRanker::default());

        reporter.generate(&results, &output).unwrap();
        assert!(output.exists());

        let content = std::fs::read_to_string(&output).unwrap();
        assert!(content.contains("gemma-2b-it-q4"));

        let parsed: BenchmarkResults = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.models.len(), 1);
        assert_eq!(parsed.leaderboard.entries[0].position, 1);
    }

    #[test]
    fn test_generate_creates_missing_directories() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("nested").join("run-1").join("results.json");
        let results = MetricsAggregator::new().evaluate(&[], &LeaderboardRanker::default());

        JsonReporter::new().generate(&results, &output).unwrap();

        let parsed: BenchmarkResults =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(parsed.record_count, 0);
    }

    #[test]
    fn test_write_failure_names_the_file() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("results.json");
        std::fs::create_dir_all(&output).unwrap();
        let results = MetricsAggregator::new().evaluate(&[], &LeaderboardRanker::default());

        let err = JsonReporter::new().generate(&results, &output).unwrap_err();
        assert!(format!("{:#}", err).contains("results.json"));
    }
}
