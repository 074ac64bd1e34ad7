//! @ai:module:intent Markdown report generation
//! @ai:module:layer infrastructure
//! @ai:module:public_api MarkdownReporter
//! @ai:module:stateless true

use crate::leaderboard::RankedMetric;
use crate::metrics::BenchmarkResults;
use anyhow::Result;
use std::fmt::Write as FmtWrite;
use std::path::Path;

/// @ai:intent Trait for Markdown report generation
pub trait MarkdownReporterTrait: Send + Sync {
    /// @ai:intent Generate Markdown report from results
    fn generate(&self, results: &BenchmarkResults, output_path: &Path) -> Result<()>;
}

/// @ai:intent Generates Markdown reports from benchmark results
pub struct MarkdownReporter;

impl MarkdownReporter {
    /// @ai:intent Create a new Markdown reporter
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Format a rate as a percentage
    /// @ai:effects pure
    fn pct(rate: f64) -> String {
        format!("{:.1}%", rate * 100.0)
    }

    /// @ai:intent Format an optional average, N/A when unmeasured
    /// @ai:effects pure
    fn opt(value: Option<f64>, unit: &str) -> String {
        match value {
            Some(v) => format!("{:.0}{}", v, unit),
            None => "N/A".to_string(),
        }
    }

    /// @ai:intent Render the full report
    /// @ai:effects pure
    pub fn render(results: &BenchmarkResults) -> String {
        let mut content = String::new();

        content.push_str(&Self::generate_summary(results));
        content.push_str(&Self::generate_leaderboard(results));
        content.push_str(&Self::generate_rankings(results));
        content.push_str(&Self::generate_safety_section(results));
        content.push_str(&Self::generate_quality_section(results));
        content.push_str(&Self::generate_efficiency_section(results));

        content
    }

    /// @ai:intent Generate overall summary section
    /// @ai:effects pure
    fn generate_summary(results: &BenchmarkResults) -> String {
        let mut output = String::new();

        writeln!(output, "# Allergen Detection Benchmark").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "**Date:** {}", results.timestamp).unwrap();
        writeln!(output, "**Models:** {}", results.models.len()).unwrap();
        writeln!(output, "**Records:** {}", results.record_count).unwrap();
        writeln!(output).unwrap();

        output
    }

    /// @ai:intent Generate the overall leaderboard with badges
    /// @ai:effects pure
    fn generate_leaderboard(results: &BenchmarkResults) -> String {
        let mut output = String::new();

        writeln!(output, "## Leaderboard").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "| # | Model | Score | Accuracy | Latency (norm) | Badges |").unwrap();
        writeln!(output, "|---|-------|-------|----------|----------------|--------|").unwrap();

        for entry in &results.leaderboard.entries {
            let badges = if entry.badges.is_empty() {
                "-".to_string()
            } else {
                entry
                    .badges
                    .iter()
                    .map(|b| b.label())
                    .collect::<Vec<_>>()
                    .join(", ")
            };

            writeln!(
                output,
                "| {} | {} | {:.3} | {} | {:.2} | {} |",
                entry.position,
                entry.model,
                entry.score,
                Self::pct(entry.accuracy),
                entry.latency_norm,
                badges
            )
            .unwrap();
        }

        writeln!(output).unwrap();
        output
    }

    /// @ai:intent Generate one ordered list per ranked metric
    /// @ai:effects pure
    fn generate_rankings(results: &BenchmarkResults) -> String {
        let mut output = String::new();

        writeln!(output, "## Rankings by Metric").unwrap();
        writeln!(output).unwrap();

        for metric in RankedMetric::ALL {
            let Some(ranking) = results.leaderboard.ranking(metric) else {
                continue;
            };

            writeln!(output, "**{}:** {}", metric.label(), ranking.models.join(" > ")).unwrap();
            writeln!(output).unwrap();
        }

        output
    }

    /// @ai:intent Generate safety table
    /// @ai:effects pure
    fn generate_safety_section(results: &BenchmarkResults) -> String {
        let mut output = String::new();

        writeln!(output, "## Safety").unwrap();
        writeln!(output).unwrap();
        writeln!(
            output,
            "| Model | Hallucination (doc) | Hallucination (label) | Over-prediction | Abstention | FNR |"
        )
        .unwrap();
        writeln!(output, "|-------|---------------------|-----------------------|-----------------|------------|-----|").unwrap();

        for m in &results.models {
            writeln!(
                output,
                "| {} | {} | {} | {} | {} | {} |",
                m.model,
                Self::pct(m.document_hallucination_rate),
                Self::pct(m.quality.hallucination_rate),
                Self::pct(m.quality.over_prediction_rate),
                Self::pct(m.quality.abstention_rate),
                Self::pct(m.quality.fnr)
            )
            .unwrap();
        }

        writeln!(output).unwrap();
        output
    }

    /// @ai:intent Generate quality table
    /// @ai:effects pure
    fn generate_quality_section(results: &BenchmarkResults) -> String {
        let mut output = String::new();

        writeln!(output, "## Quality").unwrap();
        writeln!(output).unwrap();
        writeln!(
            output,
            "| Model | Correct | Precision | Recall | Micro-F1 | Macro-F1 | Exact Match | Hamming Loss |"
        )
        .unwrap();
        writeln!(output, "|-------|---------|-----------|--------|----------|----------|-------------|--------------|").unwrap();

        for m in &results.models {
            let q = &m.quality;
            writeln!(
                output,
                "| {} | {}/{} | {} | {} | {:.3} | {:.3} | {} | {:.3} |",
                m.model,
                m.correct,
                m.total,
                Self::pct(q.precision),
                Self::pct(q.recall),
                q.micro_f1,
                q.macro_f1,
                Self::pct(q.exact_match_rate),
                q.hamming_loss
            )
            .unwrap();
        }

        writeln!(output).unwrap();
        output
    }

    /// @ai:intent Generate efficiency table
    /// @ai:effects pure
    fn generate_efficiency_section(results: &BenchmarkResults) -> String {
        let mut output = String::new();

        writeln!(output, "## Efficiency").unwrap();
        writeln!(output).unwrap();
        writeln!(
            output,
            "| Model | Latency | TTFT | ITPS | OTPS | OET | Total | PSS |"
        )
        .unwrap();
        writeln!(output, "|-------|---------|------|------|------|-----|-------|-----|").unwrap();

        for m in &results.models {
            let e = &m.efficiency;
            writeln!(
                output,
                "| {} | {:.0}ms | {} | {} | {} | {} | {} | {} |",
                m.model,
                m.avg_latency_ms,
                Self::opt(e.avg_ttft_ms, "ms"),
                Self::opt(e.avg_itps, ""),
                Self::opt(e.avg_otps, ""),
                Self::opt(e.avg_oet_ms, "ms"),
                Self::opt(e.total_time_ms, "ms"),
                Self::opt(e.avg_pss_kb, " KB")
            )
            .unwrap();
        }

        writeln!(output).unwrap();
        output
    }
}

impl Default for MarkdownReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownReporterTrait for MarkdownReporter {
    /// @ai:intent Generate Markdown report to file
    /// @ai:effects fs:write
    fn generate(&self, results: &BenchmarkResults, output_path: &Path) -> Result<()> {
        std::fs::write(output_path, Self::render(results))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::LeaderboardRanker;
    use crate::metrics::MetricsAggregator;
    use crate::store::{BenchmarkRecord, StoredRecord};
    use tempfile::TempDir;

    fn record(model: &str, predicted: &str, latency: i64) -> BenchmarkRecord {
        StoredRecord {
            model_name: Some(model.to_string()),
            mapped_allergens: Some("milk".to_string()),
            predicted_allergens: Some(predicted.to_string()),
            latency_ms: Some(latency),
            ttft_ms: Some(80),
            ..Default::default()
        }
        .normalize()
    }

    #[test]
    fn test_opt_formats_missing_as_na() {
        assert_eq!(MarkdownReporter::opt(None, "ms"), "N/A");
        assert_eq!(MarkdownReporter::opt(Some(12.4), "ms"), "12ms");
    }

    #[test]
    fn test_generate_markdown_report() {
        let reporter = MarkdownReporter::new();
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("results.md");

        let records = vec![record("phi-mini", "milk", 300), record("tinyllama", "EMPTY", 900)];
        let results = MetricsAggregator::new().evaluate(&records, &LeaderboardRanker::default());

        reporter.generate(&results, &output).unwrap();
        assert!(output.exists());

        let content = std::fs::read_to_string(&output).unwrap();
        assert!(content.contains("# Allergen Detection Benchmark"));
        assert!(content.contains("| 1 | phi-mini |"));
        assert!(content.contains("**Accuracy:** phi-mini > tinyllama"));
        assert!(content.contains("| phi-mini | 1/1 |"));
        assert!(content.contains("80ms"));
    }
}
