//! @ai:module:intent Chart generation for benchmark results
//! @ai:module:layer infrastructure
//! @ai:module:public_api ChartGenerator
//! @ai:module:stateless true

use crate::metrics::BenchmarkResults;
use anyhow::Result;
use plotters::prelude::*;
use std::path::Path;

/// Quality metrics plotted side by side for each model.
const QUALITY_SERIES: [&str; 4] = ["Precision", "Recall", "Micro-F1", "Macro-F1"];

/// @ai:intent Trait for chart generation
pub trait ChartGeneratorTrait: Send + Sync {
    /// @ai:intent Generate all charts from results
    fn generate_all(&self, results: &BenchmarkResults, output_dir: &Path) -> Result<Vec<String>>;
}

/// @ai:intent Generates charts from benchmark results
pub struct ChartGenerator;

impl ChartGenerator {
    /// @ai:intent Create a new chart generator
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Leaderboard scores in rank order
    /// @ai:effects pure
    fn score_bars(results: &BenchmarkResults) -> Vec<(String, f64)> {
        results
            .leaderboard
            .entries
            .iter()
            .map(|e| (e.model.clone(), e.score))
            .collect()
    }

    /// @ai:intent Y range covering every score and zero, with some headroom
    /// @ai:effects pure
    fn score_range(bars: &[(String, f64)]) -> (f64, f64) {
        let low = bars.iter().map(|(_, s)| *s).fold(0.0_f64, f64::min);
        let high = bars.iter().map(|(_, s)| *s).fold(0.0_f64, f64::max);
        let pad = ((high - low) * 0.1).max(0.05);

        (if low < 0.0 { low - pad } else { 0.0 }, high + pad)
    }

    /// @ai:intent Per-model values in QUALITY_SERIES order
    /// @ai:effects pure
    fn quality_groups(results: &BenchmarkResults) -> Vec<(String, [f64; 4])> {
        results
            .models
            .iter()
            .map(|m| {
                let q = &m.quality;
                (m.model.clone(), [q.precision, q.recall, q.micro_f1, q.macro_f1])
            })
            .collect()
    }

    /// @ai:intent Generate composite score bar chart
    /// @ai:effects fs:write
    fn generate_leaderboard_chart(&self, results: &BenchmarkResults, output_path: &Path) -> Result<()> {
        let bars = Self::score_bars(results);
        let (y_min, y_max) = Self::score_range(&bars);

        let root = BitMapBackend::new(output_path, (800, 500)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Leaderboard Score", ("sans-serif", 28))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(0f64..bars.len().max(1) as f64, y_min..y_max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(bars.len().max(1))
            .y_desc("Score")
            .x_label_formatter(&|x| {
                bars.get(x.floor() as usize)
                    .map(|(name, _)| name.clone())
                    .unwrap_or_default()
            })
            .draw()?;

        chart.draw_series(bars.iter().enumerate().map(|(i, (_, score))| {
            let color = if *score >= 0.0 { GREEN } else { RED };
            Rectangle::new(
                [(i as f64 + 0.2, 0.0), (i as f64 + 0.8, *score)],
                color.mix(0.7).filled(),
            )
        }))?;

        root.present()?;
        Ok(())
    }

    /// @ai:intent Generate grouped quality bar chart
    /// @ai:effects fs:write
    fn generate_quality_chart(&self, results: &BenchmarkResults, output_path: &Path) -> Result<()> {
        let groups = Self::quality_groups(results);
        let palette = [BLUE, GREEN, MAGENTA, CYAN];
        let width = 0.8 / QUALITY_SERIES.len() as f64;

        let root = BitMapBackend::new(output_path, (900, 550)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Quality by Model", ("sans-serif", 28))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(0f64..groups.len().max(1) as f64, 0f64..1f64)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(groups.len().max(1))
            .y_desc("Rate")
            .x_label_formatter(&|x| {
                groups
                    .get(x.floor() as usize)
                    .map(|(name, _)| name.clone())
                    .unwrap_or_default()
            })
            .draw()?;

        for (s, (name, color)) in QUALITY_SERIES.iter().zip(palette).enumerate() {
            chart
                .draw_series(groups.iter().enumerate().map(|(i, (_, values))| {
                    let left = i as f64 + 0.1 + s as f64 * width;
                    Rectangle::new([(left, 0.0), (left + width, values[s])], color.mix(0.7).filled())
                }))?
                .label(*name)
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], color.mix(0.7).filled()));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .border_style(BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }
}

impl Default for ChartGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartGeneratorTrait for ChartGenerator {
    /// @ai:intent Generate all charts
    /// @ai:effects fs:write
    fn generate_all(&self, results: &BenchmarkResults, output_dir: &Path) -> Result<Vec<String>> {
        std::fs::create_dir_all(output_dir)?;

        let mut generated = Vec::new();

        if results.models.is_empty() {
            tracing::warn!("No models to chart");
            return Ok(generated);
        }

        self.generate_leaderboard_chart(results, &output_dir.join("leaderboard.png"))?;
        generated.push("leaderboard.png".to_string());

        self.generate_quality_chart(results, &output_dir.join("quality.png"))?;
        generated.push("quality.png".to_string());

        Ok(generated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::LeaderboardRanker;
    use crate::metrics::MetricsAggregator;
    use crate::store::StoredRecord;
    use tempfile::TempDir;

    fn create_test_results() -> BenchmarkResults {
        let records: Vec<_> = [("good", "milk", 100), ("bad", "peanut, soy", 800)]
            .into_iter()
            .map(|(model, predicted, latency)| {
                StoredRecord {
                    model_name: Some(model.to_string()),
                    mapped_allergens: Some("milk".to_string()),
                    predicted_allergens: Some(predicted.to_string()),
                    latency_ms: Some(latency),
                    ..Default::default()
                }
                .normalize()
            })
            .collect();

        MetricsAggregator::new().evaluate(&records, &LeaderboardRanker::default())
    }

    #[test]
    fn test_score_bars_follow_leaderboard_order() {
        let bars = ChartGenerator::score_bars(&create_test_results());
        assert_eq!(bars[0].0, "good");
        assert!(bars[1].1 < 0.0);
    }

    #[test]
    fn test_score_range_includes_zero_and_negatives() {
        let bars = vec![("a".to_string(), 0.4), ("b".to_string(), -0.3)];
        let (low, high) = ChartGenerator::score_range(&bars);
        assert!(low < -0.3);
        assert!(high > 0.4);

        let (low, _) = ChartGenerator::score_range(&[("a".to_string(), 0.2)]);
        assert_eq!(low, 0.0);
    }

    #[test]
    fn test_quality_groups() {
        let groups = ChartGenerator::quality_groups(&create_test_results());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].1, [1.0, 1.0, 1.0, 1.0 / 9.0]);
    }

    #[test]
    fn test_no_models_generates_nothing() {
        let temp = TempDir::new().unwrap();
        let results = MetricsAggregator::new().evaluate(&[], &LeaderboardRanker::default());

        let files = ChartGenerator::new().generate_all(&results, temp.path()).unwrap();
        assert!(files.is_empty());
    }
}
