//! @ai:module:intent Per-item benchmark loop for one model
//! @ai:module:layer application
//! @ai:module:public_api BenchmarkOrchestrator, RunOutcome, RunState, CancellationToken, build_prompt
//! @ai:module:stateless false

use crate::allergen::{
    approximate_lexical_match, canonical_prediction_text, extract, AllergenLabel, EMPTY_SENTINEL,
};
use crate::codec::ResultCodec;
use crate::config::{MatchingMode, RunConfig};
use crate::dataset::FoodItem;
use crate::metrics::{LabelPair, MetricsEngine, QualityResult};
use crate::runner::engine::InferenceEngine;
use crate::runner::memory::{MemorySampler, NullMemorySampler};
use crate::store::{spawn_writer, BenchmarkRecord, PersistenceReport, RecordStore};
use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// @ai:intent Build the fixed allergen-detection prompt for one food item
/// @ai:effects pure
pub fn build_prompt(ingredients: &str) -> String {
    format!(
        "Task: Detect food allergens.\n\
         Ingredients:\n{}\n\
         Allowed allergens:\n{}\n\
         Rules:\n\
         - Output ONLY a comma-separated list of allergens.\n\
         - If none are present, output {}.",
        ingredients,
        AllergenLabel::vocabulary_line(),
        EMPTY_SENTINEL
    )
}

/// @ai:intent Lifecycle of a benchmark run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum RunState {
    Idle,
    /// `index` items of `total` are done
    Running { index: usize, total: usize },
    Completed { total: usize },
    /// Stopped before item `at` (0-based)
    Cancelled { at: usize, total: usize },
}

impl RunState {
    /// @ai:intent Whether the run has stopped, normally or not
    /// @ai:effects pure
    pub fn is_finished(&self) -> bool {
        matches!(self, RunState::Completed { .. } | RunState::Cancelled { .. })
    }
}

/// @ai:intent Cooperative cancellation flag shared with the caller
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// @ai:intent Create an untriggered token
    /// @ai:effects pure
    pub fn new() -> Self {
        Self::default()
    }

    /// @ai:intent Request the run to stop before its next item
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// @ai:intent Everything a finished run produced
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub model: String,
    pub records: Vec<BenchmarkRecord>,
    pub quality: QualityResult,
    pub state: RunState,
    pub engine_failures: usize,
    pub persistence: PersistenceReport,
}

/// @ai:intent Drives one model through every food item in order
pub struct BenchmarkOrchestrator<E: InferenceEngine> {
    engine: Arc<E>,
    sampler: Arc<dyn MemorySampler>,
    run_config: RunConfig,
    progress: watch::Sender<RunState>,
    cancel: CancellationToken,
}

impl<E: InferenceEngine> BenchmarkOrchestrator<E> {
    /// @ai:intent Create an orchestrator around an engine
    /// @ai:effects pure
    pub fn new(engine: Arc<E>, run_config: RunConfig) -> Self {
        let (progress, _) = watch::channel(RunState::Idle);

        Self {
            engine,
            sampler: Arc::new(NullMemorySampler),
            run_config,
            progress,
            cancel: CancellationToken::new(),
        }
    }

    /// @ai:intent Replace the memory sampler
    /// @ai:effects pure
    pub fn with_memory_sampler(mut self, sampler: Arc<dyn MemorySampler>) -> Self {
        self.sampler = sampler;
        self
    }

    /// @ai:intent Use a caller-owned cancellation token
    /// @ai:effects pure
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// @ai:intent Observe run state changes
    /// @ai:effects pure
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.progress.subscribe()
    }

    /// @ai:intent Current run state
    /// @ai:effects pure
    pub fn state(&self) -> RunState {
        *self.progress.borrow()
    }

    /// @ai:intent Turn prediction text into the stored predicted-allergen string
    /// @ai:effects pure
    fn predicted_text(&self, prediction: &str) -> String {
        match self.run_config.matching {
            MatchingMode::Lexical => {
                if prediction.to_lowercase().contains("empty") {
                    EMPTY_SENTINEL.to_string()
                } else {
                    canonical_prediction_text(&approximate_lexical_match(prediction))
                }
            }
            MatchingMode::Tokens => {
                let labels = extract(Some(prediction));

                if labels.is_empty() {
                    EMPTY_SENTINEL.to_string()
                } else {
                    labels.into_iter().collect::<Vec<_>>().join(", ")
                }
            }
        }
    }

    /// @ai:intent Run one item: prompt, infer, decode, match, sample memory
    /// @ai:post latency_ms >= 1
    /// @ai:effects network | process:spawn
    async fn execute_item(&self, item: &FoodItem, model: &str) -> (BenchmarkRecord, bool) {
        let prompt = build_prompt(&item.ingredients);

        let start = Instant::now();
        let result = self.engine.infer(&prompt, &self.run_config.model_ref).await;
        let latency_ms = (start.elapsed().as_millis() as i64).max(1);

        let (raw, failed) = match result {
            Ok(raw) => (raw, false),
            Err(e) => {
                tracing::warn!("Inference failed for item {}: {:#}", item.id, e);
                (String::new(), true)
            }
        };

        let output = ResultCodec::decode(&raw);
        let predicted_allergens = self.predicted_text(&output.prediction);

        tracing::debug!(
            "Item {}: raw {:?} -> predicted {:?}",
            item.id,
            raw,
            predicted_allergens
        );

        let record = BenchmarkRecord {
            model: model.to_string(),
            item_id: item.id.clone(),
            food_name: item.name.clone(),
            ingredients: item.ingredients.clone(),
            raw_allergens: item.allergens_raw.clone(),
            mapped_allergens: item.allergens_mapped.clone(),
            predicted_allergens,
            latency_ms,
            timing: output.metrics,
            memory: self.sampler.snapshot(),
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
            defaulted_fields: Vec::new(),
        };

        (record, failed)
    }

    /// @ai:intent Benchmark every item in order, persisting records as they finish
    /// @ai:pre no other run is in progress on this orchestrator
    /// @ai:post state is Completed, or Cancelled if the token fired
    /// @ai:effects network | fs:write
    pub async fn run(&self, items: &[FoodItem], store: Arc<dyn RecordStore>) -> Result<RunOutcome> {
        let total = items.len();

        let started = self.progress.send_if_modified(|state| {
            if matches!(state, RunState::Running { .. }) {
                return false;
            }
            *state = RunState::Running { index: 0, total };
            true
        });

        if !started {
            anyhow::bail!("A benchmark run is already in progress");
        }

        let model = self.run_config.resolved_model_name();
        let (sink, writer) = spawn_writer(store, self.run_config.write_queue_capacity);

        let mut records = Vec::with_capacity(total);
        let mut engine_failures = 0;
        let mut final_state = RunState::Completed { total };

        tracing::info!("Benchmarking {} on {} items", model, total);

        for (index, item) in items.iter().enumerate() {
            if self.cancel.is_cancelled() {
                tracing::warn!("Run cancelled before item {} of {}", index + 1, total);
                final_state = RunState::Cancelled { at: index, total };
                break;
            }

            tracing::info!("[{}/{}] {} ({})", index + 1, total, item.id, item.name);

            let (record, failed) = self.execute_item(item, &model).await;
            if failed {
                engine_failures += 1;
            }

            sink.send(record.clone()).await;
            records.push(record);

            self.progress.send_replace(RunState::Running {
                index: index + 1,
                total,
            });
        }

        drop(sink);
        let persistence = writer.await.context("Record writer task failed")?;

        if !persistence.is_complete() {
            tracing::error!(
                "{} of {} records were not persisted",
                persistence.failed,
                records.len()
            );
        }

        let pairs: Vec<LabelPair> = records
            .iter()
            .map(|r| (r.ground_truth(), r.predicted()))
            .collect();
        let quality = MetricsEngine::evaluate(&pairs);

        self.progress.send_replace(final_state);

        tracing::info!(
            "Finished {}: {} records, {} engine failures, micro-F1 {:.3}",
            model,
            records.len(),
            engine_failures,
            quality.micro_f1
        );

        Ok(RunOutcome {
            model,
            records,
            quality,
            state: final_state,
            engine_failures,
            persistence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::engine::MockInferenceEngine;
    use crate::store::MemoryRecordStore;

    fn item(id: &str, ingredients: &str, mapped: &str) -> FoodItem {
        FoodItem {
            id: id.to_string(),
            name: format!("Food {}", id),
            ingredients: ingredients.to_string(),
            allergens_raw: mapped.to_string(),
            allergens_mapped: mapped.to_string(),
        }
    }

    fn run_config(matching: MatchingMode) -> RunConfig {
        RunConfig {
            model_ref: "models/tiny-q4.gguf".to_string(),
            matching,
            write_queue_capacity: 2,
            ..Default::default()
        }
    }

    /// Engine that trips the token while serving its first call.
    struct CancellingEngine {
        token: CancellationToken,
    }

    impl InferenceEngine for CancellingEngine {
        async fn infer(&self, _prompt: &str, _model_ref: &str) -> Result<String> {
            self.token.cancel();
            Ok("milk".to_string())
        }
    }

    #[test]
    fn test_prompt_lists_vocabulary_and_sentinel() {
        let prompt = build_prompt("flour, butter");

        assert!(prompt.contains("Ingredients:\nflour, butter"));
        assert!(prompt.contains("milk, egg, peanut, tree nut, wheat, soy, fish, shellfish, sesame"));
        assert!(prompt.ends_with("output EMPTY."));
    }

    #[tokio::test]
    async fn test_run_produces_records_and_quality() {
        let engine = Arc::new(MockInferenceEngine::scripted(vec![
            "TTFT_MS=120;ITPS=30|milk".to_string(),
            "EMPTY".to_string(),
        ]));
        let store = Arc::new(MemoryRecordStore::new());
        let orchestrator = BenchmarkOrchestrator::new(engine, run_config(MatchingMode::Lexical));

        let items = vec![item("1", "milk powder", "milk"), item("2", "egg yolk", "egg")];
        let outcome = orchestrator.run(&items, store.clone()).await.unwrap();

        assert_eq!(outcome.model, "tiny-q4");
        assert_eq!(outcome.state, RunState::Completed { total: 2 });
        assert_eq!(orchestrator.state(), RunState::Completed { total: 2 });
        assert_eq!(outcome.records[0].predicted_allergens, "milk");
        assert_eq!(outcome.records[0].timing.ttft_ms, 120);
        assert_eq!(outcome.records[1].predicted_allergens, "EMPTY");
        assert!(outcome.records.iter().all(|r| r.latency_ms >= 1));

        assert_eq!(outcome.quality.counts.true_positives, 1);
        assert!((outcome.quality.recall - 0.5).abs() < 1e-9);
        assert_eq!(outcome.persistence.written, 2);
        assert_eq!(store.load_all().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_lexical_matching_is_approximate() {
        let engine = Arc::new(MockInferenceEngine::new("Contains shellfish and tree nuts"));
        let orchestrator = BenchmarkOrchestrator::new(engine, run_config(MatchingMode::Lexical));

        let outcome = orchestrator
            .run(&[item("1", "shrimp, almonds", "tree nut, shellfish")], Arc::new(MemoryRecordStore::new()))
            .await
            .unwrap();

        assert_eq!(outcome.records[0].predicted_allergens, "tree nut, fish, shellfish");
    }

    #[tokio::test]
    async fn test_token_matching_uses_extractor() {
        let engine = Arc::new(MockInferenceEngine::new("Sesame, Mustard"));
        let orchestrator = BenchmarkOrchestrator::new(engine, run_config(MatchingMode::Tokens));

        let outcome = orchestrator
            .run(&[item("1", "tahini", "sesame")], Arc::new(MemoryRecordStore::new()))
            .await
            .unwrap();

        assert_eq!(outcome.records[0].predicted_allergens, "mustard, sesame");
    }

    #[tokio::test]
    async fn test_engine_failures_are_recorded_not_fatal() {
        let engine = Arc::new(MockInferenceEngine::failing("runtime crashed"));
        let orchestrator = BenchmarkOrchestrator::new(engine, run_config(MatchingMode::Lexical));

        let items = vec![item("1", "milk", "milk"), item("2", "egg", "egg")];
        let outcome = orchestrator.run(&items, Arc::new(MemoryRecordStore::new())).await.unwrap();

        assert_eq!(outcome.engine_failures, 2);
        assert_eq!(outcome.records.len(), 2);
        assert!(outcome.records.iter().all(|r| r.predicted_allergens == "EMPTY"));
        assert_eq!(outcome.records[0].timing.ttft_ms, -1);
    }

    #[tokio::test]
    async fn test_cancellation_stops_before_next_item() {
        let token = CancellationToken::new();
        let engine = Arc::new(CancellingEngine {
            token: token.clone(),
        });
        let orchestrator = BenchmarkOrchestrator::new(engine, run_config(MatchingMode::Lexical))
            .with_cancellation(token);
        let progress = orchestrator.subscribe();

        let items = vec![item("1", "milk", "milk"), item("2", "egg", "egg"), item("3", "soy", "soy")];
        let outcome = orchestrator.run(&items, Arc::new(MemoryRecordStore::new())).await.unwrap();

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.state, RunState::Cancelled { at: 1, total: 3 });
        assert!(progress.borrow().is_finished());
        assert_eq!(outcome.persistence.written, 1);
    }

    #[tokio::test]
    async fn test_empty_dataset_completes_with_zero_quality() {
        let engine = Arc::new(MockInferenceEngine::new("milk"));
        let orchestrator = BenchmarkOrchestrator::new(engine.clone(), run_config(MatchingMode::Lexical));

        let outcome = orchestrator.run(&[], Arc::new(MemoryRecordStore::new())).await.unwrap();

        assert_eq!(outcome.state, RunState::Completed { total: 0 });
        assert_eq!(outcome.quality, QualityResult::default());
        assert_eq!(engine.calls(), 0);
    }
}
