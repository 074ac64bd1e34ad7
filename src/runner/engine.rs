//! @ai:module:intent Inference engine adapters producing raw result strings
//! @ai:module:layer infrastructure
//! @ai:module:public_api InferenceEngine, MockInferenceEngine, CommandInferenceEngine, HttpInferenceEngine
//! @ai:module:stateless false

use crate::codec::{ResultCodec, TimingMetrics};
use crate::config::EngineConfig;
use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// @ai:intent Trait for a model runtime answering one prompt at a time
#[allow(async_fn_in_trait)]
pub trait InferenceEngine: Send + Sync {
    /// @ai:intent Run one prompt against a model and return the raw result
    /// @ai:post result is either a bare prediction or `metrics|prediction`
    async fn infer(&self, prompt: &str, model_ref: &str) -> Result<String>;
}

/// @ai:intent Mock engine for tests and dry runs
pub struct MockInferenceEngine {
    responses: Vec<String>,
    next: AtomicUsize,
    failure: Option<String>,
}

impl MockInferenceEngine {
    /// @ai:intent Create a mock engine that always returns the same response
    /// @ai:effects pure
    pub fn new(response: impl Into<String>) -> Self {
        Self::scripted(vec![response.into()])
    }

    /// @ai:intent Create a mock engine cycling through responses in order
    /// @ai:effects pure
    pub fn scripted(responses: Vec<String>) -> Self {
        Self {
            responses,
            next: AtomicUsize::new(0),
            failure: None,
        }
    }

    /// @ai:intent Create a mock engine whose every call fails
    /// @ai:effects pure
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            responses: Vec::new(),
            next: AtomicUsize::new(0),
            failure: Some(message.into()),
        }
    }

    /// @ai:intent Number of calls served so far
    /// @ai:effects pure
    pub fn calls(&self) -> usize {
        self.next.load(Ordering::SeqCst)
    }
}

impl InferenceEngine for MockInferenceEngine {
    /// @ai:effects pure
    async fn infer(&self, _prompt: &str, _model_ref: &str) -> Result<String> {
        let index = self.next.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = &self.failure {
            anyhow::bail!("{}", message);
        }

        if self.responses.is_empty() {
            return Ok(String::new());
        }

        Ok(self.responses[index % self.responses.len()].clone())
    }
}

/// @ai:intent Engine that spawns a local CLI runtime per prompt
pub struct CommandInferenceEngine {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    ansi_escape: Regex,
}

impl CommandInferenceEngine {
    /// @ai:intent Build the engine from configuration
    /// @ai:effects pure
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let ansi_escape =
            Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]").context("Invalid ANSI escape pattern")?;

        Ok(Self {
            program: config.command.clone(),
            args: config.args.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            ansi_escape,
        })
    }

    /// @ai:intent Substitute `{model}` and `{prompt}` in the argument templates
    /// @ai:effects pure
    fn render_args(&self, prompt: &str, model_ref: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.replace("{model}", model_ref).replace("{prompt}", prompt))
            .collect()
    }
}

impl InferenceEngine for CommandInferenceEngine {
    /// @ai:effects process:spawn
    async fn infer(&self, prompt: &str, model_ref: &str) -> Result<String> {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(self.render_args(prompt, model_ref))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd
            .spawn()
            .with_context(|| format!("Failed to execute {}. Is it installed?", self.program))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .with_context(|| format!("{} timed out after {:?}", self.program, self.timeout))?
            .with_context(|| format!("Failed to wait for {}", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "{} exited with {:?}: {}",
                self.program,
                output.status.code(),
                stderr.trim()
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(self.ansi_escape.replace_all(&stdout, "").trim().to_string())
    }
}

/// @ai:intent llama.cpp server completion request body
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    prompt: &'a str,
    n_predict: u32,
    temperature: f32,
    cache_prompt: bool,
}

/// @ai:intent llama.cpp server completion response body
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    content: String,
    #[serde(default)]
    timings: Option<CompletionTimings>,
}

#[derive(Debug, Deserialize)]
struct CompletionTimings {
    prompt_ms: Option<f64>,
    prompt_per_second: Option<f64>,
    predicted_ms: Option<f64>,
    predicted_per_second: Option<f64>,
}

impl CompletionTimings {
    /// @ai:intent Map server timings onto the wire metrics
    /// @ai:post OET is prompt plus generation time
    /// @ai:effects pure
    fn to_metrics(&self) -> TimingMetrics {
        let round = |v: Option<f64>| v.filter(|x| x.is_finite()).map(|x| x.round() as i64);
        let defaults = TimingMetrics::default();

        TimingMetrics {
            ttft_ms: round(self.prompt_ms).unwrap_or(defaults.ttft_ms),
            itps: round(self.prompt_per_second).unwrap_or(defaults.itps),
            otps: round(self.predicted_per_second).unwrap_or(defaults.otps),
            oet_ms: match (self.prompt_ms, self.predicted_ms) {
                (Some(p), Some(g)) => round(Some(p + g)).unwrap_or(defaults.oet_ms),
                _ => defaults.oet_ms,
            },
        }
    }
}

/// @ai:intent Engine talking to a llama.cpp compatible HTTP server
pub struct HttpInferenceEngine {
    client: reqwest::Client,
    endpoint: String,
    max_tokens: u32,
}

impl HttpInferenceEngine {
    /// @ai:intent Build the engine from configuration
    /// @ai:effects pure
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            max_tokens: config.max_tokens,
        })
    }
}

impl InferenceEngine for HttpInferenceEngine {
    /// @ai:intent Send a completion request; the server hosts the model
    /// @ai:effects network
    async fn infer(&self, prompt: &str, _model_ref: &str) -> Result<String> {
        let request = CompletionRequest {
            prompt,
            n_predict: self.max_tokens,
            temperature: 0.0,
            cache_prompt: false,
        };

        let response = self
            .client
            .post(format!("{}/completion", self.endpoint))
            .json(&request)
            .send()
            .await
            .context("Failed to send request to inference server")?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Inference server error ({}): {}", status, error_text);
        }

        let body: CompletionResponse = response
            .json()
            .await
            .context("Failed to parse inference server response")?;

        let metrics = body
            .timings
            .as_ref()
            .map(CompletionTimings::to_metrics)
            .unwrap_or_default();

        Ok(ResultCodec::encode(body.content.trim(), &metrics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_engine_cycles_script() {
        let engine = MockInferenceEngine::scripted(vec!["milk".to_string(), "EMPTY".to_string()]);

        assert_eq!(engine.infer("p", "m").await.unwrap(), "milk");
        assert_eq!(engine.infer("p", "m").await.unwrap(), "EMPTY");
        assert_eq!(engine.infer("p", "m").await.unwrap(), "milk");
        assert_eq!(engine.calls(), 3);
    }

    #[tokio::test]
    async fn test_failing_mock_engine() {
        let engine = MockInferenceEngine::failing("model not loaded");
        let err = engine.infer("p", "m").await.unwrap_err();
        assert!(err.to_string().contains("model not loaded"));
    }

    #[test]
    fn test_command_args_are_templated() {
        let config = EngineConfig {
            args: vec!["-m".into(), "{model}".into(), "-p".into(), "{prompt}".into()],
            ..Default::default()
        };
        let engine = CommandInferenceEngine::new(&config).unwrap();

        assert_eq!(
            engine.render_args("list allergens", "/models/q.gguf"),
            vec!["-m", "/models/q.gguf", "-p", "list allergens"]
        );
    }

    #[test]
    fn test_ansi_escapes_are_stripped() {
        let engine = CommandInferenceEngine::new(&EngineConfig::default()).unwrap();
        let cleaned = engine.ansi_escape.replace_all("\x1b[32mmilk, egg\x1b[0m", "");
        assert_eq!(cleaned, "milk, egg");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_engine_runs_program() {
        let config = EngineConfig {
            command: "echo".to_string(),
            args: vec!["{prompt}".to_string()],
            timeout_secs: 5,
            ..Default::default()
        };
        let engine = CommandInferenceEngine::new(&config).unwrap();

        let raw = engine.infer("TTFT_MS=5|soy", "unused").await.unwrap();
        assert_eq!(raw, "TTFT_MS=5|soy");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_engine_reports_failure() {
        let config = EngineConfig {
            command: "false".to_string(),
            args: vec![],
            timeout_secs: 5,
            ..Default::default()
        };
        let engine = CommandInferenceEngine::new(&config).unwrap();
        assert!(engine.infer("p", "m").await.is_err());
    }

    #[test]
    fn test_server_timings_map_to_metrics() {
        let body: CompletionResponse = serde_json::from_str(
            r#"{"content":" milk ","timings":{"prompt_ms":120.4,"prompt_per_second":250.0,"predicted_ms":300.0,"predicted_per_second":18.6}}"#,
        )
        .unwrap();

        let metrics = body.timings.unwrap().to_metrics();
        assert_eq!(
            metrics,
            TimingMetrics {
                ttft_ms: 120,
                itps: 250,
                otps: 19,
                oet_ms: 420,
            }
        );
    }

    #[test]
    fn test_missing_server_timings_stay_unavailable() {
        let body: CompletionResponse = serde_json::from_str(r#"{"content":"egg"}"#).unwrap();
        assert!(body.timings.is_none());
    }
}
