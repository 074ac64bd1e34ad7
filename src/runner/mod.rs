//! @ai:module:intent Inference engines and the benchmark orchestrator
//! @ai:module:layer infrastructure
//! @ai:module:public_api InferenceEngine, BenchmarkOrchestrator, MemorySampler, CancellationToken

pub mod engine;
pub mod executor;
pub mod memory;

pub use engine::{CommandInferenceEngine, HttpInferenceEngine, InferenceEngine, MockInferenceEngine};
pub use executor::{build_prompt, BenchmarkOrchestrator, CancellationToken, RunOutcome, RunState};
pub use memory::{MemorySampler, NullMemorySampler, SysinfoMemorySampler};
