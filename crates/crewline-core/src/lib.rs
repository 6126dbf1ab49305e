//! crewline core library
//!
//! Sequential multi-agent task pipelines:
//! - [`agent`] / [`task`]: immutable agent configuration and write-once tasks
//! - [`pipeline`]: runs tasks in order, threading earlier results as context
//! - [`collaborator`]: the boundary to whatever actually performs a task
//! - [`llm`]: an OpenAI-compatible collaborator
//! - [`sink`]: prints and persists the final result

pub mod agent;
pub mod capability;
pub mod collaborator;
pub mod config;
pub mod crew;
pub mod error;
pub mod fakes;
pub mod llm;
pub mod obs;
pub mod pipeline;
pub mod sink;
pub mod task;
pub mod telemetry;

pub use agent::{Agent, AgentConfig, DEFAULT_MAX_ITERATIONS};
pub use capability::{Capability, CapabilitySet, ScrapeWebsiteCapability, WebSearchCapability};
pub use collaborator::{AgentExecutor, ExecutionRequest};
pub use config::{
    CrewConfig, CrewSettings, EmbedderConfig, LlmConfig, SearchConfig, DEFAULT_OUTPUT_PATH,
};
pub use crew::{research_crew, research_crew_with, research_settings};
pub use error::{CapabilityError, CollaboratorError, CrewError, Result};
pub use llm::OpenAiExecutor;
pub use pipeline::{ExecutionResult, Pipeline, PipelineState, ProcessMode};
pub use sink::{AuditArtifact, ResultSink};
pub use task::{Task, TaskOutput};
pub use telemetry::init_tracing;

/// crewline version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
