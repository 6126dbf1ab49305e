//! Sequential pipeline orchestration.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use sha2::Digest as _;
use tracing::Instrument;
use uuid::Uuid;

use crate::agent::Agent;
use crate::collaborator::AgentExecutor;
use crate::config::CrewSettings;
use crate::error::{CrewError, Result};
use crate::obs::{
    emit_pipeline_finished, emit_pipeline_started, emit_task_failed, emit_task_finished,
    emit_task_started, run_span,
};
use crate::task::{summarize, Task, TaskOutput};

/// How tasks are scheduled. Only sequential execution is supported.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProcessMode {
    #[default]
    Sequential,
}

/// Lifecycle of a pipeline: `Pending -> Running -> {Completed, Failed}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Pending,
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PipelineState::Pending => "pending",
            PipelineState::Running => "running",
            PipelineState::Completed => "completed",
            PipelineState::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// Result of a completed pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExecutionResult {
    pub run_id: Uuid,

    /// Output of the last task.
    pub primary: String,

    /// Every task's output, in execution order.
    pub outputs: Vec<TaskOutput>,

    /// Total duration in milliseconds.
    pub duration_ms: u64,
}

impl ExecutionResult {
    /// Task results in order, last one equal to [`ExecutionResult::primary`].
    pub fn audit_trail(&self) -> Vec<&str> {
        self.outputs.iter().map(|o| o.output.as_str()).collect()
    }

    /// SHA-256 hex digest of the primary text.
    pub fn primary_digest(&self) -> String {
        hex::encode(sha2::Sha256::digest(self.primary.as_bytes()))
    }
}

/// An ordered list of tasks over a set of agents, run at most once.
#[derive(Debug)]
pub struct Pipeline {
    agents: Vec<Arc<Agent>>,
    tasks: Vec<Task>,
    mode: ProcessMode,
    settings: CrewSettings,
    state: PipelineState,
}

impl Pipeline {
    /// Validate and assemble a pipeline.
    ///
    /// Every task must be bound to an agent from `agents` (compared by
    /// identity), there must be at least one task, and no agent may be
    /// listed twice.
    pub fn new(agents: Vec<Arc<Agent>>, tasks: Vec<Task>, mode: ProcessMode) -> Result<Self> {
        if tasks.is_empty() {
            return Err(CrewError::InvalidConfiguration(
                "pipeline must declare at least one task".to_string(),
            ));
        }

        for (i, agent) in agents.iter().enumerate() {
            if agents[..i].iter().any(|other| Arc::ptr_eq(other, agent)) {
                return Err(CrewError::InvalidConfiguration(format!(
                    "agent '{}' is listed more than once",
                    agent.role()
                )));
            }
        }

        for (index, task) in tasks.iter().enumerate() {
            let agent = task.agent().ok_or_else(|| CrewError::UnboundTask {
                description: summarize(task.description()),
            })?;
            if !agents.iter().any(|member| Arc::ptr_eq(member, agent)) {
                return Err(CrewError::InvalidConfiguration(format!(
                    "task {index} is bound to agent '{}' which is not part of the pipeline",
                    agent.role()
                )));
            }
            if task.is_executed() {
                return Err(CrewError::InvalidConfiguration(format!(
                    "task {index} has already been executed"
                )));
            }
        }

        Ok(Self {
            agents,
            tasks,
            mode,
            settings: CrewSettings::default(),
            state: PipelineState::Pending,
        })
    }

    /// Shorthand for [`Pipeline::new`] with [`ProcessMode::Sequential`].
    pub fn sequential(agents: Vec<Arc<Agent>>, tasks: Vec<Task>) -> Result<Self> {
        Self::new(agents, tasks, ProcessMode::Sequential)
    }

    /// Crew-wide settings forwarded with every task.
    pub fn with_settings(mut self, settings: CrewSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &CrewSettings {
        &self.settings
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn mode(&self) -> ProcessMode {
        self.mode
    }

    pub fn agents(&self) -> &[Arc<Agent>] {
        &self.agents
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Execute every task once, in declared order.
    ///
    /// Task `i` receives the results of tasks `0..i` as context. The first
    /// failure moves the pipeline to [`PipelineState::Failed`] and is returned
    /// as-is; later tasks never start. A pipeline runs at most once.
    pub async fn run(&mut self, executor: &dyn AgentExecutor) -> Result<ExecutionResult> {
        if self.state != PipelineState::Pending {
            return Err(CrewError::InvalidConfiguration(format!(
                "pipeline cannot run from state '{}'",
                self.state
            )));
        }
        self.state = PipelineState::Running;

        let start = Instant::now();
        let run_id = Uuid::new_v4();
        let run_id_str = run_id.to_string();
        let span = run_span(&run_id_str);
        let (task_count, agent_count) = (self.tasks.len(), self.agents.len());

        span.in_scope(|| emit_pipeline_started(&run_id_str, task_count, agent_count));
        let outcome = match self.mode {
            ProcessMode::Sequential => self.run_sequential(executor).instrument(span.clone()).await,
        };

        let _entered = span.enter();
        let duration_ms = start.elapsed().as_millis() as u64;
        match outcome {
            Ok(outputs) => {
                self.state = PipelineState::Completed;
                emit_pipeline_finished(&run_id_str, duration_ms, true);
                let primary = outputs
                    .last()
                    .map(|o| o.output.clone())
                    .unwrap_or_default();
                Ok(ExecutionResult {
                    run_id,
                    primary,
                    outputs,
                    duration_ms,
                })
            }
            Err(e) => {
                self.state = PipelineState::Failed;
                emit_pipeline_finished(&run_id_str, duration_ms, false);
                Err(e)
            }
        }
    }

    async fn run_sequential(&mut self, executor: &dyn AgentExecutor) -> Result<Vec<TaskOutput>> {
        let mut results: Vec<String> = Vec::with_capacity(self.tasks.len());
        let mut outputs = Vec::with_capacity(self.tasks.len());

        for (index, task) in self.tasks.iter_mut().enumerate() {
            let role = task
                .agent()
                .map(|a| a.role().to_string())
                .unwrap_or_default();
            emit_task_started(index, &role, &summarize(task.description()));

            let task_start = Instant::now();
            let output = match task.execute(index, executor, &results, &self.settings).await {
                Ok(output) => output,
                Err(e) => {
                    emit_task_failed(index, &role, &e);
                    return Err(e);
                }
            };
            let duration_ms = task_start.elapsed().as_millis() as u64;
            emit_task_finished(index, &role, duration_ms, output.chars().count());

            outputs.push(TaskOutput {
                index,
                role,
                description: task.description().to_string(),
                output: output.clone(),
                duration_ms,
            });
            results.push(output);
        }

        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentConfig;
    use crate::fakes::ScriptedExecutor;

    fn agent(role: &str) -> Arc<Agent> {
        Arc::new(Agent::new(AgentConfig::new(role, "do the work", "")).unwrap())
    }

    #[test]
    fn test_empty_pipeline_is_invalid() {
        let err = Pipeline::sequential(vec![agent("a")], vec![]).unwrap_err();
        assert!(matches!(err, CrewError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_task_agent_must_be_member() {
        let member = agent("member");
        let outsider = agent("member");
        let err = Pipeline::sequential(
            vec![member],
            vec![Task::for_agent(&outsider, "t", "o")],
        )
        .unwrap_err();
        match err {
            CrewError::InvalidConfiguration(msg) => assert!(msg.contains("not part of")),
            other => panic!("Expected InvalidConfiguration, got {:?}", other),
        }
    }

    #[test]
    fn test_unbound_task_rejected_at_construction() {
        let err = Pipeline::sequential(vec![agent("a")], vec![Task::new("t", "o")]).unwrap_err();
        assert!(matches!(err, CrewError::UnboundTask { .. }));
    }

    #[test]
    fn test_duplicate_agent_rejected() {
        let a = agent("a");
        let err = Pipeline::sequential(
            vec![a.clone(), a.clone()],
            vec![Task::for_agent(&a, "t", "o")],
        )
        .unwrap_err();
        assert!(matches!(err, CrewError::InvalidConfiguration(_)));
    }

    #[tokio::test]
    async fn test_pipeline_runs_once() {
        let a = agent("a");
        let mut pipeline =
            Pipeline::sequential(vec![a.clone()], vec![Task::for_agent(&a, "t", "o")]).unwrap();
        assert_eq!(pipeline.state(), PipelineState::Pending);

        let executor = ScriptedExecutor::replying(["done"]);
        let result = pipeline.run(&executor).await.unwrap();
        assert_eq!(result.primary, "done");
        assert_eq!(pipeline.state(), PipelineState::Completed);

        let err = pipeline.run(&executor).await.unwrap_err();
        assert!(matches!(err, CrewError::InvalidConfiguration(_)));
        assert_eq!(executor.call_count(), 1);
    }

    #[tokio::test]
    async fn test_settings_reach_every_task() {
        let a = agent("a");
        let tasks = vec![Task::for_agent(&a, "t1", "o"), Task::for_agent(&a, "t2", "o")];
        let settings = CrewSettings::default().with_memory(true);
        let mut pipeline = Pipeline::sequential(vec![a], tasks)
            .unwrap()
            .with_settings(settings.clone());

        let executor = ScriptedExecutor::new();
        pipeline.run(&executor).await.unwrap();

        assert_eq!(pipeline.settings(), &settings);
        assert!(executor.calls().iter().all(|call| call.crew == settings));
    }

    #[test]
    fn test_primary_digest_is_sha256_of_primary() {
        let result = ExecutionResult {
            run_id: Uuid::nil(),
            primary: "abc".to_string(),
            outputs: vec![],
            duration_ms: 0,
        };
        assert_eq!(
            result.primary_digest(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_process_mode_serializes_snake_case() {
        let json = serde_json::to_string(&ProcessMode::Sequential).unwrap();
        assert_eq!(json, "\"sequential\"");
        assert_eq!(PipelineState::Failed.to_string(), "failed");
    }
}
