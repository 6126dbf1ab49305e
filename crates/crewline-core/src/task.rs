//! Tasks: one unit of delegated work bound to one agent.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::agent::Agent;
use crate::collaborator::{AgentExecutor, ExecutionRequest};
use crate::config::CrewSettings;
use crate::error::{CollaboratorError, CrewError, Result};

/// A description, an expected-output contract and a write-once result slot.
#[derive(Debug)]
pub struct Task {
    description: String,
    expected_output: String,
    agent: Option<Arc<Agent>>,
    result: Option<String>,
}

impl Task {
    /// Create an unbound task. Bind it with [`Task::bind`] before running.
    pub fn new(description: impl Into<String>, expected_output: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            expected_output: expected_output.into(),
            agent: None,
            result: None,
        }
    }

    /// Create a task already bound to `agent`.
    pub fn for_agent(
        agent: &Arc<Agent>,
        description: impl Into<String>,
        expected_output: impl Into<String>,
    ) -> Self {
        Self::new(description, expected_output).bind(agent)
    }

    pub fn bind(mut self, agent: &Arc<Agent>) -> Self {
        self.agent = Some(Arc::clone(agent));
        self
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn expected_output(&self) -> &str {
        &self.expected_output
    }

    pub fn agent(&self) -> Option<&Arc<Agent>> {
        self.agent.as_ref()
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn is_executed(&self) -> bool {
        self.result.is_some()
    }

    /// Run the task through `executor` with the results of earlier tasks as
    /// `context`, and store the returned text. `crew` is forwarded untouched.
    ///
    /// `index` is the task's position in its pipeline and only labels errors.
    /// The result slot is written once; executing a finished task is an
    /// [`CrewError::InvalidConfiguration`] and leaves the stored result alone.
    pub async fn execute(
        &mut self,
        index: usize,
        executor: &dyn AgentExecutor,
        context: &[String],
        crew: &CrewSettings,
    ) -> Result<String> {
        if self.result.is_some() {
            return Err(CrewError::InvalidConfiguration(format!(
                "task {index} has already been executed"
            )));
        }
        let agent = self.agent.as_ref().ok_or_else(|| CrewError::UnboundTask {
            description: summarize(&self.description),
        })?;

        let descriptor = agent.describe();
        let request = ExecutionRequest {
            agent_descriptor: &descriptor,
            role: agent.role(),
            task_description: &self.description,
            expected_output: &self.expected_output,
            context,
            capabilities: agent.capabilities(),
            max_iterations: agent.max_iterations(),
            allow_delegation: agent.allows_delegation(),
            memory_enabled: agent.memory_enabled(),
            verbose: agent.is_verbose() || crew.verbose,
            crew,
        };

        let output = executor
            .execute(&request)
            .await
            .map_err(|cause: CollaboratorError| CrewError::ExecutionFailed {
                task_index: index,
                role: agent.role().to_string(),
                cause,
            })?;

        self.result = Some(output.clone());
        Ok(output)
    }
}

/// Output of one executed task, kept in the run's audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskOutput {
    pub index: usize,
    pub role: String,
    pub description: String,
    pub output: String,
    pub duration_ms: u64,
}

/// First line of a description, capped for log and error messages.
pub(crate) fn summarize(description: &str) -> String {
    let first = description.trim().lines().next().unwrap_or("").trim();
    match first.char_indices().nth(60) {
        Some((cut, _)) => format!("{}...", &first[..cut]),
        None => first.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentConfig;
    use crate::config::EmbedderConfig;
    use crate::fakes::ScriptedExecutor;

    fn quiet() -> CrewSettings {
        CrewSettings::default()
    }

    fn writer() -> Arc<Agent> {
        Arc::new(
            Agent::new(AgentConfig::new("writer", "write well", "").with_max_iterations(3))
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_unbound_task_fails() {
        let executor = ScriptedExecutor::replying(["unused"]);
        let mut task = Task::new("Write a post", "A post");
        let err = task.execute(0, &executor, &[], &quiet()).await.unwrap_err();
        assert!(matches!(err, CrewError::UnboundTask { .. }));
        assert_eq!(executor.call_count(), 0);
        assert!(task.result().is_none());
    }

    #[tokio::test]
    async fn test_execute_stores_result_and_forwards_request() {
        let executor = ScriptedExecutor::replying(["post"]);
        let agent = writer();
        let mut task = Task::for_agent(&agent, "Write a post", "A post");
        let context = vec!["research".to_string()];

        let output = task.execute(1, &executor, &context, &quiet()).await.unwrap();

        assert_eq!(output, "post");
        assert_eq!(task.result(), Some("post"));
        let calls = executor.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].role, "writer");
        assert_eq!(calls[0].context, context);
        assert_eq!(calls[0].max_iterations, 3);
    }

    #[tokio::test]
    async fn test_crew_settings_are_forwarded() {
        let executor = ScriptedExecutor::new();
        let mut task = Task::for_agent(&writer(), "Write a post", "A post");
        let crew = CrewSettings::default()
            .with_memory(true)
            .verbose(true)
            .with_embedder(EmbedderConfig::default());

        task.execute(0, &executor, &[], &crew).await.unwrap();

        let call = &executor.calls()[0];
        assert!(call.verbose, "crew verbosity applies to quiet agents");
        assert_eq!(call.crew, crew);
    }

    #[tokio::test]
    async fn test_result_is_never_overwritten() {
        let executor = ScriptedExecutor::replying(["first", "second"]);
        let mut task = Task::for_agent(&writer(), "Write a post", "A post");
        task.execute(0, &executor, &[], &quiet()).await.unwrap();

        let err = task.execute(0, &executor, &[], &quiet()).await.unwrap_err();
        assert!(matches!(err, CrewError::InvalidConfiguration(_)));
        assert_eq!(task.result(), Some("first"));
        assert_eq!(executor.call_count(), 1);
    }

    #[tokio::test]
    async fn test_collaborator_failure_becomes_execution_failed() {
        let executor = ScriptedExecutor::failing_at(0);
        let mut task = Task::for_agent(&writer(), "Write a post", "A post");
        let err = task.execute(4, &executor, &[], &quiet()).await.unwrap_err();
        match err {
            CrewError::ExecutionFailed {
                task_index, role, ..
            } => {
                assert_eq!(task_index, 4);
                assert_eq!(role, "writer");
            }
            other => panic!("Expected ExecutionFailed, got {:?}", other),
        }
        assert!(!task.is_executed());
    }

    #[test]
    fn test_summarize_takes_first_line() {
        assert_eq!(summarize("  Analyze things.\n More detail"), "Analyze things.");
        let long = "x".repeat(80);
        assert_eq!(summarize(&long), format!("{}...", "x".repeat(60)));
    }
}
