//! In-memory fakes for the collaborator and capability traits (testing only).
//!
//! `ScriptedExecutor` returns canned replies and records every request it
//! sees; `EchoCapability` returns its input unchanged.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::capability::Capability;
use crate::collaborator::{AgentExecutor, ExecutionRequest};
use crate::config::CrewSettings;
use crate::error::{CapabilityError, CollaboratorError};

/// Owned copy of an [`ExecutionRequest`] as seen by a fake executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub role: String,
    pub agent_descriptor: String,
    pub task_description: String,
    pub expected_output: String,
    pub context: Vec<String>,
    pub capability_names: Vec<String>,
    pub max_iterations: u32,
    pub allow_delegation: bool,
    pub memory_enabled: bool,
    pub verbose: bool,
    pub crew: CrewSettings,
}

impl From<&ExecutionRequest<'_>> for RecordedCall {
    fn from(request: &ExecutionRequest<'_>) -> Self {
        Self {
            role: request.role.to_string(),
            agent_descriptor: request.agent_descriptor.to_string(),
            task_description: request.task_description.to_string(),
            expected_output: request.expected_output.to_string(),
            context: request.context.to_vec(),
            capability_names: request
                .capabilities
                .iter()
                .map(|c| c.name().to_string())
                .collect(),
            max_iterations: request.max_iterations,
            allow_delegation: request.allow_delegation,
            memory_enabled: request.memory_enabled,
            verbose: request.verbose,
            crew: request.crew.clone(),
        }
    }
}

/// Executor that replays scripted replies in call order.
///
/// Calls past the end of the script reply with `"output-{n}"`.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    replies: Vec<String>,
    fail_at: Option<usize>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replying<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: replies.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// An executor whose `call`-th invocation (zero-based) fails.
    pub fn failing_at(call: usize) -> Self {
        Self::new().fail_at(call)
    }

    pub fn fail_at(mut self, call: usize) -> Self {
        self.fail_at = Some(call);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl AgentExecutor for ScriptedExecutor {
    async fn execute(
        &self,
        request: &ExecutionRequest<'_>,
    ) -> std::result::Result<String, CollaboratorError> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(RecordedCall::from(request));
            calls.len() - 1
        };

        if self.fail_at == Some(index) {
            return Err(CollaboratorError::Http(format!(
                "scripted failure on call {index}"
            )));
        }

        Ok(self
            .replies
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("output-{index}")))
    }
}

/// Capability that returns its input unchanged.
#[derive(Debug, Clone)]
pub struct EchoCapability {
    name: String,
}

impl EchoCapability {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Capability for EchoCapability {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Returns its input unchanged."
    }

    async fn invoke(&self, input: &str) -> std::result::Result<String, CapabilityError> {
        Ok(input.to_string())
    }
}
