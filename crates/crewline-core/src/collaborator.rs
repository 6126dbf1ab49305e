//! The agent-execution boundary.
//!
//! A task hands one [`ExecutionRequest`] to an [`AgentExecutor`] and gets a
//! single text result back. How the executor reasons, calls capabilities or
//! remembers things is its own business.

use std::sync::Arc;

use async_trait::async_trait;

use crate::capability::Capability;
use crate::config::CrewSettings;
use crate::error::CollaboratorError;

/// Everything an executor needs to run one task on behalf of one agent.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionRequest<'a> {
    /// Rendered agent descriptor, see [`Agent::describe`](crate::agent::Agent::describe).
    pub agent_descriptor: &'a str,
    pub role: &'a str,
    pub task_description: &'a str,
    pub expected_output: &'a str,
    /// Results of earlier tasks, in declared order.
    pub context: &'a [String],
    pub capabilities: &'a [Arc<dyn Capability>],
    pub max_iterations: u32,
    pub allow_delegation: bool,
    pub memory_enabled: bool,
    /// Agent-level verbosity, or'd with the crew's.
    pub verbose: bool,
    /// Crew-wide memory, verbosity and embedder settings.
    pub crew: &'a CrewSettings,
}

impl ExecutionRequest<'_> {
    /// Render the user-facing task prompt.
    pub fn render_task_prompt(&self) -> String {
        let mut prompt = format!(
            "Current Task: {}\n\nThis is the expected criteria for your final answer: {}\n\
             You MUST return the actual complete content as the final answer, not a summary.",
            self.task_description.trim(),
            self.expected_output.trim()
        );

        if !self.context.is_empty() {
            prompt.push_str("\n\nThis is the context you're working with:\n");
            prompt.push_str(&self.context.join("\n\n"));
        }

        prompt.push_str("\n\nBegin! This is VERY important to you, use the tools available and give your best Final Answer, your job depends on it!");
        prompt
    }
}

/// Runs a single task for a single agent.
#[async_trait]
pub trait AgentExecutor: Send + Sync {
    async fn execute(
        &self,
        request: &ExecutionRequest<'_>,
    ) -> std::result::Result<String, CollaboratorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    static SETTINGS: CrewSettings = CrewSettings {
        memory: false,
        verbose: false,
        embedder: None,
    };

    fn request<'a>(context: &'a [String]) -> ExecutionRequest<'a> {
        ExecutionRequest {
            agent_descriptor: "You are a writer.",
            role: "writer",
            task_description: "  Write a post.  ",
            expected_output: "A blog post.",
            context,
            capabilities: &[],
            max_iterations: 3,
            allow_delegation: false,
            memory_enabled: false,
            verbose: false,
            crew: &SETTINGS,
        }
    }

    #[test]
    fn test_prompt_without_context_has_no_context_section() {
        let prompt = request(&[]).render_task_prompt();
        assert!(prompt.starts_with("Current Task: Write a post.\n"));
        assert!(prompt.contains("expected criteria for your final answer: A blog post."));
        assert!(!prompt.contains("context you're working with"));
    }

    #[test]
    fn test_prompt_joins_context_in_order() {
        let context = vec!["R1".to_string(), "R2".to_string()];
        let prompt = request(&context).render_task_prompt();
        assert!(prompt.contains("This is the context you're working with:\nR1\n\nR2"));
    }
}
