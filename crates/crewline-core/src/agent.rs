//! Agent configuration: role, goal, backstory and the capabilities an agent
//! may use. Agents are immutable once built.

use std::sync::Arc;

use crate::capability::Capability;
use crate::error::{CrewError, Result};

/// Iteration budget used when a config does not set one.
pub const DEFAULT_MAX_ITERATIONS: u32 = 25;

/// Builder-style configuration for an [`Agent`].
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub role: String,
    pub goal: String,
    pub backstory: String,
    pub capabilities: Vec<Arc<dyn Capability>>,
    pub max_iterations: u32,
    pub allow_delegation: bool,
    pub memory_enabled: bool,
    pub verbose: bool,
}

impl AgentConfig {
    pub fn new(
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
            capabilities: Vec::new(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            allow_delegation: false,
            memory_enabled: false,
            verbose: false,
        }
    }

    pub fn with_capability(mut self, capability: Arc<dyn Capability>) -> Self {
        self.capabilities.push(capability);
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn allow_delegation(mut self, allow: bool) -> Self {
        self.allow_delegation = allow;
        self
    }

    pub fn with_memory(mut self, enabled: bool) -> Self {
        self.memory_enabled = enabled;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// A role-playing reasoning entity, as seen by the pipeline.
#[derive(Debug)]
pub struct Agent {
    role: String,
    goal: String,
    backstory: String,
    capabilities: Vec<Arc<dyn Capability>>,
    max_iterations: u32,
    allow_delegation: bool,
    memory_enabled: bool,
    verbose: bool,
}

impl Agent {
    /// Build the agent. The only invalid configuration is a zero
    /// `max_iterations`, reported as [`CrewError::InvalidConfiguration`].
    ///
    /// Capabilities are kept in the order given; name uniqueness is the
    /// job of [`CapabilitySet`](crate::capability::CapabilitySet).
    pub fn new(config: AgentConfig) -> Result<Self> {
        if config.max_iterations < 1 {
            return Err(CrewError::InvalidConfiguration(format!(
                "agent '{}': max_iterations must be at least 1",
                config.role
            )));
        }

        Ok(Self {
            role: config.role.trim().to_string(),
            goal: config.goal.trim().to_string(),
            backstory: normalize_whitespace(&config.backstory),
            capabilities: config.capabilities,
            max_iterations: config.max_iterations,
            allow_delegation: config.allow_delegation,
            memory_enabled: config.memory_enabled,
            verbose: config.verbose,
        })
    }

    /// Render role, backstory and goal as the system prompt for the
    /// reasoning collaborator.
    pub fn describe(&self) -> String {
        let mut out = format!("You are {}.\n", self.role);
        if !self.backstory.is_empty() {
            out.push_str(&self.backstory);
            out.push('\n');
        }
        out.push_str(&format!("\nYour personal goal is: {}", self.goal));
        out
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn backstory(&self) -> &str {
        &self.backstory
    }

    pub fn capabilities(&self) -> &[Arc<dyn Capability>] {
        &self.capabilities
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    pub fn allows_delegation(&self) -> bool {
        self.allow_delegation
    }

    pub fn memory_enabled(&self) -> bool {
        self.memory_enabled
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Join trimmed, non-empty lines with single spaces.
fn normalize_whitespace(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
