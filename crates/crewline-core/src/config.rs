//! Explicit configuration for the collaborator and capabilities.
//!
//! Credentials are read from the environment once, at process start, by
//! [`CrewConfig::from_env`]. Everything downstream receives plain values so
//! tests can inject fakes without touching the process environment.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const OPENAI_BASE_URL_VAR: &str = "OPENAI_BASE_URL";
pub const MODEL_VAR: &str = "CREWLINE_MODEL";
pub const SERPER_API_KEY_VAR: &str = "SERPER_API_KEY";
pub const OUTPUT_VAR: &str = "CREWLINE_OUTPUT";

/// Default artifact written by the result sink.
pub const DEFAULT_OUTPUT_PATH: &str = "ai_advancements_report.md";

/// Settings for the OpenAI-compatible chat endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            request_timeout_secs: 300,
        }
    }
}

impl LlmConfig {
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Settings for the web search capability.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://google.serper.dev".to_string(),
        }
    }
}

/// Embedding model for the executor's memory. Opaque to crewline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmbedderConfig {
    pub provider: String,
    pub model: String,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
        }
    }
}

/// Crew-wide flags handed to the executor alongside every task.
///
/// Nothing in the pipeline acts on them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CrewSettings {
    pub memory: bool,
    pub verbose: bool,
    pub embedder: Option<EmbedderConfig>,
}

impl CrewSettings {
    pub fn with_memory(mut self, memory: bool) -> Self {
        self.memory = memory;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_embedder(mut self, embedder: EmbedderConfig) -> Self {
        self.embedder = Some(embedder);
        self
    }
}

/// Process-wide configuration, built once and passed down explicitly.
#[derive(Debug, Clone, Default)]
pub struct CrewConfig {
    pub llm: LlmConfig,
    pub search: SearchConfig,
    pub output_path: PathBuf,
    pub audit_path: Option<PathBuf>,
}

impl CrewConfig {
    /// Build configuration from the process environment.
    ///
    /// Missing credentials are not an error here; the collaborator reports
    /// them when a task first needs them.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mut llm = LlmConfig {
            api_key: non_empty(OPENAI_API_KEY_VAR),
            ..LlmConfig::default()
        };
        if let Some(url) = non_empty(OPENAI_BASE_URL_VAR) {
            llm = llm.with_base_url(url);
        }
        if let Some(model) = non_empty(MODEL_VAR) {
            llm.model = model;
        }

        let search = SearchConfig {
            api_key: non_empty(SERPER_API_KEY_VAR),
            ..SearchConfig::default()
        };

        let output_path = non_empty(OUTPUT_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH));

        Self {
            llm,
            search,
            output_path,
            audit_path: None,
        }
    }
}
