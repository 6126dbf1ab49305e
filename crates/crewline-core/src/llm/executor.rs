//! Drives one task through an OpenAI-compatible chat endpoint.
//!
//! The agent descriptor becomes the system prompt and the rendered task the
//! user prompt. Capabilities are offered as function tools; each model turn
//! either answers (done) or asks for tool calls, whose results are fed back.
//! The turn budget is the agent's `max_iterations`; the last turn is sent
//! without tools so the model has to answer.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::collaborator::{AgentExecutor, ExecutionRequest};
use crate::config::LlmConfig;
use crate::error::CollaboratorError;
use crate::llm::{
    tool_definition, ChatMessage, ChatRequest, ChatTransport, HttpChatTransport, ToolCall,
};

/// [`AgentExecutor`] backed by a [`ChatTransport`].
pub struct OpenAiExecutor<T: ChatTransport = HttpChatTransport> {
    transport: T,
    model: String,
    temperature: f32,
}

impl OpenAiExecutor<HttpChatTransport> {
    pub fn new(config: LlmConfig) -> Self {
        let model = config.model.clone();
        let temperature = config.temperature;
        Self::with_transport(HttpChatTransport::new(config), model, temperature)
    }
}

impl<T: ChatTransport> OpenAiExecutor<T> {
    pub fn with_transport(transport: T, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            transport,
            model: model.into(),
            temperature,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn dispatch(&self, request: &ExecutionRequest<'_>, call: &ToolCall) -> String {
        let name = call.function.name.as_str();
        let Some(capability) = request.capabilities.iter().find(|c| c.name() == name) else {
            warn!(role = %request.role, tool = %name, "model requested unknown tool");
            return format!("Error: unknown tool '{name}'");
        };

        let input = call.function.input();
        debug!(role = %request.role, tool = %name, "invoking capability");
        match capability.invoke(&input).await {
            Ok(output) => output,
            Err(e) => {
                warn!(role = %request.role, tool = %name, error = %e, "capability failed");
                format!("Error: {e}")
            }
        }
    }
}

/// Agent progress: `info` when the agent or crew is verbose, `debug` otherwise.
fn log_step(request: &ExecutionRequest<'_>, turn: u32, step: &str) {
    if request.verbose {
        info!(role = %request.role, turn, step, "agent step");
    } else {
        debug!(role = %request.role, turn, step, "agent step");
    }
}

#[async_trait]
impl<T: ChatTransport> AgentExecutor for OpenAiExecutor<T> {
    async fn execute(
        &self,
        request: &ExecutionRequest<'_>,
    ) -> Result<String, CollaboratorError> {
        let crew = request.crew;
        if request.memory_enabled || request.allow_delegation || crew.memory {
            debug!(
                role = %request.role,
                memory = request.memory_enabled,
                crew_memory = crew.memory,
                embedder = ?crew.embedder.as_ref().map(|e| e.model.as_str()),
                delegation = request.allow_delegation,
                "memory and delegation flags are not acted on by this executor"
            );
        }

        let tools: Vec<_> = request
            .capabilities
            .iter()
            .map(|c| tool_definition(&**c))
            .collect();

        let mut messages = vec![
            ChatMessage::system(request.agent_descriptor),
            ChatMessage::user(request.render_task_prompt()),
        ];

        for turn in 1..=request.max_iterations {
            let last_turn = turn == request.max_iterations;
            let chat = ChatRequest {
                model: self.model.clone(),
                messages: messages.clone(),
                temperature: self.temperature,
                tools: if last_turn { Vec::new() } else { tools.clone() },
            };

            let message = self.transport.complete(&chat).await?.into_message()?;
            let calls = message.tool_calls.clone().unwrap_or_default();

            if calls.is_empty() {
                let answer = message.content.unwrap_or_default();
                if answer.trim().is_empty() {
                    return Err(CollaboratorError::MalformedResponse(
                        "model returned an empty answer".to_string(),
                    ));
                }
                log_step(request, turn, "final answer received");
                return Ok(answer);
            }

            if last_turn {
                break;
            }

            log_step(request, turn, "tool calls requested");
            messages.push(ChatMessage::assistant_tool_calls(message.content, calls.clone()));
            for call in &calls {
                let output = self.dispatch(request, call).await;
                messages.push(ChatMessage::tool_result(call.id.clone(), output));
            }
        }

        Err(CollaboratorError::IterationLimit {
            max_iterations: request.max_iterations,
        })
    }
}
