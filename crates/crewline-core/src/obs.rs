//! Structured observability hooks for pipeline lifecycle events.
//!
//! Events are emitted with an `event` field (`pipeline.started`,
//! `task.finished`, ...) so they can be filtered in JSON log output.

use tracing::{info, warn};

/// Run-scoped span; attach it to the run's future with
/// [`tracing::Instrument::instrument`] so every event is tagged with `run_id`.
pub fn run_span(run_id: &str) -> tracing::Span {
    tracing::info_span!("crewline.run", run_id = %run_id)
}

pub fn emit_pipeline_started(run_id: &str, task_count: usize, agent_count: usize) {
    info!(
        event = "pipeline.started",
        run_id = %run_id,
        tasks = task_count,
        agents = agent_count,
    );
}

pub fn emit_task_started(index: usize, role: &str, summary: &str) {
    info!(event = "task.started", index = index, role = %role, task = %summary);
}

pub fn emit_task_finished(index: usize, role: &str, duration_ms: u64, output_chars: usize) {
    info!(
        event = "task.finished",
        index = index,
        role = %role,
        duration_ms = duration_ms,
        output_chars = output_chars,
    );
}

/// Warn-level: the collaborator failed and the run is aborting.
pub fn emit_task_failed(index: usize, role: &str, error: &dyn std::fmt::Display) {
    warn!(event = "task.failed", index = index, role = %role, error = %error);
}

pub fn emit_pipeline_finished(run_id: &str, duration_ms: u64, success: bool) {
    info!(
        event = "pipeline.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        success = success,
    );
}

/// Warn-level: the result artifact could not be written.
pub fn emit_persist_error(path: &str, error: &dyn std::fmt::Display) {
    warn!(event = "sink.persist_error", path = %path, error = %error);
}

/// Warn-level: printing the result failed (closed pipe, full terminal).
pub fn emit_stdout_error(error: &dyn std::fmt::Display) {
    warn!(event = "sink.stdout_error", error = %error);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_span_in_scope() {
        let span = run_span("test-run-id");
        span.in_scope(|| emit_pipeline_started("test-run-id", 2, 2));
    }
}
