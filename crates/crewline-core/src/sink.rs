//! Result sink: print the final result and persist it as plain text.
//!
//! Printing always happens before the write is attempted, so a failed write
//! never hides the result from the user.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::config::DEFAULT_OUTPUT_PATH;
use crate::error::{CrewError, Result};
use crate::obs::{emit_persist_error, emit_stdout_error};
use crate::pipeline::ExecutionResult;
use crate::task::TaskOutput;

const BANNER_WIDTH: usize = 50;
pub const AUDIT_SCHEMA_VERSION: &str = "1.0";

/// JSON audit record of a completed run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditArtifact {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub run_id: Uuid,
    pub primary_digest: String,
    pub duration_ms: u64,
    pub tasks: Vec<TaskOutput>,
}

impl AuditArtifact {
    pub fn from_result(result: &ExecutionResult) -> Self {
        Self {
            schema_version: AUDIT_SCHEMA_VERSION.to_string(),
            generated_at: Utc::now(),
            run_id: result.run_id,
            primary_digest: result.primary_digest(),
            duration_ms: result.duration_ms,
            tasks: result.outputs.clone(),
        }
    }
}

/// Prints and persists an [`ExecutionResult`].
#[derive(Debug, Clone)]
pub struct ResultSink {
    output_path: PathBuf,
    audit_path: Option<PathBuf>,
}

impl Default for ResultSink {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_PATH)
    }
}

impl ResultSink {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
            audit_path: None,
        }
    }

    /// Also write a JSON [`AuditArtifact`] to `path`.
    pub fn with_audit_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.audit_path = Some(path.into());
        self
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn audit_path(&self) -> Option<&Path> {
        self.audit_path.as_deref()
    }

    /// Print the banner and primary value to `out`, then write the artifacts.
    ///
    /// A failure to print is logged and does not stop the write. The report
    /// is overwritten on every call, so emitting the same result twice
    /// leaves identical content. Returns the report path.
    pub fn emit<W: Write>(&self, result: &ExecutionResult, out: &mut W) -> Result<PathBuf> {
        if let Err(e) = print_banner(result, out) {
            emit_stdout_error(&e);
        }

        self.write_report(result)?;
        if let Err(e) = writeln!(out, "\nReport saved to '{}'", self.output_path.display()) {
            emit_stdout_error(&e);
        }

        self.write_audit(result)?;
        Ok(self.output_path.clone())
    }

    /// Write the primary value (and the audit artifact when configured).
    pub fn persist(&self, result: &ExecutionResult) -> Result<()> {
        self.write_report(result)?;
        self.write_audit(result)
    }

    fn write_report(&self, result: &ExecutionResult) -> Result<()> {
        write_text(&self.output_path, &result.primary)?;
        info!(path = %self.output_path.display(), bytes = result.primary.len(), "report written");
        Ok(())
    }

    fn write_audit(&self, result: &ExecutionResult) -> Result<()> {
        let Some(audit_path) = &self.audit_path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(&AuditArtifact::from_result(result))?;
        write_text(audit_path, &json)?;
        info!(path = %audit_path.display(), "audit artifact written");
        Ok(())
    }
}

fn print_banner<W: Write>(result: &ExecutionResult, out: &mut W) -> std::io::Result<()> {
    let rule = "=".repeat(BANNER_WIDTH);
    writeln!(out, "\n{rule}")?;
    writeln!(out, "FINAL RESULT")?;
    writeln!(out, "{rule}")?;
    writeln!(out, "{}", result.primary)?;
    out.flush()
}

fn write_text(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).map_err(|source| {
        emit_persist_error(&path.display().to_string(), &source);
        CrewError::PersistenceFailed {
            path: path.to_path_buf(),
            source,
        }
    })
}
