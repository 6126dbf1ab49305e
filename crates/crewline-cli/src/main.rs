//! crewline - run the bundled research crew
//!
//! Runs a researcher and a writer as a two-task sequential pipeline, prints
//! the final blog post and saves it to a markdown file.
//!
//! Exit codes: 0 on success, 1 when the crew fails, 2 when the report could
//! not be saved (the result is still printed).

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::Level;

use crewline_core::config::{MODEL_VAR, OPENAI_BASE_URL_VAR, OUTPUT_VAR};
use crewline_core::{
    init_tracing, research_crew, CrewConfig, CrewError, ExecutionResult, OpenAiExecutor,
    ResultSink,
};

const EXIT_CREW_FAILED: u8 = 1;
const EXIT_PERSIST_FAILED: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "crewline")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run a researcher + writer crew and save the resulting report", long_about = None)]
struct Cli {
    /// Where to write the final report
    #[arg(short, long, env = OUTPUT_VAR)]
    output: Option<PathBuf>,

    /// Also write a JSON audit trail of every task's output
    #[arg(long, env = "CREWLINE_AUDIT_JSON")]
    audit_json: Option<PathBuf>,

    /// Chat model to use
    #[arg(long, env = MODEL_VAR)]
    model: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, env = OPENAI_BASE_URL_VAR)]
    base_url: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

impl Cli {
    /// Layer command-line overrides on top of environment configuration.
    fn apply(self, mut config: CrewConfig) -> CrewConfig {
        if let Some(output) = self.output {
            config.output_path = output;
        }
        if let Some(model) = self.model {
            config.llm = config.llm.with_model(model);
        }
        if let Some(url) = self.base_url {
            config.llm = config.llm.with_base_url(url);
        }
        config.audit_path = self.audit_json.or(config.audit_path);
        config
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    init_tracing(cli.json, level);

    let config = cli.apply(CrewConfig::from_env());

    println!("Starting crew execution...");
    let outcome = run_crew(&config).await;

    let mut sink = ResultSink::new(&config.output_path);
    if let Some(audit) = &config.audit_path {
        sink = sink.with_audit_path(audit);
    }

    let mut stdout = std::io::stdout().lock();
    ExitCode::from(finish(outcome, &sink, &mut stdout))
}

/// Print and persist the crew's outcome, returning the process exit code.
///
/// Nothing is written when the crew failed.
fn finish<W: Write>(outcome: Result<ExecutionResult>, sink: &ResultSink, out: &mut W) -> u8 {
    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            print_failure(&e, out).ok();
            return EXIT_CREW_FAILED;
        }
    };

    match sink.emit(&result, out) {
        Ok(_) => 0,
        Err(e) => {
            print_persist_error(&e, sink, out).ok();
            EXIT_PERSIST_FAILED
        }
    }
}

async fn run_crew(config: &CrewConfig) -> Result<ExecutionResult> {
    let mut pipeline =
        research_crew(&config.search).context("Failed to configure the research crew")?;
    let executor = OpenAiExecutor::new(config.llm.clone());
    tracing::info!(model = %executor.model(), tasks = pipeline.tasks().len(), "running crew");

    pipeline
        .run(&executor)
        .await
        .context("Crew execution failed")
}

fn print_failure<W: Write>(err: &anyhow::Error, out: &mut W) -> std::io::Result<()> {
    writeln!(out, "Error during execution: {err:#}")?;
    writeln!(out, "Make sure you have:")?;
    writeln!(out, "   - Set up your API keys (OPENAI_API_KEY, SERPER_API_KEY)")?;
    writeln!(out, "   - Network access to the configured LLM endpoint")
}

fn print_persist_error<W: Write>(
    err: &CrewError,
    sink: &ResultSink,
    out: &mut W,
) -> std::io::Result<()> {
    match err {
        CrewError::PersistenceFailed { path, source }
            if sink.audit_path() == Some(path.as_path()) =>
        {
            writeln!(out, "\nError saving audit trail to '{}': {source}", path.display())?;
            writeln!(out, "The report itself was saved to '{}'", sink.output_path().display())
        }
        other => writeln!(out, "\nError saving report: {other}"),
    }
}
