use std::io::Write as _;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use soapdraft::config;
use soapdraft::generation::ollama::OllamaGenerator;
use soapdraft::generation::{GenerationError, SamplingConfig};
use soapdraft::note::{NoteError, NoteOrchestrator, SectionLabel, SectionResult};
use soapdraft::scenarios::Scenario;

/// Draft a SOAP note for a synthetic patient with a local Qwen3 model.
#[derive(Parser)]
#[command(name = "soapdraft", version)]
struct Args {
    /// Demo scenario: 1 (worried well), 2 (metabolic risk), 3 (stress/sleep).
    #[arg(long, default_value_t = 1)]
    scenario: u8,

    /// Generate a single section (S, O, A, or P) instead of the full note.
    #[arg(long)]
    section: Option<String>,

    /// Model tag on the local Ollama instance.
    #[arg(long, default_value = config::DEFAULT_MODEL)]
    model: String,

    /// Ollama endpoint. Defaults to OLLAMA_HOST or localhost:11434.
    #[arg(long)]
    base_url: Option<String>,

    /// Cap on generated tokens per section.
    #[arg(long, default_value_t = config::DEFAULT_MAX_TOKENS)]
    max_tokens: u32,

    /// Sampling temperature.
    #[arg(long, default_value_t = config::DEFAULT_TEMPERATURE)]
    temperature: f32,

    /// Disable visible reasoning before the final answer.
    #[arg(long)]
    no_thinking: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    let args = Args::parse();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let Some(scenario) = Scenario::from_index(args.scenario) else {
        eprintln!("Unknown scenario {} (expected 1-3)", args.scenario);
        return ExitCode::FAILURE;
    };
    let section = match args
        .section
        .as_deref()
        .map(SectionLabel::from_str)
        .transpose()
    {
        Ok(section) => section,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let base_url = args.base_url.unwrap_or_else(config::ollama_base_url);
    let generator = OllamaGenerator::new(&base_url, &args.model);
    if let Err(e) = generator.ensure_model().await {
        // Missing model assets are a fatal startup condition.
        match &e {
            GenerationError::ModelMissing(model) => eprintln!(
                "Fatal: model '{model}' is not available. Pull it first: ollama pull {model}"
            ),
            other => eprintln!("Fatal: cannot reach the generation backend: {other}"),
        }
        return ExitCode::FAILURE;
    }

    let sampling = SamplingConfig {
        max_tokens: args.max_tokens,
        temperature: args.temperature,
        enable_thinking: !args.no_thinking,
    };
    let orchestrator = NoteOrchestrator::new(Arc::new(generator), sampling);

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Cancellation requested");
                cancel.cancel();
            }
        });
    }

    let (tx, rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(print_snapshots(rx));

    println!("{scenario}");
    println!();

    let patient = scenario.patient_input();
    let outcome = match section {
        Some(label) => orchestrator.run_section(label, &patient, &tx, &cancel).await,
        None => {
            let mut sections = SectionResult::new();
            orchestrator
                .run_full_note(&patient, &mut sections, &tx, &cancel)
                .await
        }
    };
    drop(tx);
    let _ = printer.await;

    match outcome {
        Ok(text) => {
            let banner = if section.is_some() {
                "SECTION"
            } else {
                "FINAL NOTE"
            };
            println!("\n================ {banner} ================\n");
            println!("{text}");
            ExitCode::SUCCESS
        }
        Err(NoteError::Cancelled) => {
            println!("\nGeneration cancelled.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("\n{e}");
            ExitCode::FAILURE
        }
    }
}

/// What to print when the transcript snapshot advances from `prev` to `next`.
///
/// Snapshots are append-mostly while a step streams, so usually only the new
/// suffix is emitted. When a step completes, its placeholder region is
/// rewritten; the cleaned-up transcript is then re-rendered in full after a
/// paragraph break so the extracted section text stays visible in the
/// streamed view.
fn snapshot_delta(prev: &str, next: &str) -> String {
    match next.strip_prefix(prev) {
        Some(suffix) => suffix.to_string(),
        None => format!("\n\n{next}"),
    }
}

async fn print_snapshots(mut rx: mpsc::UnboundedReceiver<String>) {
    let mut prev = String::new();
    while let Some(next) = rx.recv().await {
        print!("{}", snapshot_delta(&prev, &next));
        let _ = std::io::stdout().flush();
        prev = next;
    }
    println!();
}
