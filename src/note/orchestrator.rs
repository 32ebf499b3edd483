//! Note orchestrator — drives the composer across the four SOAP sections in
//! fixed order, threading each step's output into the next step's context.
//!
//! All mutable run state (section storage, transcript) lives here and is
//! touched only from the orchestrator's own task; the generation service
//! reports back over a channel. Steps are strictly sequential: A needs the
//! S and O text, P needs the A text, so there is no parallelism to exploit.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::generation::{
    ChatMessage, GenerationError, GenerationService, GenerationUpdate, SamplingConfig,
};
use crate::patient::PatientInput;

use super::composer::compose;
use super::reasoning::extract_final_answer;
use super::section::{SectionLabel, SectionResult};
use super::transcript::Transcript;
use super::NoteError;

/// Fixed system message for every generation step.
pub const SYSTEM_PREAMBLE: &str = "You are a helpful clinician assistant";

struct StepOutcome {
    text: String,
    cancelled: bool,
}

/// Sequences section generation against a [`GenerationService`].
///
/// Only one run may be active at a time: starting a run while another is in
/// flight returns [`NoteError::Busy`] and leaves the active run untouched.
pub struct NoteOrchestrator {
    service: Arc<dyn GenerationService>,
    sampling: SamplingConfig,
    busy: tokio::sync::Mutex<()>,
}

impl NoteOrchestrator {
    pub fn new(service: Arc<dyn GenerationService>, sampling: SamplingConfig) -> Self {
        Self {
            service,
            sampling,
            busy: tokio::sync::Mutex::new(()),
        }
    }

    /// Generate a single section with a lean prompt (no prior context).
    ///
    /// Returns the extracted section text once generation completes or is
    /// cancelled (a cancelled step yields whatever was produced so far).
    pub async fn run_section(
        &self,
        label: SectionLabel,
        patient: &PatientInput,
        transcript_tx: &mpsc::UnboundedSender<String>,
        cancel: &CancellationToken,
    ) -> Result<String, NoteError> {
        let _guard = self.busy.try_lock().map_err(|_| NoteError::Busy)?;

        let mut transcript = Transcript::new();
        let prompt = compose(label, patient, &SectionResult::new());
        let outcome = self
            .generate_step(label, prompt, &mut transcript, transcript_tx, cancel)
            .await?;
        Ok(outcome.text)
    }

    /// Generate the full note: S, O, A, P in order, each step's extracted
    /// text stored in `sections` and fed to later prompts as context.
    ///
    /// On success returns the assembled final note. On failure or
    /// cancellation, `sections` keeps every step that completed, so the
    /// caller may assemble a partial note or retry manually.
    pub async fn run_full_note(
        &self,
        patient: &PatientInput,
        sections: &mut SectionResult,
        transcript_tx: &mpsc::UnboundedSender<String>,
        cancel: &CancellationToken,
    ) -> Result<String, NoteError> {
        let _guard = self.busy.try_lock().map_err(|_| NoteError::Busy)?;

        // A run starts from a clean slate; stale entries from an earlier
        // run must not leak into this run's prompts.
        *sections = SectionResult::new();

        let mut transcript = Transcript::new();
        for label in SectionLabel::ALL {
            if cancel.is_cancelled() {
                return Err(NoteError::Cancelled);
            }
            let prompt = compose(label, patient, sections);
            let outcome = self
                .generate_step(label, prompt, &mut transcript, transcript_tx, cancel)
                .await?;
            if outcome.cancelled {
                return Err(NoteError::Cancelled);
            }
            sections.store(label, outcome.text);
        }

        Ok(sections.assemble())
    }

    /// Run one generation step: submit the two-message transcript, apply
    /// streamed updates to the transcript, extract the final answer.
    async fn generate_step(
        &self,
        label: SectionLabel,
        prompt: String,
        transcript: &mut Transcript,
        transcript_tx: &mpsc::UnboundedSender<String>,
        cancel: &CancellationToken,
    ) -> Result<StepOutcome, NoteError> {
        tracing::info!(section = %label, "Generating section");
        transcript.begin_step(label);
        publish(transcript_tx, transcript);

        let chat = vec![
            ChatMessage::system(SYSTEM_PREAMBLE),
            ChatMessage::user(prompt),
        ];
        let (update_tx, mut update_rx) = mpsc::channel::<GenerationUpdate>(32);
        let service = Arc::clone(&self.service);
        let sampling = self.sampling.clone();
        let step_cancel = cancel.clone();
        let task =
            tokio::spawn(async move { service.generate(chat, sampling, update_tx, step_cancel).await });

        while let Some(update) = update_rx.recv().await {
            // Once cancelled, no further fragments are appended.
            if cancel.is_cancelled() {
                break;
            }
            if let Some(fragment) = update.fragment {
                transcript.append_fragment(&fragment);
            }
            if let Some(stats) = update.stats {
                tracing::debug!(section = %label, tokens_per_second = stats.tokens_per_second);
                transcript.set_stats(stats);
            }
            publish(transcript_tx, transcript);
        }
        drop(update_rx);

        let raw = match task.await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                tracing::warn!(section = %label, error = %e, "Generation step failed");
                transcript.fail_step(&format!("Failed: {e}"));
                publish(transcript_tx, transcript);
                return Err(NoteError::Generation { label, source: e });
            }
            Err(e) => {
                let source = GenerationError::Task(e.to_string());
                transcript.fail_step(&format!("Failed: {source}"));
                publish(transcript_tx, transcript);
                return Err(NoteError::Generation { label, source });
            }
        };

        let text = extract_final_answer(&raw).to_string();
        if cancel.is_cancelled() {
            return Ok(StepOutcome {
                text,
                cancelled: true,
            });
        }

        transcript.complete_step(&text);
        publish(transcript_tx, transcript);
        Ok(StepOutcome {
            text,
            cancelled: false,
        })
    }
}

fn publish(tx: &mpsc::UnboundedSender<String>, transcript: &Transcript) {
    // The display surface may be gone; the run itself does not care.
    let _ = tx.send(transcript.render());
}
