//! SOAP note drafting — prompt composition and the four-step,
//! context-chaining orchestration over a generation service.

pub mod composer;
pub mod orchestrator;
pub mod reasoning;
pub mod section;
pub mod transcript;

pub use composer::compose;
pub use orchestrator::NoteOrchestrator;
pub use reasoning::extract_final_answer;
pub use section::{SectionLabel, SectionResult, MISSING_SECTION_PLACEHOLDER};
pub use transcript::Transcript;

use crate::generation::GenerationError;

/// Errors from note runs.
///
/// Cancellation is a cooperative stop, not a failure — callers distinguish
/// it from `Generation` to decide whether anything went wrong.
#[derive(Debug, thiserror::Error)]
pub enum NoteError {
    /// A run is already in flight; the new request is dropped, not queued.
    #[error("a generation is already running")]
    Busy,

    /// The run was cancelled before completing.
    #[error("generation cancelled")]
    Cancelled,

    /// The generation service failed during a step; the run stops there.
    #[error("generation failed for section {label}: {source}")]
    Generation {
        label: SectionLabel,
        #[source]
        source: GenerationError,
    },
}
