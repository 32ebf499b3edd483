//! User-visible running transcript of a note run.
//!
//! While a step is in flight the transcript shows a placeholder line plus
//! whatever raw text has streamed so far; when the step completes, both are
//! replaced with the extracted section text. A failed step is shown as its
//! failure message. The orchestrator owns the transcript and publishes a
//! rendered snapshot after every change.

use crate::generation::PerfStats;

use super::section::SectionLabel;

#[derive(Debug, Clone)]
struct CurrentStep {
    label: SectionLabel,
    streamed: String,
}

/// Running transcript state for one run.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    completed: Vec<String>,
    current: Option<CurrentStep>,
    stats: Option<PerfStats>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a step as in flight. Replaces any previous in-flight step.
    pub fn begin_step(&mut self, label: SectionLabel) {
        self.current = Some(CurrentStep {
            label,
            streamed: String::new(),
        });
    }

    /// Append raw streamed text to the in-flight step. No-op when idle.
    pub fn append_fragment(&mut self, fragment: &str) {
        if let Some(current) = &mut self.current {
            current.streamed.push_str(fragment);
        }
    }

    /// Replace the in-flight placeholder with the step's final text.
    pub fn complete_step(&mut self, text: &str) {
        self.completed.push(text.to_string());
        self.current = None;
    }

    /// Replace the in-flight placeholder with a failure message.
    pub fn fail_step(&mut self, message: &str) {
        self.completed.push(message.to_string());
        self.current = None;
    }

    pub fn set_stats(&mut self, stats: PerfStats) {
        self.stats = Some(stats);
    }

    /// Latest reported generation throughput, if any.
    pub fn stats(&self) -> Option<PerfStats> {
        self.stats
    }

    /// Render the full transcript for display.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for text in &self.completed {
            out.push_str(text);
            out.push_str("\n\n");
        }
        match &self.current {
            Some(current) => {
                out.push_str(&format!("--- Generating {} ---\n", current.label));
                out.push_str(&current.streamed);
            }
            // Idle with stats reported: show the latest throughput.
            None => {
                if let Some(stats) = self.stats {
                    out.push_str(&format!("[{:.1} tokens/s]\n", stats.tokens_per_second));
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_shown_while_in_flight() {
        let mut transcript = Transcript::new();
        transcript.begin_step(SectionLabel::Subjective);
        assert!(transcript.render().contains("--- Generating S ---"));
    }

    #[test]
    fn fragments_appear_under_placeholder() {
        let mut transcript = Transcript::new();
        transcript.begin_step(SectionLabel::Objective);
        transcript.append_fragment("O: Avg");
        transcript.append_fragment(" HR 75 bpm.");
        let rendered = transcript.render();
        assert!(rendered.contains("--- Generating O ---\nO: Avg HR 75 bpm."));
    }

    #[test]
    fn completion_replaces_placeholder() {
        let mut transcript = Transcript::new();
        transcript.begin_step(SectionLabel::Subjective);
        transcript.append_fragment("raw thinking text");
        transcript.complete_step("S: Fatigue for two weeks.");

        let rendered = transcript.render();
        assert!(!rendered.contains("--- Generating"));
        assert!(!rendered.contains("raw thinking text"));
        assert_eq!(rendered, "S: Fatigue for two weeks.\n\n");
    }

    #[test]
    fn completed_steps_accumulate_in_order() {
        let mut transcript = Transcript::new();
        transcript.begin_step(SectionLabel::Subjective);
        transcript.complete_step("S: first");
        transcript.begin_step(SectionLabel::Objective);
        transcript.complete_step("O: second");
        transcript.begin_step(SectionLabel::Assessment);

        let rendered = transcript.render();
        assert_eq!(
            rendered,
            "S: first\n\nO: second\n\n--- Generating A ---\n"
        );
    }

    #[test]
    fn failure_message_replaces_placeholder() {
        let mut transcript = Transcript::new();
        transcript.begin_step(SectionLabel::Assessment);
        transcript.fail_step("Failed: backend returned HTTP 500");
        let rendered = transcript.render();
        assert!(rendered.contains("Failed: backend returned HTTP 500"));
        assert!(!rendered.contains("--- Generating"));
    }

    #[test]
    fn fragment_ignored_when_idle() {
        let mut transcript = Transcript::new();
        transcript.append_fragment("stray");
        assert_eq!(transcript.render(), "");
    }

    #[test]
    fn stats_line_rendered_only_when_idle() {
        let mut transcript = Transcript::new();
        transcript.begin_step(SectionLabel::Plan);
        transcript.set_stats(PerfStats {
            tokens_per_second: 37.5,
            eval_tokens: 900,
        });
        // In flight: raw stream only.
        assert!(!transcript.render().contains("tokens/s"));

        transcript.complete_step("P: 1. Order TSH.");
        let rendered = transcript.render();
        assert!(rendered.contains("[37.5 tokens/s]"));
        assert_eq!(transcript.stats().unwrap().eval_tokens, 900);
    }
}
