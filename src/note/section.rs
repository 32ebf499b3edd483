//! SOAP section labels and per-run section storage.

use std::fmt;
use std::str::FromStr;

/// Placeholder text for a section that was never generated.
pub const MISSING_SECTION_PLACEHOLDER: &str = "Data not generated.";

/// The four SOAP sections, in their fixed generation order.
///
/// Order is significant: S and O are generated before A, and A before P,
/// because later sections consume earlier ones as prompt context. The closed
/// enum makes labels outside the set unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionLabel {
    Subjective,
    Objective,
    Assessment,
    Plan,
}

impl SectionLabel {
    /// All four labels in generation order.
    pub const ALL: [SectionLabel; 4] = [
        SectionLabel::Subjective,
        SectionLabel::Objective,
        SectionLabel::Assessment,
        SectionLabel::Plan,
    ];

    /// The single-letter label used in prompts and output markers.
    pub fn letter(&self) -> &'static str {
        match self {
            Self::Subjective => "S",
            Self::Objective => "O",
            Self::Assessment => "A",
            Self::Plan => "P",
        }
    }

    /// The full section name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Subjective => "Subjective",
            Self::Objective => "Objective",
            Self::Assessment => "Assessment",
            Self::Plan => "Plan",
        }
    }

    /// The literal marker the model is instructed to start its output with.
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Subjective => "S:",
            Self::Objective => "O:",
            Self::Assessment => "A:",
            Self::Plan => "P:",
        }
    }

    /// Whether this section's prompt carries previously generated sections.
    /// S and O always use a lean prompt; only A and P see prior context.
    pub fn uses_prior_context(&self) -> bool {
        matches!(self, Self::Assessment | Self::Plan)
    }

    fn index(&self) -> usize {
        match self {
            Self::Subjective => 0,
            Self::Objective => 1,
            Self::Assessment => 2,
            Self::Plan => 3,
        }
    }
}

impl fmt::Display for SectionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl FromStr for SectionLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s" | "subjective" => Ok(Self::Subjective),
            "o" | "objective" => Ok(Self::Objective),
            "a" | "assessment" => Ok(Self::Assessment),
            "p" | "plan" => Ok(Self::Plan),
            other => Err(format!(
                "unknown section label '{other}' (expected S, O, A, or P)"
            )),
        }
    }
}

/// Generated section texts for one note run.
///
/// A slot is written when its step completes and overwritten if the same
/// label is re-requested before assembly. Slots never hold anything but the
/// four SOAP sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionResult {
    slots: [Option<String>; 4],
}

impl SectionResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a section's extracted text, overwriting any previous entry.
    pub fn store(&mut self, label: SectionLabel, text: impl Into<String>) {
        self.slots[label.index()] = Some(text.into());
    }

    pub fn get(&self, label: SectionLabel) -> Option<&str> {
        self.slots[label.index()].as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Filled sections as `L: text` lines in SOAP order, for the
    /// "previously generated" prompt block.
    pub fn render_context(&self) -> String {
        SectionLabel::ALL
            .iter()
            .filter_map(|label| {
                self.get(*label)
                    .map(|text| format!("{}: {text}", label.letter()))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Assemble the final note: S, O, A, P each on its own paragraph,
    /// with a labeled placeholder for any section that was never stored.
    pub fn assemble(&self) -> String {
        SectionLabel::ALL
            .iter()
            .map(|label| match self.get(*label) {
                Some(text) => text.to_string(),
                None => format!("{} {MISSING_SECTION_PLACEHOLDER}", label.marker()),
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
