//! Prompt composition — pure mapping from (label, patient, prior sections)
//! to a complete generation prompt.
//!
//! The prompt has four blocks in fixed order: role preamble, patient data,
//! prior-section context (A and P only), and the label-specific instruction.
//! S and O always get the lean shape with no context block, so a section's
//! prompt can never reference a later, not-yet-generated section.

use crate::patient::PatientInput;

use super::section::{SectionLabel, SectionResult};

/// Fixed role preamble describing the assistant's task and domain.
pub const SYSTEM_ROLE: &str = "\
### Your Role and Goal
You are an AI assistant for primary care physicians. Your task is to process \
pre-visit information from a patient's questionnaire and their HealthKit data \
to generate a concise DRAFT SOAP note for an INITIAL CONSULTATION.";

/// Heading introducing previously generated sections in A and P prompts.
pub const CONTEXT_HEADING: &str = "### Previously Generated Sections (for context):";

/// Compose the full prompt for one generation step.
///
/// Deterministic given identical inputs; touches no mutable state.
pub fn compose(label: SectionLabel, patient: &PatientInput, prior: &SectionResult) -> String {
    let patient_data = format_patient_data(patient);
    let instructions = instructions_for(label);

    if !label.uses_prior_context() || prior.is_empty() {
        return format!("{SYSTEM_ROLE}\n\n{patient_data}\n\n{instructions}");
    }

    let context = prior.render_context();
    format!("{SYSTEM_ROLE}\n\n{patient_data}\n{CONTEXT_HEADING}\n{context}\n\n{instructions}")
}

fn format_patient_data(patient: &PatientInput) -> String {
    format!(
        "### Patient Metadata\n{}\n\n\
         ### Patient's Subjective Report\n{}\n\n\
         ### Patient's Objective HealthKit Data\n{}",
        patient.metadata.render(),
        patient.subjective.render(),
        patient.objective.render(),
    )
}

fn instructions_for(label: SectionLabel) -> String {
    let name = label.name();
    match label {
        SectionLabel::Subjective => format!(
            "### Your Current Task: Generate the '{name}' Section (S)\n\
             - Summarize the patient's self-reported reasons for this initial consultation \
             into a coherent narrative paragraph.\n\
             - You MUST ONLY use information from the 'Patient's Subjective Report'.\n\
             - Your output MUST start with exactly \"S:\".\n\n\
             Now, generate ONLY the 'S' section."
        ),
        SectionLabel::Objective => format!(
            "### Your Current Task: Generate the '{name}' Section (O)\n\
             - From the 'Patient's Objective HealthKit Data', select and list ONLY the most \
             clinically relevant measurements for the patient's complaint.\n\
             - If a specific vital sign is NOT provided, you MUST omit it. DO NOT invent data.\n\
             - Your output MUST start with exactly \"O:\".\n\n\
             Now, generate ONLY the 'O' section."
        ),
        SectionLabel::Assessment => format!(
            "### Your Current Task: Generate the '{name}' Section (A)\n\
             - Act as a reviewing clinician. Based on ALL the information provided above \
             (S and O), formulate a preliminary 'Problem List'.\n\
             - These are potential issues for the doctor to investigate, NOT a final diagnosis.\n\
             - Frame it as a numbered list of concise clinical observations.\n\
             - Your output MUST start with exactly \"A:\".\n\n\
             Now, based on all the information above, generate the 'A' section as a \
             'Problem List'."
        ),
        SectionLabel::Plan => format!(
            "### Your Current Task: Generate the '{name}' Section (P)\n\
             - Based on the Assessment (A) and all other data, suggest an 'Initial Plan & \
             Discussion Points' for the physician to CONSIDER.\n\
             - Focus on potential diagnostic steps (e.g., lab tests), lifestyle topics to \
             discuss, and referrals.\n\
             - This MUST be a numbered list.\n\
             - Your output MUST start with exactly \"P:\".\n\n\
             Now, based on the 'Problem List' in the Assessment, generate the 'P' section."
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patient::Fields;

    fn sample_patient() -> PatientInput {
        PatientInput::new(
            Fields::from_pairs([("Age", "32"), ("Sex", "Male")]),
            Fields::from_pairs([("Chief Complaint", "Fatigue")]),
            Fields::from_pairs([("Resting Heart Rate (Avg)", "75 bpm")]),
        )
    }

    fn prior_with_s_and_o() -> SectionResult {
        let mut prior = SectionResult::new();
        prior.store(SectionLabel::Subjective, "S: Reports fatigue.");
        prior.store(SectionLabel::Objective, "O: Avg resting HR 75 bpm.");
        prior
    }

    #[test]
    fn every_label_requests_its_marker() {
        let patient = sample_patient();
        let prior = SectionResult::new();
        for label in SectionLabel::ALL {
            let prompt = compose(label, &patient, &prior);
            let required = format!(
                "Your output MUST start with exactly \"{}\"",
                label.marker()
            );
            assert!(prompt.contains(&required), "{label} prompt missing marker");
        }
    }

    #[test]
    fn blocks_appear_in_fixed_order() {
        let prompt = compose(
            SectionLabel::Assessment,
            &sample_patient(),
            &prior_with_s_and_o(),
        );
        let role = prompt.find("### Your Role and Goal").unwrap();
        let data = prompt.find("### Patient Metadata").unwrap();
        let context = prompt.find(CONTEXT_HEADING).unwrap();
        let task = prompt.find("### Your Current Task").unwrap();
        assert!(role < data && data < context && context < task);
    }

    #[test]
    fn subjective_and_objective_never_carry_context() {
        let patient = sample_patient();
        let prior = prior_with_s_and_o();
        for label in [SectionLabel::Subjective, SectionLabel::Objective] {
            let prompt = compose(label, &patient, &prior);
            assert!(
                !prompt.contains(CONTEXT_HEADING),
                "{label} prompt must stay lean even with prior sections supplied"
            );
        }
    }

    #[test]
    fn assessment_carries_context_iff_prior_nonempty() {
        let patient = sample_patient();
        let with = compose(SectionLabel::Assessment, &patient, &prior_with_s_and_o());
        assert!(with.contains(CONTEXT_HEADING));
        assert!(with.contains("S: S: Reports fatigue."));
        assert!(with.contains("O: O: Avg resting HR 75 bpm."));

        let without = compose(SectionLabel::Assessment, &patient, &SectionResult::new());
        assert!(!without.contains(CONTEXT_HEADING));
    }

    #[test]
    fn plan_carries_context_iff_prior_nonempty() {
        let patient = sample_patient();
        let with = compose(SectionLabel::Plan, &patient, &prior_with_s_and_o());
        assert!(with.contains(CONTEXT_HEADING));

        let without = compose(SectionLabel::Plan, &patient, &SectionResult::new());
        assert!(!without.contains(CONTEXT_HEADING));
    }

    #[test]
    fn patient_fields_rendered_as_key_value_lines() {
        let patient = sample_patient();
        let prompt = compose(SectionLabel::Subjective, &patient, &SectionResult::new());
        assert!(prompt.contains("Chief Complaint: Fatigue"));
        assert!(prompt.contains("Age: 32"));
        assert!(prompt.contains("Resting Heart Rate (Avg): 75 bpm"));
    }

    #[test]
    fn lean_subjective_prompt_for_single_complaint() {
        let patient = PatientInput::new(
            Fields::new(),
            Fields::from_pairs([("Chief Complaint", "Fatigue")]),
            Fields::new(),
        );
        let prompt = compose(SectionLabel::Subjective, &patient, &SectionResult::new());
        assert!(prompt.contains("Chief Complaint: Fatigue"));
        assert!(!prompt.contains(CONTEXT_HEADING));
    }

    #[test]
    fn instruction_semantics_reproduced() {
        let patient = sample_patient();
        let prior = SectionResult::new();

        let s = compose(SectionLabel::Subjective, &patient, &prior);
        assert!(s.contains("MUST ONLY use information from the 'Patient's Subjective Report'"));

        let o = compose(SectionLabel::Objective, &patient, &prior);
        assert!(o.contains("DO NOT invent data"));

        let a = compose(SectionLabel::Assessment, &patient, &prior);
        assert!(a.contains("'Problem List'"));
        assert!(a.contains("NOT a final diagnosis"));

        let p = compose(SectionLabel::Plan, &patient, &prior);
        assert!(p.contains("'Initial Plan & Discussion Points'"));
        assert!(p.contains("referrals"));
    }

    #[test]
    fn deterministic_for_identical_inputs() {
        let patient = sample_patient();
        let prior = prior_with_s_and_o();
        let a = compose(SectionLabel::Plan, &patient, &prior);
        let b = compose(SectionLabel::Plan, &patient, &prior);
        assert_eq!(a, b);
    }
}
