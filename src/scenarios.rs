//! Synthetic initial-visit scenarios used by the demo binary.
//!
//! Three hardcoded cases with questionnaire answers and HealthKit-style
//! device data. Values are display strings only — nothing downstream parses
//! them.

use std::fmt;

use crate::patient::{Fields, PatientInput};

/// The built-in demo cases, selectable from the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Case 1: 32M, palpitations and fatigue under work stress.
    WorriedWell,
    /// Case 2: 48M, annual check-up with metabolic risk markers.
    MetabolicRisk,
    /// Case 3: 22F, insomnia and low mood during heavy study load.
    StressAndSleep,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [
        Scenario::WorriedWell,
        Scenario::MetabolicRisk,
        Scenario::StressAndSleep,
    ];

    /// Scenario by 1-based CLI index.
    pub fn from_index(index: u8) -> Option<Scenario> {
        match index {
            1 => Some(Scenario::WorriedWell),
            2 => Some(Scenario::MetabolicRisk),
            3 => Some(Scenario::StressAndSleep),
            _ => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Scenario::WorriedWell => "Case 1 — Initial Visit: Worried Well",
            Scenario::MetabolicRisk => "Case 2 — Initial Visit: Metabolic Risk",
            Scenario::StressAndSleep => "Case 3 — Initial Visit: Stress and Sleep",
        }
    }

    pub fn patient_input(&self) -> PatientInput {
        match self {
            Scenario::WorriedWell => worried_well(),
            Scenario::MetabolicRisk => metabolic_risk(),
            Scenario::StressAndSleep => stress_and_sleep(),
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

fn worried_well() -> PatientInput {
    PatientInput::new(
        Fields::from_pairs([("Age", "32"), ("Sex", "Male")]),
        Fields::from_pairs([
            (
                "Chief Complaint",
                "Heart palpitations and persistent fatigue for the last 2 weeks.",
            ),
            (
                "Symptoms",
                "Feels his heart 'fluttering' especially in the evening. Finds it hard to \
                 concentrate at work. General feeling of being 'wired but tired'.",
            ),
            (
                "Lifestyle",
                "Works long hours, typically 10-12 hours a day. Reports high stress levels \
                 from a recent project deadline.",
            ),
            (
                "Diet",
                "Admits to drinking 4-5 cups of coffee per day to stay focused. Often skips \
                 lunch or orders takeout.",
            ),
            (
                "Sleep",
                "Reports difficulty falling asleep and wakes up 2-3 times during the night. \
                 Feels unrefreshed in the morning.",
            ),
            (
                "Family History",
                "No significant family history of heart disease.",
            ),
        ]),
        // Device data from the past 2 weeks
        Fields::from_pairs([
            ("Resting Heart Rate (Avg)", "75 bpm"),
            ("Walking Heart Rate (Avg)", "110 bpm"),
            (
                "High Heart Rate Events",
                "4 notifications in the last 14 days (>120 bpm at rest)",
            ),
            (
                "Heart Rate Variability (SDNN Avg)",
                "35 ms (Lower than his usual 55 ms)",
            ),
            ("Time Asleep (Avg)", "5 hr 30 min"),
            ("Sleep Efficiency (Avg)", "75%"),
            ("Caffeine Intake (Avg Daily)", "450 mg"),
            ("Mindful Minutes", "0 min logged"),
            (
                "State of Mind (Logged)",
                "Frequently logged 'Stressed' and 'Anxious' moods.",
            ),
        ]),
    )
}

fn metabolic_risk() -> PatientInput {
    PatientInput::new(
        Fields::from_pairs([("Age", "48"), ("Sex", "Male")]),
        Fields::from_pairs([
            ("Chief Complaint", "General annual check-up."),
            (
                "Symptoms",
                "Reports feeling 'more tired than usual' over the past year. Notes increased \
                 thirst and needing to urinate more often, especially at night. Experiences \
                 some numbness in his feet occasionally.",
            ),
            (
                "Lifestyle",
                "Sedentary job. Drives to work. Watches TV in the evening.",
            ),
            (
                "Diet",
                "Enjoys fast food and sugary drinks. Doesn't actively track nutrition.",
            ),
            ("Exercise", "Reports 'no time for exercise'."),
            (
                "Family History",
                "Father had Type 2 Diabetes, Mother has Hypertension.",
            ),
        ]),
        // Device data from the past 30 days
        Fields::from_pairs([
            ("Weight", "95 kg"),
            ("Height", "178 cm"),
            ("Body Mass Index (BMI)", "29.9 kg/m²"),
            ("Waist Circumference", "105 cm"),
            ("Steps (Avg Daily)", "3,500 steps"),
            ("Flights Climbed (Avg Daily)", "2 flights"),
            (
                "Blood Pressure (from home cuff)",
                "Several readings logged, avg 138/88 mmHg",
            ),
            ("Apple Walking Steadiness", "OK (82%)"),
            ("Number of Times Fallen", "0"),
        ]),
    )
}

fn stress_and_sleep() -> PatientInput {
    PatientInput::new(
        Fields::from_pairs([("Age", "22"), ("Sex", "Female")]),
        Fields::from_pairs([
            (
                "Chief Complaint",
                "Trouble sleeping and feeling down for the past month.",
            ),
            (
                "Symptoms",
                "Cannot quiet her mind at night, leading to taking 2-3 hours to fall asleep. \
                 Feels irritable and has low motivation for her studies. Cries easily over \
                 small things.",
            ),
            (
                "Social History",
                "Lives in a dorm. Feels isolated due to heavy study load.",
            ),
            (
                "Diet",
                "Reports loss of appetite and sometimes forgetting to eat.",
            ),
            (
                "Medications",
                "Not taking any prescription medications.",
            ),
        ]),
        // Device data from the past 30 days
        Fields::from_pairs([
            ("Time in Bed (Avg)", "9 hr"),
            ("Time Asleep (Avg)", "5 hr 15 min"),
            ("Sleep Stages (Avg)", "Deep: 30 min, REM: 1 hr"),
            (
                "Wrist Temperature (during sleep)",
                "Avg +0.4°C deviation from baseline",
            ),
            (
                "Mental Health Assessment (PHQ-9)",
                "Logged a score of 14 (Moderately Severe Depression)",
            ),
            (
                "State of Mind (Logged)",
                "Predominantly 'Unpleasant' moods logged, with emotions like 'Sad', \
                 'Overwhelmed'.",
            ),
            (
                "Active Energy Burned (Avg Daily)",
                "150 kcal (significantly lower than her baseline)",
            ),
            (
                "Menstrual Cycles",
                "Logged as 'Irregular' for the past 2 cycles.",
            ),
        ]),
    )
}
