use crate::models::UrgencyTier;

/// Phrases that escalate straight to `High`. Checked before anything else.
pub const EMERGENCY_SYMPTOMS: &[&str] = &[
    "chest pain",
    "difficulty breathing",
    "severe pain",
    "blood vomiting",
    "unconscious",
    "heart attack",
    "stroke",
    "severe headache",
    "high fever above 104",
    "seizure",
    "severe bleeding",
    "choking",
    "severe burns",
    "poisoning",
    "severe allergic reaction",
];

pub const MEDIUM_URGENCY_SYMPTOMS: &[&str] = &[
    "fever",
    "persistent cough",
    "severe fatigue",
    "dizziness",
    "nausea",
    "vomiting",
    "abdominal pain",
    "shortness of breath",
    "persistent headache",
    "unusual rash",
    "severe diarrhea",
    "dehydration",
];

/// Keyword triage over the lowercased message. Matching is plain substring
/// containment, so negations ("no chest pain") still escalate.
pub fn classify_urgency(message: &str) -> UrgencyTier {
    let lower = message.to_lowercase();

    if contains_any(&lower, EMERGENCY_SYMPTOMS) {
        return UrgencyTier::High;
    }

    if contains_any(&lower, MEDIUM_URGENCY_SYMPTOMS) {
        return UrgencyTier::Medium;
    }

    UrgencyTier::Low
}

/// First keyword of the winning set, for logging.
pub fn matched_keyword(message: &str) -> Option<&'static str> {
    let lower = message.to_lowercase();
    EMERGENCY_SYMPTOMS
        .iter()
        .chain(MEDIUM_URGENCY_SYMPTOMS.iter())
        .find(|needle| lower.contains(*needle))
        .copied()
}

fn contains_any(input: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| input.contains(needle))
}
