// Shared prompt fragments.
// Each stage's own templates live in generation/prompts.rs; this file only holds
// the cross-cutting pieces every stage appends.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Keeps generated material tied to the learner's actual situation.
pub const GROUNDING_INSTRUCTION: &str = "\
    Tailor every recommendation, example and exercise to the learner profile provided. \
    Only mention tools that actually exist. Do NOT invent product features, prices or statistics. \
    Prefer concrete, workplace-ready examples over generic advice.";

/// Appended when the profile names a preferred language.
pub fn language_instruction(language: Option<&str>) -> String {
    match language.map(str::trim).filter(|l| !l.is_empty()) {
        Some(lang) => format!(
            "Write all human-readable text in the learner's language ({lang}). \
             JSON keys stay exactly as specified."
        ),
        None => "Write all human-readable text in English. JSON keys stay exactly as specified."
            .to_string(),
    }
}
