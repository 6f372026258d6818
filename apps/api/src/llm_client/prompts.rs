// Shared prompt fragments. Each feature that calls the model keeps its own
// prompts.rs next to its handlers.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended to prompts that carry candidate-supplied text.
pub const FAIRNESS_INSTRUCTION: &str = "\
    Judge only job-relevant evidence: skills, experience, education and the quality of answers. \
    Ignore names, gender, age, nationality, photos and any other protected characteristic.";

/// Builds a system prompt from a role description plus the JSON-only rules.
pub fn json_system(role: &str) -> String {
    format!("{role} {JSON_ONLY_SYSTEM}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_system_appends_rules() {
        let s = json_system("You are an interviewer.");
        assert!(s.starts_with("You are an interviewer."));
        assert!(s.ends_with(JSON_ONLY_SYSTEM));
    }
}
