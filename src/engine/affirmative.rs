//! Deterministic reading of short user replies.
//!
//! Everything here is a pure string predicate: clear-yes detection for
//! confirmation screens, prompt-injection scaffolding detection, planner
//! wrapper unwrapping, and the digit shortcut expansion for numbered menus.

/// Exact affirmative tokens. A match fires the deterministic confirm paths,
/// so the set is closed on purpose.
const YES_TOKENS: &[&str] = &[
    "yes", "yep", "yeah", "sure", "ok", "okay", "proceed", "let's go", "lets go", "go", "y", "1",
];

/// True only for a short, unambiguous yes: lowercased, trailing `.`/`!`
/// stripped, at most 6 words, exact membership in the closed token set.
pub fn is_clear_yes(message: &str) -> bool {
    let t = message
        .trim()
        .to_lowercase()
        .trim_end_matches(['.', '!'])
        .trim()
        .to_string();
    if t.is_empty() || t.split_whitespace().count() > 6 {
        return false;
    }
    YES_TOKENS.contains(&t.as_str())
}

const INJECTION_MARKERS: &[&str] = &[
    "system:",
    "assistant:",
    "ignore previous instructions",
    "ignore all previous",
    "disregard previous",
    "you are chatgpt",
    "you are a model",
    "you are an ai",
    "pretend you are",
    "roleplay as",
    "act as ",
];

/// Flags explicit injection scaffolding only; bulleted business briefs and
/// requirement lists must pass through untouched.
pub fn looks_like_meta_instruction(message: &str) -> bool {
    let lower = message.trim().to_lowercase();
    if lower.is_empty() {
        return false;
    }
    INJECTION_MARKERS.iter().any(|m| lower.contains(m))
}

/// Unwraps a planner envelope (`... USER_MESSAGE: <text>`), returning the
/// inner text, or "" when no wrapper is present. The marker is matched
/// literally: the envelope is uppercase by contract, and an offset found in
/// a case-folded copy is not a valid index into the original text.
pub fn extract_wrapped_message(raw: &str) -> String {
    let Some(pos) = raw.find("USER_MESSAGE") else {
        return String::new();
    };
    let rest = &raw[pos + "USER_MESSAGE".len()..];
    let Some(colon) = rest.find(':') else {
        return String::new();
    };
    if !rest[..colon].trim().is_empty() {
        return String::new();
    }
    rest[colon + 1..].trim().to_string()
}

/// Expands a bare "1"/"2"/"3" reply to the text of that numbered option in
/// the previous question. Anything else passes through unchanged.
pub fn expand_choice(message: &str, previous_question: &str) -> String {
    let t = message.trim();
    if t != "1" && t != "2" && t != "3" {
        return message.to_string();
    }
    for line in previous_question.lines().map(str::trim) {
        let Some(rest) = line.strip_prefix(t) else {
            continue;
        };
        let Some(body) = rest.strip_prefix(')').or_else(|| rest.strip_prefix('.')) else {
            continue;
        };
        let body = body.trim();
        if !body.is_empty() {
            return body.to_string();
        }
    }
    message.to_string()
}
