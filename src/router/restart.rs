//! Full-restart intent detection.
//!
//! Deliberately conservative: long messages never match, and without an
//! explicit canvas reference only a handful of bare tokens count.

const RESTART_WORDS: [&str; 6] = [
    "restart",
    "reset",
    "start over",
    "start again",
    "begin again",
    "from scratch",
];

const CANVAS_WORDS: [&str; 4] = [
    "canvas",
    "business strategy canvas",
    "business canvas",
    "bsc",
];

/// Messages that on their own mean "wipe the canvas", including the Dutch
/// equivalents.
const BARE_RESTART_TOKENS: [&str; 4] = ["restart", "reset", "opnieuw", "herstart"];

/// True when the message asks to restart the whole canvas.
pub fn wants_full_restart(user_message: &str) -> bool {
    let text = user_message.trim().to_lowercase();
    if text.is_empty() {
        return false;
    }

    let word_count = text.split_whitespace().count();
    if word_count > 12 {
        return false;
    }

    if word_count <= 3 && BARE_RESTART_TOKENS.contains(&text.as_str()) {
        return true;
    }

    let restart_hit = RESTART_WORDS.iter().any(|w| text.contains(w));
    let canvas_hit = CANVAS_WORDS.iter().any(|w| text.contains(w));
    restart_hit && canvas_hit
}
