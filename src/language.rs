//! Session language policy and localized UI strings.
//!
//! The session language is pinned once: an explicit user request always wins,
//! otherwise the first meaningful message is run through a deterministic
//! marker-word heuristic (no model call, no network). UI strings ship in
//! English and are translated once per process per language through the
//! strict-JSON boundary, then cached.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tokio::sync::RwLock;

use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::state::CanvasState;

const MIN_ALPHA_FOR_DETECTION: usize = 8;

/// Trims, lowercases and strips region subtags; `und` reads as unknown.
pub fn normalize_lang_code(raw: &str) -> String {
    let s = raw.trim().to_lowercase();
    if s.is_empty() || s == "und" {
        return String::new();
    }
    s.split(['-', '_']).next().unwrap_or("").to_string()
}

static CODE_OVERRIDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(lang|language)\s*[:=]\s*([a-z]{2,3})\b").unwrap_or_else(|e| panic!("{e}"))
});

const LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("english", "en"),
    ("german", "de"),
    ("deutsch", "de"),
    ("french", "fr"),
    ("spanish", "es"),
    ("italian", "it"),
    ("portuguese", "pt"),
    ("chinese", "zh"),
    ("japanese", "ja"),
    ("korean", "ko"),
    ("arabic", "ar"),
    ("hindi", "hi"),
    ("turkish", "tr"),
    ("russian", "ru"),
];

/// An explicit language request: a `lang: xx` form, or a switch keyword
/// combined with a known language name.
pub fn parse_explicit_override(message: &str) -> Option<String> {
    let raw = message.trim().to_lowercase();
    if raw.is_empty() {
        return None;
    }

    if let Some(captures) = CODE_OVERRIDE.captures(&raw) {
        let code = captures.get(2)?.as_str();
        return Some(code.chars().take(2).collect());
    }

    let keywords = ["switch", "change", "use", "speak", "language", "lang"];
    if !keywords.iter().any(|k| raw.contains(k)) {
        return None;
    }
    LANGUAGE_NAMES
        .iter()
        .find(|(name, _)| raw.contains(name))
        .map(|(_, code)| code.to_string())
}

fn count_alpha(message: &str) -> usize {
    message.chars().filter(|c| c.is_alphabetic()).count()
}

/// Common function words per detectable language. Words shared between two
/// table entries cancel out through the scoring below.
const MARKER_WORDS: &[(&str, &[&str])] = &[
    (
        "en",
        &[
            "the", "and", "with", "have", "want", "this", "that", "for", "are", "our", "we",
            "business", "company", "my",
        ],
    ),
    (
        "nl",
        &[
            "de", "het", "een", "en", "ik", "wij", "niet", "voor", "met", "mijn", "bedrijf",
            "willen", "wil", "hebben", "dat", "is",
        ],
    ),
    (
        "de",
        &[
            "der", "die", "das", "und", "ich", "wir", "nicht", "ein", "eine", "mit", "mein",
            "haben", "will", "möchte", "für",
        ],
    ),
    (
        "fr",
        &[
            "le", "la", "les", "et", "je", "nous", "pas", "une", "avec", "mon", "entreprise",
            "pour", "est", "que", "vous",
        ],
    ),
    (
        "es",
        &[
            "el", "la", "los", "las", "y", "yo", "nosotros", "una", "con", "mi", "empresa",
            "para", "es", "que", "quiero",
        ],
    ),
    (
        "it",
        &[
            "il", "lo", "gli", "e", "io", "noi", "una", "con", "mia", "azienda", "per", "è",
            "che", "voglio", "sono",
        ],
    ),
    (
        "pt",
        &[
            "o", "a", "os", "as", "e", "eu", "nós", "uma", "com", "minha", "empresa", "para",
            "é", "que", "quero",
        ],
    ),
];

/// Deterministic language detection over the marker-word tables. Returns a
/// language only when it scores at least two hits and beats every other
/// candidate outright.
pub fn detect_language(message: &str) -> Option<&'static str> {
    if count_alpha(message) < MIN_ALPHA_FOR_DETECTION {
        return None;
    }
    let words: Vec<String> = message
        .to_lowercase()
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect();
    if words.is_empty() {
        return None;
    }

    let mut best: Option<(&'static str, usize)> = None;
    let mut tied = false;
    for (lang, markers) in MARKER_WORDS {
        let hits = words
            .iter()
            .filter(|w| markers.contains(&w.as_str()))
            .count();
        match best {
            Some((_, top)) if hits > top => {
                best = Some((lang, hits));
                tied = false;
            }
            Some((_, top)) if hits == top => tied = true,
            None => best = Some((lang, hits)),
            _ => {}
        }
    }
    match best {
        Some((lang, hits)) if hits >= 2 && !tied => Some(lang),
        _ => None,
    }
}

/// Pins the session language from the user message. Explicit overrides always
/// win; otherwise an existing lock is respected and detection only runs on
/// messages with enough alphabetic content.
pub fn ensure_language(state: &mut CanvasState, message: &str) {
    if let Some(code) = parse_explicit_override(message) {
        state.language = code;
        state.language_locked = "true".to_string();
        state.language_override = "true".to_string();
        return;
    }

    let current = normalize_lang_code(&state.language);
    let pinned = state.language_locked == "true" || state.language_override == "true";
    if pinned && !current.is_empty() {
        return;
    }

    if let Some(detected) = detect_language(message) {
        state.language = detected.to_string();
        state.language_locked = "true".to_string();
        state.language_override = "false".to_string();
    }
}

/// Real typed text, as opposed to widget tokens and digit shortcuts.
pub fn is_plain_user_text(message: &str) -> bool {
    let t = message.trim();
    !t.is_empty()
        && !t.chars().all(|c| c.is_ascii_digit())
        && !t.starts_with("ACTION_")
        && !t.starts_with("__ROUTE__")
        && !t.starts_with("choice:")
}

/// Fresh sessions re-detect from the first real message: at verification with
/// no final yet and no explicit override, stale language state is cleared.
pub fn reset_stale_language(state: &mut CanvasState, message: &str) {
    if state.step_0_final.trim().is_empty()
        && is_plain_user_text(message)
        && state.language_override != "true"
    {
        state.language.clear();
        state.language_locked = "false".to_string();
        state.language_override = "false".to_string();
    }
}

pub const STEP0_CONTEXT_MESSAGE: &str =
    "Just to set the context, we'll start with the basics.";

/// The opening verification question. English regardless of session language;
/// the language is usually not known yet at this point.
pub fn step0_question() -> &'static str {
    "What type of venture is it, and what's the business name? If the name isn't final yet, write \"TBD\"."
}

/// Built-in English UI strings, the translation source for every other
/// language.
pub fn default_ui_strings() -> BTreeMap<String, String> {
    [
        ("startHint", "Click Start to begin."),
        ("btnStart", "Start"),
        ("btnOk", "Continue"),
        ("btnGoToNextStep", "Go to next step"),
        ("sendTitle", "Send"),
        ("thinking", "Thinking…"),
        (
            "inputPlaceholder",
            "Type your answer here (use The Business Strategy Canvas Builder widget, not the chat box)…",
        ),
        (
            "uiUseWidgetToContinue",
            "Use The Business Strategy Canvas Builder widget to continue (not the chat box).",
        ),
        (
            "errorMessage",
            "Something went wrong while processing your message. Please try again.",
        ),
        ("dreamBuilder.startExercise", "Start the exercise"),
        ("dreamBuilder.statements.title", "Your Dream statements"),
        (
            "dreamBuilder.statements.count",
            "N statements out of a minimum of 20 so far",
        ),
        ("dreamBuilder.statements.empty", "No statements yet."),
        (
            "btnSwitchToSelfDream",
            "Switch back to self-formulate the dream",
        ),
        (
            "btnScoringContinue",
            "Formulate my dream for me based on what I find important.",
        ),
        ("scoringFilled", "N/M"),
        ("scoringAvg", "Average: X"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

const TRANSLATION_INSTRUCTIONS: &str = "\
You are a UI translation engine for The Business Strategy Canvas Builder app.\n\
Translate the VALUES to the target LANGUAGE.\n\
Keep KEYS exactly the same.\n\
Return valid JSON only. No markdown. No extra keys. No comments.\n\
Preserve placeholders like N, M, and X exactly as-is.\n\
Do not translate or alter the product name 'The Business Strategy Canvas Builder'; keep it exactly as-is.\n\
Use concise, natural UI wording in the target language.";

/// Per-process cache of translated UI string tables.
pub struct UiCatalog {
    cache: RwLock<HashMap<String, BTreeMap<String, String>>>,
}

impl Default for UiCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl UiCatalog {
    pub fn new() -> UiCatalog {
        UiCatalog {
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// UI strings for a language. English is the built-in table; anything else
    /// is translated once and cached. Any translation failure falls back to
    /// English (a readable widget beats a failed turn).
    pub async fn strings_for(
        &self,
        lang: &str,
        provider: &dyn LlmProvider,
        timeout: Duration,
    ) -> BTreeMap<String, String> {
        let lang = {
            let normalized = normalize_lang_code(lang);
            if normalized.is_empty() {
                "en".to_string()
            } else {
                normalized
            }
        };
        if lang == "en" {
            return default_ui_strings();
        }
        if let Some(cached) = self.cache.read().await.get(&lang) {
            return cached.clone();
        }

        let strings = match translate_ui_strings(&lang, provider, timeout).await {
            Ok(strings) => strings,
            Err(reason) => {
                tracing::warn!(lang, reason, "ui string translation failed, using defaults");
                return default_ui_strings();
            }
        };
        self.cache
            .write()
            .await
            .insert(lang.clone(), strings.clone());
        strings
    }
}

async fn translate_ui_strings(
    lang: &str,
    provider: &dyn LlmProvider,
    timeout: Duration,
) -> Result<BTreeMap<String, String>, String> {
    let defaults = default_ui_strings();
    let input_json = serde_json::to_string(&defaults).map_err(|e| e.to_string())?;
    let request = CompletionRequest::new(vec![
        ChatMessage::system(TRANSLATION_INSTRUCTIONS),
        ChatMessage::user(format!("LANGUAGE: {lang}\nINPUT_JSON:\n{input_json}")),
    ])
    .with_temperature(0.2)
    .with_max_tokens(2048);

    let response = tokio::time::timeout(timeout, provider.complete(request))
        .await
        .map_err(|_| "translation timed out".to_string())?
        .map_err(|e| e.to_string())?;

    let text = &response.content;
    let start = text.find('{').ok_or("no JSON object in output")?;
    let end = text.rfind('}').ok_or("no closing brace in output")?;
    if end < start {
        return Err("no JSON object in output".to_string());
    }
    let parsed: BTreeMap<String, String> =
        serde_json::from_str(&text[start..=end]).map_err(|e| e.to_string())?;

    if parsed.keys().ne(defaults.keys()) {
        return Err("translated table does not match the default keys".to_string());
    }
    Ok(parsed)
}

/// Fills the state's UI string table for the session language, skipping work
/// when the stored table already matches.
pub async fn ensure_ui_strings(
    state: &mut CanvasState,
    catalog: &UiCatalog,
    provider: &dyn LlmProvider,
    timeout: Duration,
) {
    let lang = {
        let normalized = normalize_lang_code(&state.language);
        if normalized.is_empty() {
            "en".to_string()
        } else {
            normalized
        }
    };
    if state.ui_strings_lang == lang && !state.ui_strings.is_empty() {
        return;
    }
    state.ui_strings = catalog.strings_for(&lang, provider, timeout).await;
    state.ui_strings_lang = lang;
}
