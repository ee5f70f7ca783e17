//! Per-session usage reports (opt-in ops artifact).
//!
//! When a report directory is configured, every turn appends one record to a
//! per-session markdown file. The file carries a machine-readable JSON marker
//! comment followed by human tables; appends are idempotent per turn id, and
//! I/O failures only log a warning (a report must never fail a turn).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::llm::TokenUsage;

const DATA_MARKER_PREFIX: &str = "SESSION_LOG_DATA:";

/// One specialist-turn entry in the session report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTurnRecord {
    pub turn_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub step: String,
    pub specialist: String,
    pub model: String,
    pub attempts: u32,
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionData {
    session_id: String,
    started_at: DateTime<Utc>,
    turns: Vec<SessionTurnRecord>,
}

struct SessionFile {
    path: PathBuf,
    data: SessionData,
}

/// Appends turn records to per-session markdown reports.
pub struct UsageReporter {
    dir: PathBuf,
    sessions: Mutex<HashMap<String, SessionFile>>,
}

fn safe_session_id(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .take(80)
        .collect();
    if cleaned.is_empty() {
        "session".to_string()
    } else {
        cleaned
    }
}

fn format_count(value: Option<u32>) -> String {
    match value {
        Some(n) => n.to_string(),
        None => "unknown".to_string(),
    }
}

impl UsageReporter {
    pub fn new(dir: impl Into<PathBuf>) -> UsageReporter {
        UsageReporter {
            dir: dir.into(),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Appends one turn to the session's report. Re-submitting the same
    /// `turn_id` is a no-op; write failures log a warning and return.
    pub fn append(&self, session_id: &str, record: SessionTurnRecord) {
        let mut sessions = match self.sessions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let entry = sessions.entry(session_id.to_string()).or_insert_with(|| {
            let started_at = record.timestamp;
            let file_name = format!(
                "session-{}-{}-{}.md",
                started_at.format("%Y-%m-%d"),
                started_at.format("%H%M%S"),
                safe_session_id(session_id),
            );
            SessionFile {
                path: self.dir.join(file_name),
                data: SessionData {
                    session_id: session_id.to_string(),
                    started_at,
                    turns: Vec::new(),
                },
            }
        });

        if entry.data.turns.iter().any(|t| t.turn_id == record.turn_id) {
            return;
        }
        entry.data.turns.push(record);

        if let Err(e) = write_report(&self.dir, &entry.path, &entry.data) {
            tracing::warn!(path = %entry.path.display(), error = %e, "failed to write session report");
        }
    }
}

fn write_report(dir: &Path, path: &Path, data: &SessionData) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    std::fs::write(path, render_markdown(data))
}

fn render_markdown(data: &SessionData) -> String {
    let machine = serde_json::to_string(data).unwrap_or_else(|_| "{}".to_string());

    let turn_rows = if data.turns.is_empty() {
        "| - | - | - | - | - | - | - | - | - |".to_string()
    } else {
        data.turns
            .iter()
            .map(|t| {
                let (input, output, total) = usage_columns(&t.usage);
                format!(
                    "| {} | {} | {} | {} | {} | {} | {input} | {output} | {total} |",
                    t.timestamp.to_rfc3339(),
                    t.turn_id,
                    t.step,
                    t.specialist,
                    t.model,
                    t.attempts,
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let mut by_step: Vec<(String, Vec<&SessionTurnRecord>)> = Vec::new();
    for turn in &data.turns {
        match by_step.iter_mut().find(|(step, _)| *step == turn.step) {
            Some((_, turns)) => turns.push(turn),
            None => by_step.push((turn.step.clone(), vec![turn])),
        }
    }
    by_step.sort_by(|(a, _), (b, _)| a.cmp(b));
    let step_rows = if by_step.is_empty() {
        "| - | 0 | 0 | 0 | 0 |".to_string()
    } else {
        by_step
            .iter()
            .map(|(step, turns)| {
                let (input, output, total) = sum_usage(turns.iter().map(|t| &t.usage));
                format!(
                    "| {step} | {} | {} | {} | {} |",
                    turns.len(),
                    format_count(input),
                    format_count(output),
                    format_count(total),
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let (input, output, total) = sum_usage(data.turns.iter().map(|t| &t.usage));

    format!(
        "<!-- {DATA_MARKER_PREFIX}{machine} -->\n\
         # Session Token Report\n\
         \n\
         - session_id: {}\n\
         - started_at: {}\n\
         - turns: {}\n\
         \n\
         ## Turn log\n\
         \n\
         | timestamp | turn_id | step | specialist | model | attempts | input | output | total |\n\
         | --- | --- | --- | --- | --- | --- | --- | --- | --- |\n\
         {turn_rows}\n\
         \n\
         ## Per-step totals\n\
         \n\
         | step | turns | input | output | total |\n\
         | --- | --- | --- | --- | --- |\n\
         {step_rows}\n\
         \n\
         ## Session totals\n\
         \n\
         - input_tokens: {}\n\
         - output_tokens: {}\n\
         - total_tokens: {}\n",
        data.session_id,
        data.started_at.to_rfc3339(),
        data.turns.len(),
        format_count(input),
        format_count(output),
        format_count(total),
    )
}

fn usage_columns(usage: &Option<TokenUsage>) -> (String, String, String) {
    match usage {
        Some(u) => (
            u.input_tokens.to_string(),
            u.output_tokens.to_string(),
            u.total().to_string(),
        ),
        None => (
            "unknown".to_string(),
            "unknown".to_string(),
            "unknown".to_string(),
        ),
    }
}

/// Sums token counts across turns; any turn without provider counts makes
/// the corresponding column `unknown`.
fn sum_usage<'a>(
    usages: impl Iterator<Item = &'a Option<TokenUsage>>,
) -> (Option<u32>, Option<u32>, Option<u32>) {
    let mut input = Some(0u32);
    let mut output = Some(0u32);
    let mut total = Some(0u32);
    for usage in usages {
        match usage {
            Some(u) => {
                input = input.map(|n| n.saturating_add(u.input_tokens));
                output = output.map(|n| n.saturating_add(u.output_tokens));
                total = total.map(|n| n.saturating_add(u.total()));
            }
            None => {
                input = None;
                output = None;
                total = None;
            }
        }
    }
    (input, output, total)
}
