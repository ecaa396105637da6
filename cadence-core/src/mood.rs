//! Mood collaborator contract.
//!
//! An external service (an LLM over a voice note or typed note) reports
//! per-event mood scores; the scheduler merges them into its task list by
//! exact name match. The engine never calls out itself; it consumes a
//! [`MoodSource`] supplied by the driver.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::task::Task;

/// Event name the collaborator uses when it can't tie the mood to a task.
pub const GENERAL_EVENT: &str = "General";
pub const NEUTRAL_MOOD: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodReport {
    pub event_name: String,
    /// 1-10, 10 happiest.
    pub mood: f64,
}

impl MoodReport {
    /// The fallback when the collaborator can't produce anything usable.
    pub fn neutral() -> Self {
        Self {
            event_name: GENERAL_EVENT.to_string(),
            mood: NEUTRAL_MOOD,
        }
    }
}

/// Something that can produce mood reports. Blocking; the simulation loop
/// waits for it (retry/fallback policy lives in the implementation).
pub trait MoodSource {
    fn fetch(&mut self) -> Result<Vec<MoodReport>>;
}

/// Parse a collaborator reply: a single report object or an array of them,
/// possibly wrapped in a markdown code fence.
pub fn parse_mood_reports(raw: &str) -> Result<Vec<MoodReport>> {
    let body = strip_fences(raw);
    let body = body.trim();
    if body.is_empty() {
        bail!("empty mood reply");
    }
    if let Ok(one) = serde_json::from_str::<MoodReport>(body) {
        return Ok(vec![one]);
    }
    let many: Vec<MoodReport> =
        serde_json::from_str(body).context("mood reply is neither a report nor a list of reports")?;
    Ok(many)
}

/// Overwrite `mood` on every task whose name equals a report's event name.
/// Returns how many tasks were updated; unmatched reports (including
/// "General") are ignored.
pub fn apply_mood_reports(tasks: &mut [Task], reports: &[MoodReport]) -> usize {
    let mut updated = 0;
    for report in reports {
        for task in tasks.iter_mut() {
            if task.name == report.event_name {
                task.mood = report.mood;
                updated += 1;
            }
        }
    }
    updated
}

fn strip_fences(s: &str) -> String {
    if !s.trim_start().starts_with("```") {
        return s.to_string();
    }
    s.lines()
        .filter(|l| !l.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Task, TaskInput};

    fn task(name: &str) -> Task {
        Task::from_input(
            TaskInput {
                name: name.to_string(),
                ddl: "6/1".to_string(),
                duration: 4.0,
                importance: None,
                mood: None,
                user_comment: None,
            },
            2025,
            19,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_single_object() {
        let reports = parse_mood_reports(r#"{"event_name": "3A1 coursework", "mood": 8}"#).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].event_name, "3A1 coursework");
        assert_eq!(reports[0].mood, 8.0);
    }

    #[test]
    fn test_parse_array() {
        let reports = parse_mood_reports(
            r#"[{"event_name": "a", "mood": 2}, {"event_name": "b", "mood": 9}]"#,
        )
        .unwrap();
        assert_eq!(reports.len(), 2);
    }

    #[test]
    fn test_parse_fenced_reply() {
        let raw = "```json\n{\"event_name\": \"General\", \"mood\": 5}\n```";
        let reports = parse_mood_reports(raw).unwrap();
        assert_eq!(reports[0].event_name, GENERAL_EVENT);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_mood_reports("I feel great today!").is_err());
        assert!(parse_mood_reports("").is_err());
        assert!(parse_mood_reports(r#"{"mood": 5}"#).is_err());
    }

    #[test]
    fn test_apply_matches_exact_names_only() {
        let mut tasks = vec![task("3A1 coursework"), task("3F2 FTR")];
        let reports = vec![
            MoodReport {
                event_name: "3A1 coursework".to_string(),
                mood: 9.0,
            },
            MoodReport {
                event_name: "3A1".to_string(), // prefix, not a match
                mood: 1.0,
            },
        ];
        let updated = apply_mood_reports(&mut tasks, &reports);
        assert_eq!(updated, 1);
        assert_eq!(tasks[0].mood, 9.0);
        assert_eq!(tasks[1].mood, crate::task::DEFAULT_MOOD);
    }

    #[test]
    fn test_general_report_touches_nothing() {
        let mut tasks = vec![task("lab report")];
        let updated = apply_mood_reports(&mut tasks, &[MoodReport::neutral()]);
        assert_eq!(updated, 0);
        assert_eq!(tasks[0].mood, crate::task::DEFAULT_MOOD);
    }
}
