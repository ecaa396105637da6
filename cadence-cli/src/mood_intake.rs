//! Mood-extraction collaborator: sends the user's note to the LLM and parses
//! the per-task mood reports it returns.
//!
//! Malformed replies get a bounded number of retries, then the neutral
//! fallback; the scheduling loop never sees a hard failure from here.

use anyhow::Result;
use cadence_core::{GENERAL_EVENT, MoodReport, MoodSource, parse_mood_reports};

use crate::llm::{ChatTurn, LlmConfig, chat_complete};

pub const MOOD_RETRY_LIMIT: usize = 3;

const SYSTEM: &str =
    "You are an assistant that analyzes a note and returns a JSON object with the task name and mood rating.";

/// Ask the collaborator for mood reports. Falls back to a single neutral
/// report after [`MOOD_RETRY_LIMIT`] failed attempts.
pub fn extract_mood(llm: &LlmConfig, task_names: &[String], note: &str) -> Vec<MoodReport> {
    let prompt = mood_prompt(task_names, note);

    for attempt in 1..=MOOD_RETRY_LIMIT {
        match try_extract(llm, &prompt) {
            Ok(reports) => return reports,
            Err(e) => {
                println!("warning: mood extraction attempt {attempt}/{MOOD_RETRY_LIMIT} failed: {e:#}");
            }
        }
    }
    vec![MoodReport::neutral()]
}

fn try_extract(llm: &LlmConfig, prompt: &str) -> Result<Vec<MoodReport>> {
    let reply = chat_complete(llm, SYSTEM, &[ChatTurn::user(prompt)])?;
    parse_mood_reports(&reply)
}

fn mood_prompt(task_names: &[String], note: &str) -> String {
    format!(
        "You are analyzing a user's mood and which of their tasks they are \
         referring to, based on a written note.\n\
         Important: return the result ONLY as JSON like this:\n\
         {{\"event_name\": \"<task name>\", \"mood\": <rating 1-10>}}\n\
         or a JSON array of such objects when several tasks are mentioned.\n\
         Important: event_name must be chosen from this list: {:?}.\n\
         Rate mood from 1 to 10, 10 being happiest. If the note is a general \
         feeling not tied to a task, or you can't determine anything, return \
         \"{}\" with a mood of 5.\n\nNote:\n{}",
        task_names, GENERAL_EVENT, note
    )
}

/// [`MoodSource`] that consumes a single note on the first fetch; later
/// day-starts get nothing.
pub struct NoteMoodSource {
    llm: LlmConfig,
    task_names: Vec<String>,
    note: Option<String>,
}

impl NoteMoodSource {
    pub fn new(llm: LlmConfig, task_names: Vec<String>, note: String) -> Self {
        Self {
            llm,
            task_names,
            note: Some(note),
        }
    }
}

impl MoodSource for NoteMoodSource {
    fn fetch(&mut self) -> Result<Vec<MoodReport>> {
        let Some(note) = self.note.take() else {
            return Ok(vec![]);
        };
        Ok(extract_mood(&self.llm, &self.task_names, &note))
    }
}
