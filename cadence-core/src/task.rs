//! Task model: the wire contract (`TaskInput`) and the in-memory `Task`
//! with its derived per-step scoring fields.

use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::calendar::WorkCalendar;
use crate::urgency::UrgencyModel;

pub const DEFAULT_IMPORTANCE: f64 = 5.0;
pub const DEFAULT_MOOD: f64 = 5.0;

/// One entry of the task-list JSON handed to the scheduler.
///
/// `importance` and `mood` stay optional here and are resolved to their
/// defaults exactly once, in [`Task::from_input`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInput {
    #[serde(alias = "assignment_name")]
    pub name: String,

    /// Deadline as "M/D" (month/day); the year comes from the scheduler's
    /// start date, the hour from the calendar's deadline hour.
    #[serde(rename = "DDL")]
    pub ddl: String,

    /// Total hours of work required.
    pub duration: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<f64>,

    /// 0-10, how much the user feels like doing this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_comment: Option<String>,
}

/// A scheduled task.
///
/// `deadline` is fixed at construction and never recomputed. The derived
/// fields (`time_to_deadline`, `duration_left`, `urgency`, `weighted_score`)
/// are stale until refreshed for the current reference instant.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub name: String,
    /// Original "M/D" deadline text, kept for serialization round-trips.
    pub ddl: String,
    pub deadline: NaiveDateTime,
    pub duration: f64,
    pub completed_work: f64,
    pub importance: f64,
    pub mood: f64,
    pub user_comment: Option<String>,

    pub time_to_deadline: f64,
    pub duration_left: f64,
    pub urgency: f64,
    pub weighted_score: f64,
}

impl Task {
    /// Build a task from its wire form. The deadline year is taken from the
    /// scheduler's start date; a malformed or impossible "M/D" is fatal.
    pub fn from_input(input: TaskInput, year: i32, deadline_hour: u32) -> Result<Self> {
        let (month, day) = parse_month_day(&input.ddl)
            .with_context(|| format!("task '{}': invalid deadline '{}'", input.name, input.ddl))?;
        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            anyhow!(
                "task '{}': no such date {}/{} in {}",
                input.name,
                month,
                day,
                year
            )
        })?;
        let deadline = date
            .and_hms_opt(deadline_hour, 0, 0)
            .ok_or_else(|| anyhow!("deadline hour {} out of range", deadline_hour))?;

        let duration = input.duration;
        Ok(Self {
            name: input.name,
            ddl: input.ddl,
            deadline,
            duration,
            completed_work: 0.0,
            importance: input.importance.unwrap_or(DEFAULT_IMPORTANCE),
            mood: input.mood.unwrap_or(DEFAULT_MOOD),
            user_comment: input.user_comment,
            time_to_deadline: 0.0,
            duration_left: duration,
            urgency: 0.0,
            weighted_score: 0.0,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.duration_left <= 0.0
    }

    /// Log `hours` of work. `completed_work` only ever grows.
    pub fn apply_work(&mut self, hours: f64) {
        self.completed_work += hours;
        self.duration_left = (self.duration - self.completed_work).max(0.0);
    }

    /// Recompute the derived fields for the reference instant `now`.
    pub fn refresh(&mut self, calendar: &WorkCalendar, now: NaiveDateTime, model: UrgencyModel) {
        self.time_to_deadline = calendar.available_hours(now, self.deadline);
        self.duration_left = (self.duration - self.completed_work).max(0.0);
        self.urgency = model.score(self.duration_left, self.time_to_deadline);
    }
}

/// Load a task-list JSON file (an array of [`TaskInput`]).
pub fn load_task_inputs(path: impl AsRef<Path>) -> Result<Vec<TaskInput>> {
    let path = path.as_ref();
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse task list {}", path.display()))
}

fn parse_month_day(s: &str) -> Result<(u32, u32)> {
    let re = Regex::new(r"^\s*(\d{1,2})\s*/\s*(\d{1,2})\s*$")?;
    let caps = re
        .captures(s)
        .ok_or_else(|| anyhow!("expected \"M/D\", got '{s}'"))?;
    // Captures are all-digit by construction.
    let month: u32 = caps[1].parse()?;
    let day: u32 = caps[2].parse()?;
    Ok((month, day))
}
