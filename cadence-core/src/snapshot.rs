//! Snapshot/result writer: ordered, synchronous JSON dumps of task state.
//!
//! Per-step snapshots land in the output directory as
//! `tasks_YYYYmmdd_HHMM.json`; the final results as `output.json`. Records
//! round-trip: the input fields keep their wire names so a snapshot can be
//! reloaded as a task list.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::task::Task;

pub const DEADLINE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Serialized task state: the wire fields plus everything derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    #[serde(alias = "assignment_name")]
    pub name: String,
    #[serde(rename = "DDL")]
    pub ddl: String,
    pub duration: f64,
    pub importance: f64,
    pub mood: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_comment: Option<String>,

    /// Formatted with [`DEADLINE_FORMAT`].
    pub deadline: String,
    pub completed_work: f64,
    pub duration_left: f64,
    pub urgency: f64,
    pub time_to_deadline: f64,
    pub weighted_score: f64,

    /// 1-based position after ranking; absent until assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<usize>,
}

impl TaskRecord {
    pub fn from_task(t: &Task) -> Self {
        Self {
            name: t.name.clone(),
            ddl: t.ddl.clone(),
            duration: t.duration,
            importance: t.importance,
            mood: t.mood,
            user_comment: t.user_comment.clone(),
            deadline: t.deadline.format(DEADLINE_FORMAT).to_string(),
            completed_work: t.completed_work,
            duration_left: t.duration_left,
            urgency: t.urgency,
            time_to_deadline: t.time_to_deadline,
            weighted_score: t.weighted_score,
            rank: None,
        }
    }
}

/// Sort by weighted score (descending, stable) and assign 1-based ranks.
pub fn assign_ranks(records: &mut [TaskRecord]) {
    records.sort_by(|a, b| b.weighted_score.total_cmp(&a.weighted_score));
    for (i, r) in records.iter_mut().enumerate() {
        r.rank = Some(i + 1);
    }
}

pub fn write_records(path: &Path, records: &[TaskRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    fs::write(path, json).with_context(|| format!("write {}", path.display()))
}

pub fn read_records(path: &Path) -> Result<Vec<TaskRecord>> {
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse records {}", path.display()))
}

/// Writes snapshots and final results under one owned directory.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    dir: PathBuf,
}

impl SnapshotWriter {
    /// Create the output directory if needed.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist all tasks, keyed by the simulation clock.
    pub fn write_snapshot(&self, tasks: &[Task], now: NaiveDateTime) -> Result<PathBuf> {
        let stamp = now.format("%Y%m%d_%H%M");
        let path = self.dir.join(format!("tasks_{stamp}.json"));
        let records: Vec<TaskRecord> = tasks.iter().map(TaskRecord::from_task).collect();
        write_records(&path, &records)?;
        Ok(path)
    }

    /// Final results on termination.
    pub fn write_results(&self, tasks: &[Task]) -> Result<PathBuf> {
        let path = self.dir.join("output.json");
        let records: Vec<TaskRecord> = tasks.iter().map(TaskRecord::from_task).collect();
        write_records(&path, &records)?;
        Ok(path)
    }
}
