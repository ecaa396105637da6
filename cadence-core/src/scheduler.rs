//! The task scheduler: weighted ranking, daily work-hour retuning, and the
//! stepped day-by-day simulation loop.
//!
//! The engine is single-threaded and step-driven. External collaborators
//! plug in through the [`TaskPicker`] and [`crate::mood::MoodSource`] traits;
//! the loop blocks on them and owns the task collection exclusively.

use anyhow::Result;
use chrono::{Datelike, Duration, NaiveDateTime, Timelike};
use std::path::PathBuf;

use crate::calendar::{STANDARD_END_HOUR, WorkCalendar};
use crate::mood::MoodSource;
use crate::snapshot::{DEADLINE_FORMAT, SnapshotWriter};
use crate::sufficiency::{check_time_sufficiency, extended_end_hour};
use crate::task::{Task, TaskInput};
use crate::urgency::UrgencyModel;

#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    /// Applied as-is to `urgency / 10`; the loop does not normalize.
    pub urgency_weight: f64,
    pub importance_weight: f64,
    pub mood_weight: f64,
    /// Hours logged per step; sessions are 2-hour blocks by default.
    pub work_increment_hours: f64,
    pub top_n: usize,
    pub urgency_model: UrgencyModel,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            urgency_weight: 0.5,
            importance_weight: 0.3,
            mood_weight: 0.2,
            work_increment_hours: 2.0,
            top_n: 3,
            urgency_model: UrgencyModel::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// The clock sits exactly on `work_start_hour:00` of a new day.
    AtWorkStart,
    Working,
    OffHours,
    /// No active tasks remain.
    Terminated,
}

/// What the daily re-baseline decided.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayStart {
    /// True when the end hour moved (including a reset back to standard).
    pub adjusted: bool,
    pub work_end_hour: u32,
    /// Tasks updated from the mood collaborator, when one ran.
    pub mood_updates: Option<usize>,
    pub warnings: Vec<String>,
}

/// One entry of the ranked top-N.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedTask {
    /// Position in the scheduler's task vector.
    pub index: usize,
    pub name: String,
    pub weighted_score: f64,
    pub urgency: f64,
    pub importance: f64,
    pub mood: f64,
    pub duration_left: f64,
    pub deadline: NaiveDateTime,
}

/// Per-task progress line for status output.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskProgress {
    pub index: usize,
    pub name: String,
    pub duration: f64,
    pub completed_work: f64,
    pub duration_left: f64,
    pub time_to_deadline: f64,
    pub urgency: f64,
    pub deadline: NaiveDateTime,
    pub is_complete: bool,
}

/// Everything a picker sees before choosing: the freshly ranked top-N, all
/// task progress, and the snapshot just written.
#[derive(Debug, Clone)]
pub struct StepReport {
    pub time: NaiveDateTime,
    pub work_end_hour: u32,
    /// Present on the first step of each simulated day.
    pub day_start: Option<DayStart>,
    pub ranked: Vec<RankedTask>,
    pub progress: Vec<TaskProgress>,
    pub snapshot: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// Work on the highest-ranked task.
    Default,
    /// Work on `ranked[i]`; out-of-range falls back to the top.
    Ranked(usize),
    /// End the run before logging any work this step.
    Stop,
}

/// The external per-step prompt. Both methods block the loop.
pub trait TaskPicker {
    /// Choose a task from the report's top-N.
    fn pick(&mut self, report: &StepReport) -> Choice;

    /// Called after the chosen task received its work increment. Returning
    /// false stops the run without the in-flight time advance.
    fn confirm_continue(&mut self, worked: &TaskProgress) -> bool {
        let _ = worked;
        true
    }

    /// The clock fell outside working hours and snapped forward.
    fn on_time_skip(&mut self, from: NaiveDateTime, to: NaiveDateTime) {
        let _ = (from, to);
    }
}

/// Never prompts: always works on the highest-ranked task.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoPicker;

impl TaskPicker for AutoPicker {
    fn pick(&mut self, _report: &StepReport) -> Choice {
        Choice::Default
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSummary {
    pub steps: usize,
    pub stopped_by_user: bool,
    pub final_time: NaiveDateTime,
    pub results_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct TaskScheduler {
    config: SchedulerConfig,
    calendar: WorkCalendar,
    start_date: NaiveDateTime,
    current_date: NaiveDateTime,
    tasks: Vec<Task>,
}

impl TaskScheduler {
    /// The start time is normalized into working hours immediately.
    pub fn new(config: SchedulerConfig, calendar: WorkCalendar, start_date: NaiveDateTime) -> Self {
        let current_date = calendar.next_working_time(start_date);
        Self {
            config,
            calendar,
            start_date,
            current_date,
            tasks: Vec::new(),
        }
    }

    /// Resolve the wire-form task list. Deadline years come from the start
    /// date; a bad deadline fails the whole load.
    pub fn load_tasks(&mut self, inputs: Vec<TaskInput>) -> Result<usize> {
        let year = self.start_date.year();
        self.tasks = inputs
            .into_iter()
            .map(|i| Task::from_input(i, year, self.calendar.deadline_hour))
            .collect::<Result<_>>()?;
        Ok(self.tasks.len())
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn tasks_mut(&mut self) -> &mut [Task] {
        &mut self.tasks
    }

    pub fn current_date(&self) -> NaiveDateTime {
        self.current_date
    }

    pub fn calendar(&self) -> &WorkCalendar {
        &self.calendar
    }

    pub fn state(&self) -> SchedulerState {
        if !self.has_active_tasks() {
            SchedulerState::Terminated
        } else if !self.calendar.is_working_hours(self.current_date) {
            SchedulerState::OffHours
        } else if self.at_day_start() {
            SchedulerState::AtWorkStart
        } else {
            SchedulerState::Working
        }
    }

    fn at_day_start(&self) -> bool {
        self.current_date.hour() == self.calendar.work_start_hour
            && self.current_date.minute() == 0
    }

    /// Active: deadline still ahead and work remaining.
    fn active_indices(&self) -> Vec<usize> {
        let now = self.current_date;
        self.tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.deadline > now && t.duration - t.completed_work > 0.0)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn has_active_tasks(&self) -> bool {
        !self.active_indices().is_empty()
    }

    /// Recompute derived fields for every incomplete task. Completed tasks
    /// keep the values frozen at completion time.
    pub fn recalculate_all(&mut self) {
        let now = self.current_date;
        for t in &mut self.tasks {
            if t.is_complete() {
                continue;
            }
            t.refresh(&self.calendar, now, self.config.urgency_model);
        }
    }

    /// Score the active tasks and return the top-N, highest first.
    /// Ties keep input order (stable sort).
    pub fn top_ranked(&mut self) -> Vec<RankedTask> {
        let active = self.active_indices();
        for &i in &active {
            let t = &mut self.tasks[i];
            t.weighted_score = self.config.urgency_weight * (t.urgency / 10.0)
                + self.config.importance_weight * t.importance
                + self.config.mood_weight * t.mood;
        }

        let mut order = active;
        order.sort_by(|&a, &b| {
            self.tasks[b]
                .weighted_score
                .total_cmp(&self.tasks[a].weighted_score)
        });
        order.truncate(self.config.top_n);

        order
            .into_iter()
            .map(|i| {
                let t = &self.tasks[i];
                RankedTask {
                    index: i,
                    name: t.name.clone(),
                    weighted_score: t.weighted_score,
                    urgency: t.urgency,
                    importance: t.importance,
                    mood: t.mood,
                    duration_left: t.duration_left,
                    deadline: t.deadline,
                }
            })
            .collect()
    }

    /// Log `hours` on one task and refresh its derived fields.
    pub fn work_on(&mut self, index: usize, hours: f64) -> Option<&Task> {
        let now = self.current_date;
        let model = self.config.urgency_model;
        let calendar = self.calendar;
        let t = self.tasks.get_mut(index)?;
        t.apply_work(hours);
        t.refresh(&calendar, now, model);
        Some(&self.tasks[index])
    }

    /// Advance the clock one work increment, snapping forward past off-hours.
    pub fn advance_time(&mut self) -> NaiveDateTime {
        let minutes = (self.config.work_increment_hours * 60.0).round() as i64;
        self.current_date += Duration::minutes(minutes);
        if !self.calendar.is_working_hours(self.current_date) {
            self.current_date = self.calendar.next_working_time(self.current_date);
        }
        self.current_date
    }

    /// The daily cycle: retune working hours from a fresh standard baseline,
    /// then recompute every task.
    pub fn begin_day(&mut self) -> DayStart {
        let mut warnings = Vec::new();
        let adjusted = self.check_and_adjust_working_hours(&mut warnings);
        self.recalculate_all();
        DayStart {
            adjusted,
            work_end_hour: self.calendar.work_end_hour,
            mood_updates: None,
            warnings,
        }
    }

    /// Sufficiency check + extension policy (once per simulated day):
    ///
    /// 1. No outstanding work: restore the standard close.
    /// 2. Standard hours suffice: settle on the standard close.
    /// 3. Otherwise re-check under the previously extended close; if that
    ///    still suffices, keep it.
    /// 4. Otherwise extend. The close never moves backwards into the band
    ///    between standard and its current value, and saturates at 24, at
    ///    which point an unsatisfiable schedule is reported as a warning.
    fn check_and_adjust_working_hours(&mut self, warnings: &mut Vec<String>) -> bool {
        let now = self.current_date;
        let has_future = self
            .tasks
            .iter()
            .any(|t| t.deadline > now && t.duration - t.completed_work > 0.0);
        if !has_future {
            self.calendar.work_end_hour = STANDARD_END_HOUR;
            return true;
        }

        let previous_end = self.calendar.work_end_hour;

        self.calendar.work_end_hour = STANDARD_END_HOUR;
        let future = |t: &&Task| t.deadline > now && t.duration - t.completed_work > 0.0;
        let shortfalls =
            check_time_sufficiency(&self.calendar, self.tasks.iter().filter(future), now);
        if shortfalls.is_empty() {
            return false;
        }

        self.calendar.work_end_hour = previous_end;
        let shortfalls =
            check_time_sufficiency(&self.calendar, self.tasks.iter().filter(future), now);
        if shortfalls.is_empty() {
            return false;
        }

        let ext = extended_end_hour(&self.calendar, &shortfalls, now);
        for d in &ext.unrescuable {
            warnings.push(format!(
                "deadline {} can no longer be met by extending hours",
                d.format(DEADLINE_FORMAT)
            ));
        }

        let new_end = ext.new_end_hour;
        if STANDARD_END_HOUR < new_end && new_end < previous_end {
            return false;
        }
        self.calendar.work_end_hour = new_end;

        if new_end == 24 {
            let remaining =
                check_time_sufficiency(&self.calendar, self.tasks.iter().filter(future), now);
            for s in &remaining {
                warnings.push(format!(
                    "even at a 24:00 close, {:.1}h short before {}",
                    s.shortage(),
                    s.deadline.format(DEADLINE_FORMAT)
                ));
            }
        }

        true
    }

    pub fn progress_report(&self) -> Vec<TaskProgress> {
        self.tasks
            .iter()
            .enumerate()
            .map(|(i, _)| self.progress_of(i))
            .collect()
    }

    fn progress_of(&self, index: usize) -> TaskProgress {
        let t = &self.tasks[index];
        TaskProgress {
            index,
            name: t.name.clone(),
            duration: t.duration,
            completed_work: t.completed_work,
            duration_left: t.duration_left,
            time_to_deadline: t.time_to_deadline,
            urgency: t.urgency,
            deadline: t.deadline,
            is_complete: t.is_complete(),
        }
    }

    /// Drive the full simulation (snapshot, prompt, work, advance) until no
    /// active task remains or the picker stops the run. The final results
    /// file is written either way.
    pub fn run(
        &mut self,
        picker: &mut dyn TaskPicker,
        mut mood: Option<&mut dyn MoodSource>,
        writer: &SnapshotWriter,
    ) -> Result<SimulationSummary> {
        self.current_date = self.calendar.next_working_time(self.current_date);

        let mut steps = 0usize;
        let mut stopped_by_user = false;

        loop {
            if !self.calendar.is_working_hours(self.current_date) {
                let from = self.current_date;
                self.current_date = self.calendar.next_working_time(self.current_date);
                picker.on_time_skip(from, self.current_date);
                continue;
            }

            let mut day_start = None;
            if self.at_day_start() {
                let mut mood_warning = None;
                let mut mood_updates = None;
                if let Some(src) = mood.as_deref_mut() {
                    match src.fetch() {
                        Ok(reports) if !reports.is_empty() => {
                            mood_updates =
                                Some(crate::mood::apply_mood_reports(&mut self.tasks, &reports));
                        }
                        Ok(_) => {}
                        Err(e) => mood_warning = Some(format!("mood refresh failed: {e:#}")),
                    }
                }

                let mut day = self.begin_day();
                day.mood_updates = mood_updates;
                if let Some(w) = mood_warning {
                    day.warnings.insert(0, w);
                }
                day_start = Some(day);
            }

            self.recalculate_all();
            let ranked = self.top_ranked();
            if ranked.is_empty() {
                break;
            }

            let snapshot = writer.write_snapshot(&self.tasks, self.current_date)?;
            let report = StepReport {
                time: self.current_date,
                work_end_hour: self.calendar.work_end_hour,
                day_start,
                ranked,
                progress: self.progress_report(),
                snapshot,
            };

            let picked = match picker.pick(&report) {
                Choice::Stop => {
                    stopped_by_user = true;
                    break;
                }
                Choice::Default => 0,
                Choice::Ranked(i) if i < report.ranked.len() => i,
                Choice::Ranked(_) => 0,
            };

            let task_index = report.ranked[picked].index;
            self.work_on(task_index, self.config.work_increment_hours);
            steps += 1;

            if !picker.confirm_continue(&self.progress_of(task_index)) {
                stopped_by_user = true;
                break;
            }

            self.advance_time();
        }

        let results_path = writer.write_results(&self.tasks)?;
        Ok(SimulationSummary {
            steps,
            stopped_by_user,
            final_time: self.current_date,
            results_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn input(name: &str, ddl: &str, duration: f64, importance: f64, mood: f64) -> TaskInput {
        TaskInput {
            name: name.to_string(),
            ddl: ddl.to_string(),
            duration,
            importance: Some(importance),
            mood: Some(mood),
            user_comment: None,
        }
    }

    fn scheduler(tasks: Vec<TaskInput>, start: NaiveDateTime) -> TaskScheduler {
        let mut s = TaskScheduler::new(SchedulerConfig::default(), WorkCalendar::default(), start);
        s.load_tasks(tasks).unwrap();
        s
    }

    #[test]
    fn test_start_time_is_normalized_into_working_hours() {
        let s = scheduler(vec![], at(1, 1, 6));
        assert_eq!(s.current_date(), at(1, 1, 9));
        let s = scheduler(vec![], at(1, 1, 22));
        assert_eq!(s.current_date(), at(1, 2, 9));
    }

    #[test]
    fn test_deadline_year_comes_from_start_date() {
        let s = scheduler(vec![input("a", "3/14", 2.0, 5.0, 5.0)], at(1, 1, 9));
        assert_eq!(s.tasks()[0].deadline, at(3, 14, 19));
    }

    #[test]
    fn test_weighted_score_applies_raw_weights() {
        let mut s = TaskScheduler::new(
            SchedulerConfig {
                urgency_weight: 0.6,
                importance_weight: 0.5,
                mood_weight: 0.2,
                ..SchedulerConfig::default()
            },
            WorkCalendar::default(),
            at(1, 1, 9),
        );
        s.load_tasks(vec![input("a", "1/5", 4.0, 8.0, 3.0)]).unwrap();
        s.recalculate_all();
        let ranked = s.top_ranked();
        let t = &s.tasks()[0];
        // Non-unit weight sums are applied exactly as given.
        let expected = 0.6 * (t.urgency / 10.0) + 0.5 * 8.0 + 0.2 * 3.0;
        assert!((ranked[0].weighted_score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_ranking_is_descending_and_ties_keep_input_order() {
        // Identical tasks tie exactly; a clearly better one leads.
        let mut s = scheduler(
            vec![
                input("tie-first", "1/5", 4.0, 5.0, 5.0),
                input("winner", "1/5", 4.0, 9.0, 9.0),
                input("tie-second", "1/5", 4.0, 5.0, 5.0),
            ],
            at(1, 1, 9),
        );
        s.recalculate_all();
        let ranked = s.top_ranked();
        let names: Vec<&str> = ranked.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["winner", "tie-first", "tie-second"]);
        for w in ranked.windows(2) {
            assert!(w[0].weighted_score >= w[1].weighted_score);
        }
    }

    #[test]
    fn test_completed_and_overdue_tasks_are_not_active() {
        let mut s = scheduler(
            vec![
                input("done", "1/5", 2.0, 5.0, 5.0),
                input("missed", "1/1", 2.0, 5.0, 5.0),
                input("live", "1/5", 2.0, 5.0, 5.0),
            ],
            at(1, 2, 9),
        );
        s.work_on(0, 2.0);
        s.recalculate_all();
        let ranked = s.top_ranked();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].name, "live");
    }

    #[test]
    fn test_duration_left_invariant_through_mutations() {
        let mut s = scheduler(vec![input("a", "1/5", 5.0, 5.0, 5.0)], at(1, 1, 9));
        for _ in 0..4 {
            s.work_on(0, 2.0);
            let t = &s.tasks()[0];
            assert_eq!(t.duration_left, (t.duration - t.completed_work).max(0.0));
        }
        assert!(s.tasks()[0].is_complete());
    }

    #[test]
    fn test_advance_time_snaps_past_the_close() {
        let mut s = scheduler(vec![input("a", "1/9", 40.0, 5.0, 5.0)], at(1, 1, 9));
        assert_eq!(s.advance_time(), at(1, 1, 11));
        // 11 -> 13 -> 15 -> 17, then 17:00 + 2h = 19:00 snaps to next morning.
        for _ in 0..4 {
            s.advance_time();
        }
        assert_eq!(s.current_date(), at(1, 2, 9));
    }

    #[test]
    fn test_begin_day_extends_hours_for_overloaded_deadline() {
        // 22h due tomorrow, only 20 effective hours under standard policy:
        // 2h short over 1 adjustable day -> close moves to 21.
        let mut s = scheduler(vec![input("crunch", "1/2", 22.0, 5.0, 5.0)], at(1, 1, 9));
        let day = s.begin_day();
        assert!(day.adjusted);
        assert_eq!(day.work_end_hour, 21);
        assert_eq!(s.calendar().work_end_hour, 21);
        assert!(day.warnings.is_empty());
    }

    #[test]
    fn test_begin_day_restores_standard_close_when_load_clears() {
        let mut s = scheduler(vec![input("easy", "1/4", 4.0, 5.0, 5.0)], at(1, 1, 9));
        s.calendar.work_end_hour = 23;
        let day = s.begin_day();
        assert_eq!(day.work_end_hour, STANDARD_END_HOUR);
    }

    #[test]
    fn test_begin_day_keeps_extended_close_when_it_still_suffices() {
        // 22h due tomorrow: standard hours are short, but yesterday's 23:00
        // close gives 14 + 10 = 24 effective hours. Keep it.
        let mut s = scheduler(vec![input("crunch", "1/2", 22.0, 5.0, 5.0)], at(1, 1, 9));
        s.calendar.work_end_hour = 23;
        let day = s.begin_day();
        assert!(!day.adjusted);
        assert_eq!(s.calendar().work_end_hour, 23);
    }

    #[test]
    fn test_begin_day_warns_when_even_midnight_is_not_enough() {
        let mut s = scheduler(vec![input("doomed", "1/2", 60.0, 5.0, 5.0)], at(1, 1, 9));
        let day = s.begin_day();
        assert_eq!(day.work_end_hour, 24);
        assert!(day.warnings.iter().any(|w| w.contains("24:00")));
    }

    #[test]
    fn test_begin_day_flags_unrescuable_same_day_deadline() {
        // Due today at 19:00 with 14h left: no adjustable day remains.
        let mut s = scheduler(vec![input("today", "1/1", 14.0, 5.0, 5.0)], at(1, 1, 9));
        let day = s.begin_day();
        assert!(day.warnings.iter().any(|w| w.contains("2025-01-01 19:00")));
        assert_eq!(day.work_end_hour, STANDARD_END_HOUR);
    }

    #[test]
    fn test_tight_task_outranks_important_one_and_triggers_extension() {
        let mut s = scheduler(
            vec![
                input("essay", "1/3", 4.0, 8.0, 5.0),
                input("crunch", "1/2", 22.0, 3.0, 8.0),
            ],
            at(1, 1, 9),
        );
        let day = s.begin_day();
        assert!(day.work_end_hour > STANDARD_END_HOUR);

        s.recalculate_all();
        let ranked = s.top_ranked();
        assert_eq!(ranked[0].name, "crunch");
        assert!(ranked[0].urgency > ranked[1].urgency);
    }

    #[test]
    fn test_run_terminates_when_all_work_is_done() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::create(dir.path()).unwrap();
        let mut s = scheduler(
            vec![
                input("a", "1/6", 4.0, 5.0, 5.0),
                input("b", "1/6", 2.0, 5.0, 5.0),
            ],
            at(1, 1, 9),
        );

        let summary = s.run(&mut AutoPicker, None, &writer).unwrap();
        assert!(!summary.stopped_by_user);
        // 6 hours of work at 2h per step.
        assert_eq!(summary.steps, 3);
        assert!(s.tasks().iter().all(|t| t.is_complete()));
        assert!(summary.results_path.ends_with("output.json"));
        assert!(summary.results_path.exists());
    }

    #[test]
    fn test_run_with_nothing_active_terminates_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::create(dir.path()).unwrap();
        let mut s = scheduler(vec![input("missed", "1/1", 4.0, 5.0, 5.0)], at(1, 2, 9));

        let summary = s.run(&mut AutoPicker, None, &writer).unwrap();
        assert_eq!(summary.steps, 0);
        assert!(!summary.stopped_by_user);
        assert!(summary.results_path.exists());
    }

    #[test]
    fn test_stop_skips_the_inflight_time_advance() {
        struct StopAfterWork;
        impl TaskPicker for StopAfterWork {
            fn pick(&mut self, _r: &StepReport) -> Choice {
                Choice::Default
            }
            fn confirm_continue(&mut self, _w: &TaskProgress) -> bool {
                false
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::create(dir.path()).unwrap();
        let mut s = scheduler(vec![input("a", "1/6", 8.0, 5.0, 5.0)], at(1, 1, 9));

        let summary = s.run(&mut StopAfterWork, None, &writer).unwrap();
        assert!(summary.stopped_by_user);
        assert_eq!(summary.steps, 1);
        // Work was logged, but the clock never advanced.
        assert_eq!(s.tasks()[0].completed_work, 2.0);
        assert_eq!(summary.final_time, at(1, 1, 9));
    }

    #[test]
    fn test_run_snapshots_before_each_selection() {
        struct AssertSnapshot;
        impl TaskPicker for AssertSnapshot {
            fn pick(&mut self, report: &StepReport) -> Choice {
                assert!(report.snapshot.exists());
                Choice::Default
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::create(dir.path()).unwrap();
        let mut s = scheduler(vec![input("a", "1/6", 2.0, 5.0, 5.0)], at(1, 1, 9));
        s.run(&mut AssertSnapshot, None, &writer).unwrap();
        assert!(dir.path().join("tasks_20250101_0900.json").exists());
    }

    #[test]
    fn test_run_applies_mood_reports_at_day_start() {
        struct OneShot(bool);
        impl MoodSource for OneShot {
            fn fetch(&mut self) -> Result<Vec<crate::mood::MoodReport>> {
                if self.0 {
                    return Ok(vec![]);
                }
                self.0 = true;
                Ok(vec![crate::mood::MoodReport {
                    event_name: "a".to_string(),
                    mood: 9.0,
                }])
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::create(dir.path()).unwrap();
        let mut s = scheduler(vec![input("a", "1/6", 2.0, 5.0, 5.0)], at(1, 1, 9));
        let mut source = OneShot(false);
        s.run(&mut AutoPicker, Some(&mut source), &writer).unwrap();
        assert_eq!(s.tasks()[0].mood, 9.0);
    }

    #[test]
    fn test_mood_source_failure_is_a_warning_not_an_error() {
        struct Broken;
        impl MoodSource for Broken {
            fn fetch(&mut self) -> Result<Vec<crate::mood::MoodReport>> {
                anyhow::bail!("collaborator down")
            }
        }

        struct SawWarning(bool);
        impl TaskPicker for SawWarning {
            fn pick(&mut self, report: &StepReport) -> Choice {
                if let Some(day) = &report.day_start {
                    if day.warnings.iter().any(|w| w.contains("mood refresh")) {
                        self.0 = true;
                    }
                }
                Choice::Default
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::create(dir.path()).unwrap();
        let mut s = scheduler(vec![input("a", "1/6", 2.0, 5.0, 5.0)], at(1, 1, 9));
        let mut picker = SawWarning(false);
        let mut source = Broken;
        let summary = s.run(&mut picker, Some(&mut source), &writer).unwrap();
        assert!(picker.0);
        assert_eq!(summary.steps, 1);
    }

    #[test]
    fn test_state_classification() {
        let mut s = scheduler(vec![input("a", "1/6", 4.0, 5.0, 5.0)], at(1, 1, 9));
        assert_eq!(s.state(), SchedulerState::AtWorkStart);
        s.advance_time();
        assert_eq!(s.state(), SchedulerState::Working);
        s.current_date = at(1, 1, 20);
        assert_eq!(s.state(), SchedulerState::OffHours);
        s.current_date = at(1, 1, 11);
        s.work_on(0, 4.0);
        assert_eq!(s.state(), SchedulerState::Terminated);
    }
}
