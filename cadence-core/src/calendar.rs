//! Working-hours calendar: converts between wall-clock time and effective
//! working hours.
//!
//! The day runs `[work_start_hour, work_end_hour)`. The end hour is the only
//! mutable part of the policy; the daily re-check resets it to
//! [`STANDARD_END_HOUR`] before deciding whether an extension is needed.

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};

/// Standard close of the working day (19:00).
pub const STANDARD_END_HOUR: u32 = 19;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkCalendar {
    pub work_start_hour: u32,
    /// Mutable: the daily sufficiency check may push this toward 24.
    pub work_end_hour: u32,
    /// Hour-of-day at which deadlines fall, independent of the end hour.
    pub deadline_hour: u32,
}

impl Default for WorkCalendar {
    fn default() -> Self {
        Self {
            work_start_hour: 9,
            work_end_hour: STANDARD_END_HOUR,
            deadline_hour: STANDARD_END_HOUR,
        }
    }
}

impl WorkCalendar {
    pub fn new(work_start_hour: u32, work_end_hour: u32, deadline_hour: u32) -> Self {
        Self {
            work_start_hour,
            work_end_hour,
            deadline_hour,
        }
    }

    /// Hours in a full working day under the current policy.
    pub fn daily_hours(&self) -> u32 {
        self.work_end_hour.saturating_sub(self.work_start_hour)
    }

    pub fn is_working_hours(&self, t: NaiveDateTime) -> bool {
        self.work_start_hour <= t.hour() && t.hour() < self.work_end_hour
    }

    /// Snap a time forward to the next instant inside working hours.
    ///
    /// Idempotent: applying it to its own output returns the same value.
    pub fn next_working_time(&self, t: NaiveDateTime) -> NaiveDateTime {
        if t.hour() >= self.work_end_hour {
            day_at(t.date() + Duration::days(1), self.work_start_hour)
        } else if t.hour() < self.work_start_hour {
            day_at(t.date(), self.work_start_hour)
        } else {
            t
        }
    }

    /// Effective working hours between `from` and `deadline`.
    ///
    /// On the deadline's own day work stops at `deadline_hour`, not at the
    /// (possibly extended) close. On a multi-day span the deadline-day
    /// contribution is `deadline_hour - work_start_hour` regardless of the
    /// current end hour; only the same-day branch caps at
    /// `min(deadline_hour, work_end_hour)`.
    ///
    /// Minutes are truncated: the simulation clock only ever sits on whole
    /// hours.
    pub fn available_hours(&self, from: NaiveDateTime, deadline: NaiveDateTime) -> f64 {
        let deadline_day = deadline.date();
        if from.date() > deadline_day {
            return 0.0;
        }

        if from.date() == deadline_day {
            let end = self.deadline_hour.min(self.work_end_hour);
            let start = from.hour().max(self.work_start_hour);
            if start >= end {
                return 0.0;
            }
            return f64::from(end - start);
        }

        let mut total = 0.0;

        // Remainder of today, if the close hasn't passed yet.
        if from.hour() < self.work_end_hour {
            let start = from.hour().max(self.work_start_hour);
            total += f64::from(self.work_end_hour - start);
        }

        // Full intervening days.
        let mut day = from.date() + Duration::days(1);
        while day < deadline_day {
            total += f64::from(self.daily_hours());
            day += Duration::days(1);
        }

        // Deadline day itself.
        total += f64::from(self.deadline_hour.saturating_sub(self.work_start_hour));

        total
    }
}

fn day_at(date: NaiveDate, hour: u32) -> NaiveDateTime {
    date.and_hms_opt(hour, 0, 0).expect("hour must be < 24")
}
