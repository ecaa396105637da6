//! Deadline sufficiency: can the current working-hours policy still finish
//! everything on time, and if not, how far must the daily close move?

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;

use crate::calendar::WorkCalendar;
use crate::task::Task;

/// One deadline the current policy cannot satisfy.
#[derive(Debug, Clone, PartialEq)]
pub struct Insufficiency {
    pub deadline: NaiveDateTime,
    /// Outstanding hours across this deadline group and every earlier one.
    pub required_hours: f64,
    pub available_hours: f64,
}

impl Insufficiency {
    pub fn shortage(&self) -> f64 {
        self.required_hours - self.available_hours
    }
}

/// Check whether the calendar leaves enough time for `tasks`, grouped by
/// deadline date in ascending order.
///
/// Required hours accumulate: work due earlier competes for the same time
/// budget as every later deadline, so each group is checked against the sum
/// of all outstanding work up to and including it.
pub fn check_time_sufficiency<'a>(
    calendar: &WorkCalendar,
    tasks: impl IntoIterator<Item = &'a Task>,
    now: NaiveDateTime,
) -> Vec<Insufficiency> {
    let mut by_day: BTreeMap<NaiveDate, Vec<&Task>> = BTreeMap::new();
    for t in tasks {
        by_day.entry(t.deadline.date()).or_default().push(t);
    }

    let mut shortfalls = Vec::new();
    let mut required_hours = 0.0;

    for group in by_day.values() {
        required_hours += group
            .iter()
            .map(|t| t.duration - t.completed_work)
            .sum::<f64>();

        let deadline = group[0].deadline;
        let available_hours = calendar.available_hours(now, deadline);

        if required_hours > available_hours {
            shortfalls.push(Insufficiency {
                deadline,
                required_hours,
                available_hours,
            });
        }
    }

    shortfalls
}

/// Result of the work-hours extension calculation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extension {
    /// Proposed daily close, capped at 24.
    pub new_end_hour: u32,
    /// Deadlines with no adjustable day left (the deadline day is already
    /// here); extending hours cannot rescue these.
    pub unrescuable: Vec<NaiveDateTime>,
}

/// Distribute each shortage evenly over the days remaining before its
/// deadline and propose a new daily close.
///
/// The day count runs from `now`'s date up to, but not including, the
/// deadline day: a deadline tomorrow has exactly one adjustable day
/// (today). The extra hours are rounded up to an even number because work
/// sessions are quantized to 2-hour blocks.
pub fn extended_end_hour(
    calendar: &WorkCalendar,
    shortfalls: &[Insufficiency],
    now: NaiveDateTime,
) -> Extension {
    let mut max_extra: u32 = 0;
    let mut unrescuable = Vec::new();

    for s in shortfalls {
        let days = (s.deadline.date() - now.date()).num_days();
        if days <= 0 {
            unrescuable.push(s.deadline);
            continue;
        }
        let per_day = (s.shortage() / days as f64).ceil() as u32;
        max_extra = max_extra.max(per_day);
    }

    if max_extra % 2 != 0 {
        max_extra += 1;
    }

    Extension {
        new_end_hour: (calendar.work_end_hour + max_extra).min(24),
        unrescuable,
    }
}
