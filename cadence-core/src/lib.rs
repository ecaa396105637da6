//! cadence-core: the scheduling/urgency engine behind the Cadence task
//! simulator.
//!
//! Given tasks with deadlines, durations, importance and mood, the engine
//! computes time-decaying urgency, keeps a weighted priority ranking, and
//! steps a two-hour-block work schedule that stretches the working day when
//! deadlines come under pressure.

pub mod calendar;
pub mod mood;
pub mod scheduler;
pub mod snapshot;
pub mod sufficiency;
pub mod task;
pub mod urgency;

pub use calendar::{STANDARD_END_HOUR, WorkCalendar};
pub use mood::{GENERAL_EVENT, MoodReport, MoodSource, apply_mood_reports, parse_mood_reports};
pub use scheduler::{
    AutoPicker, Choice, DayStart, RankedTask, SchedulerConfig, SchedulerState, SimulationSummary,
    StepReport, TaskPicker, TaskProgress, TaskScheduler,
};
pub use snapshot::{
    DEADLINE_FORMAT, SnapshotWriter, TaskRecord, assign_ranks, read_records, write_records,
};
pub use sufficiency::{Extension, Insufficiency, check_time_sufficiency, extended_end_hour};
pub use task::{DEFAULT_IMPORTANCE, DEFAULT_MOOD, Task, TaskInput, load_task_inputs};
pub use urgency::UrgencyModel;
