//! Interactive simulation driver: wires the scheduler loop to stdin prompts,
//! per-step narration, and the optional LLM collaborators.

use anyhow::{Context, Result};
use cadence_core::{
    Choice, MoodSource, SchedulerConfig, SimulationSummary, SnapshotWriter, STANDARD_END_HOUR,
    StepReport, TaskPicker, TaskProgress, TaskScheduler, WorkCalendar, load_task_inputs,
};
use chrono::NaiveDateTime;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::config;
use crate::explain;
use crate::llm::{self, LlmConfig};
use crate::mood_intake::NoteMoodSource;

pub const CLOCK_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug)]
pub struct SimulateOpts {
    pub tasks: PathBuf,
    pub start: Option<String>,
    pub output_dir: PathBuf,
    pub urgency_weight: Option<f64>,
    pub importance_weight: Option<f64>,
    pub mood_weight: Option<f64>,
    pub auto: bool,
    pub max_steps: Option<usize>,
    pub mood_note: Option<String>,
    pub explain: bool,
}

pub fn run_simulate(opts: SimulateOpts) -> Result<()> {
    let cfg = config::load_config()?;

    let mut weights = cfg.weights.clone();
    if let Some(u) = opts.urgency_weight {
        weights.urgency = u;
    }
    if let Some(i) = opts.importance_weight {
        weights.importance = i;
    }
    if let Some(m) = opts.mood_weight {
        weights.mood = m;
    }
    let (urgency_weight, importance_weight, mood_weight) = weights.normalized();

    let calendar = WorkCalendar::new(
        cfg.schedule.work_start_hour,
        cfg.schedule.work_end_hour,
        cfg.schedule.deadline_hour,
    );
    let start = parse_start(opts.start.as_deref())?;

    let scheduler_config = SchedulerConfig {
        urgency_weight,
        importance_weight,
        mood_weight,
        work_increment_hours: cfg.schedule.work_increment_hours,
        top_n: cfg.schedule.top_n,
        urgency_model: cfg.schedule.urgency_model,
    };

    let mut scheduler = TaskScheduler::new(scheduler_config, calendar, start);
    let count = scheduler.load_tasks(load_task_inputs(&opts.tasks)?)?;
    println!("Loaded {count} tasks from {}", opts.tasks.display());
    println!(
        "Initial time: {}",
        scheduler.current_date().format(CLOCK_FORMAT)
    );

    let writer = SnapshotWriter::create(&opts.output_dir)?;

    let llm_config = llm::resolve_config(&cfg.llm)?;
    if (opts.explain || opts.mood_note.is_some()) && llm_config.is_none() {
        println!("warning: no LLM credentials found; collaborator features are disabled");
        println!("         (run `cadence auth paste-anthropic-token` or set ANTHROPIC_API_KEY)");
    }

    let mut mood_source = match (&opts.mood_note, &llm_config) {
        (Some(note), Some(l)) => {
            let names: Vec<String> = scheduler.tasks().iter().map(|t| t.name.clone()).collect();
            Some(NoteMoodSource::new(l.clone(), names, note.clone()))
        }
        _ => None,
    };

    let mut picker = InteractivePicker {
        auto: opts.auto,
        max_steps: opts.max_steps,
        steps: 0,
        increment: cfg.schedule.work_increment_hours,
        explain: opts.explain,
        llm: llm_config,
        work_start_hour: cfg.schedule.work_start_hour,
    };

    let summary = scheduler.run(
        &mut picker,
        mood_source.as_mut().map(|s| s as &mut dyn MoodSource),
        &writer,
    )?;

    print_final_report(&scheduler, &summary);
    Ok(())
}

fn parse_start(start: Option<&str>) -> Result<NaiveDateTime> {
    match start {
        Some(s) => NaiveDateTime::parse_from_str(s, CLOCK_FORMAT)
            .with_context(|| format!("invalid start time '{s}' (expected YYYY-MM-DD HH:MM)")),
        None => chrono::Local::now()
            .date_naive()
            .and_hms_opt(9, 0, 0)
            .context("construct default 09:00 start"),
    }
}

struct InteractivePicker {
    auto: bool,
    max_steps: Option<usize>,
    steps: usize,
    increment: f64,
    explain: bool,
    llm: Option<LlmConfig>,
    work_start_hour: u32,
}

impl TaskPicker for InteractivePicker {
    fn pick(&mut self, report: &StepReport) -> Choice {
        println!("\nCurrent time point: {}", report.time.format(CLOCK_FORMAT));

        if let Some(day) = &report.day_start {
            println!("\nNew day begins, checking today's work hour arrangement...");
            if let Some(n) = day.mood_updates {
                println!("Mood collaborator updated {n} task(s)");
            }
            for w in &day.warnings {
                println!("warning: {w}");
            }
            if day.work_end_hour > STANDARD_END_HOUR {
                println!(
                    "Work hours extended to {}:00-{}:00",
                    self.work_start_hour, day.work_end_hour
                );
            } else {
                println!(
                    "Standard work hours ({}:00-{}:00) are enough",
                    self.work_start_hour, day.work_end_hour
                );
            }
        }

        println!("\nCurrent task status:");
        for p in report.progress.iter().filter(|p| !p.is_complete) {
            println!("  {}", p.name);
            println!(
                "    accumulated work: {:.1}h of {:.1}h",
                p.completed_work, p.duration
            );
            println!("    remaining work: {:.1}h", p.duration_left);
            println!(
                "    effective hours before deadline: {:.2}",
                p.time_to_deadline
            );
            println!("    urgency: {:.2}%", p.urgency);
        }

        println!("\nSaved task snapshot to {}", report.snapshot.display());

        println!(
            "\nTop {} suggested tasks by weighted score:",
            report.ranked.len()
        );
        for (i, r) in report.ranked.iter().enumerate() {
            println!(
                "{}. {}: score {:.2} (urgency {:.2}%, importance {}, mood {}), {:.1}h left, due {}",
                i + 1,
                r.name,
                r.weighted_score,
                r.urgency,
                r.importance,
                r.mood,
                r.duration_left,
                r.deadline.format(CLOCK_FORMAT)
            );
        }

        if self.explain {
            if let Some(llm) = &self.llm {
                println!("\nWhy these tasks are prioritized:");
                match explain::explain_snapshot(llm, &report.snapshot, None) {
                    Ok(text) => println!("{text}"),
                    Err(e) => println!("warning: explanation unavailable: {e:#}"),
                }
            }
        }

        if self.auto {
            return Choice::Default;
        }

        print!(
            "\nWhich task for the next {:.0} hours? (1-{}, Enter for the top ranked): ",
            self.increment,
            report.ranked.len()
        );
        io::stdout().flush().ok();
        match read_line_trimmed() {
            None => Choice::Stop,
            Some(s) if s.is_empty() => Choice::Default,
            Some(s) => match s.parse::<usize>() {
                Ok(n) if n >= 1 && n <= report.ranked.len() => Choice::Ranked(n - 1),
                _ => Choice::Default,
            },
        }
    }

    fn confirm_continue(&mut self, worked: &TaskProgress) -> bool {
        self.steps += 1;

        println!("\nLogged {:.1}h of work on: {}", self.increment, worked.name);
        println!("  accumulated work: {:.1}h", worked.completed_work);
        println!("  remaining work: {:.1}h", worked.duration_left);
        println!(
            "  effective hours before deadline: {:.2}",
            worked.time_to_deadline
        );
        if worked.is_complete {
            println!("  task complete");
        }

        if let Some(max) = self.max_steps {
            if self.steps >= max {
                println!("\nReached the step limit ({max}); stopping.");
                return false;
            }
        }
        if self.auto {
            return true;
        }

        print!("\nPress Enter to continue, or type 'stop': ");
        io::stdout().flush().ok();
        match read_line_trimmed() {
            None => false,
            Some(s) => !s.eq_ignore_ascii_case("stop"),
        }
    }

    fn on_time_skip(&mut self, from: NaiveDateTime, to: NaiveDateTime) {
        println!(
            "\nNot during working hours, adjusted: {} -> {}",
            from.format(CLOCK_FORMAT),
            to.format(CLOCK_FORMAT)
        );
    }
}

/// Returns `None` on EOF or a read error; callers treat that as "stop".
fn read_line_trimmed() -> Option<String> {
    let mut s = String::new();
    match io::stdin().read_line(&mut s) {
        Ok(0) => None,
        Ok(_) => Some(s.trim().to_string()),
        Err(_) => None,
    }
}

fn print_final_report(scheduler: &TaskScheduler, summary: &SimulationSummary) {
    if summary.stopped_by_user {
        println!("\nStopped by user.");
    } else {
        println!("\nAll tasks completed or deadlines reached, ending simulation.");
    }

    println!("\nFinal results for all tasks:");
    for p in scheduler.progress_report() {
        println!("\n{}", p.name);
        println!("  duration: {:.1}h", p.duration);
        println!("  completed: {:.1}h", p.completed_work);
        println!("  remaining: {:.1}h", p.duration_left);
        println!("  urgency: {:.2}%", p.urgency);
        println!("  deadline: {}", p.deadline.format(CLOCK_FORMAT));
    }

    println!(
        "\n{} steps simulated; final time {}",
        summary.steps,
        summary.final_time.format(CLOCK_FORMAT)
    );
    println!("Results saved to {}", summary.results_path.display());
}
