//! Recurring-task notifier.
//!
//! Each task with a recurrence expression gets a thread that sleeps until the
//! next occurrence and then reports the task as due. Threads own a copy of
//! the task text and never touch the repository. Dropping the `Notifier`
//! disconnects their stop channels; each thread exits when it next wakes.

use std::str::FromStr;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::Local;
use cron::Schedule;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::task::Task;

type DueCallback = dyn Fn(&str) + Send + Sync;

pub struct Notifier {
    stops: Vec<Sender<()>>,
}

impl Notifier {
    /// Start one schedule per recurring task. Invalid expressions are logged and skipped.
    pub fn start<F>(tasks: &[Task], on_due: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let on_due: Arc<DueCallback> = Arc::new(on_due);
        let mut stops = Vec::new();
        for task in tasks {
            let Some(expr) = task.recurring_cron.as_deref() else {
                continue;
            };
            let schedule = match parse_schedule(expr) {
                Ok(schedule) => schedule,
                Err(e) => {
                    warn!(id = task.id, error = %e, "ignoring recurrence");
                    continue;
                }
            };
            let (tx, rx) = mpsc::channel();
            let text = task.text.clone();
            let callback = Arc::clone(&on_due);
            let spawned = thread::Builder::new()
                .name(format!("recur-{}", task.id))
                .spawn(move || run_schedule(&schedule, &text, &rx, callback.as_ref()));
            match spawned {
                Ok(_) => {
                    debug!(id = task.id, expr, "scheduled recurring task");
                    stops.push(tx);
                }
                Err(e) => warn!(id = task.id, error = %e, "could not start recurrence thread"),
            }
        }
        Notifier { stops }
    }

    /// Number of running schedules.
    pub fn active(&self) -> usize {
        self.stops.len()
    }

    /// Stop all schedules. Callbacks already running are not waited for.
    pub fn stop(&mut self) {
        self.stops.clear();
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Default notice printed when a recurring task comes due.
pub fn print_due(text: &str) {
    println!("Recurring task due: {text}");
}

fn run_schedule(schedule: &Schedule, text: &str, stop: &Receiver<()>, on_due: &DueCallback) {
    let mut after = Local::now();
    while let Some(next) = schedule.after(&after).next() {
        let wait = (next - Local::now()).to_std().unwrap_or(Duration::ZERO);
        match stop.recv_timeout(wait) {
            Err(RecvTimeoutError::Timeout) => on_due(text),
            _ => return,
        }
        // Occurrences missed while the callback ran are skipped.
        after = next.max(Local::now());
    }
}

/// Parse a recurrence expression.
///
/// Five-field crontab expressions (minute hour day month weekday, Sunday = 0)
/// are accepted and converted; six- and seven-field expressions with seconds
/// and `@daily`-style shorthands are passed through unchanged.
pub fn parse_schedule(expr: &str) -> Result<Schedule> {
    Schedule::from_str(&normalize_expression(expr)).map_err(|e| Error::InvalidRecurrence {
        expr: expr.to_string(),
        reason: e.to_string(),
    })
}

pub fn normalize_expression(expr: &str) -> String {
    let expr = expr.trim();
    let fields: Vec<&str> = expr.split_whitespace().collect();
    if fields.len() != 5 {
        return fields.join(" ");
    }
    format!("0 {} {} {} {} {}", fields[0], fields[1], fields[2], fields[3], shift_weekdays(fields[4]))
}

/// Crontab numbers weekdays 0-6 from Sunday; the cron crate uses 1-7.
fn shift_weekdays(field: &str) -> String {
    field
        .split(',')
        .map(|part| {
            let (range, step) = match part.split_once('/') {
                Some((range, step)) => (range, Some(step)),
                None => (part, None),
            };
            let range = range
                .split('-')
                .map(|v| match v.parse::<u8>() {
                    Ok(n) => (n % 7 + 1).to_string(),
                    Err(_) => v.to_string(),
                })
                .collect::<Vec<_>>()
                .join("-");
            match step {
                Some(step) => format!("{range}/{step}"),
                None => range,
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}
