//! Command implementations shared by the flag interface and the interactive menu.
//!
//! Every handler writes its result through the `Console`. A task id that does
//! not exist is reported to the user and is not an error; only persistence,
//! CSV and input failures propagate.

use std::io::{self, BufRead, Write};
use std::path::Path;

use chrono::{Datelike, Duration, Local, Months, NaiveDate, Utc};
use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::auth;
use crate::cli::Cli;
use crate::console::Console;
use crate::error::{Error, Result};
use crate::fields::{Priority, SortKey};
use crate::query;
use crate::repo::TaskRepository;
use crate::scheduler;
use crate::transfer;
use crate::view;

/// Values given on the command line for a new task. Missing ones are prompted for.
#[derive(Debug, Default, Clone)]
pub struct AddOptions {
    pub priority: Option<Priority>,
    pub due: Option<String>,
    pub category: Option<String>,
}

/// Add a new task to the repository.
pub fn cmd_add<R: BufRead, W: Write>(
    repo: &mut TaskRepository,
    console: &mut Console<R, W>,
    text: &str,
    opts: AddOptions,
) -> Result<()> {
    let today = Local::now().date_naive();
    let priority = match opts.priority {
        Some(p) => p,
        None => ask_priority(console)?,
    };
    let due = match opts.due.as_deref() {
        Some(raw) if raw.trim().is_empty() => None,
        Some(raw) => Some(
            parse_due_input(raw, today)
                .ok_or_else(|| Error::InvalidFormat(format!("unrecognised due date '{raw}'")))?,
        ),
        None => ask_due(console, today)?,
    };
    let category = match opts.category {
        Some(c) => c.trim().to_string(),
        None => console.prompt("Enter category:")?,
    };

    let task = repo.add(text, priority, due, &category)?;
    let msg = format!("Task added: {} (id {})", task.text, task.id);
    console.success(msg)
}

fn ask_priority<R: BufRead, W: Write>(console: &mut Console<R, W>) -> Result<Priority> {
    loop {
        let answer = console.prompt("Enter priority (0: Low, 1: Medium, 2: High):")?;
        if answer.is_empty() {
            return Ok(Priority::default());
        }
        match answer.parse() {
            Ok(p) => return Ok(p),
            Err(e) => console.warn(e)?,
        }
    }
}

fn ask_due<R: BufRead, W: Write>(console: &mut Console<R, W>, today: NaiveDate) -> Result<Option<NaiveDate>> {
    loop {
        let answer = console.prompt("Enter due date (YYYY-MM-DD, today, tomorrow, in 3d... or leave empty):")?;
        if answer.is_empty() {
            return Ok(None);
        }
        match parse_due_input(&answer, today) {
            Some(d) => return Ok(Some(d)),
            None => console.warn(format!("Unrecognised due date '{answer}'"))?,
        }
    }
}

/// Remove a task by id.
pub fn cmd_delete<R: BufRead, W: Write>(repo: &mut TaskRepository, console: &mut Console<R, W>, id: u64) -> Result<()> {
    if repo.remove(id)? {
        console.success(format!("Task removed: {id}"))
    } else {
        not_found(console, id)
    }
}

/// List tasks, optionally restricted to one category and sorted.
pub fn cmd_list<R: BufRead, W: Write>(
    repo: &TaskRepository,
    console: &mut Console<R, W>,
    category: &str,
    sort: Option<SortKey>,
) -> Result<()> {
    if repo.tasks().is_empty() {
        return console.info("No tasks");
    }
    let mut tasks = query::filter(repo.tasks(), category);
    if tasks.is_empty() {
        return console.info(format!("No tasks in category '{category}'"));
    }
    query::sort(&mut tasks, sort);
    console.table(&view::task_table(&tasks, Local::now().date_naive()))
}

/// Mark a task as completed.
pub fn cmd_complete<R: BufRead, W: Write>(repo: &mut TaskRepository, console: &mut Console<R, W>, id: u64) -> Result<()> {
    if repo.complete(id, Some(Utc::now()))? {
        console.success(format!("Task marked as complete: {id}"))
    } else {
        not_found(console, id)
    }
}

pub fn cmd_add_subtask<R: BufRead, W: Write>(
    repo: &mut TaskRepository,
    console: &mut Console<R, W>,
    id: u64,
    text: &str,
) -> Result<()> {
    match repo.add_subtask(id, text)? {
        Some(sub_id) => console.success(format!("Subtask {sub_id} added to task {id}: {text}")),
        None => not_found(console, id),
    }
}

pub fn cmd_complete_subtask<R: BufRead, W: Write>(
    repo: &mut TaskRepository,
    console: &mut Console<R, W>,
    id: u64,
    subtask_id: u64,
) -> Result<()> {
    if repo.get(id).is_none() {
        return not_found(console, id);
    }
    if repo.complete_subtask(id, subtask_id)? {
        console.success(format!("Subtask {subtask_id} of task {id} marked as complete"))
    } else {
        console.warn(format!("Subtask {subtask_id} not found in task {id}"))
    }
}

pub fn cmd_export<R: BufRead, W: Write>(repo: &TaskRepository, console: &mut Console<R, W>, path: &Path) -> Result<()> {
    let count = transfer::export_csv(path, repo.tasks())?;
    console.success(format!("Exported {count} task(s) to {}", path.display()))
}

/// Append tasks from a CSV file. Malformed rows and rows whose id is taken are reported.
pub fn cmd_import<R: BufRead, W: Write>(repo: &mut TaskRepository, console: &mut Console<R, W>, path: &Path) -> Result<()> {
    let parsed = transfer::read_csv(path)?;
    let summary = repo.import(parsed.rows)?;

    let mut skipped = parsed.skipped;
    skipped.extend(summary.skipped);
    skipped.sort_by_key(|s| s.line);
    for row in &skipped {
        console.warn(format!("Skipped line {}: {}", row.line, row.reason))?;
    }
    console.success(format!(
        "Imported {} task(s) from {}, {} skipped",
        summary.imported,
        path.display(),
        skipped.len()
    ))
}

pub fn cmd_add_attachment<R: BufRead, W: Write>(
    repo: &mut TaskRepository,
    console: &mut Console<R, W>,
    id: u64,
    name: &str,
) -> Result<()> {
    if repo.add_attachment(id, name)? {
        console.success(format!("Attachment added to task {id}: {name}"))
    } else {
        not_found(console, id)
    }
}

pub fn cmd_add_collaborator<R: BufRead, W: Write>(
    repo: &mut TaskRepository,
    console: &mut Console<R, W>,
    id: u64,
    name: &str,
) -> Result<()> {
    if repo.add_collaborator(id, name)? {
        console.success(format!("Collaborator added to task {id}: {name}"))
    } else {
        not_found(console, id)
    }
}

pub fn cmd_add_tag<R: BufRead, W: Write>(repo: &mut TaskRepository, console: &mut Console<R, W>, id: u64, tag: &str) -> Result<()> {
    if tag.is_empty() {
        return Err(Error::InvalidFormat("tag must not be empty".into()));
    }
    if repo.add_tag(id, tag)? {
        console.success(format!("Tag added to task {id}: {tag}"))
    } else {
        not_found(console, id)
    }
}

/// Set or clear (with an empty expression) a task's recurrence.
pub fn cmd_set_recurrence<R: BufRead, W: Write>(
    repo: &mut TaskRepository,
    console: &mut Console<R, W>,
    id: u64,
    expr: &str,
) -> Result<()> {
    if !expr.trim().is_empty() {
        scheduler::parse_schedule(expr)?;
    }
    if !repo.set_recurrence(id, expr)? {
        return not_found(console, id);
    }
    if expr.trim().is_empty() {
        console.success(format!("Recurrence cleared for task {id}"))
    } else {
        console.success(format!("Task {id} recurs on '{}'", expr.trim()))
    }
}

pub fn cmd_set_estimate<R: BufRead, W: Write>(
    repo: &mut TaskRepository,
    console: &mut Console<R, W>,
    id: u64,
    minutes: u32,
) -> Result<()> {
    if repo.set_estimate(id, minutes)? {
        console.success(format!("Estimated time for task {id} set to {minutes} min"))
    } else {
        not_found(console, id)
    }
}

pub fn cmd_set_actual<R: BufRead, W: Write>(
    repo: &mut TaskRepository,
    console: &mut Console<R, W>,
    id: u64,
    minutes: u32,
) -> Result<()> {
    if repo.set_actual(id, minutes)? {
        console.success(format!("Actual time for task {id} set to {minutes} min"))
    } else {
        not_found(console, id)
    }
}

pub fn cmd_set_notes<R: BufRead, W: Write>(
    repo: &mut TaskRepository,
    console: &mut Console<R, W>,
    id: u64,
    notes: &str,
) -> Result<()> {
    if repo.set_notes(id, notes)? {
        console.success(format!("Notes updated for task {id}"))
    } else {
        not_found(console, id)
    }
}

/// Effort summary over completed tasks.
pub fn cmd_report<R: BufRead, W: Write>(repo: &TaskRepository, console: &mut Console<R, W>) -> Result<()> {
    console.table(&view::report_table(&query::report(repo.tasks())))
}

pub fn cmd_search<R: BufRead, W: Write>(repo: &TaskRepository, console: &mut Console<R, W>, keyword: &str) -> Result<()> {
    let found = query::search(repo.tasks(), keyword);
    if found.is_empty() {
        return console.info(format!("No tasks found matching the keyword: {keyword}"));
    }
    console.table(&view::task_table(&found, Local::now().date_naive()))
}

/// Show every field of one task.
pub fn cmd_view<R: BufRead, W: Write>(repo: &TaskRepository, console: &mut Console<R, W>, id: u64) -> Result<()> {
    match repo.get(id) {
        Some(task) => console.table(&view::task_detail(task)),
        None => not_found(console, id),
    }
}

/// Ask for a new password (with confirmation) and store its bcrypt hash.
pub fn cmd_set_password<R: BufRead, W: Write>(repo: &mut TaskRepository, console: &mut Console<R, W>, cost: u32) -> Result<()> {
    let plain = auth::read_password(console, "New password", true)?;
    if plain.is_empty() {
        return Err(Error::InvalidFormat("password must not be empty".into()));
    }
    repo.set_password_hash(auth::hash_password(&plain, cost)?)?;
    console.success("Password set successfully.")
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut io::stdout());
}

fn not_found<R: BufRead, W: Write>(console: &mut Console<R, W>, id: u64) -> Result<()> {
    console.warn(format!("Task not found: {id}"))
}

/// Split an `ID,VALUE` argument. The value keeps any further commas.
pub fn parse_id_pair(raw: &str) -> Result<(u64, String)> {
    let Some((id, value)) = raw.split_once(',') else {
        return Err(Error::InvalidFormat(format!("expected ID,VALUE but got '{raw}'")));
    };
    Ok((parse_task_id(id)?, value.trim().to_string()))
}

pub fn parse_task_id(raw: &str) -> Result<u64> {
    raw.trim()
        .parse()
        .map_err(|_| Error::InvalidFormat(format!("invalid task id '{}'", raw.trim())))
}

/// Parse human-readable due date input relative to `today`.
///
/// Supports:
/// - "today", "tomorrow", "yesterday"
/// - "monday", "next monday", "this friday" and three-letter forms
/// - "weekend", "end of week" / "eow", "end of month" / "eom"
/// - "in 3d", "in 2w", "in 1m"
/// - "YYYY-MM-DD"
pub fn parse_due_input(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "yesterday" => return Some(today - Duration::days(1)),
        "end of week" | "eow" => {
            let weekday = today.weekday().num_days_from_monday() as i64;
            return Some(today + Duration::days(6 - weekday));
        }
        "end of month" | "eom" => {
            let first = today.with_day(1)?;
            return Some(first.checked_add_months(Months::new(1))? - Duration::days(1));
        }
        "this weekend" | "weekend" => {
            let days_until_saturday = (5 + 7 - today.weekday().num_days_from_monday()) % 7;
            return Some(today + Duration::days(days_until_saturday as i64));
        }
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        let rest = rest.trim();
        let count = |suffix: char| rest.strip_suffix(suffix).and_then(|n| n.trim().parse::<u32>().ok());
        if let Some(days) = count('d') {
            return Some(today + Duration::days(days.into()));
        }
        if let Some(weeks) = count('w') {
            return Some(today + Duration::weeks(weeks.into()));
        }
        if let Some(months) = count('m') {
            return today.checked_add_months(Months::new(months));
        }
        return None;
    }

    let weekdays = [
        ("monday", 0), ("tuesday", 1), ("wednesday", 2), ("thursday", 3),
        ("friday", 4), ("saturday", 5), ("sunday", 6),
        ("mon", 0), ("tue", 1), ("wed", 2), ("thu", 3),
        ("fri", 4), ("sat", 5), ("sun", 6),
    ];
    let current = today.weekday().num_days_from_monday() as i64;
    for (day_name, target) in weekdays {
        let days_ahead = (target + 7 - current) % 7;
        if s == day_name || s == format!("this {day_name}") {
            return Some(today + Duration::days(days_ahead));
        }
        if s == format!("next {day_name}") {
            let days = if days_ahead == 0 { 7 } else { days_ahead + 7 };
            return Some(today + Duration::days(days));
        }
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}
