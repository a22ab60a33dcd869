//! CSV export and import.
//!
//! Only id, text, priority, due date, category, completion and tags travel
//! through CSV. Subtasks, attachments, collaborators, recurrence, effort,
//! notes and timestamps are dropped on export and left empty on import.

use std::path::Path;

use chrono::NaiveDate;
use csv::{ErrorKind, ReaderBuilder, StringRecord, WriterBuilder};
use tracing::{debug, warn};

use crate::error::Result;
use crate::fields::Priority;
use crate::task::Task;

pub const CSV_HEADER: [&str; 7] = ["ID", "Text", "Priority", "DueDate", "Category", "IsComplete", "Tags"];
const TAG_SEPARATOR: char = '|';

/// A CSV row that was not imported, with its 1-based line number.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    pub line: usize,
    pub reason: String,
}

/// Parsed rows (paired with their line numbers) plus the rows that were rejected.
#[derive(Debug, Default)]
pub struct ParsedCsv {
    pub rows: Vec<(usize, Task)>,
    pub skipped: Vec<SkippedRow>,
}

/// Write `tasks` to `path`, replacing any existing file. Returns the row count.
pub fn export_csv<'a, I>(path: &Path, tasks: I) -> Result<usize>
where
    I: IntoIterator<Item = &'a Task>,
{
    let mut wtr = WriterBuilder::new().from_path(path)?;
    wtr.write_record(CSV_HEADER)?;
    let mut count = 0;
    for task in tasks {
        let due = task.due_date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default();
        let tags = task.tags.join(&TAG_SEPARATOR.to_string());
        wtr.write_record([
            task.id.to_string(),
            task.text.clone(),
            task.priority.ordinal().to_string(),
            due,
            task.category.clone(),
            task.is_complete.to_string(),
            tags,
        ])?;
        count += 1;
    }
    wtr.flush()?;
    debug!(path = %path.display(), count, "exported tasks");
    Ok(count)
}

/// Read tasks from a CSV file written by [`export_csv`]. The first line is
/// treated as a header and skipped. Rows with a field count other than seven,
/// with bytes that are not UTF-8, or with unparsable values, are collected in
/// `skipped`.
pub fn read_csv(path: &Path) -> Result<ParsedCsv> {
    let mut rdr = ReaderBuilder::new().has_headers(true).flexible(true).from_path(path)?;
    let mut parsed = ParsedCsv::default();
    for result in rdr.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => match e.kind() {
                ErrorKind::Utf8 { pos, err } => {
                    let line = pos.as_ref().map(|p| p.line() as usize).unwrap_or(0);
                    let reason = format!("invalid UTF-8 in field {}", err.field() + 1);
                    warn!(line, %reason, "skipping CSV row");
                    parsed.skipped.push(SkippedRow { line, reason });
                    continue;
                }
                _ => return Err(e.into()),
            },
        };
        let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
        match parse_record(&record) {
            Ok(task) => parsed.rows.push((line, task)),
            Err(reason) => {
                warn!(line, %reason, "skipping CSV row");
                parsed.skipped.push(SkippedRow { line, reason });
            }
        }
    }
    Ok(parsed)
}

fn parse_record(record: &StringRecord) -> std::result::Result<Task, String> {
    if record.len() != CSV_HEADER.len() {
        return Err(format!("expected {} fields, found {}", CSV_HEADER.len(), record.len()));
    }
    let field = |i: usize| record.get(i).unwrap_or("");

    let id = field(0).trim().parse::<u64>().map_err(|_| format!("invalid id '{}'", field(0)))?;
    let priority = field(2)
        .trim()
        .parse::<i64>()
        .map_err(|_| format!("invalid priority '{}'", field(2)))
        .and_then(Priority::try_from)?;
    let due = match field(3).trim() {
        "" => None,
        s => Some(NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| format!("invalid due date '{s}'"))?),
    };
    let is_complete = field(5)
        .trim()
        .parse::<bool>()
        .map_err(|_| format!("invalid completion flag '{}'", field(5)))?;

    let mut task = Task::new(id, field(1), priority, due, field(4));
    task.is_complete = is_complete;
    task.tags = field(6)
        .split(TAG_SEPARATOR)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    Ok(task)
}
