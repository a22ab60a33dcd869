//! Table rendering for task lists, single tasks and reports.

use chrono::NaiveDate;
use prettytable::{row, Cell, Row, Table};

use crate::fields::Priority;
use crate::query::Report;
use crate::task::Task;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn task_table(tasks: &[&Task], today: NaiveDate) -> Table {
    let mut table = Table::new();
    table.set_titles(row!["ID", "Description", "Priority", "Due Date", "Category", "Status", "Subtasks"]);
    for task in tasks {
        let (done, total) = task.subtask_progress();
        table.add_row(Row::new(vec![
            Cell::new(&task.id.to_string()),
            Cell::new(&task.text),
            priority_cell(task.priority),
            Cell::new(&due_label(task, today)),
            Cell::new(&task.category),
            Cell::new(status_label(task)),
            Cell::new(&format!("{done}/{total}")),
        ]));
    }
    table
}

/// Every stored field of one task as a two-column table.
pub fn task_detail(task: &Task) -> Table {
    let mut table = Table::new();
    table.add_row(row!["ID", task.id]);
    table.add_row(row!["Description", task.text]);
    table.add_row(Row::new(vec![Cell::new("Priority"), priority_cell(task.priority)]));
    table.add_row(row!["Due Date", or_dash(task.due_date.map(|d| d.format(DATE_FORMAT).to_string()))]);
    table.add_row(row!["Category", dash_if_empty(&task.category)]);
    table.add_row(row!["Status", status_label(task)]);
    table.add_row(row!["Tags", join_or_dash(&task.tags)]);
    table.add_row(row!["Recurring", task.recurring_cron.as_deref().unwrap_or("-")]);
    table.add_row(row!["Estimated (min)", task.estimated_time]);
    table.add_row(row!["Actual (min)", task.actual_time]);
    table.add_row(row!["Attachments", join_or_dash(&task.attachments)]);
    table.add_row(row!["Collaborators", join_or_dash(&task.collaborators)]);
    table.add_row(row!["Created", or_dash(task.created_at.map(|t| t.to_rfc3339()))]);
    table.add_row(row!["Completed", or_dash(task.completed_at.map(|t| t.to_rfc3339()))]);
    table.add_row(row!["Notes", dash_if_empty(&task.notes)]);

    let subtasks = if task.subtasks.is_empty() {
        "-".to_string()
    } else {
        task.subtasks
            .iter()
            .map(|s| format!("[{}] {}. {}", if s.is_complete { "x" } else { " " }, s.id, s.text))
            .collect::<Vec<_>>()
            .join("\n")
    };
    table.add_row(row!["Subtasks", subtasks]);
    table
}

pub fn report_table(report: &Report) -> Table {
    let mut table = Table::new();
    table.add_row(row!["Completed Tasks", report.completed]);
    table.add_row(row!["Total Estimated Time (min)", report.total_estimated]);
    table.add_row(row!["Total Actual Time (min)", report.total_actual]);
    if let Some(efficiency) = report.efficiency {
        table.add_row(row!["Efficiency", format!("{efficiency:.2}%")]);
    }
    table
}

fn priority_cell(priority: Priority) -> Cell {
    let spec = match priority {
        Priority::Low => "Fg",
        Priority::Medium => "Fy",
        Priority::High => "Fr",
    };
    Cell::new(priority.label()).style_spec(spec)
}

fn due_label(task: &Task, today: NaiveDate) -> String {
    match task.due_date {
        None => String::new(),
        Some(d) if d < today && !task.is_complete => format!("{} (Overdue)", d.format(DATE_FORMAT)),
        Some(d) => d.format(DATE_FORMAT).to_string(),
    }
}

fn status_label(task: &Task) -> &'static str {
    if task.is_complete {
        "Completed"
    } else {
        "Pending"
    }
}

fn or_dash(value: Option<String>) -> String {
    value.unwrap_or_else(|| "-".into())
}

fn dash_if_empty(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}

fn join_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".into()
    } else {
        items.join(", ")
    }
}
