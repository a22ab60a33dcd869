//! Filtering, sorting, searching and reporting over task lists.

use std::borrow::Borrow;

use crate::fields::SortKey;
use crate::task::Task;

/// Tasks whose category equals `category` exactly. An empty category keeps everything.
pub fn filter<'a>(tasks: &'a [Task], category: &str) -> Vec<&'a Task> {
    if category.is_empty() {
        return tasks.iter().collect();
    }
    tasks.iter().filter(|t| t.category == category).collect()
}

/// Stable in-place sort. `None` leaves the order untouched.
pub fn sort<T: Borrow<Task>>(tasks: &mut [T], key: Option<SortKey>) {
    match key {
        Some(SortKey::Priority) => tasks.sort_by(|a, b| b.borrow().priority.cmp(&a.borrow().priority)),
        // A missing due date sorts first.
        Some(SortKey::Due) => tasks.sort_by(|a, b| a.borrow().due_date.cmp(&b.borrow().due_date)),
        Some(SortKey::Category) => tasks.sort_by(|a, b| a.borrow().category.cmp(&b.borrow().category)),
        None => {}
    }
}

/// Case-insensitive match on description or category substrings, or an exact tag.
pub fn search<'a>(tasks: &'a [Task], keyword: &str) -> Vec<&'a Task> {
    let needle = keyword.to_lowercase();
    tasks
        .iter()
        .filter(|t| {
            t.text.to_lowercase().contains(&needle)
                || t.category.to_lowercase().contains(&needle)
                || t.has_tag(keyword)
        })
        .collect()
}

/// Effort totals over completed tasks.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub completed: usize,
    pub total_estimated: u64,
    pub total_actual: u64,
    /// Estimated / actual as a percentage; `None` when no actual time was logged.
    pub efficiency: Option<f64>,
}

pub fn report(tasks: &[Task]) -> Report {
    let done = tasks.iter().filter(|t| t.is_complete);
    let (completed, total_estimated, total_actual) = done.fold((0usize, 0u64, 0u64), |(n, est, act), t| {
        (n + 1, est + u64::from(t.estimated_time), act + u64::from(t.actual_time))
    });
    let efficiency = (total_actual > 0).then(|| total_estimated as f64 / total_actual as f64 * 100.0);
    Report {
        completed,
        total_estimated,
        total_actual,
        efficiency,
    }
}
