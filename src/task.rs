//! Task data structure and related functionality.
//!
//! This module defines the core `Task` record and its `Subtask` children, with
//! the JSON field names used by the backing file.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::compat::{self, null_as_default};
use crate::fields::Priority;

/// A checklist item scoped to one task. Ids are unique only within the parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default)]
    pub is_complete: bool,
}

/// A to-do item with scheduling, categorisation and collaboration metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "name", alias = "text", default, deserialize_with = "null_as_default")]
    pub text: String,
    pub id: u64,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, with = "compat::date")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default)]
    pub is_complete: bool,
    #[serde(rename = "subtask", default, deserialize_with = "null_as_default")]
    pub subtasks: Vec<Subtask>,
    #[serde(rename = "recuring_cron", default, with = "compat::blank_as_none")]
    pub recurring_cron: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attachments: Vec<String>,
    #[serde(default, with = "compat::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "compat::timestamp")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Minutes.
    #[serde(default)]
    pub estimated_time: u32,
    /// Minutes.
    #[serde(default)]
    pub actual_time: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
    #[serde(rename = "Collaborators", default, deserialize_with = "null_as_default")]
    pub collaborators: Vec<String>,
}

impl Task {
    /// A fresh, incomplete task with every optional field empty.
    pub fn new(id: u64, text: &str, priority: Priority, due_date: Option<NaiveDate>, category: &str) -> Self {
        Task {
            text: text.to_string(),
            id,
            priority,
            due_date,
            category: category.to_string(),
            is_complete: false,
            subtasks: Vec::new(),
            recurring_cron: None,
            tags: Vec::new(),
            attachments: Vec::new(),
            created_at: None,
            completed_at: None,
            estimated_time: 0,
            actual_time: 0,
            notes: String::new(),
            collaborators: Vec::new(),
        }
    }

    /// Next subtask id: the last subtask's id + 1, or 1 for the first.
    /// `None` when the last id is `u64::MAX`.
    pub fn next_subtask_id(&self) -> Option<u64> {
        self.subtasks.last().map_or(Some(1), |s| s.id.checked_add(1))
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        let tag = tag.to_lowercase();
        self.tags.iter().any(|t| t.to_lowercase() == tag)
    }

    pub fn subtask_progress(&self) -> (usize, usize) {
        let done = self.subtasks.iter().filter(|s| s.is_complete).count();
        (done, self.subtasks.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_legacy_task_json() {
        let json = r#"{
            "name": "Water plants",
            "id": 4,
            "priority": 1,
            "due_date": "2024-06-01T00:00:00Z",
            "category": "home",
            "is_complete": false,
            "subtask": null,
            "recuring_cron": "0 9 * * 1",
            "tags": ["Garden"],
            "attachments": null,
            "created_at": "0001-01-01T00:00:00Z",
            "completed_at": "0001-01-01T00:00:00Z",
            "estimated_time": 15,
            "actual_time": 0,
            "notes": "",
            "Collaborators": null
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.text, "Water plants");
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2024, 6, 1));
        assert_eq!(task.recurring_cron.as_deref(), Some("0 9 * * 1"));
        assert!(task.subtasks.is_empty());
        assert!(task.collaborators.is_empty());
        assert_eq!(task.created_at, None);
        assert_eq!(task.estimated_time, 15);
    }

    #[test]
    fn test_text_alias_accepted() {
        let task: Task = serde_json::from_str(r#"{"text": "aliased", "id": 1}"#).unwrap();
        assert_eq!(task.text, "aliased");
        assert_eq!(task.priority, Priority::Low);
    }

    #[test]
    fn test_serialized_keys() {
        let task = Task::new(1, "buy milk", Priority::Low, None, "errand");
        let value = serde_json::to_value(&task).unwrap();
        let obj = value.as_object().unwrap();
        for key in [
            "name", "id", "priority", "due_date", "category", "is_complete", "subtask", "recuring_cron",
            "tags", "attachments", "created_at", "completed_at", "estimated_time", "actual_time", "notes",
            "Collaborators",
        ] {
            assert!(obj.contains_key(key), "missing key {key}");
        }
        assert_eq!(obj["recuring_cron"], "");
        assert_eq!(obj["priority"], 0);
    }

    #[test]
    fn test_next_subtask_id_follows_last() {
        let mut task = Task::new(1, "t", Priority::Low, None, "");
        assert_eq!(task.next_subtask_id(), Some(1));
        task.subtasks.push(Subtask { id: 5, text: "a".into(), is_complete: false });
        task.subtasks.push(Subtask { id: 2, text: "b".into(), is_complete: true });
        assert_eq!(task.next_subtask_id(), Some(3));
        assert_eq!(task.subtask_progress(), (1, 2));
        task.subtasks.push(Subtask { id: u64::MAX, text: "c".into(), is_complete: false });
        assert_eq!(task.next_subtask_id(), None);
    }

    #[test]
    fn test_has_tag_ignores_case() {
        let mut task = Task::new(1, "t", Priority::Low, None, "");
        task.tags.push("Urgent".into());
        assert!(task.has_tag("urgent"));
        assert!(!task.has_tag("urg"));
    }
}
