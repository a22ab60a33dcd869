//! The task repository: an ordered, file-backed task collection.
//!
//! Every mutating operation writes the whole database back to disk before
//! returning. Operations addressing a task by id return `Ok(false)` (or
//! `Ok(None)`) when no task has that id; only persistence failures are errors.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, warn};

use crate::db::Database;
use crate::error::{Error, Result};
use crate::fields::Priority;
use crate::task::{Subtask, Task};
use crate::transfer::SkippedRow;

/// Outcome of appending imported rows.
#[derive(Debug, Default)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: Vec<SkippedRow>,
}

pub struct TaskRepository {
    db: Database,
    path: PathBuf,
}

impl TaskRepository {
    pub fn new(db: Database, path: impl Into<PathBuf>) -> Self {
        TaskRepository { db, path: path.into() }
    }

    /// Load the repository backed by `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let db = Database::load(&path)?;
        Ok(TaskRepository { db, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All tasks in insertion order.
    pub fn tasks(&self) -> &[Task] {
        &self.db.tasks
    }

    pub fn get(&self, id: u64) -> Option<&Task> {
        self.db.get(id)
    }

    pub fn password_hash(&self) -> Option<&[u8]> {
        self.db.password.as_deref()
    }

    pub fn set_password_hash(&mut self, hash: Vec<u8>) -> Result<()> {
        self.db.password = Some(hash);
        self.persist()
    }

    /// Append a new task with the next id and persist it.
    pub fn add(&mut self, text: &str, priority: Priority, due_date: Option<NaiveDate>, category: &str) -> Result<&Task> {
        let id = self
            .db
            .next_id()
            .ok_or_else(|| Error::InvalidFormat("no task id left after the last task".into()))?;
        let mut task = Task::new(id, text, priority, due_date, category);
        task.created_at = Some(Utc::now());
        self.db.tasks.push(task);
        self.persist()?;
        debug!(id, "added task");
        Ok(&self.db.tasks[self.db.tasks.len() - 1])
    }

    /// Remove the first task with `id`; later tasks keep their ids and order.
    pub fn remove(&mut self, id: u64) -> Result<bool> {
        let Some(idx) = self.db.tasks.iter().position(|t| t.id == id) else {
            return Ok(false);
        };
        self.db.tasks.remove(idx);
        self.persist()?;
        debug!(id, "removed task");
        Ok(true)
    }

    /// Mark a task complete. `completed_at` is only written when supplied.
    pub fn complete(&mut self, id: u64, completed_at: Option<DateTime<Utc>>) -> Result<bool> {
        self.update(id, |t| {
            t.is_complete = true;
            if completed_at.is_some() {
                t.completed_at = completed_at;
            }
        })
    }

    /// Append a subtask and return its id, or `None` if the task is missing.
    pub fn add_subtask(&mut self, id: u64, text: &str) -> Result<Option<u64>> {
        let Some(task) = self.db.get_mut(id) else {
            return Ok(None);
        };
        let sub_id = task
            .next_subtask_id()
            .ok_or_else(|| Error::InvalidFormat(format!("no subtask id left in task {id}")))?;
        task.subtasks.push(Subtask {
            id: sub_id,
            text: text.to_string(),
            is_complete: false,
        });
        self.persist()?;
        Ok(Some(sub_id))
    }

    /// Mark one subtask complete. `false` if either the task or the subtask is missing.
    pub fn complete_subtask(&mut self, id: u64, subtask_id: u64) -> Result<bool> {
        let found = self
            .db
            .get_mut(id)
            .and_then(|t| t.subtasks.iter_mut().find(|s| s.id == subtask_id))
            .map(|s| s.is_complete = true)
            .is_some();
        if found {
            self.persist()?;
        }
        Ok(found)
    }

    pub fn add_attachment(&mut self, id: u64, name: &str) -> Result<bool> {
        self.update(id, |t| t.attachments.push(name.to_string()))
    }

    pub fn add_collaborator(&mut self, id: u64, name: &str) -> Result<bool> {
        self.update(id, |t| t.collaborators.push(name.to_string()))
    }

    /// Add a tag unless the task already carries it (compared case-insensitively).
    pub fn add_tag(&mut self, id: u64, tag: &str) -> Result<bool> {
        self.update(id, |t| {
            if !t.has_tag(tag) {
                t.tags.push(tag.to_string());
            }
        })
    }

    /// Set the cron expression; an empty string clears it.
    pub fn set_recurrence(&mut self, id: u64, expr: &str) -> Result<bool> {
        let expr = expr.trim();
        self.update(id, |t| t.recurring_cron = (!expr.is_empty()).then(|| expr.to_string()))
    }

    pub fn set_estimate(&mut self, id: u64, minutes: u32) -> Result<bool> {
        self.update(id, |t| t.estimated_time = minutes)
    }

    pub fn set_actual(&mut self, id: u64, minutes: u32) -> Result<bool> {
        self.update(id, |t| t.actual_time = minutes)
    }

    pub fn set_notes(&mut self, id: u64, notes: &str) -> Result<bool> {
        self.update(id, |t| t.notes = notes.to_string())
    }

    /// Append imported tasks, keeping their ids. Rows whose id is already taken
    /// are skipped. Persists once, after all rows.
    pub fn import(&mut self, tasks: Vec<(usize, Task)>) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();
        let mut taken: HashSet<u64> = self.db.tasks.iter().map(|t| t.id).collect();
        for (line, task) in tasks {
            if !taken.insert(task.id) {
                warn!(line, id = task.id, "skipping imported row with duplicate id");
                summary.skipped.push(SkippedRow {
                    line,
                    reason: format!("task id {} already exists", task.id),
                });
                continue;
            }
            self.db.tasks.push(task);
            summary.imported += 1;
        }
        self.persist()?;
        Ok(summary)
    }

    fn update<F: FnOnce(&mut Task)>(&mut self, id: u64, f: F) -> Result<bool> {
        let Some(task) = self.db.get_mut(id) else {
            return Ok(false);
        };
        f(task);
        self.persist()?;
        Ok(true)
    }

    fn persist(&self) -> Result<()> {
        self.db.save(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> (tempfile::TempDir, TaskRepository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = TaskRepository::open(dir.path().join("db.json")).unwrap();
        (dir, repo)
    }

    fn reload(repo: &TaskRepository) -> Database {
        Database::load(repo.path()).unwrap()
    }

    fn ids(repo: &TaskRepository) -> Vec<u64> {
        repo.tasks().iter().map(|t| t.id).collect()
    }

    #[test]
    fn test_add_assigns_sequential_ids() {
        let (_dir, mut repo) = repo();
        for i in 0..5 {
            repo.add(&format!("task {i}"), Priority::Low, None, "").unwrap();
        }
        assert_eq!(ids(&repo), vec![1, 2, 3, 4, 5]);
        assert_eq!(reload(&repo).tasks.len(), 5);
    }

    #[test]
    fn test_add_then_remove_scenario() {
        let (_dir, mut repo) = repo();
        let due = NaiveDate::from_ymd_opt(2025, 1, 1);
        let task = repo.add("buy milk", Priority::Low, due, "errand").unwrap();
        assert_eq!(task.id, 1);
        assert!(!task.is_complete);
        assert!(task.created_at.is_some());

        assert!(repo.remove(1).unwrap());
        assert!(repo.tasks().is_empty());
        assert!(reload(&repo).tasks.is_empty());
        assert!(!repo.remove(1).unwrap());
    }

    #[test]
    fn test_remove_keeps_other_ids_and_order() {
        let (_dir, mut repo) = repo();
        for text in ["a", "b", "c", "d"] {
            repo.add(text, Priority::Low, None, "").unwrap();
        }
        assert!(repo.remove(2).unwrap());
        assert_eq!(ids(&repo), vec![1, 3, 4]);
        let texts: Vec<&str> = repo.tasks().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "c", "d"]);
    }

    #[test]
    fn test_id_follows_last_task_not_max() {
        let (_dir, mut repo) = repo();
        for text in ["a", "b", "c"] {
            repo.add(text, Priority::Low, None, "").unwrap();
        }
        // Removing the last task frees its id for reuse.
        repo.remove(3).unwrap();
        assert_eq!(repo.add("d", Priority::Low, None, "").unwrap().id, 3);

        // Removing from the middle does not.
        repo.remove(2).unwrap();
        assert_eq!(repo.add("e", Priority::Low, None, "").unwrap().id, 4);
    }

    #[test]
    fn test_add_after_max_id_fails_cleanly() {
        let (_dir, mut repo) = repo();
        repo.import(vec![(2, Task::new(u64::MAX, "imported", Priority::Low, None, ""))]).unwrap();
        assert!(matches!(repo.add("next", Priority::Low, None, ""), Err(Error::InvalidFormat(_))));
        assert_eq!(ids(&repo), vec![u64::MAX]);
        assert_eq!(reload(&repo).tasks.len(), 1);
    }

    #[test]
    fn test_complete_sets_flag_and_optional_timestamp() {
        let (_dir, mut repo) = repo();
        repo.add("a", Priority::Low, None, "").unwrap();
        repo.add("b", Priority::Low, None, "").unwrap();

        assert!(repo.complete(1, None).unwrap());
        assert!(repo.get(1).unwrap().is_complete);
        assert!(repo.get(1).unwrap().completed_at.is_none());

        let at = Utc::now();
        assert!(repo.complete(2, Some(at)).unwrap());
        assert_eq!(repo.get(2).unwrap().completed_at, Some(at));
        assert!(reload(&repo).tasks[1].is_complete);

        assert!(!repo.complete(99, None).unwrap());
    }

    #[test]
    fn test_subtask_ids_are_per_task() {
        let (_dir, mut repo) = repo();
        repo.add("a", Priority::Low, None, "").unwrap();
        repo.add("b", Priority::Low, None, "").unwrap();
        assert_eq!(repo.add_subtask(1, "a1").unwrap(), Some(1));
        assert_eq!(repo.add_subtask(1, "a2").unwrap(), Some(2));
        assert_eq!(repo.add_subtask(2, "b1").unwrap(), Some(1));
        assert_eq!(repo.add_subtask(3, "nope").unwrap(), None);
        assert_eq!(reload(&repo).tasks[0].subtasks.len(), 2);
    }

    #[test]
    fn test_complete_subtask() {
        let (_dir, mut repo) = repo();
        repo.add("a", Priority::Low, None, "").unwrap();
        repo.add_subtask(1, "a1").unwrap();
        assert!(repo.complete_subtask(1, 1).unwrap());
        assert!(repo.get(1).unwrap().subtasks[0].is_complete);
        assert!(!repo.complete_subtask(1, 2).unwrap());
        assert!(!repo.complete_subtask(2, 1).unwrap());
    }

    #[test]
    fn test_append_style_mutators() {
        let (_dir, mut repo) = repo();
        repo.add("a", Priority::Low, None, "").unwrap();
        assert!(repo.add_attachment(1, "plan.pdf").unwrap());
        assert!(repo.add_collaborator(1, "sam").unwrap());
        assert!(repo.add_tag(1, "Home").unwrap());
        assert!(repo.add_tag(1, "home").unwrap());
        assert!(!repo.add_attachment(9, "x").unwrap());
        assert!(!repo.add_collaborator(9, "x").unwrap());

        let saved = reload(&repo);
        assert_eq!(saved.tasks[0].attachments, vec!["plan.pdf"]);
        assert_eq!(saved.tasks[0].collaborators, vec!["sam"]);
        assert_eq!(saved.tasks[0].tags, vec!["Home"]);
    }

    #[test]
    fn test_field_setters() {
        let (_dir, mut repo) = repo();
        repo.add("a", Priority::Low, None, "").unwrap();
        assert!(repo.set_recurrence(1, " 0 9 * * * ").unwrap());
        assert_eq!(repo.get(1).unwrap().recurring_cron.as_deref(), Some("0 9 * * *"));
        assert!(repo.set_recurrence(1, "").unwrap());
        assert_eq!(repo.get(1).unwrap().recurring_cron, None);
        assert!(repo.set_estimate(1, 30).unwrap());
        assert!(repo.set_actual(1, 45).unwrap());
        assert!(repo.set_notes(1, "call first").unwrap());
        let saved = reload(&repo);
        assert_eq!(saved.tasks[0].estimated_time, 30);
        assert_eq!(saved.tasks[0].actual_time, 45);
        assert_eq!(saved.tasks[0].notes, "call first");
    }

    #[test]
    fn test_import_skips_colliding_ids() {
        let (_dir, mut repo) = repo();
        repo.add("existing", Priority::Low, None, "").unwrap();
        let rows = vec![
            (2, Task::new(1, "collides", Priority::Low, None, "")),
            (3, Task::new(5, "fresh", Priority::High, None, "")),
            (4, Task::new(5, "dup in file", Priority::Low, None, "")),
        ];
        let summary = repo.import(rows).unwrap();
        assert_eq!(summary.imported, 1);
        assert_eq!(summary.skipped.iter().map(|s| s.line).collect::<Vec<_>>(), vec![2, 4]);
        assert_eq!(ids(&repo), vec![1, 5]);
        assert_eq!(reload(&repo).tasks.len(), 2);
    }

    #[test]
    fn test_password_hash_persisted() {
        let (_dir, mut repo) = repo();
        assert!(repo.password_hash().is_none());
        repo.set_password_hash(b"hash".to_vec()).unwrap();
        assert_eq!(reload(&repo).password.as_deref(), Some(&b"hash"[..]));
    }
}
