//! Numbered interactive menu.
//!
//! Reads one line per prompt and loops until the user picks Exit or input
//! ends. Failures inside a command are printed and the menu carries on.

use std::io::{BufRead, Write};
use std::path::Path;

use tracing::debug;

use crate::cmd::{self, AddOptions};
use crate::console::Console;
use crate::error::{Error, Result};
use crate::fields::SortKey;
use crate::repo::TaskRepository;

const ITEMS: [&str; 12] = [
    "Add task",
    "Remove task",
    "List tasks",
    "Mark task as complete",
    "Add subtask",
    "Export tasks to CSV",
    "Import tasks from CSV",
    "Add attachment",
    "Generate productivity report",
    "Add collaborator to task",
    "Search tasks",
    "Exit",
];

enum Step {
    Continue,
    Exit,
}

pub fn run<R: BufRead, W: Write>(repo: &mut TaskRepository, console: &mut Console<R, W>) -> Result<()> {
    loop {
        console.line("")?;
        console.info("Interactive Mode:")?;
        for (n, item) in ITEMS.iter().enumerate() {
            console.line(format!("{:>2}. {item}", n + 1))?;
        }

        let result = console.prompt("Enter your choice:").and_then(|choice| handle(&choice, repo, console));
        match result {
            Ok(Step::Continue) => {}
            Ok(Step::Exit) | Err(Error::InputClosed) => break,
            Err(e) => console.error(e)?,
        }
    }
    debug!("leaving interactive mode");
    console.line("Exiting interactive mode.")
}

fn handle<R: BufRead, W: Write>(choice: &str, repo: &mut TaskRepository, console: &mut Console<R, W>) -> Result<Step> {
    match choice {
        "1" => {
            let text = console.prompt("Enter task description:")?;
            if text.is_empty() {
                console.warn("Task description must not be empty")?;
            } else {
                cmd::cmd_add(repo, console, &text, AddOptions::default())?;
            }
        }
        "2" => {
            if let Some(id) = read_id(console, "Enter task ID to remove:")? {
                cmd::cmd_delete(repo, console, id)?;
            }
        }
        "3" => {
            let category = console.prompt("Enter filter category (or leave empty):")?;
            let sort = console.prompt("Enter sort method (priority/due/category, or leave empty):")?;
            cmd::cmd_list(repo, console, &category, SortKey::parse_lenient(&sort))?;
        }
        "4" => {
            if let Some(id) = read_id(console, "Enter task ID to mark as complete:")? {
                cmd::cmd_complete(repo, console, id)?;
            }
        }
        "5" => {
            if let Some(id) = read_id(console, "Enter task ID to add a subtask to:")? {
                let text = console.prompt("Enter subtask description:")?;
                cmd::cmd_add_subtask(repo, console, id, &text)?;
            }
        }
        "6" => {
            let file = console.prompt("Enter filename to export tasks:")?;
            cmd::cmd_export(repo, console, Path::new(&file))?;
        }
        "7" => {
            let file = console.prompt("Enter filename to import tasks:")?;
            cmd::cmd_import(repo, console, Path::new(&file))?;
        }
        "8" => {
            if let Some(id) = read_id(console, "Enter task ID:")? {
                let name = console.prompt("Enter attachment filename:")?;
                cmd::cmd_add_attachment(repo, console, id, &name)?;
            }
        }
        "9" => cmd::cmd_report(repo, console)?,
        "10" => {
            if let Some(id) = read_id(console, "Enter task ID:")? {
                let name = console.prompt("Enter collaborator name:")?;
                cmd::cmd_add_collaborator(repo, console, id, &name)?;
            }
        }
        "11" => {
            let keyword = console.prompt("Enter search keyword:")?;
            cmd::cmd_search(repo, console, &keyword)?;
        }
        "12" => return Ok(Step::Exit),
        _ => console.error("Invalid choice, please try again.")?,
    }
    Ok(Step::Continue)
}

/// Prompt for a task id. A non-numeric answer is reported and yields `None`.
fn read_id<R: BufRead, W: Write>(console: &mut Console<R, W>, label: &str) -> Result<Option<u64>> {
    let raw = console.prompt(label)?;
    match cmd::parse_task_id(&raw) {
        Ok(id) => Ok(Some(id)),
        Err(e) => {
            console.error(e)?;
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::testing::{output, scripted};

    fn repo() -> (tempfile::TempDir, TaskRepository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = TaskRepository::open(dir.path().join("db.json")).unwrap();
        (dir, repo)
    }

    #[test]
    fn test_exit_choice() {
        let (_dir, mut repo) = repo();
        let mut console = scripted(&["12", "1"]);
        run(&mut repo, &mut console).unwrap();
        let out = output(console);
        assert!(out.contains("12. Exit"));
        assert!(out.contains("Exiting interactive mode."));
        assert!(repo.tasks().is_empty());
    }

    #[test]
    fn test_end_of_input_exits() {
        let (_dir, mut repo) = repo();
        let mut console = scripted(&["9"]);
        run(&mut repo, &mut console).unwrap();
        assert!(output(console).contains("Exiting interactive mode."));
    }

    #[test]
    fn test_add_complete_and_list_session() {
        let (_dir, mut repo) = repo();
        let mut console = scripted(&[
            "1", "water plants", "1", "2030-01-02", "home",
            "5", "1", "buy fertiliser",
            "4", "1",
            "3", "home", "priority",
            "12",
        ]);
        run(&mut repo, &mut console).unwrap();

        let task = repo.get(1).unwrap();
        assert_eq!(task.text, "water plants");
        assert_eq!(task.category, "home");
        assert!(task.is_complete);
        assert_eq!(task.subtasks.len(), 1);
        let out = output(console);
        assert!(out.contains("Task added: water plants (id 1)"));
        assert!(out.contains("2030-01-02"));
        assert!(out.contains("Completed"));
    }

    #[test]
    fn test_invalid_input_keeps_looping() {
        let (_dir, mut repo) = repo();
        let mut console = scripted(&["42", "2", "abc", "2", "7", "11", "nothing", "12"]);
        run(&mut repo, &mut console).unwrap();
        let out = output(console);
        assert!(out.contains("Invalid choice, please try again."));
        assert!(out.contains("invalid task id 'abc'"));
        assert!(out.contains("Task not found: 7"));
        assert!(out.contains("No tasks found matching the keyword: nothing"));
        assert!(out.contains("Exiting interactive mode."));
    }

    #[test]
    fn test_command_errors_are_printed() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = TaskRepository::open(dir.path().join("db.json")).unwrap();
        let missing = dir.path().join("missing.csv");
        let missing = missing.to_str().unwrap();
        let mut console = scripted(&["7", missing, "12"]);
        run(&mut repo, &mut console).unwrap();
        let out = output(console);
        assert!(out.contains("CSV error"));
        assert!(out.contains("Exiting interactive mode."));
    }
}
