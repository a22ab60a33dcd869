use std::collections::HashSet;
use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use clap_complete::Shell;

use crate::cmd::{parse_id_pair, parse_task_id, AddOptions};
use crate::error::{Error, Result};
use crate::fields::{Priority, SortKey};

/// File-backed to-do list manager.
/// Storage defaults to ./db.json or a path passed via --db.
///
/// When several actions are given only the first one, in the order listed
/// here, runs. Single-dash spellings such as `-add` and `-list` are accepted.
#[derive(Parser, Debug)]
#[command(name = "todo", version, about = "Command-line to-do list manager")]
pub struct Cli {
    /// Path to the JSON database file.
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Print a shell completion script and exit.
    #[arg(long, value_enum, value_name = "SHELL")]
    pub completions: Option<Shell>,

    /// Set a password for the to-do list.
    #[arg(long)]
    pub set_password: bool,

    /// Add a task with this description.
    #[arg(long, value_name = "TEXT", allow_hyphen_values = true)]
    pub add: Option<String>,

    /// Priority for --add: 0/1/2 or low/medium/high.
    #[arg(long)]
    pub priority: Option<Priority>,

    /// Due date for --add: YYYY-MM-DD, "today", "tomorrow", "in Nd", "friday"...
    #[arg(long, allow_hyphen_values = true)]
    pub due: Option<String>,

    /// Category for --add.
    #[arg(long, allow_hyphen_values = true)]
    pub category: Option<String>,

    /// Delete the task with this id.
    #[arg(long, value_name = "ID")]
    pub delete: Option<u64>,

    /// List tasks.
    #[arg(long)]
    pub list: bool,

    /// Mark the task with this id complete.
    #[arg(long, value_name = "ID")]
    pub complete: Option<u64>,

    /// Only list tasks in this category.
    #[arg(long, value_name = "CATEGORY", allow_hyphen_values = true)]
    pub filter: Option<String>,

    /// Sort listed tasks.
    #[arg(long, value_enum)]
    pub sort: Option<SortKey>,

    /// Enter interactive mode.
    #[arg(long)]
    pub interactive: bool,

    /// Export tasks to a CSV file.
    #[arg(long, value_name = "FILE", allow_hyphen_values = true)]
    pub export: Option<PathBuf>,

    /// Import tasks from a CSV file.
    #[arg(long, value_name = "FILE", allow_hyphen_values = true)]
    pub import: Option<PathBuf>,

    /// Print a productivity report.
    #[arg(long)]
    pub report: bool,

    /// Add a collaborator to a task.
    #[arg(long, value_name = "ID,NAME", allow_hyphen_values = true)]
    pub add_collaborator: Option<String>,

    /// Search tasks by keyword.
    #[arg(long, value_name = "KEYWORD", allow_hyphen_values = true)]
    pub search: Option<String>,

    /// Show every field of one task.
    #[arg(long, value_name = "ID")]
    pub view: Option<u64>,

    /// Add a subtask to a task.
    #[arg(long, value_name = "ID,TEXT", allow_hyphen_values = true)]
    pub add_subtask: Option<String>,

    /// Mark a subtask complete.
    #[arg(long, value_name = "ID,SUBTASK_ID", allow_hyphen_values = true)]
    pub complete_subtask: Option<String>,

    /// Attach a file name to a task.
    #[arg(long, value_name = "ID,FILE", allow_hyphen_values = true)]
    pub add_attachment: Option<String>,

    /// Tag a task.
    #[arg(long, value_name = "ID,TAG", allow_hyphen_values = true)]
    pub add_tag: Option<String>,

    /// Recurrence as a cron expression; an empty expression clears it.
    #[arg(long, value_name = "ID,CRON", allow_hyphen_values = true)]
    pub set_recurring: Option<String>,

    /// Estimated effort in minutes.
    #[arg(long, value_name = "ID,MINUTES", allow_hyphen_values = true)]
    pub set_estimate: Option<String>,

    /// Actual effort in minutes.
    #[arg(long, value_name = "ID,MINUTES", allow_hyphen_values = true)]
    pub set_actual: Option<String>,

    /// Replace a task's notes.
    #[arg(long, value_name = "ID,TEXT", allow_hyphen_values = true)]
    pub set_notes: Option<String>,
}

/// The single action an invocation performs.
#[derive(Debug, Clone)]
pub enum Action {
    Completions(Shell),
    SetPassword,
    Add { text: String, opts: AddOptions },
    Delete(u64),
    List { filter: String, sort: Option<SortKey> },
    Complete(u64),
    Interactive,
    Export(PathBuf),
    Import(PathBuf),
    Report,
    AddCollaborator { id: u64, name: String },
    Search(String),
    View(u64),
    AddSubtask { id: u64, text: String },
    CompleteSubtask { id: u64, subtask_id: u64 },
    AddAttachment { id: u64, name: String },
    AddTag { id: u64, tag: String },
    SetRecurring { id: u64, expr: String },
    SetEstimate { id: u64, minutes: u32 },
    SetActual { id: u64, minutes: u32 },
    SetNotes { id: u64, notes: String },
}

impl Cli {
    /// Pick the first requested action. Empty string values count as absent.
    pub fn action(&self) -> Result<Option<Action>> {
        if let Some(shell) = self.completions {
            return Ok(Some(Action::Completions(shell)));
        }
        if self.set_password {
            return Ok(Some(Action::SetPassword));
        }
        if let Some(text) = given(&self.add) {
            let opts = AddOptions {
                priority: self.priority,
                due: self.due.clone(),
                category: self.category.clone(),
            };
            return Ok(Some(Action::Add { text: text.to_string(), opts }));
        }
        if let Some(id) = self.delete {
            return Ok(Some(Action::Delete(id)));
        }
        if self.list || given(&self.filter).is_some() || self.sort.is_some() {
            let filter = self.filter.clone().unwrap_or_default();
            return Ok(Some(Action::List { filter, sort: self.sort }));
        }
        if let Some(id) = self.complete {
            return Ok(Some(Action::Complete(id)));
        }
        if self.interactive {
            return Ok(Some(Action::Interactive));
        }
        if let Some(path) = self.export.clone().filter(|p| !p.as_os_str().is_empty()) {
            return Ok(Some(Action::Export(path)));
        }
        if let Some(path) = self.import.clone().filter(|p| !p.as_os_str().is_empty()) {
            return Ok(Some(Action::Import(path)));
        }
        if self.report {
            return Ok(Some(Action::Report));
        }
        if let Some(raw) = given(&self.add_collaborator) {
            let (id, name) = parse_id_pair(raw)?;
            return Ok(Some(Action::AddCollaborator { id, name }));
        }
        if let Some(keyword) = given(&self.search) {
            return Ok(Some(Action::Search(keyword.to_string())));
        }
        if let Some(id) = self.view {
            return Ok(Some(Action::View(id)));
        }
        if let Some(raw) = given(&self.add_subtask) {
            let (id, text) = parse_id_pair(raw)?;
            return Ok(Some(Action::AddSubtask { id, text }));
        }
        if let Some(raw) = given(&self.complete_subtask) {
            let (id, sub) = parse_id_pair(raw)?;
            let subtask_id = parse_task_id(&sub)?;
            return Ok(Some(Action::CompleteSubtask { id, subtask_id }));
        }
        if let Some(raw) = given(&self.add_attachment) {
            let (id, name) = parse_id_pair(raw)?;
            return Ok(Some(Action::AddAttachment { id, name }));
        }
        if let Some(raw) = given(&self.add_tag) {
            let (id, tag) = parse_id_pair(raw)?;
            return Ok(Some(Action::AddTag { id, tag }));
        }
        if let Some(raw) = given(&self.set_recurring) {
            let (id, expr) = parse_id_pair(raw)?;
            return Ok(Some(Action::SetRecurring { id, expr }));
        }
        if let Some(raw) = given(&self.set_estimate) {
            let (id, minutes) = parse_minutes(raw)?;
            return Ok(Some(Action::SetEstimate { id, minutes }));
        }
        if let Some(raw) = given(&self.set_actual) {
            let (id, minutes) = parse_minutes(raw)?;
            return Ok(Some(Action::SetActual { id, minutes }));
        }
        if let Some(raw) = given(&self.set_notes) {
            let (id, notes) = parse_id_pair(raw)?;
            return Ok(Some(Action::SetNotes { id, notes }));
        }
        Ok(None)
    }
}

/// A string option counts as given only when it is non-empty.
fn given(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn parse_minutes(raw: &str) -> Result<(u64, u32)> {
    let (id, value) = parse_id_pair(raw)?;
    let minutes = value
        .parse()
        .map_err(|_| Error::InvalidFormat(format!("invalid number of minutes '{value}'")))?;
    Ok((id, minutes))
}

/// Rewrite single-dash long flags (`-add`, `-delete=3`) to their double-dash
/// form. The value following a value-taking flag is left alone, as is
/// anything after a bare `--`.
pub fn normalize_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let command = Cli::command();
    let mut longs: HashSet<&str> = HashSet::new();
    let mut valued: HashSet<&str> = HashSet::new();
    for arg in command.get_arguments() {
        if let Some(long) = arg.get_long() {
            longs.insert(long);
            if arg.get_action().takes_values() {
                valued.insert(long);
            }
        }
    }
    longs.extend(["help", "version"]);

    let mut out = Vec::new();
    let mut literal = false;
    let mut value_next = false;
    for arg in args {
        if literal || value_next {
            value_next = false;
            out.push(arg);
            continue;
        }
        if arg == "--" {
            literal = true;
            out.push(arg);
            continue;
        }
        let (dashes, rest) = match arg.strip_prefix("--") {
            Some(rest) => (2, rest),
            None => (1, arg.strip_prefix('-').unwrap_or(arg.as_str())),
        };
        let (name, inline_value) = match rest.split_once('=') {
            Some((name, _)) => (name, true),
            None => (rest, false),
        };
        let is_long = arg.starts_with('-') && longs.contains(name);
        value_next = is_long && !inline_value && valued.contains(name);
        out.push(if is_long && dashes == 1 { format!("-{arg}") } else { arg });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let args = std::iter::once("todo").chain(args.iter().copied()).map(String::from);
        Cli::try_parse_from(normalize_args(args)).unwrap()
    }

    #[test]
    fn test_normalize_single_dash_flags() {
        let args = ["todo", "-add", "milk", "-delete=3", "-h", "-5", "--list", "--", "-list"].map(String::from);
        assert_eq!(
            normalize_args(args),
            vec!["todo", "--add", "milk", "--delete=3", "-h", "-5", "--list", "--", "-list"]
        );
    }

    #[test]
    fn test_flag_like_values_are_kept() {
        let args = ["todo", "-search", "-list", "--add", "-report", "-due=-x", "-list"].map(String::from);
        assert_eq!(
            normalize_args(args),
            vec!["todo", "--search", "-list", "--add", "-report", "--due=-x", "--list"]
        );
        let cli = Cli::try_parse_from(normalize_args(["todo", "-search", "-list"].map(String::from))).unwrap();
        assert!(matches!(cli.action().unwrap(), Some(Action::Search(ref k)) if k == "-list"));
    }

    #[test]
    fn test_given_skips_empty_values() {
        assert_eq!(given(&Some("x".into())), Some("x"));
        assert_eq!(given(&Some(String::new())), None);
        assert_eq!(given(&None), None);
    }

    #[test]
    fn test_every_flag_has_help() {
        let command = Cli::command();
        for arg in command.get_arguments().filter(|a| !matches!(a.get_id().as_str(), "help" | "version")) {
            assert!(arg.get_help().is_some(), "--{} has no help text", arg.get_id());
        }
    }

    #[test]
    fn test_go_style_invocation() {
        let cli = parse(&["-add", "buy milk", "-priority", "high", "-category=errand"]);
        match cli.action().unwrap() {
            Some(Action::Add { text, opts }) => {
                assert_eq!(text, "buy milk");
                assert_eq!(opts.priority, Some(Priority::High));
                assert_eq!(opts.category.as_deref(), Some("errand"));
                assert_eq!(opts.due, None);
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn test_precedence() {
        assert!(matches!(parse(&["--list", "--set-password"]).action().unwrap(), Some(Action::SetPassword)));
        assert!(matches!(parse(&["--delete", "2", "--add", "x"]).action().unwrap(), Some(Action::Add { .. })));
        assert!(matches!(parse(&["--complete", "2", "--delete", "3"]).action().unwrap(), Some(Action::Delete(3))));
        assert!(matches!(parse(&["--report", "--search", "x"]).action().unwrap(), Some(Action::Report)));
        assert!(matches!(parse(&["--view", "1", "--search", "x"]).action().unwrap(), Some(Action::Search(_))));
        assert!(parse(&[]).action().unwrap().is_none());
    }

    #[test]
    fn test_filter_or_sort_implies_list() {
        match parse(&["-sort", "due"]).action().unwrap() {
            Some(Action::List { filter, sort }) => {
                assert_eq!(filter, "");
                assert_eq!(sort, Some(SortKey::Due));
            }
            other => panic!("unexpected action {other:?}"),
        }
        assert!(matches!(
            parse(&["--filter", "work"]).action().unwrap(),
            Some(Action::List { ref filter, sort: None }) if filter == "work"
        ));
    }

    #[test]
    fn test_empty_values_are_ignored() {
        assert!(parse(&["--add", "", "--report"]).action().unwrap().is_some_and(|a| matches!(a, Action::Report)));
    }

    #[test]
    fn test_pair_arguments() {
        assert!(matches!(
            parse(&["--add-collaborator", "2,Alex"]).action().unwrap(),
            Some(Action::AddCollaborator { id: 2, ref name }) if name == "Alex"
        ));
        assert!(matches!(
            parse(&["--complete-subtask", "2,3"]).action().unwrap(),
            Some(Action::CompleteSubtask { id: 2, subtask_id: 3 })
        ));
        assert!(matches!(
            parse(&["--set-estimate", "2,90"]).action().unwrap(),
            Some(Action::SetEstimate { id: 2, minutes: 90 })
        ));
        assert!(matches!(parse(&["--add-collaborator", "Alex"]).action(), Err(Error::InvalidFormat(_))));
        assert!(matches!(parse(&["--set-actual", "2,lots"]).action(), Err(Error::InvalidFormat(_))));
    }

    #[test]
    fn test_bad_values_are_usage_errors() {
        let err = Cli::try_parse_from(["todo", "--delete", "abc"]).unwrap_err();
        assert!(err.use_stderr());
        assert!(Cli::try_parse_from(["todo", "--sort", "size"]).is_err());
        assert!(Cli::try_parse_from(["todo", "--add", "x", "--priority", "9"]).is_err());
    }
}
