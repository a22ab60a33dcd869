//! # todo - Command-line to-do list manager
//!
//! A single-user task list kept in a local JSON file, with subtasks, tags,
//! attachments, collaborators, effort tracking and recurring reminders.
//!
//! ## Key Features
//!
//! - **One-shot commands**: add, delete, list, complete, search, report and more, one per invocation
//! - **Interactive Mode**: a numbered menu for working through a session
//! - **CSV Interchange**: export and import the portable task fields
//! - **Password Gate**: an optional bcrypt-hashed password checked before every command
//! - **Recurring Reminders**: cron expressions that print a notice while the process runs
//!
//! ## Quick Start
//!
//! ```bash
//! # Add a task without prompts
//! todo --add "Renew passport" --priority high --due "in 2w" --category admin
//!
//! # List tasks in a category, highest priority first
//! todo --list --filter admin --sort priority
//!
//! # Single-dash spellings work too
//! todo -complete 1
//!
//! # Work interactively
//! todo --interactive
//! ```
//!
//! Data lives in `db.json` in the working directory unless `--db` or
//! `db_path` in `config.json` says otherwise. Set `RUST_LOG=debug` to see
//! loads, saves and scheduling on stderr.

use std::env;
use std::path::Path;
use std::process;

use clap::Parser;
use crossterm::style::Stylize;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub mod auth;
pub mod cli;
pub mod cmd;
pub mod compat;
pub mod config;
pub mod console;
pub mod db;
pub mod error;
pub mod fields;
pub mod menu;
pub mod query;
pub mod repo;
pub mod scheduler;
pub mod task;
pub mod transfer;
pub mod view;

use cli::{normalize_args, Action, Cli};
use cmd::*;
use config::{Config, CONFIG_FILE};
use console::Console;
use db::Database;
use error::{exit_codes, Result};
use repo::TaskRepository;
use scheduler::Notifier;

fn main() {
    init_tracing();

    let cli = match Cli::try_parse_from(normalize_args(env::args())) {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version also arrive here.
            let code = if err.use_stderr() { exit_codes::USAGE } else { exit_codes::SUCCESS };
            let _ = err.print();
            process::exit(code);
        }
    };

    if let Err(err) = run(cli) {
        eprintln!("{}", err.to_string().red());
        process::exit(err.exit_code());
    }
}

/// Log to stderr so command output stays clean. Defaults to warnings only.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let action = cli.action()?;
    if let Some(Action::Completions(shell)) = action {
        cmd_completions(shell);
        return Ok(());
    }

    let config = Config::load(Path::new(CONFIG_FILE));
    let db_path = cli.db.unwrap_or_else(|| config.db_path.clone());
    let mut repo = match TaskRepository::open(&db_path) {
        Ok(repo) => repo,
        Err(e) => {
            // Carry on with an empty list; the next save replaces the file.
            eprintln!("{}", format!("Could not load tasks: {e}").red());
            TaskRepository::new(Database::default(), db_path)
        }
    };
    debug!(path = %repo.path().display(), tasks = repo.tasks().len(), "database ready");
    let mut console = Console::stdio();

    auth::authenticate(&repo, &mut console)?;

    let _notifier = config.notifications.then(|| {
        let notifier = Notifier::start(repo.tasks(), scheduler::print_due);
        debug!(schedules = notifier.active(), "notifier running");
        notifier
    });

    let Some(action) = action else {
        return console.info("Please provide a valid command. Use -h for help.");
    };
    debug!(?action, "dispatching");

    match action {
        Action::Completions(_) => Ok(()),
        Action::SetPassword => cmd_set_password(&mut repo, &mut console, config.bcrypt_cost),
        Action::Add { text, opts } => cmd_add(&mut repo, &mut console, &text, opts),
        Action::Delete(id) => cmd_delete(&mut repo, &mut console, id),
        Action::List { filter, sort } => cmd_list(&repo, &mut console, &filter, sort),
        Action::Complete(id) => cmd_complete(&mut repo, &mut console, id),
        Action::Interactive => menu::run(&mut repo, &mut console),
        Action::Export(path) => cmd_export(&repo, &mut console, &path),
        Action::Import(path) => cmd_import(&mut repo, &mut console, &path),
        Action::Report => cmd_report(&repo, &mut console),
        Action::AddCollaborator { id, name } => cmd_add_collaborator(&mut repo, &mut console, id, &name),
        Action::Search(keyword) => cmd_search(&repo, &mut console, &keyword),
        Action::View(id) => cmd_view(&repo, &mut console, id),
        Action::AddSubtask { id, text } => cmd_add_subtask(&mut repo, &mut console, id, &text),
        Action::CompleteSubtask { id, subtask_id } => cmd_complete_subtask(&mut repo, &mut console, id, subtask_id),
        Action::AddAttachment { id, name } => cmd_add_attachment(&mut repo, &mut console, id, &name),
        Action::AddTag { id, tag } => cmd_add_tag(&mut repo, &mut console, id, &tag),
        Action::SetRecurring { id, expr } => cmd_set_recurrence(&mut repo, &mut console, id, &expr),
        Action::SetEstimate { id, minutes } => cmd_set_estimate(&mut repo, &mut console, id, minutes),
        Action::SetActual { id, minutes } => cmd_set_actual(&mut repo, &mut console, id, minutes),
        Action::SetNotes { id, notes } => cmd_set_notes(&mut repo, &mut console, id, &notes),
    }
}
