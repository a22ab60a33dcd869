//! Line-oriented terminal I/O.
//!
//! Commands and the interactive menu talk to the user through a `Console`,
//! which wraps any `BufRead` / `Write` pair so sessions can be scripted in
//! tests. Status lines are coloured with crossterm; tables are rendered by
//! prettytable.

use std::fmt::Display;
use std::io::{self, BufRead, IsTerminal, Stdout, StdinLock, Write};

use crossterm::style::Stylize;
use prettytable::Table;

use crate::error::{Error, Result};

pub struct Console<R, W> {
    input: R,
    output: W,
    tty_in: bool,
    tty_out: bool,
}

impl Console<StdinLock<'static>, Stdout> {
    /// Console bound to the process's stdin and stdout.
    pub fn stdio() -> Self {
        let stdin = io::stdin();
        let stdout = io::stdout();
        let tty_in = stdin.is_terminal();
        let tty_out = stdout.is_terminal();
        let mut console = Console::new(stdin.lock(), stdout);
        console.tty_in = tty_in;
        console.tty_out = tty_out;
        console
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Console {
            input,
            output,
            tty_in: false,
            tty_out: false,
        }
    }

    /// Whether input comes from a terminal (hidden password entry is possible).
    pub fn is_interactive(&self) -> bool {
        self.tty_in
    }

    /// Read one line, trimmed. End of input is `Error::InputClosed`.
    pub fn read_line(&mut self) -> Result<String> {
        let mut buf = String::new();
        if self.input.read_line(&mut buf)? == 0 {
            return Err(Error::InputClosed);
        }
        Ok(buf.trim().to_string())
    }

    pub fn prompt(&mut self, label: &str) -> Result<String> {
        write!(self.output, "{} ", label.to_string().yellow())?;
        self.output.flush()?;
        self.read_line()
    }

    pub fn line(&mut self, msg: impl Display) -> Result<()> {
        writeln!(self.output, "{msg}")?;
        Ok(())
    }

    pub fn success(&mut self, msg: impl Display) -> Result<()> {
        self.line(msg.to_string().green())
    }

    pub fn info(&mut self, msg: impl Display) -> Result<()> {
        self.line(msg.to_string().cyan())
    }

    pub fn warn(&mut self, msg: impl Display) -> Result<()> {
        self.line(msg.to_string().yellow())
    }

    pub fn error(&mut self, msg: impl Display) -> Result<()> {
        self.line(msg.to_string().red())
    }

    /// Render a table; cell colours only survive on a real terminal.
    pub fn table(&mut self, table: &Table) -> Result<()> {
        if self.tty_out {
            self.output.flush()?;
            table.printstd();
        } else {
            table.print(&mut self.output)?;
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use prettytable::row;

    use super::testing::{output, scripted};
    use super::*;

    #[test]
    fn test_prompt_reads_trimmed_lines() {
        let mut console = scripted(&["  first ", "second"]);
        assert_eq!(console.prompt("One:").unwrap(), "first");
        assert_eq!(console.prompt("Two:").unwrap(), "second");
        assert!(matches!(console.prompt("Three:"), Err(Error::InputClosed)));
        let out = output(console);
        assert!(out.contains("One:"));
        assert!(out.contains("Three:"));
    }

    #[test]
    fn test_messages_and_tables_are_written() {
        let mut console = scripted(&[]);
        console.success("saved").unwrap();
        console.error("broken").unwrap();
        let mut table = Table::new();
        table.set_titles(row!["ID", "Description"]);
        table.add_row(row!["1", "buy milk"]);
        console.table(&table).unwrap();
        let out = output(console);
        assert!(out.contains("saved"));
        assert!(out.contains("broken"));
        assert!(out.contains("buy milk"));
    }
}
