//! Terminal stand-ins for the host's file dialogs.
//!
//! Questions go to stderr, answers come from stdin. An empty answer or
//! end of input counts as dismissing the dialog.

use anyhow::Result;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use crate::library::{DirectoryPicker, Outcome, SavePathPicker};

/// Asks on the terminal where a dialog would be shown.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPicker;

impl DirectoryPicker for TerminalPicker {
    fn pick_directory(&self) -> Outcome<PathBuf> {
        ask("Folder to import (empty to cancel): ", &mut io::stdin().lock())
    }
}

impl SavePathPicker for TerminalPicker {
    fn pick_save_path(&self, suggested_name: &str) -> Outcome<PathBuf> {
        let question = format!("Save {suggested_name} to (empty to cancel): ");
        ask(&question, &mut io::stdin().lock())
    }
}

fn ask(question: &str, input: &mut impl BufRead) -> Outcome<PathBuf> {
    eprint!("{question}");
    io::stderr().flush().ok();

    let mut answer = String::new();
    match input.read_line(&mut answer) {
        Ok(0) | Err(_) => {
            eprintln!();
            Outcome::Cancelled
        }
        Ok(_) => match answer.trim() {
            "" => Outcome::Cancelled,
            path => Outcome::Done(PathBuf::from(shellexpand::tilde(path).into_owned())),
        },
    }
}

/// Ask a yes/no question. Returns true only if user explicitly confirms.
pub fn confirm(question: &str) -> Result<bool> {
    eprint!("{question} [y/N] ");
    io::stderr().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_answer_is_trimmed() {
        let answer = ask("? ", &mut Cursor::new("  /tmp/MyIcons \n"));
        assert_eq!(answer, Outcome::Done(PathBuf::from("/tmp/MyIcons")));
    }

    #[test]
    fn test_empty_answer_cancels() {
        assert!(ask("? ", &mut Cursor::new("\n")).is_cancelled());
    }

    #[test]
    fn test_end_of_input_cancels() {
        assert!(ask("? ", &mut Cursor::new("")).is_cancelled());
    }
}
