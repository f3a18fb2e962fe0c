//! Interactive confirmation

use std::io::{self, BufRead, IsTerminal, Write};

use console::Term;
use dialoguer::Input;

use crate::error::{Error, Result};

/// Source of answers to yes/no questions
pub trait Prompter {
    /// Ask `question` and return the raw line typed by the user
    fn ask(&mut self, question: &str) -> Result<String>;
}

/// Reads answers from the terminal, or from stdin when it is not one
#[derive(Debug, Default)]
pub struct ConsolePrompter;

impl Prompter for ConsolePrompter {
    fn ask(&mut self, question: &str) -> Result<String> {
        if !Term::stderr().is_term() || !io::stdin().is_terminal() {
            return LinePrompter::new(io::stdin().lock(), io::stdout()).ask(question);
        }

        Input::<String>::new()
            .with_prompt(question)
            .allow_empty(true)
            .interact_text()
            .map_err(|e| match e {
                dialoguer::Error::IO(err) if err.kind() == io::ErrorKind::Interrupted => {
                    Error::Interrupted
                }
                dialoguer::Error::IO(err) => Error::Io(err),
            })
    }
}

/// Plain line prompter: writes the question, reads one line
pub struct LinePrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{}: ", question)?;
        self.output.flush()?;

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => Err(Error::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed before an answer was given",
            ))),
            Ok(_) => Ok(line.trim_end_matches(|c: char| c == '\r' || c == '\n').to_string()),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Err(Error::Interrupted),
            Err(e) => Err(e.into()),
        }
    }
}

/// A normalized answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
}

impl Answer {
    /// Interpret a typed line; `None` when it is neither yes nor no
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "yes" | "y" => Some(Self::Yes),
            "no" | "n" => Some(Self::No),
            _ => None,
        }
    }
}
