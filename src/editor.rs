//! Line sources for the dispatch loop.

use std::collections::VecDeque;
use std::fmt;
use std::fs;
use std::io::{self, BufRead};
use std::path::Path;

use failure::{Fail, ResultExt};
use rustyline::error::ReadlineError;

use crate::errors::{ErrorKind, Result};

/// Yields command lines. `Ok(None)` means the source is exhausted.
pub trait LineSource {
    fn next_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// Interactive line editing on a terminal.
pub struct Editor {
    internal: rustyline::Editor<()>,
}

impl Editor {
    pub fn new() -> Editor {
        Editor {
            internal: rustyline::Editor::<()>::new(),
        }
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl LineSource for Editor {
    fn next_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.internal.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Eof) => Ok(None),
            // ^C discards the current line, as in other shells.
            Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(e) => Err(e.context(ErrorKind::Readline).into()),
        }
    }
}

impl fmt::Debug for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Editor")
    }
}

/// Lines of a batch file, read up front.
#[derive(Debug, Default)]
pub struct BatchSource {
    lines: VecDeque<String>,
}

impl BatchSource {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<BatchSource> {
        let contents = fs::read_to_string(path).context(ErrorKind::Io)?;
        Ok(BatchSource::from_lines(contents.lines()))
    }

    pub fn from_lines<I, S>(lines: I) -> BatchSource
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        BatchSource {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

impl LineSource for BatchSource {
    fn next_line(&mut self, _prompt: &str) -> Result<Option<String>> {
        Ok(self.lines.pop_front())
    }
}

/// Reads lines from a stdin that is not a terminal. The lock is taken per
/// line so `pause` can read from stdin too.
#[derive(Debug, Default)]
pub struct StdinSource;

impl LineSource for StdinSource {
    fn next_line(&mut self, _prompt: &str) -> Result<Option<String>> {
        let stdin = io::stdin();
        let mut line = String::new();
        let read = stdin.lock().read_line(&mut line).context(ErrorKind::Io)?;
        if read == 0 {
            return Ok(None);
        }

        let len = line.trim_end_matches(&['\n', '\r'][..]).len();
        line.truncate(len);
        Ok(Some(line))
    }
}
