use std::io::{self, BufRead, Write};

use failure::ResultExt;
use log::debug;

use crate::core::parser::PAUSE_NAME;
use crate::errors::{ErrorKind, Result};
use crate::shell::builtins::BuiltinCommand;
use crate::shell::ShellState;

const RESUME_PROMPT: &str = "[enter] to resume";

/// `pause`: block until the user presses enter.
pub struct Pause;

impl BuiltinCommand for Pause {
    const NAME: &'static str = PAUSE_NAME;

    fn run<T: AsRef<str>>(_state: &mut ShellState, _args: &[T], stdout: &mut dyn Write) -> Result<()> {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        wait_for_enter(&mut input, stdout)
    }
}

/// Prints the resume prompt and consumes one line from `input`. End of input
/// also resumes, so a closed stdin cannot wedge the shell.
pub fn wait_for_enter<R: BufRead + ?Sized>(input: &mut R, stdout: &mut dyn Write) -> Result<()> {
    write!(stdout, "{}", RESUME_PROMPT).context(ErrorKind::Io)?;
    stdout.flush().context(ErrorKind::Io)?;

    let mut line = String::new();
    let read = input.read_line(&mut line).context(ErrorKind::Io)?;
    debug!("{}: resumed after reading {} byte(s)", PAUSE_NAME, read);
    Ok(())
}
