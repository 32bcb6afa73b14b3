use std::env;
use std::io::Write;

use log::debug;

use crate::core::parser::CD_NAME;
use crate::errors::{Error, Result};
use crate::shell::builtins::BuiltinCommand;
use crate::shell::ShellState;

/// `cd <dir>`: exactly one argument.
pub struct Cd;

impl BuiltinCommand for Cd {
    const NAME: &'static str = CD_NAME;

    fn run<T: AsRef<str>>(_state: &mut ShellState, args: &[T], _stdout: &mut dyn Write) -> Result<()> {
        let dir = match args {
            [] => {
                let cwd = env::current_dir()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|_| String::from("(unknown)"));
                return Err(Error::argument(format!(
                    "error: no directory specified. Current directory: {}",
                    cwd
                )));
            }
            [dir] => dir.as_ref(),
            _ => return Err(Error::argument("error: too many arguments")),
        };

        debug!("{}: changing directory to {}", Self::NAME, dir);
        env::set_current_dir(dir).map_err(|e| {
            debug!("{}: {}: {}", Self::NAME, dir, e);
            Error::argument("error: directory does not exist")
        })
    }
}
