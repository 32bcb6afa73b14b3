//! Shell builtins
//!
//! `cd`, `quit` and `pause` run inside the shell process itself, since they
//! change or suspend the shell's own state.

use std::io::Write;

use crate::errors::Result;
use crate::shell::ShellState;

pub use self::dirs::Cd;
pub use self::pause::Pause;
pub use self::quit::Quit;

mod dirs;
mod pause;
mod quit;

/// Represents a builtin command such as cd or quit.
pub trait BuiltinCommand {
    /// The NAME of the command.
    const NAME: &'static str;
    /// Runs the command with the given arguments against the shell's state.
    fn run<T: AsRef<str>>(state: &mut ShellState, args: &[T], stdout: &mut dyn Write) -> Result<()>;
}
