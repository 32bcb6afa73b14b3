use std::io::Write;

use failure::ResultExt;
use log::info;

use crate::core::parser::QUIT_NAME;
use crate::errors::{ErrorKind, Result};
use crate::shell::builtins::BuiltinCommand;
use crate::shell::ShellState;

/// `quit`: stop prompting, then exit once background jobs have drained.
/// Outstanding jobs are waited for, never killed.
pub struct Quit;

impl BuiltinCommand for Quit {
    const NAME: &'static str = QUIT_NAME;

    fn run<T: AsRef<str>>(state: &mut ShellState, _args: &[T], stdout: &mut dyn Write) -> Result<()> {
        state.request_stop();

        let outstanding = state.jobs().len();
        if outstanding > 0 {
            info!("{}: waiting for {} job(s)", Self::NAME, outstanding);
            writeln!(stdout, "waiting for {} background job(s)", outstanding)
                .context(ErrorKind::Io)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use nix::unistd::Pid;

    use super::*;
    use crate::core::job::Job;

    #[test]
    fn test_quit_without_jobs() {
        let mut state = ShellState::default();
        let mut out = Vec::new();
        Quit::run::<&str>(&mut state, &[], &mut out).unwrap();

        assert!(state.stop_requested());
        assert!(state.is_finished());
        assert!(out.is_empty());
    }

    #[test]
    fn test_quit_with_outstanding_job_is_deferred() {
        let mut state = ShellState::default();
        state
            .jobs_mut()
            .track(Job::new("sleep 10", vec![Pid::from_raw(i32::max_value())]));

        let mut out = Vec::new();
        Quit::run::<&str>(&mut state, &[], &mut out).unwrap();

        assert!(state.stop_requested());
        assert!(!state.is_finished());
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "waiting for 1 background job(s)\n"
        );
    }
}
