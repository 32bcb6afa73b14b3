use std::path::Path;
use std::time::Duration;

use crate::editor::LineSource;
use crate::errors::Result;

use self::job_control::JobManager;

#[cfg(unix)]
pub use self::unix::{create_shell, isatty};

mod builtins;
pub mod job_control;
#[cfg(unix)]
pub mod unix;

/// How often outstanding background jobs are polled once the shell has been
/// asked to quit.
pub const DEFAULT_DRAIN_INTERVAL: Duration = Duration::from_millis(100);

pub trait Shell {
    /// Parses and runs one command line, then reports on background jobs.
    fn execute_command_string(&mut self, input: &str) -> Result<()>;
    /// Runs each line of a batch file; running out of lines acts as `quit`.
    fn execute_commands_from_file(&mut self, path: &Path) -> Result<()>;
    /// Runs lines from stdin until `quit` or end of input.
    fn execute_from_stdin(&mut self);
    /// The dispatch loop: read, interpret and poll until the shell has been
    /// asked to stop and no background jobs remain.
    fn run(&mut self, source: &mut dyn LineSource);
    fn exit(&mut self) -> !;
    fn state(&self) -> &ShellState;
}

/// Mutable state shared by the dispatch loop and the built-ins.
#[derive(Debug, Default)]
pub struct ShellState {
    stop_requested: bool,
    jobs: JobManager,
}

impl ShellState {
    /// Stops prompting. The shell exits once every background job is reaped.
    pub fn request_stop(&mut self) {
        self.stop_requested = true;
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested
    }

    /// `true` once a stop was requested and there is nothing left to wait on.
    pub fn is_finished(&self) -> bool {
        self.stop_requested && !self.jobs.has_jobs()
    }

    pub fn jobs(&self) -> &JobManager {
        &self.jobs
    }

    pub fn jobs_mut(&mut self) -> &mut JobManager {
        &mut self.jobs
    }
}

/// Policy object to control a Shell's behavior
#[derive(Debug, Copy, Clone)]
pub struct ShellConfig {
    /// Determines if the `<cwd>$ ` prompt is shown before each line.
    display_prompt: bool,

    /// Determines if some messages (e.g. "exiting...") should be displayed.
    display_messages: bool,

    /// Delay between job polls while waiting for background jobs to finish
    /// after `quit`.
    drain_interval: Duration,
}

impl ShellConfig {
    /// Creates an interactive shell
    ///
    /// # Complete List
    /// - A prompt is displayed before each line
    /// - Some additional messages are displayed
    pub fn interactive(drain_interval: Duration) -> Self {
        Self {
            display_prompt: true,
            display_messages: true,
            drain_interval,
        }
    }

    /// Creates a noninteractive shell, e.g. for batch files and `-c`
    ///
    /// # Complete List
    /// - No prompt is displayed
    /// - Fewer messages are displayed
    pub fn noninteractive() -> Self {
        Default::default()
    }

    pub fn display_prompt(&self) -> bool {
        self.display_prompt
    }

    pub fn display_messages(&self) -> bool {
        self.display_messages
    }

    pub fn drain_interval(&self) -> Duration {
        self.drain_interval
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            display_prompt: false,
            display_messages: false,
            drain_interval: DEFAULT_DRAIN_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_finishes_only_without_jobs() {
        let mut state = ShellState::default();
        assert!(!state.is_finished());
        state.request_stop();
        assert!(state.stop_requested());
        assert!(state.is_finished());
    }

    #[test]
    fn test_config_policies() {
        let interactive = ShellConfig::interactive(Duration::from_millis(5));
        assert!(interactive.display_prompt());
        assert!(interactive.display_messages());
        assert_eq!(interactive.drain_interval(), Duration::from_millis(5));

        let batch = ShellConfig::noninteractive();
        assert!(!batch.display_prompt());
        assert!(!batch.display_messages());
        assert_eq!(batch.drain_interval(), DEFAULT_DRAIN_INTERVAL);
    }
}
