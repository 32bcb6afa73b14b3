//! The UnixShell interprets command lines, launching each pipeline stage as
//! a child process and tracking background work until it is reaped.

use std::env;
use std::fmt;
use std::io;
use std::path::Path;
use std::process;
use std::thread;

use log::{debug, error, info};
use nix::libc;
use nix::unistd;

use super::builtins::{BuiltinCommand, Cd, Pause, Quit};
use super::{Shell, ShellConfig, ShellState};
use crate::{
    core::parser::ast::{Command, CommandLine, CommandUnit, Pipeline},
    editor::{BatchSource, Editor, LineSource, StdinSource},
    errors::{Error, ErrorKind, Result},
    execute_command::run_pipeline,
};

pub struct UnixShell {
    state: ShellState,
    config: ShellConfig,
    /// `true` when stdin is a terminal.
    is_interactive: bool,
}

impl UnixShell {
    pub fn new(config: ShellConfig) -> Self {
        let shell = Self {
            state: ShellState::default(),
            config,
            is_interactive: isatty(),
        };

        info!("myshell started up");
        shell
    }

    fn prompt(&self) -> String {
        if !(self.config.display_prompt() && self.is_interactive) {
            return String::new();
        }

        match env::current_dir() {
            Ok(cwd) => format!("{}$ ", cwd.display()),
            Err(_) => String::from("$ "),
        }
    }

    fn execute_unit(&mut self, unit: &CommandUnit) {
        debug!("executing unit: {:?}", unit);
        let stdout = &mut io::stdout();
        let result = match unit.command {
            Command::Cd(ref args) => Cd::run(&mut self.state, args, stdout),
            Command::Quit => Quit::run::<&str>(&mut self.state, &[], stdout),
            Command::Pause => Pause::run::<&str>(&mut self.state, &[], stdout),
            Command::External(ref pipeline) => self.execute_pipeline(pipeline, unit),
        };

        if let Err(e) = result {
            report_error(&e);
        }
    }

    fn execute_pipeline(&mut self, pipeline: &Pipeline, unit: &CommandUnit) -> Result<()> {
        if let Some(job) = run_pipeline(pipeline, &unit.input, unit.background)? {
            self.state.jobs_mut().track(job);
        }

        Ok(())
    }

    /// Prints a status line for every background job and reaps finished ones.
    fn notify_jobs(&mut self) {
        let stdout = io::stdout();
        let temp_result = self.state.jobs_mut().poll(&mut stdout.lock());
        log_if_err!(temp_result, "notify_jobs");
    }

    /// After a stop request: poll on a fixed cadence until no jobs remain.
    fn drain_jobs(&mut self) {
        if self.state.jobs().has_jobs() {
            info!("waiting for {} background job(s)", self.state.jobs().len());
        }

        while !self.state.is_finished() {
            thread::sleep(self.config.drain_interval());
            let stdout = io::stdout();
            let temp_result = self.state.jobs_mut().poll_finished(&mut stdout.lock());
            log_if_err!(temp_result, "drain_jobs");
        }
    }
}

impl Shell for UnixShell {
    fn execute_command_string(&mut self, input: &str) -> Result<()> {
        let command_line = match CommandLine::parse(input) {
            Ok(command_line) => command_line,
            Err(e) => {
                if let ErrorKind::Parse(_) = *e.kind() {
                    report_error(&e);
                    return Ok(());
                }

                return Err(e);
            }
        };

        for unit in &command_line.units {
            self.execute_unit(unit);
        }

        Ok(())
    }

    fn execute_commands_from_file(&mut self, path: &Path) -> Result<()> {
        let mut source = BatchSource::from_file(path)?;
        self.run(&mut source);
        Ok(())
    }

    fn execute_from_stdin(&mut self) {
        if self.is_interactive {
            self.run(&mut Editor::new());
        } else {
            self.run(&mut StdinSource);
        }
    }

    fn run(&mut self, source: &mut dyn LineSource) {
        while !self.state.stop_requested() {
            let prompt = self.prompt();
            match source.next_line(&prompt) {
                Ok(Some(line)) => {
                    let temp_result = self.execute_command_string(&line);
                    log_if_err!(temp_result, "execute_command_string");
                }
                Ok(None) => {
                    info!("end of input");
                    self.state.request_stop();
                }
                Err(e) => {
                    error!("failed to read command, stopping: {}", e);
                    self.state.request_stop();
                }
            }

            self.notify_jobs();
        }

        self.drain_jobs();
    }

    fn exit(&mut self) -> ! {
        if self.config.display_messages() {
            println!("exiting...");
        }

        info!("myshell has shut down");
        process::exit(0);
    }

    fn state(&self) -> &ShellState {
        &self.state
    }
}

impl fmt::Debug for UnixShell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}\n{:?}", self.state, self.config)
    }
}

/// `true` when the shell's stdin is a terminal.
pub fn isatty() -> bool {
    let temp_result = unistd::isatty(libc::STDIN_FILENO);
    log_if_err!(temp_result, "unistd::isatty");
    temp_result.unwrap_or(false)
}

pub fn create_shell(config: ShellConfig) -> Result<Box<dyn Shell>> {
    Ok(Box::new(UnixShell::new(config)))
}

/// Every error stops at the dispatch loop; none of them end the shell.
fn report_error(e: &Error) {
    error!("{}", e);
    match *e.kind() {
        ErrorKind::Argument(_) => eprintln!("{}", e),
        ErrorKind::ForkFailure => eprintln!("error: {}", e),
        _ => eprintln!("myshell: {}", e),
    }
}
