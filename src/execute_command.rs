//! Process execution
//!
//! Every pipeline stage runs in its own forked child. The parent wires
//! stage `n`'s stdout to stage `n + 1`'s stdin through an anonymous pipe,
//! then each child applies its own file redirections and replaces itself
//! with the requested program. Only the final stage carries an output
//! redirection; the parser drops them from earlier stages.

use std::ffi::CString;
use std::fs::File;
use std::io::{self, Write};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::{AsRawFd, FromRawFd, RawFd};
use std::path::Path;
use std::process;

use failure::{Fail, ResultExt};
use log::{debug, info, warn};
use nix::errno::Errno;
use nix::fcntl::{self, FcntlArg, FdFlag, OFlag};
use nix::libc;
use nix::sys::signal::{self, SigHandler, Signal};
use nix::sys::stat::Mode;
use nix::sys::wait::{self, WaitPidFlag, WaitStatus};
use nix::unistd::{self, ForkResult, Pid};

use crate::core::job::Job;
use crate::core::parser::ast::{OutputMode, Pipeline, Stage};
use crate::errors::{Error, ErrorKind, Result};

const FILE_OPEN_EXIT_STATUS: i32 = 1;
const UNKNOWN_COMMAND_EXIT_STATUS: i32 = 127;
const CHILD_FAILURE_EXIT_STATUS: i32 = 126;

/// A stage with every string converted for exec(3) ahead of fork(2), so the
/// child does as little as possible before it execs.
#[derive(Debug)]
struct PreparedStage {
    argv: Vec<CString>,
    input: Option<CString>,
    output: Option<(CString, OutputMode)>,
}

impl PreparedStage {
    fn new(stage: &Stage) -> Result<Self> {
        let argv = stage
            .argv
            .iter()
            .map(|arg| to_cstring(arg.as_bytes()))
            .collect::<Result<Vec<_>>>()?;
        let input = match stage.input {
            Some(ref path) => Some(path_to_cstring(path)?),
            None => None,
        };
        let output = match stage.output {
            Some(ref redirect) => Some((path_to_cstring(&redirect.path)?, redirect.mode)),
            None => None,
        };

        Ok(Self {
            argv,
            input,
            output,
        })
    }

    fn program(&self) -> String {
        self.argv[0].to_string_lossy().into_owned()
    }
}

/// The two ends of an anonymous pipe, closed on drop.
struct Pipe {
    read: File,
    write: File,
}

/// Wraps `unistd::pipe2()` to return RAII structs instead of raw, owning file
/// descriptors. Both ends are close-on-exec so no unrelated child keeps
/// them open; `dup2` clears the flag on the stdio copies.
fn create_pipe() -> Result<Pipe> {
    let (read, write) = unistd::pipe2(OFlag::O_CLOEXEC).context(ErrorKind::ForkFailure)?;
    // Nothing else owns these descriptors, so the Files may close them.
    unsafe {
        Ok(Pipe {
            read: File::from_raw_fd(read),
            write: File::from_raw_fd(write),
        })
    }
}

/// Runs `pipeline`. Foreground pipelines are waited on; background ones are
/// returned as a `Job` for the caller to track.
pub fn run_pipeline(pipeline: &Pipeline, input: &str, background: bool) -> Result<Option<Job>> {
    let pids = spawn_pipeline(pipeline)?;
    if background {
        Ok(Some(Job::new(input, pids)))
    } else {
        wait_for_pipeline(&pids)?;
        Ok(None)
    }
}

/// Forks one child per stage, chaining them with pipes. Returns the pids in
/// pipeline order.
pub fn spawn_pipeline(pipeline: &Pipeline) -> Result<Vec<Pid>> {
    if pipeline.stages.is_empty() {
        return Err(Error::parse("empty pipeline"));
    }

    let stages = pipeline
        .stages
        .iter()
        .map(PreparedStage::new)
        .collect::<Result<Vec<_>>>()?;

    // Anything still buffered would otherwise be written again by each child.
    log_if_err!(io::stdout().flush(), "failed to flush stdout before fork");

    let mut pids = Vec::with_capacity(stages.len());
    if let Err(e) = spawn_stages(&stages, &mut pids) {
        // All pipe ends are closed by now, so the stages that did start will
        // see EOF and exit.
        warn!("abandoning pipeline after {} of {} stages: {}", pids.len(), stages.len(), e);
        log_if_err!(wait_for_pipeline(&pids), "failed to reap partial pipeline");
        return Err(e);
    }

    debug!("spawned pipeline {:?}", pids);
    Ok(pids)
}

fn spawn_stages(stages: &[PreparedStage], pids: &mut Vec<Pid>) -> Result<()> {
    let last = stages.len() - 1;
    // Read end that feeds the next stage; `None` means the shell's own stdin.
    let mut carried: Option<File> = None;

    for (i, stage) in stages.iter().enumerate() {
        let pipe = if i < last { Some(create_pipe()?) } else { None };

        match unsafe { unistd::fork() }.context(ErrorKind::ForkFailure)? {
            ForkResult::Child => {
                let stdin = carried.as_ref().map(AsRawFd::as_raw_fd);
                let stdout = pipe
                    .as_ref()
                    .map(|p| (p.read.as_raw_fd(), p.write.as_raw_fd()));
                run_child(stage, stdin, stdout)
            }
            ForkResult::Parent { child } => {
                debug!("forked {} for `{}`", child, stage.program());
                pids.push(child);
                // Close our copies so EOF reaches the readers once the
                // writers exit.
                carried = pipe.map(|Pipe { read, write }| {
                    drop(write);
                    read
                });
            }
        }
    }

    Ok(())
}

/// Child side of fork(2). `stdin` is a carried pipe read end; `stdout` is
/// the (read, write) pair of the pipe to the next stage.
fn run_child(stage: &PreparedStage, stdin: Option<RawFd>, stdout: Option<(RawFd, RawFd)>) -> ! {
    let err = match reset_signals().and_then(|()| connect_pipes(stdin, stdout)) {
        Ok(()) => exec_stage(stage),
        Err(e) => e,
    };

    let code = match *err.kind() {
        ErrorKind::FileOpen(_) => {
            eprintln!("error: {}", err);
            FILE_OPEN_EXIT_STATUS
        }
        ErrorKind::UnknownCommand(_) => {
            eprintln!("{}", err);
            UNKNOWN_COMMAND_EXIT_STATUS
        }
        _ => {
            eprintln!("myshell: {}", err);
            CHILD_FAILURE_EXIT_STATUS
        }
    };
    process::exit(code)
}

/// The Rust runtime ignores SIGPIPE, and an ignored disposition survives
/// exec. Writers into a closed pipe must die as they would under any shell.
fn reset_signals() -> Result<()> {
    unsafe { signal::signal(Signal::SIGPIPE, SigHandler::SigDfl) }.context(ErrorKind::Nix)?;
    Ok(())
}

fn connect_pipes(stdin: Option<RawFd>, stdout: Option<(RawFd, RawFd)>) -> Result<()> {
    if let Some(fd) = stdin {
        replace_fd(fd, libc::STDIN_FILENO)?;
    }
    if let Some((read, write)) = stdout {
        unistd::close(read).context(ErrorKind::Nix)?;
        replace_fd(write, libc::STDOUT_FILENO)?;
    }

    Ok(())
}

/// Applies `stage`'s redirections and execs it. Only returns on failure.
fn exec_stage(stage: &PreparedStage) -> Error {
    if let Err(e) = redirect_stdio(stage) {
        return e;
    }

    match unistd::execvp(&stage.argv[0], &stage.argv) {
        Ok(never) => match never {},
        Err(errno) => {
            debug!("execvp `{}` failed: {}", stage.program(), errno);
            Error::unknown_command(stage.program())
        }
    }
}

fn redirect_stdio(stage: &PreparedStage) -> Result<()> {
    if let Some(ref path) = stage.input {
        let fd = fcntl::open(path.as_c_str(), OFlag::O_RDONLY, Mode::empty())
            .map_err(|_| Error::file_open(path.to_string_lossy()))?;
        replace_fd(fd, libc::STDIN_FILENO)?;
    }

    if let Some((ref path, mode)) = stage.output {
        let flags = OFlag::O_WRONLY
            | OFlag::O_CREAT
            | match mode {
                OutputMode::Truncate => OFlag::O_TRUNC,
                OutputMode::Append => OFlag::O_APPEND,
            };
        let fd = fcntl::open(path.as_c_str(), flags, Mode::S_IRUSR | Mode::S_IWUSR)
            .map_err(|_| Error::file_open(path.to_string_lossy()))?;
        replace_fd(fd, libc::STDOUT_FILENO)?;
    }

    Ok(())
}

/// Moves `fd` onto `target`, closing the original. The result is always
/// inherited across exec.
fn replace_fd(fd: RawFd, target: RawFd) -> Result<()> {
    if fd == target {
        fcntl::fcntl(fd, FcntlArg::F_SETFD(FdFlag::empty())).context(ErrorKind::Nix)?;
    } else {
        unistd::dup2(fd, target).context(ErrorKind::Nix)?;
        unistd::close(fd).context(ErrorKind::Nix)?;
    }

    Ok(())
}

/// Blocks until every process in `pids` has exited, the final stage first.
pub fn wait_for_pipeline(pids: &[Pid]) -> Result<()> {
    if let Some((last, rest)) = pids.split_last() {
        let status = wait_for_process(*last)?;
        info!("{} finished: {:?}", last, status);
        for pid in rest {
            wait_for_process(*pid)?;
        }
    }

    Ok(())
}

fn wait_for_process(pid: Pid) -> Result<WaitStatus> {
    loop {
        match wait::waitpid(pid, None) {
            Ok(status @ WaitStatus::Exited(..)) | Ok(status @ WaitStatus::Signaled(..)) => {
                return Ok(status)
            }
            Ok(_) | Err(Errno::EINTR) => continue,
            Err(e) => return Err(e.context(ErrorKind::Nix).into()),
        }
    }
}

/// Reaps `pid` if it has exited, without blocking. Returns `true` once the
/// process is gone.
pub fn try_reap(pid: Pid) -> Result<bool> {
    match wait::waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
        Ok(WaitStatus::StillAlive) => Ok(false),
        Ok(status @ WaitStatus::Exited(..)) | Ok(status @ WaitStatus::Signaled(..)) => {
            debug!("reaped {}: {:?}", pid, status);
            Ok(true)
        }
        Ok(_) | Err(Errno::EINTR) => Ok(false),
        // Someone else already collected it.
        Err(Errno::ECHILD) => Ok(true),
        Err(e) => Err(e.context(ErrorKind::Nix).into()),
    }
}

fn to_cstring(bytes: &[u8]) -> Result<CString> {
    CString::new(bytes).map_err(|_| Error::parse("argument contains a nul byte"))
}

fn path_to_cstring(path: &Path) -> Result<CString> {
    to_cstring(path.as_os_str().as_bytes())
}
