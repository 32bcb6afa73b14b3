use std::ffi::OsStr;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{self, Command, Stdio};

use tempdir::TempDir;

/// WorkDir represents a scratch directory in which the shell is run.
#[derive(Debug)]
pub struct WorkDir {
    /// Removed when the WorkDir is dropped.
    dir: TempDir,
}

impl WorkDir {
    pub fn new(name: &str) -> WorkDir {
        WorkDir {
            dir: TempDir::new(name).expect("unable to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes a batch file into the working directory and returns its path.
    pub fn create_script(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path().join(name);
        fs::write(&path, contents).expect("unable to write script");
        path
    }

    /// Builds a new command that runs the shell in this working directory
    /// with a private log file.
    pub fn command<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(bin());
        cmd.current_dir(self.path());
        cmd.arg(format!("--log={}", self.path().join("log").display()));
        cmd.args(args);
        cmd
    }

    /// Runs the command with `input` on its stdin and collects its output.
    pub fn output_with_stdin(&self, cmd: &mut Command, input: &str) -> process::Output {
        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("unable to start shell");

        child
            .stdin
            .take()
            .expect("stdin is piped")
            .write_all(input.as_bytes())
            .expect("unable to write to shell stdin");

        child.wait_with_output().expect("shell did not exit")
    }

    /// Executes the command with an empty stdin and collects its output.
    ///
    /// Panics if the command fails.
    pub fn output(&self, cmd: &mut Command) -> process::Output {
        let o = self.output_with_stdin(cmd, "");
        if !o.status.success() {
            panic!(
                "\n\n==========\n\
                 command failed but expected success!\
                 \n\ncommand: {:?}\
                 \ncwd: {}\
                 \n\nstatus: {}\
                 \n\nstdout: {}\
                 \n\nstderr: {}\
                 \n\n==========\n",
                cmd,
                self.path().display(),
                o.status,
                String::from_utf8_lossy(&o.stdout),
                String::from_utf8_lossy(&o.stderr)
            );
        }
        o
    }

    /// Executes the command and collects its stdout.
    pub fn stdout(&self, cmd: &mut Command) -> String {
        String::from_utf8_lossy(&self.output(cmd).stdout).into_owned()
    }
}

fn bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_myshell"))
}
