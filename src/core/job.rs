use std::fmt;

use nix::unistd::Pid;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum JobStatus {
    Running,
    Finished,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            JobStatus::Running => write!(f, "Running"),
            JobStatus::Finished => write!(f, "Finished"),
        }
    }
}

/// A background command line, tracked from launch until it is reaped.
#[derive(Clone, Debug, PartialEq)]
pub struct Job {
    /// Pid of the final pipeline stage; identifies the job to the user.
    pid: Pid,
    input: String,
    /// Every stage still waiting to be reaped, in pipeline order.
    pending: Vec<Pid>,
    status: JobStatus,
}

impl Job {
    /// # Panics
    /// Panics if `pids` is empty.
    pub fn new(input: &str, pids: Vec<Pid>) -> Self {
        let pid = *pids.last().expect("job must have at least one process");
        Self {
            pid,
            input: input.to_string(),
            pending: pids,
            status: JobStatus::Running,
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status == JobStatus::Finished
    }

    pub fn pending(&self) -> &[Pid] {
        &self.pending
    }

    /// Records that `pid` has been reaped. The job finishes once every
    /// stage has been.
    pub fn mark_reaped(&mut self, pid: Pid) {
        self.pending.retain(|&p| p != pid);
        if self.pending.is_empty() {
            self.status = JobStatus::Finished;
        }
    }
}

/// The line printed for each tracked job after every command.
impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            JobStatus::Running => write!(f, "[{}] is running", self.pid),
            JobStatus::Finished => write!(f, "[{}] finished\t\t{}", self.pid, self.input),
        }
    }
}
