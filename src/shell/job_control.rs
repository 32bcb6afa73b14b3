use std::fmt;
use std::io::Write;

use failure::ResultExt;
use log::{debug, info};

use crate::core::job::Job;
use crate::errors::{ErrorKind, Result};
use crate::execute_command;

/// Owns every background job from launch until it has been reported
/// finished once.
#[derive(Default)]
pub struct JobManager {
    jobs: Vec<Job>,
}

impl JobManager {
    /// Starts tracking a job that was just launched in the background.
    pub fn track(&mut self, job: Job) -> &Job {
        info!("[{}] started in background: {}", job.pid(), job.input());
        let index = self.jobs.len();
        self.jobs.push(job);
        &self.jobs[index]
    }

    pub fn has_jobs(&self) -> bool {
        !self.jobs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn get_jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Checks for processes that have exited, without blocking.
    pub fn update_job_statuses(&mut self) {
        for job in &mut self.jobs {
            for pid in job.pending().to_vec() {
                match execute_command::try_reap(pid) {
                    Ok(true) => job.mark_reaped(pid),
                    Ok(false) => (),
                    e => log_if_err!(e, "failed to check status of {}", pid),
                }
            }
        }
    }

    /// Writes a status line for every tracked job, then forgets the ones
    /// that have finished. Never blocks.
    pub fn poll<W: Write + ?Sized>(&mut self, out: &mut W) -> Result<()> {
        self.report(out, true)
    }

    /// Like `poll`, but only finished jobs are reported. Used while waiting
    /// for jobs to drain so running jobs are not announced on every tick.
    pub fn poll_finished<W: Write + ?Sized>(&mut self, out: &mut W) -> Result<()> {
        self.report(out, false)
    }

    fn report<W: Write + ?Sized>(&mut self, out: &mut W, include_running: bool) -> Result<()> {
        self.update_job_statuses();

        for job in &self.jobs {
            if include_running || job.is_finished() {
                writeln!(out, "{}", job).context(ErrorKind::Io)?;
            }
        }

        // Removal happens only after every job has been reported.
        let before = self.jobs.len();
        self.jobs.retain(|job| !job.is_finished());
        if self.jobs.len() != before {
            debug!("reaped {} job(s)", before - self.jobs.len());
        }

        Ok(())
    }
}

impl fmt::Debug for JobManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} jobs", self.jobs.len())?;
        for job in &self.jobs {
            writeln!(f, "{:?}", job)?;
        }

        Ok(())
    }
}
