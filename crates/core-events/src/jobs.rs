//! Asynchronous job collaborator.
//!
//! Jobs (shell commands started from the command line) run off the editor
//! thread. The editor observes them only through [`JobRunner::poll`], which
//! never blocks, and through optional completion callbacks invoked from
//! `poll` on the polling thread.

use std::collections::HashMap;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, unbounded};
use tracing::{debug, warn};

/// Work executed on a background thread. The `Ok` payload is the job output.
pub type JobFn = Box<dyn FnOnce() -> anyhow::Result<String> + Send + 'static>;

/// Callback run on the polling thread when a job completes.
pub type CompletionFn = Box<dyn FnOnce(&CompletedJob)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobHandle(pub u64);

#[derive(Debug)]
pub struct CompletedJob {
    pub handle: JobHandle,
    pub label: String,
    pub outcome: anyhow::Result<String>,
}

pub trait JobRunner {
    /// Start `job` in the background and return immediately.
    fn run_async(
        &mut self,
        label: &str,
        job: JobFn,
        on_complete: Option<CompletionFn>,
    ) -> JobHandle;

    /// Drain jobs that finished since the last call. Never blocks.
    fn poll(&mut self) -> Vec<CompletedJob>;

    /// Number of jobs started but not yet observed through `poll`.
    fn in_flight(&self) -> usize;

    /// Block for up to `timeout` for at least one completion. Used by
    /// headless hosts before exiting; runners that finish jobs eagerly just
    /// poll.
    fn wait(&mut self, timeout: Duration) -> Vec<CompletedJob> {
        let _ = timeout;
        self.poll()
    }
}

/// Runs each job on its own `std::thread`; completions travel back over a
/// channel.
pub struct ThreadJobRunner {
    next_id: u64,
    tx: Sender<CompletedJob>,
    rx: Receiver<CompletedJob>,
    callbacks: HashMap<JobHandle, CompletionFn>,
    in_flight: usize,
}

impl Default for ThreadJobRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadJobRunner {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            next_id: 1,
            tx,
            rx,
            callbacks: HashMap::new(),
            in_flight: 0,
        }
    }

    fn finish(&mut self, done: Vec<CompletedJob>) -> Vec<CompletedJob> {
        for job in &done {
            self.in_flight = self.in_flight.saturating_sub(1);
            debug!(target: "jobs", id = job.handle.0, label = %job.label, ok = job.outcome.is_ok(), "job_completed");
            if let Some(cb) = self.callbacks.remove(&job.handle) {
                cb(job);
            }
        }
        done
    }
}

impl JobRunner for ThreadJobRunner {
    fn run_async(
        &mut self,
        label: &str,
        job: JobFn,
        on_complete: Option<CompletionFn>,
    ) -> JobHandle {
        let handle = JobHandle(self.next_id);
        self.next_id += 1;
        if let Some(cb) = on_complete {
            self.callbacks.insert(handle, cb);
        }
        let tx = self.tx.clone();
        let label_owned = label.to_string();
        let spawned = std::thread::Builder::new()
            .name(format!("keel-job-{}", handle.0))
            .spawn(move || {
                let outcome = job();
                // Receiver gone means the editor shut down; nothing to report to.
                let _ = tx.send(CompletedJob {
                    handle,
                    label: label_owned,
                    outcome,
                });
            });
        match spawned {
            Ok(_) => {
                self.in_flight += 1;
                debug!(target: "jobs", id = handle.0, label, "job_started");
            }
            Err(e) => {
                warn!(target: "jobs", id = handle.0, error = %e, "job_spawn_failed");
                self.callbacks.remove(&handle);
            }
        }
        handle
    }

    fn poll(&mut self) -> Vec<CompletedJob> {
        let done: Vec<CompletedJob> = self.rx.try_iter().collect();
        self.finish(done)
    }

    /// Waits for the first completion, then drains whatever else is ready.
    fn wait(&mut self, timeout: Duration) -> Vec<CompletedJob> {
        if self.in_flight == 0 {
            return Vec::new();
        }
        let mut done = Vec::new();
        if let Ok(first) = self.rx.recv_timeout(timeout) {
            done.push(first);
        }
        done.extend(self.rx.try_iter());
        self.finish(done)
    }

    fn in_flight(&self) -> usize {
        self.in_flight
    }
}
