//! Named background jobs with blocking join and interruption
//!
//! Every reload cycle and every stat request runs as one job on its own
//! named thread. A job can block until another job finishes
//! ([`Job::wait_for`]); a blocked job can be interrupted
//! ([`Job::interrupt`]), which makes its wait fail with
//! `Error::Interrupted`.
//!
//! Completion is signalled by an RAII guard, so joiners are released even
//! if the job body panics.
//!
//! ## Lost wakeups
//!
//! A waiter parks on the *target's* condition variable. To let an
//! interruption wake it, the waiter publishes the target in `waiting_on`
//! before checking its interrupt flag under the target's lock, and the
//! interrupter sets the flag before reading `waiting_on` and notifying
//! under that same lock. Whichever side goes second observes the other.

use parking_lot::{Condvar, Mutex};
use playerstats_core::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, error};

struct JobCore {
    id: u64,
    label: String,
    done: Mutex<bool>,
    finished: Condvar,
    interrupted: AtomicBool,
    waiting_on: Mutex<Option<Arc<JobCore>>>,
}

/// Liveness handle of a running job
///
/// Cheap to clone. Carries no outcome; see [`JobHandle`] for that.
#[derive(Clone)]
pub struct Job {
    core: Arc<JobCore>,
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.core.id)
            .field("label", &self.core.label)
            .field("alive", &self.is_alive())
            .finish()
    }
}

impl Job {
    fn new(id: u64, label: String) -> Self {
        Job {
            core: Arc::new(JobCore {
                id,
                label,
                done: Mutex::new(false),
                finished: Condvar::new(),
                interrupted: AtomicBool::new(false),
                waiting_on: Mutex::new(None),
            }),
        }
    }

    /// Numeric id, unique per engine
    pub fn id(&self) -> u64 {
        self.core.id
    }

    /// Thread name of the job
    pub fn label(&self) -> &str {
        &self.core.label
    }

    /// True until the job body has returned (or panicked)
    pub fn is_alive(&self) -> bool {
        !*self.core.done.lock()
    }

    /// True once [`Job::interrupt`] was called
    pub fn is_interrupted(&self) -> bool {
        self.core.interrupted.load(Ordering::SeqCst)
    }

    /// Interrupt this job's current or next wait
    ///
    /// The flag is sticky: a job interrupted while not waiting fails at its
    /// next [`Job::wait_for`] on a live job.
    pub fn interrupt(&self) {
        self.core.interrupted.store(true, Ordering::SeqCst);
        let target = self.core.waiting_on.lock().clone();
        if let Some(target) = target {
            let _done = target.done.lock();
            target.finished.notify_all();
        }
    }

    /// Block until `other` finishes
    ///
    /// Returns immediately if `other` already finished.
    ///
    /// # Errors
    ///
    /// Returns `Error::Interrupted` (naming this job) if this job is
    /// interrupted before `other` finishes.
    pub fn wait_for(&self, other: &Job) -> Result<()> {
        if Arc::ptr_eq(&self.core, &other.core) {
            return Err(Error::internal(format!(
                "job '{}' cannot wait for itself",
                self.label()
            )));
        }

        *self.core.waiting_on.lock() = Some(Arc::clone(&other.core));
        let outcome = {
            let mut done = other.core.done.lock();
            loop {
                if *done {
                    break Ok(());
                }
                if self.is_interrupted() {
                    break Err(Error::Interrupted(self.core.label.clone()));
                }
                other.core.finished.wait(&mut done);
            }
        };
        *self.core.waiting_on.lock() = None;
        outcome
    }

    /// Block until every job in `others` finishes, in order
    pub fn wait_for_all(&self, others: &[Job]) -> Result<()> {
        for other in others {
            self.wait_for(other)?;
        }
        Ok(())
    }

    /// Block until this job finishes; not interruptible
    pub fn wait_finished(&self) {
        let mut done = self.core.done.lock();
        while !*done {
            self.core.finished.wait(&mut done);
        }
    }
}

/// Marks the job finished and wakes every joiner on drop
///
/// Runs on both normal return and unwinding, so a panicking job never
/// leaves joiners blocked.
struct CompletionGuard {
    core: Arc<JobCore>,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        let mut done = self.core.done.lock();
        *done = true;
        self.core.finished.notify_all();
    }
}

/// A job whose body runs on the thread that admitted it
///
/// Other jobs join it like any spawned job. It finishes when dropped,
/// including on unwind.
pub struct InlineJob {
    job: Job,
    _guard: CompletionGuard,
}

impl std::fmt::Debug for InlineJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InlineJob").field("job", &self.job).finish()
    }
}

impl InlineJob {
    /// Start a job on the current thread
    pub fn start(id: u64, label: impl Into<String>) -> Self {
        let job = Job::new(id, label.into());
        let _guard = CompletionGuard {
            core: Arc::clone(&job.core),
        };
        debug!(target: "playerstats::job", job = %job.label(), "started inline");
        InlineJob { job, _guard }
    }

    /// The liveness handle, for other jobs to join and for interruption
    pub fn job(&self) -> &Job {
        &self.job
    }
}

/// Owner's handle of a spawned job, carrying its outcome
pub struct JobHandle<T> {
    job: Job,
    outcome: Arc<Mutex<Option<Result<T>>>>,
    thread: Option<JoinHandle<()>>,
}

impl<T> std::fmt::Debug for JobHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobHandle").field("job", &self.job).finish()
    }
}

impl<T: Send + 'static> JobHandle<T> {
    /// Spawn `work` on a new thread named `label`
    ///
    /// `work` receives its own [`Job`] so it can join other jobs
    /// interruptibly.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the thread cannot be spawned.
    pub fn spawn<F>(id: u64, label: impl Into<String>, work: F) -> Result<Self>
    where
        F: FnOnce(&Job) -> Result<T> + Send + 'static,
    {
        let job = Job::new(id, label.into());
        let outcome = Arc::new(Mutex::new(None));

        let thread_job = job.clone();
        let thread_outcome = Arc::clone(&outcome);
        let thread = std::thread::Builder::new()
            .name(job.label().to_string())
            .spawn(move || {
                // Declared first so it drops last, after the outcome is stored
                let _guard = CompletionGuard {
                    core: Arc::clone(&thread_job.core),
                };
                debug!(target: "playerstats::job", job = %thread_job.label(), "started");

                let result =
                    std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| work(&thread_job)));
                match result {
                    Ok(result) => {
                        if let Err(e) = &result {
                            debug!(target: "playerstats::job", job = %thread_job.label(), error = %e, "failed");
                        }
                        *thread_outcome.lock() = Some(result);
                    }
                    Err(panic) => {
                        error!(
                            target: "playerstats::job",
                            job = %thread_job.label(),
                            "job panicked: {:?}",
                            panic
                                .downcast_ref::<&str>()
                                .copied()
                                .unwrap_or("(non-string panic)")
                        );
                    }
                }
                debug!(target: "playerstats::job", job = %thread_job.label(), "finished");
            })?;

        Ok(JobHandle {
            job,
            outcome,
            thread: Some(thread),
        })
    }

    /// The liveness handle, for other jobs to join
    pub fn job(&self) -> &Job {
        &self.job
    }

    /// True until the job finished
    pub fn is_alive(&self) -> bool {
        self.job.is_alive()
    }

    /// Interrupt the job's current wait
    pub fn interrupt(&self) {
        self.job.interrupt();
    }

    /// Block until the job finishes and take its outcome
    ///
    /// # Errors
    ///
    /// Returns whatever the job returned, or `Error::JobPanicked` if it
    /// panicked.
    pub fn join(mut self) -> Result<T> {
        self.job.wait_finished();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        self.outcome
            .lock()
            .take()
            .unwrap_or_else(|| Err(Error::JobPanicked(self.job.label().to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_join_returns_outcome() {
        let handle = JobHandle::spawn(1, "answer", |_| Ok(42)).unwrap();
        assert_eq!(handle.join().unwrap(), 42);
    }

    #[test]
    fn test_thread_is_named_after_label() {
        let handle = JobHandle::spawn(1, "stat-Alex-1", |_| {
            Ok(std::thread::current().name().map(str::to_string))
        })
        .unwrap();
        assert_eq!(handle.join().unwrap().as_deref(), Some("stat-Alex-1"));
    }

    #[test]
    fn test_error_outcome_is_propagated() {
        let handle: JobHandle<()> =
            JobHandle::spawn(1, "failing", |_| Err(Error::collaborator("down"))).unwrap();
        assert!(matches!(handle.join(), Err(Error::Collaborator(_))));
    }

    #[test]
    fn test_panic_releases_joiners() {
        let handle: JobHandle<()> = JobHandle::spawn(1, "panicky", |_| {
            panic!("intentional test panic");
        })
        .unwrap();
        let job = handle.job().clone();
        assert!(matches!(handle.join(), Err(Error::JobPanicked(_))));
        assert!(!job.is_alive());
    }

    #[test]
    fn test_wait_for_blocks_until_other_finishes() {
        let (release, gate) = mpsc::channel::<()>();
        let first = JobHandle::spawn(1, "first", move |_| {
            gate.recv().ok();
            Ok(())
        })
        .unwrap();
        let first_job = first.job().clone();

        let second = JobHandle::spawn(2, "second", move |me| {
            me.wait_for(&first_job)?;
            Ok(first_job.is_alive())
        })
        .unwrap();

        std::thread::sleep(Duration::from_millis(50));
        assert!(second.is_alive());
        release.send(()).unwrap();

        assert!(!second.join().unwrap());
        first.join().unwrap();
    }

    #[test]
    fn test_interrupt_wakes_blocked_waiter() {
        let (release, gate) = mpsc::channel::<()>();
        let blocker = JobHandle::spawn(1, "blocker", move |_| {
            gate.recv().ok();
            Ok(())
        })
        .unwrap();
        let blocker_job = blocker.job().clone();

        let waiter: JobHandle<()> =
            JobHandle::spawn(2, "waiter", move |me| me.wait_for(&blocker_job)).unwrap();

        std::thread::sleep(Duration::from_millis(50));
        waiter.interrupt();
        match waiter.join() {
            Err(Error::Interrupted(label)) => assert_eq!(label, "waiter"),
            other => panic!("expected interruption, got {:?}", other),
        }

        assert!(blocker.is_alive());
        release.send(()).unwrap();
        blocker.join().unwrap();
    }

    #[test]
    fn test_wait_for_finished_job_ignores_interrupt() {
        let done = JobHandle::spawn(1, "done", |_| Ok(())).unwrap();
        let done_job = done.job().clone();
        done.join().unwrap();

        let waiter = JobHandle::spawn(2, "waiter", move |me| {
            me.interrupt();
            me.wait_for(&done_job)
        })
        .unwrap();
        assert!(waiter.join().is_ok());
    }

    #[test]
    fn test_inline_job_finishes_on_drop() {
        let inline = InlineJob::start(1, "stat-console-1");
        let inline_job = inline.job().clone();

        let waiter = JobHandle::spawn(2, "waiter", move |me| {
            me.wait_for(&inline_job)?;
            Ok(inline_job.is_alive())
        })
        .unwrap();

        std::thread::sleep(Duration::from_millis(50));
        assert!(waiter.is_alive());
        assert!(inline.job().is_alive());

        drop(inline);
        assert!(!waiter.join().unwrap());
    }

    #[test]
    fn test_inline_job_wait_is_interruptible() {
        let (release, gate) = mpsc::channel::<()>();
        let blocker = JobHandle::spawn(1, "blocker", move |_| {
            gate.recv().ok();
            Ok(())
        })
        .unwrap();

        let inline = InlineJob::start(2, "inline");
        let interrupter = {
            let job = inline.job().clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(50));
                job.interrupt();
            })
        };

        match inline.job().wait_for(blocker.job()) {
            Err(Error::Interrupted(label)) => assert_eq!(label, "inline"),
            other => panic!("expected interruption, got {:?}", other),
        }
        interrupter.join().unwrap();
        release.send(()).unwrap();
        blocker.join().unwrap();
    }

    #[test]
    fn test_wait_for_self_is_rejected() {
        let handle = JobHandle::spawn(1, "selfish", |me| {
            let me_again = me.clone();
            Ok(me.wait_for(&me_again).is_err())
        })
        .unwrap();
        assert!(handle.join().unwrap());
    }
}
