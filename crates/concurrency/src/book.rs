//! Registry of in-flight jobs
//!
//! Reload and stat jobs never share a lock while they run. Instead, each
//! new job is admitted through the [`JobBook`], which hands it the jobs it
//! must join before touching the dataset:
//!
//! - a reload joins every stat job admitted before it, plus the previous
//!   reload (the dataset stays single-writer)
//! - a stat job joins the latest reload
//!
//! Admission (capturing prerequisites, spawning, recording) happens under
//! one lock, so every job only ever waits on jobs admitted earlier and
//! joins cannot form a cycle.

use crate::job::{InlineJob, Job, JobHandle};
use parking_lot::Mutex;
use playerstats_core::Result;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
struct BookInner {
    latest_reload: Option<Job>,
    stat_jobs: Vec<Job>,
}

/// Jobs a newly admitted job must join before it proceeds
#[derive(Debug, Clone, Default)]
pub struct Prerequisites {
    jobs: Vec<Job>,
}

impl Prerequisites {
    /// The jobs to join, oldest first
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// True if nothing needs joining
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// True if any prerequisite is still running
    pub fn any_alive(&self) -> bool {
        self.jobs.iter().any(Job::is_alive)
    }
}

/// Registry of the latest reload and of running stat jobs
#[derive(Default)]
pub struct JobBook {
    inner: Mutex<BookInner>,
    next_id: AtomicU64,
    reloads_admitted: AtomicU64,
}

impl JobBook {
    /// Create an empty book
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next job id (starting at 1)
    pub fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Admit a reload job
    ///
    /// `spawn` receives the stat jobs and the previous reload that are
    /// still alive, plus the 1-based number of this reload (1 = startup).
    pub fn admit_reload<T, F>(&self, spawn: F) -> Result<JobHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce(Prerequisites, u64) -> Result<JobHandle<T>>,
    {
        let mut inner = self.inner.lock();
        inner.stat_jobs.retain(Job::is_alive);

        let mut jobs: Vec<Job> = inner
            .latest_reload
            .iter()
            .filter(|job| job.is_alive())
            .cloned()
            .collect();
        jobs.extend(inner.stat_jobs.iter().cloned());

        let ordinal = self.reloads_admitted.load(Ordering::Relaxed) + 1;
        let handle = spawn(Prerequisites { jobs }, ordinal)?;
        self.reloads_admitted.store(ordinal, Ordering::Relaxed);
        inner.latest_reload = Some(handle.job().clone());
        Ok(handle)
    }

    /// Admit a stat job
    ///
    /// `spawn` receives the latest reload if it is still alive.
    pub fn admit_stat<T, F>(&self, spawn: F) -> Result<JobHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce(Prerequisites) -> Result<JobHandle<T>>,
    {
        let mut inner = self.inner.lock();
        inner.stat_jobs.retain(Job::is_alive);

        let jobs = inner
            .latest_reload
            .iter()
            .filter(|job| job.is_alive())
            .cloned()
            .collect();

        let handle = spawn(Prerequisites { jobs })?;
        inner.stat_jobs.push(handle.job().clone());
        Ok(handle)
    }

    /// Admit a stat job that runs on the calling thread
    ///
    /// The job is recorded like a spawned stat job, so a reload admitted
    /// later joins it. `label` receives the allocated id. The caller joins
    /// the returned prerequisites through [`InlineJob::job`] and drops the
    /// [`InlineJob`] once it no longer reads the dataset.
    pub fn admit_inline(&self, label: impl FnOnce(u64) -> String) -> (InlineJob, Prerequisites) {
        let mut inner = self.inner.lock();
        inner.stat_jobs.retain(Job::is_alive);

        let jobs = inner
            .latest_reload
            .iter()
            .filter(|job| job.is_alive())
            .cloned()
            .collect();

        let id = self.next_id();
        let inline = InlineJob::start(id, label(id));
        inner.stat_jobs.push(inline.job().clone());
        (inline, Prerequisites { jobs })
    }

    /// The latest reload, if it is still running
    pub fn running_reload(&self) -> Option<Job> {
        self.inner
            .lock()
            .latest_reload
            .as_ref()
            .filter(|job| job.is_alive())
            .cloned()
    }

    /// Number of stat jobs still running
    pub fn running_stat_jobs(&self) -> usize {
        self.inner
            .lock()
            .stat_jobs
            .iter()
            .filter(|job| job.is_alive())
            .count()
    }

    /// Number of reloads admitted so far
    pub fn reloads_admitted(&self) -> u64 {
        self.reloads_admitted.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn blocked_job(book: &JobBook, label: &str) -> (JobHandle<()>, mpsc::Sender<()>) {
        let (release, gate) = mpsc::channel::<()>();
        let handle = JobHandle::spawn(book.next_id(), label, move |_| {
            gate.recv().ok();
            Ok(())
        })
        .unwrap();
        (handle, release)
    }

    #[test]
    fn test_first_reload_is_startup() {
        let book = JobBook::new();
        let handle = book
            .admit_reload(|prereq, ordinal| {
                assert!(prereq.is_empty());
                assert_eq!(ordinal, 1);
                JobHandle::spawn(book.next_id(), "reload-1", |_| Ok(()))
            })
            .unwrap();
        handle.join().unwrap();
        assert_eq!(book.reloads_admitted(), 1);
    }

    #[test]
    fn test_reload_captures_running_stat_jobs() {
        let book = JobBook::new();
        let (stat, release) = {
            let (handle, release) = blocked_job(&book, "stat-1");
            let stat = book
                .admit_stat(|prereq| {
                    assert!(prereq.is_empty());
                    Ok(handle)
                })
                .unwrap();
            (stat, release)
        };

        assert_eq!(book.running_stat_jobs(), 1);
        let reload = book
            .admit_reload(|prereq, _| {
                assert_eq!(prereq.jobs().len(), 1);
                assert_eq!(prereq.jobs()[0].label(), "stat-1");
                assert!(prereq.any_alive());
                JobHandle::spawn(book.next_id(), "reload-1", |_| Ok(()))
            })
            .unwrap();

        release.send(()).unwrap();
        stat.join().unwrap();
        reload.join().unwrap();
        assert_eq!(book.running_stat_jobs(), 0);
    }

    #[test]
    fn test_stat_captures_running_reload_only() {
        let book = JobBook::new();
        let (reload, release) = {
            let (handle, release) = blocked_job(&book, "reload-1");
            (book.admit_reload(|_, _| Ok(handle)).unwrap(), release)
        };
        assert!(book.running_reload().is_some());

        let stat = book
            .admit_stat(|prereq| {
                assert_eq!(prereq.jobs().len(), 1);
                assert_eq!(prereq.jobs()[0].label(), "reload-1");
                JobHandle::spawn(book.next_id(), "stat-1", |_| Ok(()))
            })
            .unwrap();

        release.send(()).unwrap();
        reload.join().unwrap();
        stat.join().unwrap();
        assert!(book.running_reload().is_none());
    }

    #[test]
    fn test_finished_jobs_are_not_captured() {
        let book = JobBook::new();
        let reload = book
            .admit_reload(|_, _| JobHandle::spawn(book.next_id(), "reload-1", |_| Ok(())))
            .unwrap();
        reload.join().unwrap();

        let stat = book
            .admit_stat(|prereq| {
                assert!(prereq.is_empty());
                JobHandle::spawn(book.next_id(), "stat-1", |_| Ok(()))
            })
            .unwrap();
        stat.join().unwrap();
    }

    #[test]
    fn test_reload_captures_inline_stat_job() {
        let book = JobBook::new();
        let (inline, prereq) = book.admit_inline(|id| format!("stat-console-{id}"));
        assert!(prereq.is_empty());
        assert_eq!(inline.job().label(), "stat-console-1");
        assert_eq!(book.running_stat_jobs(), 1);

        let reload = book
            .admit_reload(|prereq, _| {
                assert_eq!(prereq.jobs().len(), 1);
                assert_eq!(prereq.jobs()[0].label(), "stat-console-1");
                JobHandle::spawn(book.next_id(), "reload-1", move |job| {
                    job.wait_for_all(prereq.jobs())
                })
            })
            .unwrap();

        std::thread::sleep(std::time::Duration::from_millis(30));
        assert!(reload.is_alive());

        drop(inline);
        reload.join().unwrap();
        assert_eq!(book.running_stat_jobs(), 0);
    }

    #[test]
    fn test_inline_stat_job_captures_running_reload() {
        let book = JobBook::new();
        let (reload, release) = {
            let (handle, release) = blocked_job(&book, "reload-1");
            (book.admit_reload(|_, _| Ok(handle)).unwrap(), release)
        };

        let (inline, prereq) = book.admit_inline(|id| format!("stat-a-{id}"));
        assert_eq!(prereq.jobs().len(), 1);
        assert_eq!(prereq.jobs()[0].label(), "reload-1");

        release.send(()).unwrap();
        inline.job().wait_for_all(prereq.jobs()).unwrap();
        assert!(!reload.is_alive());
        reload.join().unwrap();
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let book = JobBook::new();
        let a = book.next_id();
        let b = book.next_id();
        assert_eq!(a, 1);
        assert!(b > a);
    }
}
