//! The engine context
//!
//! [`StatsEngine`] owns everything a running instance needs: the published
//! dataset and settings, the share cache, the calculation-time tracker,
//! the job book and the collaborators. It is constructed once by the
//! embedding application (see [`EngineBuilder`](crate::builder::EngineBuilder))
//! and cloned freely; clones share one instance.
//!
//! # Job model
//!
//! `submit_reload` and `submit_compute` each spawn one named job thread and
//! return its [`JobHandle`]. Admission goes through the [`JobBook`], so a
//! reload waits for earlier stat jobs and a stat job waits for the latest
//! reload. Stat jobs never wait for each other. `execute` is admitted the
//! same way, with the caller's thread standing in for the job thread.

use playerstats_concurrency::{CalcTimeTracker, JobBook, JobHandle};
use playerstats_core::{
    Calculator, Clock, ComputeRequest, ComputeResult, ConfigProvider, FormattedOutput, Limits,
    Notice, NotificationSink, OutputFormatter, PlayerDirectory, ReferenceDataset, Requester,
    Result, ShareCode,
};
use playerstats_share::{Redemption, ShareCache};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::builder::{Collaborators, EngineBuilder};
use crate::executor::StatExecutor;
use crate::loader::PlayerSetLoader;
use crate::logging::LogHandle;
use crate::reload::ReloadCoordinator;
use crate::settings::Settings;
use crate::snapshot::SnapshotCell;

/// Result of a share attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOutcome {
    /// Sharing is turned off
    Disabled,
    /// The code was redeemed before
    AlreadyShared,
    /// The requester shared too recently
    OnCooldown {
        /// Time left until the requester may share again
        remaining: Duration,
    },
    /// The code is unknown or its result was evicted
    TooOld,
    /// The result was broadcast
    Shared,
}

pub(crate) struct EngineInner {
    pub(crate) config: Arc<dyn ConfigProvider>,
    pub(crate) directory: Arc<dyn PlayerDirectory>,
    pub(crate) calculator: Arc<dyn Calculator>,
    pub(crate) formatter: Arc<dyn OutputFormatter>,
    pub(crate) sink: Arc<dyn NotificationSink>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) limits: Limits,
    pub(crate) log: Option<LogHandle>,
    pub(crate) loader: PlayerSetLoader,
    pub(crate) dataset: SnapshotCell<ReferenceDataset>,
    pub(crate) settings: SnapshotCell<Settings>,
    pub(crate) shares: ShareCache,
    pub(crate) calc_times: CalcTimeTracker,
    pub(crate) jobs: JobBook,
}

impl EngineInner {
    /// Best-effort advisory
    pub(crate) fn notify(&self, requester: &Requester, notice: Notice) {
        if let Err(e) = self.sink.notify(requester, notice) {
            warn!(target: "playerstats::notify", requester = %requester.name, ?notice, "dropped notice: {}", e);
        }
    }

    /// Best-effort result delivery
    pub(crate) fn deliver(&self, requester: &Requester, output: &FormattedOutput) {
        if let Err(e) = self.sink.deliver(requester, output) {
            warn!(target: "playerstats::notify", requester = %requester.name, "dropped result: {}", e);
        }
    }

    /// Best-effort broadcast
    pub(crate) fn broadcast(&self, from: &Requester, output: &FormattedOutput) {
        if let Err(e) = self.sink.broadcast(from, output) {
            warn!(target: "playerstats::notify", from = %from.name, "dropped broadcast: {}", e);
        }
    }
}

/// Handle to a running engine instance
#[derive(Clone)]
pub struct StatsEngine {
    inner: Arc<EngineInner>,
}

impl std::fmt::Debug for StatsEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsEngine")
            .field("players", &self.inner.dataset.load().len())
            .field("shared_results", &self.inner.shares.len())
            .field("reloads", &self.inner.jobs.reloads_admitted())
            .finish()
    }
}

impl StatsEngine {
    /// Start configuring an engine
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub(crate) fn from_parts(
        collaborators: Collaborators,
        clock: Arc<dyn Clock>,
        limits: Limits,
        log: Option<LogHandle>,
    ) -> Self {
        let Collaborators {
            config,
            directory,
            calculator,
            formatter,
            sink,
        } = collaborators;
        let settings = Settings::resolve(config.as_ref());
        let shares = ShareCache::with_limits(
            settings.sharing_enabled,
            settings.share_cooldown_minutes,
            &limits,
            Arc::clone(&clock),
        );
        let loader =
            PlayerSetLoader::new(Arc::clone(&clock)).with_split_threshold(limits.loader_split_threshold);

        StatsEngine {
            inner: Arc::new(EngineInner {
                config,
                directory,
                calculator,
                formatter,
                sink,
                calc_times: CalcTimeTracker::new(limits.calc_time_window),
                clock,
                limits,
                log,
                loader,
                dataset: SnapshotCell::new(ReferenceDataset::empty()),
                settings: SnapshotCell::new(settings),
                shares,
                jobs: JobBook::new(),
            }),
        }
    }

    /// Start a reload cycle
    ///
    /// The first reload of an engine is the startup cycle. `requester` is
    /// told when a later cycle completes.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the job thread cannot be spawned. Failures of
    /// the cycle itself come out of [`JobHandle::join`].
    pub fn submit_reload(&self, requester: Option<Requester>) -> Result<JobHandle<()>> {
        self.inner.jobs.admit_reload(|prerequisites, ordinal| {
            let coordinator =
                ReloadCoordinator::new(Arc::clone(&self.inner), requester, ordinal);
            let label = coordinator.label();
            debug!(target: "playerstats::reload", job = %label, "admitted");
            JobHandle::spawn(self.inner.jobs.next_id(), label, move |job| {
                coordinator.run(job, prerequisites).map(|_| ())
            })
        })
    }

    /// Start a stat job
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRequest` right away for a request that cannot
    /// be dispatched, or `Error::Io` if the job thread cannot be spawned.
    pub fn submit_compute(&self, request: ComputeRequest) -> Result<JobHandle<Option<ComputeResult>>> {
        request.validate()?;
        self.inner.jobs.admit_stat(|prerequisites| {
            let id = self.inner.jobs.next_id();
            let executor = StatExecutor::new(Arc::clone(&self.inner), request, id);
            let label = executor.label();
            JobHandle::spawn(id, label, move |job| executor.run(job, prerequisites))
        })
    }

    /// Compute on the calling thread
    ///
    /// The call is admitted as a stat job: it joins a running reload first,
    /// and a reload submitted meanwhile waits until the call returns. The
    /// result is neither delivered nor saved for sharing.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRequest` for a request that cannot be
    /// dispatched, `Error::Interrupted` if the join on a reload is
    /// interrupted, and calculator failures (including
    /// `Error::ConcurrentModification`) unchanged.
    pub fn execute(&self, request: &ComputeRequest) -> Result<ComputeResult> {
        request.validate()?;
        let (stat, prerequisites) = self
            .inner
            .jobs
            .admit_inline(|id| format!("stat-{}-{}", request.requester.name, id));
        if prerequisites.any_alive() {
            debug!(target: "playerstats::stat", job = %stat.job().label(), "waiting for reload");
        }
        stat.job().wait_for_all(prerequisites.jobs())?;

        let dataset = self.inner.dataset.load();
        let settings = self.inner.settings.load();
        let value = self.inner.compute(request, &dataset, &settings)?;
        let rendered = self.inner.render_plain(request, &value);
        Ok(ComputeResult::new(value, rendered))
    }

    /// Broadcast the result saved under `code` on behalf of `requester`
    ///
    /// Every outcome other than [`ShareOutcome::Shared`] is also sent to
    /// `requester` as a notice.
    pub fn share(&self, requester: &Requester, code: &ShareCode) -> ShareOutcome {
        let shares = &self.inner.shares;
        let (outcome, notice) = if !shares.is_enabled() {
            (ShareOutcome::Disabled, Notice::SharingDisabled)
        } else if shares.already_redeemed(code) {
            (ShareOutcome::AlreadyShared, Notice::ResultsAlreadyShared)
        } else {
            match shares.redeem_if_allowed(&requester.name, code) {
                Redemption::Redeemed(payload) => {
                    self.inner.broadcast(requester, &payload);
                    info!(target: "playerstats::share", requester = %requester.name, "shared result");
                    return ShareOutcome::Shared;
                }
                Redemption::CoolingDown(remaining) => {
                    (ShareOutcome::OnCooldown { remaining }, Notice::StillOnShareCooldown)
                }
                Redemption::Missing => (ShareOutcome::TooOld, Notice::StatResultsTooOld),
            }
        };

        debug!(target: "playerstats::share", requester = %requester.name, ?outcome, "share refused");
        self.inner.notify(requester, notice);
        outcome
    }

    /// The dataset currently published
    pub fn dataset(&self) -> Arc<ReferenceDataset> {
        self.inner.dataset.load()
    }

    /// The settings currently in effect
    pub fn settings(&self) -> Arc<Settings> {
        self.inner.settings.load()
    }

    /// The share cache
    pub fn shares(&self) -> &ShareCache {
        &self.inner.shares
    }

    /// Average of recent calculation times
    pub fn average_calc_time(&self) -> Option<Duration> {
        self.inner.calc_times.average()
    }

    /// True while a reload is running
    pub fn is_reloading(&self) -> bool {
        self.inner.jobs.running_reload().is_some()
    }

    /// Number of stat jobs still running
    pub fn running_stat_jobs(&self) -> usize {
        self.inner.jobs.running_stat_jobs()
    }

    /// The clock the engine reads time from
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.inner.clock
    }
}
