//! Reload cycle
//!
//! A [`ReloadCoordinator`] runs on its own job thread and:
//!
//! 1. joins every stat job admitted before it, plus the previous reload
//! 2. re-reads the config (except on startup) and resolves settings
//! 3. rebuilds the dataset with the [`PlayerSetLoader`](crate::loader::PlayerSetLoader)
//! 4. publishes settings and dataset, then refreshes the share cache
//! 5. tells the requester it is done (full reloads only)
//!
//! Every fallible step runs before the first publish, so a failed cycle
//! leaves the previous settings and dataset in place.

use playerstats_concurrency::{Job, Prerequisites};
use playerstats_core::{Notice, Requester, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::engine::EngineInner;
use crate::loader::FilterPolicy;
use crate::settings::Settings;

/// Whether a cycle re-read the config
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleKind {
    /// First cycle of the process, or the config could not be re-read
    Startup,
    /// The config was re-read
    Reload,
}

/// One reload cycle
pub struct ReloadCoordinator {
    inner: Arc<EngineInner>,
    requester: Option<Requester>,
    ordinal: u64,
}

impl ReloadCoordinator {
    pub(crate) fn new(inner: Arc<EngineInner>, requester: Option<Requester>, ordinal: u64) -> Self {
        ReloadCoordinator {
            inner,
            requester,
            ordinal,
        }
    }

    /// Job label (`reload-<n>`)
    pub fn label(&self) -> String {
        format!("reload-{}", self.ordinal)
    }

    /// Run the cycle on `job`'s thread
    ///
    /// # Errors
    ///
    /// Returns `Error::Interrupted` if `job` is interrupted while joining
    /// its prerequisites, or the first config/directory failure. Nothing
    /// is published in either case.
    pub fn run(self, job: &Job, prerequisites: Prerequisites) -> Result<CycleKind> {
        if prerequisites.any_alive() {
            debug!(
                target: "playerstats::reload",
                job = %job.label(),
                waiting_on = prerequisites.jobs().len(),
                "waiting for running jobs"
            );
        }
        if let Err(e) = job.wait_for_all(prerequisites.jobs()) {
            warn!(target: "playerstats::reload", job = %job.label(), "interrupted while waiting: {}", e);
            return Err(e);
        }

        let started = Instant::now();
        let kind = if self.ordinal > 1 && self.inner.config.reload_config()? {
            CycleKind::Reload
        } else {
            CycleKind::Startup
        };

        let settings = Settings::resolve(self.inner.config.as_ref());
        if let Some(log) = &self.inner.log {
            if let Err(e) = log.set_level(settings.debug_level) {
                warn!(target: "playerstats::reload", "{}", e);
            }
        }
        debug!(
            target: "playerstats::reload",
            elapsed_ms = started.elapsed().as_millis() as u64,
            ?kind,
            "resolved settings"
        );

        let fetch_started = Instant::now();
        let policy = FilterPolicy::resolve(settings.selection, self.inner.directory.as_ref())?;
        let source = self.inner.directory.all_known()?;
        debug!(
            target: "playerstats::reload",
            candidates = source.len(),
            elapsed_ms = fetch_started.elapsed().as_millis() as u64,
            "fetched candidates"
        );

        let load_started = Instant::now();
        let dataset = self
            .inner
            .loader
            .load(&source, &policy, settings.last_activity_limit);
        let load_time = load_started.elapsed();
        let loaded = dataset.len();

        let (sharing_enabled, share_cooldown_minutes) =
            (settings.sharing_enabled, settings.share_cooldown_minutes);
        self.inner.settings.publish(settings);
        self.inner.dataset.publish(dataset);
        self.inner
            .shares
            .update_settings(sharing_enabled, share_cooldown_minutes);

        match kind {
            CycleKind::Startup => self.inner.calc_times.record(load_time),
            CycleKind::Reload => {
                if let Some(requester) = &self.requester {
                    self.inner.notify(requester, Notice::Reloaded);
                }
            }
        }

        info!(
            target: "playerstats::reload",
            job = %job.label(),
            players = loaded,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "loaded players"
        );
        Ok(kind)
    }
}
