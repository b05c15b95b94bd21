//! Stat job
//!
//! A [`StatExecutor`] serves one [`ComputeRequest`] on its own job thread.
//! It joins a running reload first, then computes against the dataset
//! published at that point, renders, optionally saves the result for
//! sharing, and delivers it.

use playerstats_concurrency::{Job, Prerequisites, WaitEstimate};
use playerstats_core::{
    ComputeRequest, ComputeResult, Error, FormattedOutput, Notice, ReferenceDataset, Result,
    ShareCode, StatValue, Target,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace, warn};

use crate::engine::EngineInner;
use crate::settings::Settings;

/// One stat request
pub struct StatExecutor {
    inner: Arc<EngineInner>,
    request: ComputeRequest,
    id: u64,
}

impl StatExecutor {
    pub(crate) fn new(inner: Arc<EngineInner>, request: ComputeRequest, id: u64) -> Self {
        StatExecutor { inner, request, id }
    }

    /// Job label (`stat-<requester>-<n>`)
    pub fn label(&self) -> String {
        format!("stat-{}-{}", self.request.requester.name, self.id)
    }

    /// Run the request on `job`'s thread
    ///
    /// Returns `Ok(None)` when the calculator reported a concurrent
    /// modification; the requester was told (unless it is the console).
    ///
    /// # Errors
    ///
    /// Returns `Error::Interrupted` if `job` is interrupted while waiting
    /// for a reload, and calculator failures other than concurrent
    /// modification unchanged.
    pub fn run(self, job: &Job, prerequisites: Prerequisites) -> Result<Option<ComputeResult>> {
        let requester = &self.request.requester;

        if prerequisites.any_alive() {
            self.inner.notify(requester, Notice::StillReloading);
            debug!(target: "playerstats::stat", job = %job.label(), "waiting for reload");
        }
        job.wait_for_all(prerequisites.jobs())?;

        match self.inner.calc_times.estimate(
            self.inner.limits.wait_notice_after,
            self.inner.limits.long_wait_notice_after,
        ) {
            WaitEstimate::Quick => {}
            WaitEstimate::Short => self.inner.notify(requester, Notice::WaitAMoment { long: false }),
            WaitEstimate::Long => self.inner.notify(requester, Notice::WaitAMoment { long: true }),
        }

        let dataset = self.inner.dataset.load();
        let settings = self.inner.settings.load();
        let value = match self.inner.compute(&self.request, &dataset, &settings) {
            Ok(value) => value,
            Err(Error::ConcurrentModification) => {
                warn!(
                    target: "playerstats::stat",
                    job = %job.label(),
                    "player data changed during calculation, giving up"
                );
                if !requester.is_console() {
                    self.inner.notify(requester, Notice::UnknownError);
                }
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let code = self.save_for_sharing(&value, &settings);
        let rendered = self.inner.formatter.render(&self.request, &value, code);
        self.inner.deliver(requester, &rendered);

        Ok(Some(ComputeResult::new(value, rendered)))
    }

    fn save_for_sharing(&self, value: &StatValue, settings: &Settings) -> Option<ShareCode> {
        let requester = &self.request.requester;
        if requester.is_console() || !settings.sharing_enabled {
            return None;
        }
        let payload = self.inner.formatter.render(&self.request, value, None);
        match self.inner.shares.deposit(&requester.name, payload) {
            Ok(code) => Some(code),
            Err(e) => {
                // Sharing was turned off after this job read its settings
                debug!(target: "playerstats::stat", "result not saved for sharing: {}", e);
                None
            }
        }
    }
}

impl EngineInner {
    /// Dispatch one request to the calculator and time it
    pub(crate) fn compute(
        &self,
        request: &ComputeRequest,
        dataset: &ReferenceDataset,
        settings: &Settings,
    ) -> Result<StatValue> {
        let started = Instant::now();
        let value = match &request.target {
            Target::Player(_) => StatValue::Player(self.calculator.compute_player(request, dataset)?),
            Target::Server => StatValue::Server(self.calculator.compute_server(request, dataset)?),
            Target::Top => {
                let mut top = self.calculator.compute_top(request, dataset)?;
                top.truncate(settings.top_list_size);
                StatValue::Top(top)
            }
        };
        let elapsed = started.elapsed();
        self.calc_times.record(elapsed);
        trace!(
            target: "playerstats::stat",
            statistic = %request.statistic,
            target_kind = request.target.label(),
            elapsed_ms = elapsed.as_millis() as u64,
            "calculated"
        );
        Ok(value)
    }

    /// Render without a share code
    pub(crate) fn render_plain(&self, request: &ComputeRequest, value: &StatValue) -> FormattedOutput {
        self.formatter.render(request, value, None)
    }
}
