//! Shared test utilities for the integration suites.
//!
//! In-memory stand-ins for every collaborator the engine calls, plus a
//! [`Harness`] that wires them into a [`StatsEngine`].
//! Import via `mod common;` from any suite.

#![allow(dead_code)]

use parking_lot::{Condvar, Mutex};
use playerstats::{
    Calculator, ComputeRequest, Error, FormattedOutput, KnownPlayer, Limits, ManualClock,
    MemoryConfig, Notice, NotificationSink, OutputFormatter, PlayerDirectory, PlayerId,
    ReferenceDataset, Requester, Result, ShareCode, StatValue, StatsConfig, StatsEngine, TopList,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Upper bound for every wait in the suites
pub const PATIENCE: Duration = Duration::from_secs(10);

// ============================================================================
// Gate - lets a test hold a collaborator call in place
// ============================================================================

#[derive(Default)]
struct GateState {
    closed: bool,
    entered: usize,
}

/// A barrier a collaborator passes through on every call
///
/// While closed, callers block inside `pass`. Tests use `wait_entered` to
/// know a job reached the collaborator.
#[derive(Default)]
pub struct Gate {
    state: Mutex<GateState>,
    changed: Condvar,
}

impl Gate {
    pub fn close(&self) {
        self.state.lock().closed = true;
    }

    pub fn open(&self) {
        self.state.lock().closed = false;
        self.changed.notify_all();
    }

    pub fn pass(&self) {
        let mut state = self.state.lock();
        state.entered += 1;
        self.changed.notify_all();
        while state.closed {
            self.changed.wait(&mut state);
        }
    }

    /// Wait until `count` calls entered the gate
    pub fn wait_entered(&self, count: usize) -> bool {
        let deadline = Instant::now() + PATIENCE;
        let mut state = self.state.lock();
        while state.entered < count {
            if self.changed.wait_until(&mut state, deadline).timed_out() {
                return state.entered >= count;
            }
        }
        true
    }

    pub fn entered(&self) -> usize {
        self.state.lock().entered
    }
}

// ============================================================================
// Collaborators
// ============================================================================

/// Player directory backed by vectors
#[derive(Default)]
pub struct FakeDirectory {
    pub players: Mutex<Vec<KnownPlayer>>,
    pub whitelist: Mutex<Vec<KnownPlayer>>,
    pub banned: Mutex<HashSet<PlayerId>>,
    pub gate: Gate,
    pub fail: AtomicBool,
}

impl FakeDirectory {
    pub fn with_players(players: Vec<KnownPlayer>) -> Self {
        FakeDirectory {
            players: Mutex::new(players),
            ..Default::default()
        }
    }

    pub fn set_players(&self, players: Vec<KnownPlayer>) {
        *self.players.lock() = players;
    }
}

impl PlayerDirectory for FakeDirectory {
    fn all_known(&self) -> Result<Vec<KnownPlayer>> {
        self.gate.pass();
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::collaborator("player directory unavailable"));
        }
        Ok(self.players.lock().clone())
    }

    fn whitelisted(&self) -> Result<Vec<KnownPlayer>> {
        Ok(self.whitelist.lock().clone())
    }

    fn banned(&self) -> Result<HashSet<PlayerId>> {
        Ok(self.banned.lock().clone())
    }
}

/// What the calculator should do on its next call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Answer,
    ConcurrentModification,
    Panic,
}

/// Calculator returning fixed values and recording what it saw
pub struct ScriptedCalculator {
    pub player_value: i32,
    pub server_value: i64,
    pub top: Vec<(String, i32)>,
    pub gate: Gate,
    pub calls: AtomicUsize,
    pub next: Mutex<Script>,
    pub seen_dataset_sizes: Mutex<Vec<usize>>,
}

impl Default for ScriptedCalculator {
    fn default() -> Self {
        ScriptedCalculator {
            player_value: 42,
            server_value: 4_200,
            top: (1..=5).map(|i| (format!("player{i}"), 100 - i)).collect(),
            gate: Gate::default(),
            calls: AtomicUsize::new(0),
            next: Mutex::new(Script::Answer),
            seen_dataset_sizes: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedCalculator {
    pub fn script(&self, next: Script) {
        *self.next.lock() = next;
    }

    fn enter(&self, dataset: &ReferenceDataset) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_dataset_sizes.lock().push(dataset.len());
        self.gate.pass();
        let script = std::mem::replace(&mut *self.next.lock(), Script::Answer);
        match script {
            Script::Answer => Ok(()),
            Script::ConcurrentModification => Err(Error::ConcurrentModification),
            Script::Panic => panic!("calculator exploded"),
        }
    }
}

impl Calculator for ScriptedCalculator {
    fn compute_player(&self, _request: &ComputeRequest, dataset: &ReferenceDataset) -> Result<i32> {
        self.enter(dataset)?;
        Ok(self.player_value)
    }

    fn compute_server(&self, _request: &ComputeRequest, dataset: &ReferenceDataset) -> Result<i64> {
        self.enter(dataset)?;
        Ok(self.server_value)
    }

    fn compute_top(&self, _request: &ComputeRequest, dataset: &ReferenceDataset) -> Result<TopList> {
        self.enter(dataset)?;
        Ok(TopList::new(self.top.clone()))
    }
}

/// Formatter producing `<statistic>=<value>` and `[share <code>]` suffixes
#[derive(Default)]
pub struct TextFormatter {
    pub codes: Mutex<Vec<ShareCode>>,
}

impl TextFormatter {
    pub fn last_code(&self) -> Option<ShareCode> {
        self.codes.lock().last().copied()
    }
}

impl OutputFormatter for TextFormatter {
    fn render(
        &self,
        request: &ComputeRequest,
        value: &StatValue,
        share_code: Option<ShareCode>,
    ) -> FormattedOutput {
        let value = match value {
            StatValue::Player(v) => v.to_string(),
            StatValue::Server(v) => v.to_string(),
            StatValue::Top(top) => top
                .iter()
                .map(|(name, v)| format!("{name}:{v}"))
                .collect::<Vec<_>>()
                .join(","),
        };
        let mut text = format!("{}={}", request.statistic, value);
        if let Some(code) = share_code {
            self.codes.lock().push(code);
            text.push_str(&format!(" [share {code}]"));
        }
        FormattedOutput::new(text)
    }
}

/// Sink that records everything it is asked to send
#[derive(Default)]
pub struct RecordingSink {
    pub notices: Mutex<Vec<(String, Notice)>>,
    pub delivered: Mutex<Vec<(String, FormattedOutput)>>,
    pub broadcasts: Mutex<Vec<(String, FormattedOutput)>>,
    pub fail: AtomicBool,
}

impl RecordingSink {
    pub fn notices_for(&self, name: &str) -> Vec<Notice> {
        self.notices
            .lock()
            .iter()
            .filter(|(to, _)| to == name)
            .map(|(_, notice)| *notice)
            .collect()
    }

    pub fn delivered_to(&self, name: &str) -> Vec<FormattedOutput> {
        self.delivered
            .lock()
            .iter()
            .filter(|(to, _)| to == name)
            .map(|(_, output)| output.clone())
            .collect()
    }

    fn check(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::collaborator("chat is down"));
        }
        Ok(())
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, requester: &Requester, notice: Notice) -> Result<()> {
        self.check()?;
        self.notices.lock().push((requester.name.clone(), notice));
        Ok(())
    }

    fn deliver(&self, requester: &Requester, output: &FormattedOutput) -> Result<()> {
        self.check()?;
        self.delivered
            .lock()
            .push((requester.name.clone(), output.clone()));
        Ok(())
    }

    fn broadcast(&self, from: &Requester, output: &FormattedOutput) -> Result<()> {
        self.check()?;
        self.broadcasts.lock().push((from.name.clone(), output.clone()));
        Ok(())
    }
}

// ============================================================================
// Harness
// ============================================================================

pub fn named_players(count: usize) -> Vec<KnownPlayer> {
    (0..count)
        .map(|i| KnownPlayer::new(format!("player{i}"), PlayerId::new()))
        .collect()
}

/// An engine wired to fakes the test can reach into
pub struct Harness {
    pub engine: StatsEngine,
    pub config: Arc<MemoryConfig>,
    pub directory: Arc<FakeDirectory>,
    pub calculator: Arc<ScriptedCalculator>,
    pub formatter: Arc<TextFormatter>,
    pub sink: Arc<RecordingSink>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new(config: StatsConfig, players: Vec<KnownPlayer>) -> Self {
        Self::with_limits(config, players, Limits::default())
    }

    pub fn with_limits(config: StatsConfig, players: Vec<KnownPlayer>, limits: Limits) -> Self {
        let config = Arc::new(MemoryConfig::new(config));
        let directory = Arc::new(FakeDirectory::with_players(players));
        let calculator = Arc::new(ScriptedCalculator::default());
        let formatter = Arc::new(TextFormatter::default());
        let sink = Arc::new(RecordingSink::default());
        let clock = Arc::new(ManualClock::epoch());

        let engine = StatsEngine::builder()
            .config(config.clone())
            .directory(directory.clone())
            .calculator(calculator.clone())
            .formatter(formatter.clone())
            .sink(sink.clone())
            .clock(clock.clone())
            .limits(limits)
            .build()
            .unwrap();

        Harness {
            engine,
            config,
            directory,
            calculator,
            formatter,
            sink,
            clock,
        }
    }

    /// Engine after its startup reload completed
    pub fn started(config: StatsConfig, players: Vec<KnownPlayer>) -> Self {
        let harness = Self::new(config, players);
        harness.engine.submit_reload(None).unwrap().join().unwrap();
        harness
    }
}

/// Poll `condition` until it holds or patience runs out
pub fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + PATIENCE;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}
