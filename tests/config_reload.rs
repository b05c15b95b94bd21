//! Reload cycles driven by a real `playerstats.toml`

mod common;

use common::*;
use playerstats::{FileConfig, Notice, Requester, StatsEngine, CONFIG_FILE_NAME};
use std::sync::Arc;
use tempfile::TempDir;

struct FileHarness {
    engine: StatsEngine,
    config: Arc<FileConfig>,
    sink: Arc<RecordingSink>,
    _dir: TempDir,
}

fn file_harness(initial: &str) -> FileHarness {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(CONFIG_FILE_NAME), initial).unwrap();
    let config = Arc::new(FileConfig::open_in(dir.path()).unwrap());
    let sink = Arc::new(RecordingSink::default());

    let engine = StatsEngine::builder()
        .config(config.clone())
        .directory(Arc::new(FakeDirectory::with_players(named_players(12))))
        .calculator(Arc::new(ScriptedCalculator::default()))
        .formatter(Arc::new(TextFormatter::default()))
        .sink(sink.clone())
        .build()
        .unwrap();
    engine.submit_reload(None).unwrap().join().unwrap();

    FileHarness {
        engine,
        config,
        sink,
        _dir: dir,
    }
}

fn admin() -> Requester {
    Requester::player("Admin")
}

#[test]
fn edited_file_applies_on_reload() {
    let h = file_harness("top_list_size = 4\n");
    assert_eq!(h.engine.settings().top_list_size, 4);
    assert!(h.engine.shares().is_enabled());

    std::fs::write(
        h.config.path(),
        "top_list_size = 6\nenable_stat_sharing = false\n",
    )
    .unwrap();
    h.engine.submit_reload(Some(admin())).unwrap().join().unwrap();

    assert_eq!(h.engine.settings().top_list_size, 6);
    assert!(!h.engine.shares().is_enabled());
    assert_eq!(h.sink.notices_for("Admin"), vec![Notice::Reloaded]);
}

#[test]
fn vanished_file_reloads_like_startup() {
    let h = file_harness("share_waiting_time_minutes = 2\n");
    std::fs::remove_file(h.config.path()).unwrap();

    h.engine.submit_reload(Some(admin())).unwrap().join().unwrap();

    assert!(h.sink.notices_for("Admin").is_empty());
    assert_eq!(h.engine.settings().share_cooldown_minutes, 2);
    assert_eq!(h.engine.dataset().len(), 12);
}

#[test]
fn broken_file_fails_the_reload() {
    let h = file_harness("");
    std::fs::write(h.config.path(), "debug_level = \"shouting\"\n").unwrap();

    let result = h.engine.submit_reload(Some(admin())).unwrap().join();
    assert!(matches!(result, Err(playerstats::Error::Config(_))));
    assert!(h.sink.notices_for("Admin").is_empty());
    assert_eq!(h.engine.dataset().len(), 12);
}
