//! Capture dispatcher - one background capture/save cycle per hotkey press
//!
//! Presses are never merged, queued or capped: each one gets its own blocking task
//! on the runtime and runs to completion.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use log::{error, info};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::capture::CaptureEngine;
use crate::persistence;
use crate::settings::{Settings, SettingsStore};

#[derive(Clone)]
pub struct CaptureDispatcher {
    runtime: Handle,
    engine: Arc<CaptureEngine>,
    settings: Arc<SettingsStore>,
    presses: Arc<AtomicU64>,
}

impl CaptureDispatcher {
    pub fn new(runtime: Handle, engine: Arc<CaptureEngine>, settings: Arc<SettingsStore>) -> Self {
        Self {
            runtime,
            engine,
            settings,
            presses: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Presses seen so far
    pub fn presses(&self) -> u64 {
        self.presses.load(Ordering::Relaxed)
    }

    /// Start a capture/save cycle with the current settings
    ///
    /// Returns immediately; the handle resolves to the saved path, or `None` when
    /// the cycle failed (the failure is logged).
    pub fn dispatch(&self) -> JoinHandle<Option<PathBuf>> {
        let press = self.presses.fetch_add(1, Ordering::Relaxed) + 1;
        let settings = self.settings.snapshot();
        let engine = Arc::clone(&self.engine);

        info!("Hotkey press #{}: capturing {}", press, settings.capture_mode);
        self.runtime.spawn_blocking(move || match run_cycle(&engine, &settings) {
            Ok(path) => Some(path),
            Err(e) => {
                error!("Screenshot #{} failed: {:#}", press, e);
                None
            }
        })
    }
}

fn run_cycle(engine: &CaptureEngine, settings: &Settings) -> Result<PathBuf> {
    let image = engine.capture(settings.capture_mode)?;
    persistence::save(&image, &settings.screenshot_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::tests::FakeScreen;
    use crate::capture::{CaptureMode, CaptureRegion, MonitorInfo};
    use std::collections::HashSet;
    use std::time::Duration;

    fn setup(dir: &std::path::Path, blit_delay: Duration) -> (CaptureDispatcher, Arc<FakeScreen>) {
        let mut screen = FakeScreen::new(vec![MonitorInfo::new(CaptureRegion::new(0, 0, 64, 48), true)]);
        screen.blit_delay = blit_delay;
        let screen = Arc::new(screen);

        let store = Arc::new(SettingsStore::open(dir.join("settings.json")));
        store.set_screenshot_path(dir.join("shots")).unwrap();
        store.set_capture_mode(CaptureMode::ActiveScreen).unwrap();

        let engine = Arc::new(CaptureEngine::new(screen.clone()));
        (CaptureDispatcher::new(Handle::current(), engine, store), screen)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn single_press_saves_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let (dispatcher, _) = setup(dir.path(), Duration::ZERO);

        let path = dispatcher.dispatch().await.unwrap().unwrap();

        assert!(path.starts_with(dir.path().join("shots")));
        assert_eq!(image::open(&path).unwrap().width(), 64);
        assert_eq!(dispatcher.presses(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn overlapping_presses_each_produce_their_own_file() {
        let dir = tempfile::tempdir().unwrap();
        let (dispatcher, screen) = setup(dir.path(), Duration::from_millis(200));

        // Every press lands while the earlier captures are still blitting
        let mut handles = Vec::new();
        for _ in 0..5 {
            handles.push(dispatcher.dispatch());
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        let mut paths = HashSet::new();
        for handle in handles {
            paths.insert(handle.await.unwrap().unwrap());
        }

        assert_eq!(paths.len(), 5);
        assert_eq!(dispatcher.presses(), 5);
        assert_eq!(screen.blits.lock().unwrap().len(), 5);
        let files = std::fs::read_dir(dir.path().join("shots")).unwrap().count();
        assert_eq!(files, 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn save_failure_is_logged_not_propagated() {
        let dir = tempfile::tempdir().unwrap();
        let (dispatcher, _) = setup(dir.path(), Duration::ZERO);
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();
        dispatcher.settings.set_screenshot_path(&blocker).unwrap();

        assert_eq!(dispatcher.dispatch().await.unwrap(), None);

        // The next press still works
        dispatcher.settings.set_screenshot_path(dir.path().join("shots")).unwrap();
        assert!(dispatcher.dispatch().await.unwrap().is_some());
    }
}
