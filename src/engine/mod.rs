//! Task-dispatch and visit-orchestration engine.
//!
//! `TrafficEngine` owns the shared task queue, the schedule gate, the
//! behavior profile, the aggregate statistics, and the worker pool. The
//! control plane drives it through `start`/`stop`/`pause`/`resume` and the
//! keyword/URL/tracking setters.

pub mod queue;
pub mod stats;
pub mod visit;
pub mod worker;

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Duration, timeout};

use crate::behavior::BehaviorProfile;
use crate::collab::{BrowserDriver, CaptchaSolver, NetworkIdentityProvider};
use crate::error::Result;
use crate::schedule::{DistributionMode, Period, ScheduleStats, TrafficSchedule};
pub use queue::{Task, TaskQueue};
pub use stats::{EngineStats, StatsSnapshot};
pub use worker::Pacing;

/// Externally observable pool state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    Stopped,
    Running,
    Paused,
}

/// Engine statistics combined with the scheduler projection, for the control
/// plane's stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CombinedStats {
    pub state: EngineState,
    pub engine: StatsSnapshot,
    pub scheduler: ScheduleStats,
}

/// The traffic generation engine. Collaborators are injected as trait
/// objects; all shared state is lock- or atomic-protected for the workers.
pub struct TrafficEngine {
    keywords: Mutex<Vec<String>>,
    urls: Mutex<Vec<String>>,
    tracking_urls: Arc<Mutex<HashMap<String, String>>>,

    schedule: Arc<Mutex<TrafficSchedule>>,
    profile: Arc<BehaviorProfile>,
    stats: Arc<EngineStats>,
    queue: TaskQueue,

    browser: Arc<dyn BrowserDriver>,
    captcha: Arc<dyn CaptchaSolver>,
    network: Arc<dyn NetworkIdentityProvider>,

    state_tx: watch::Sender<EngineState>,
    state_rx: watch::Receiver<EngineState>,
    workers: Mutex<Vec<JoinHandle<()>>>,

    pacing: Pacing,
    max_workers: usize,
}

impl TrafficEngine {
    pub fn new(
        profile: BehaviorProfile,
        schedule: TrafficSchedule,
        browser: Arc<dyn BrowserDriver>,
        captcha: Arc<dyn CaptchaSolver>,
        network: Arc<dyn NetworkIdentityProvider>,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(EngineState::Stopped);
        Self {
            keywords: Mutex::new(Vec::new()),
            urls: Mutex::new(Vec::new()),
            tracking_urls: Arc::new(Mutex::new(HashMap::new())),
            schedule: Arc::new(Mutex::new(schedule)),
            profile: Arc::new(profile),
            stats: Arc::new(EngineStats::new()),
            queue: TaskQueue::new(),
            browser,
            captcha,
            network,
            state_tx,
            state_rx,
            workers: Mutex::new(Vec::new()),
            pacing: Pacing::default(),
            max_workers: 8,
        }
    }

    /// Override worker-loop and interaction pacing.
    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Cap on the worker count accepted by `start`.
    pub fn with_max_workers(mut self, max: usize) -> Self {
        self.max_workers = max.max(1);
        self
    }

    pub fn state(&self) -> EngineState {
        *self.state_rx.borrow()
    }

    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    /// Handle to the schedule gate for direct configuration.
    pub fn schedule(&self) -> Arc<Mutex<TrafficSchedule>> {
        self.schedule.clone()
    }

    // Keyword and URL management.

    pub fn set_keywords(&self, keywords: Vec<String>) {
        *self.keywords.lock().unwrap() = keywords;
    }

    pub fn set_urls(&self, urls: Vec<String>) {
        *self.urls.lock().unwrap() = urls;
    }

    pub fn add_keyword(&self, keyword: &str) {
        if keyword.is_empty() {
            return;
        }
        let mut keywords = self.keywords.lock().unwrap();
        if !keywords.iter().any(|k| k == keyword) {
            tracing::info!(keyword, "added keyword");
            keywords.push(keyword.to_string());
        }
    }

    pub fn add_url(&self, url: &str) {
        if url.is_empty() {
            return;
        }
        let mut urls = self.urls.lock().unwrap();
        if !urls.iter().any(|u| u == url) {
            tracing::info!(url, "added url");
            urls.push(url.to_string());
        }
    }

    /// Load keywords from a file, one per line, skipping blanks.
    pub fn load_keywords(&self, path: &Path) -> Result<usize> {
        let lines = read_lines(path)?;
        let count = lines.len();
        *self.keywords.lock().unwrap() = lines;
        tracing::info!(count, path = %path.display(), "loaded keywords");
        Ok(count)
    }

    /// Load URLs from a file, one per line, skipping blanks.
    pub fn load_urls(&self, path: &Path) -> Result<usize> {
        let lines = read_lines(path)?;
        let count = lines.len();
        *self.urls.lock().unwrap() = lines;
        tracing::info!(count, path = %path.display(), "loaded urls");
        Ok(count)
    }

    /// Use `tracking_url` in place of `original_url` when visiting.
    pub fn add_tracking_url(&self, original_url: &str, tracking_url: &str) {
        tracing::info!(original_url, tracking_url, "added tracking url");
        self.tracking_urls
            .lock()
            .unwrap()
            .insert(original_url.to_string(), tracking_url.to_string());
    }

    pub fn remove_tracking_url(&self, original_url: &str) {
        self.tracking_urls.lock().unwrap().remove(original_url);
    }

    // Scheduler passthroughs for the control plane.

    pub fn set_target(&self, period: Period, value: u64) -> Result<()> {
        self.schedule.lock().unwrap().set_target(period, value, now())
    }

    pub fn set_time_range(
        &self,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> Result<()> {
        self.schedule.lock().unwrap().set_time_range(start, end, now())
    }

    pub fn set_active_hours(&self, hours: &[u32]) -> Result<()> {
        self.schedule.lock().unwrap().set_active_hours(hours, now())
    }

    pub fn set_active_days(&self, days: &[u32]) -> Result<()> {
        self.schedule.lock().unwrap().set_active_days(days, now())
    }

    pub fn set_mode(&self, mode: DistributionMode) -> Result<()> {
        self.schedule.lock().unwrap().set_mode(mode, now())
    }

    /// Start the worker pool. No-op unless stopped. The initial backlog is
    /// seeded once here, never re-seeded later.
    pub fn start(&self, worker_count: usize) {
        if self.state() != EngineState::Stopped {
            return;
        }

        let worker_count = worker_count.clamp(1, self.max_workers);
        self.stats.mark_started(now());
        self.seed_initial_tasks();
        self.state_tx.send_replace(EngineState::Running);

        let mut workers = self.workers.lock().unwrap();
        for id in 0..worker_count {
            let ctx = self.worker_context();
            let state_rx = self.state_rx.clone();
            workers.push(tokio::spawn(worker::run_worker(id, ctx, state_rx)));
        }

        tracing::info!(workers = worker_count, "traffic engine started");
    }

    /// Suspend task execution without losing workers or queued tasks.
    pub fn pause(&self) {
        if self.state() != EngineState::Running {
            return;
        }
        self.state_tx.send_replace(EngineState::Paused);
        tracing::info!("traffic engine paused");
    }

    /// Continue execution with the same workers; no respawn happens.
    pub fn resume(&self) {
        if self.state() != EngineState::Paused {
            return;
        }
        self.state_tx.send_replace(EngineState::Running);
        tracing::info!("traffic engine resumed");
    }

    /// Stop the pool: cooperative signal plus a bounded join per worker.
    /// In-flight visits are not interrupted, only prevented from starting.
    pub async fn stop(&self) {
        if self.state() == EngineState::Stopped {
            return;
        }
        self.state_tx.send_replace(EngineState::Stopped);

        let handles: Vec<JoinHandle<()>> = self.workers.lock().unwrap().drain(..).collect();
        for mut handle in handles {
            if timeout(Duration::from_secs(2), &mut handle).await.is_err() {
                tracing::warn!("worker did not exit in time, aborting");
                handle.abort();
            }
        }

        tracing::info!("traffic engine stopped");
    }

    /// Combined engine and scheduler statistics.
    pub fn get_stats(&self) -> CombinedStats {
        CombinedStats {
            state: self.state(),
            engine: self.stats.snapshot(),
            scheduler: self.schedule.lock().unwrap().stats(now()),
        }
    }

    fn seed_initial_tasks(&self) {
        for url in self.urls.lock().unwrap().iter() {
            self.queue.push(Task::Visit { url: url.clone() });
        }
        for keyword in self.keywords.lock().unwrap().iter() {
            self.queue.push(Task::Search { keyword: keyword.clone() });
        }
        tracing::debug!(backlog = self.queue.len(), "seeded initial tasks");
    }

    fn worker_context(&self) -> worker::WorkerContext {
        worker::WorkerContext {
            queue: self.queue.clone(),
            schedule: self.schedule.clone(),
            stats: self.stats.clone(),
            profile: self.profile.clone(),
            tracking_urls: self.tracking_urls.clone(),
            browser: self.browser.clone(),
            captcha: self.captcha.clone(),
            network: self.network.clone(),
            pacing: self.pacing,
        }
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::BehaviorSettings;
    use crate::collab::stub::{DirectNetwork, LogOnlyBrowser, NoopCaptcha};
    use std::io::Write;

    fn engine() -> TrafficEngine {
        let profile = BehaviorProfile::new(BehaviorSettings::default()).unwrap();
        TrafficEngine::new(
            profile,
            TrafficSchedule::new(),
            Arc::new(LogOnlyBrowser),
            Arc::new(NoopCaptcha),
            Arc::new(DirectNetwork),
        )
        .with_pacing(Pacing { poll_interval_ms: 10, interaction_delay_ms: 1 })
    }

    #[test]
    fn test_initial_state_is_stopped() {
        let e = engine();
        assert_eq!(e.state(), EngineState::Stopped);
        assert!(e.queue().is_empty());
    }

    #[test]
    fn test_seed_initial_tasks_order() {
        let e = engine();
        e.set_urls(vec!["https://a.example".to_string()]);
        e.set_keywords(vec!["rust scheduling".to_string()]);
        e.seed_initial_tasks();

        // URLs first, then keywords, matching seeding order.
        assert_eq!(e.queue().pop(), Some(Task::Visit { url: "https://a.example".to_string() }));
        assert_eq!(
            e.queue().pop(),
            Some(Task::Search { keyword: "rust scheduling".to_string() })
        );
    }

    #[test]
    fn test_add_keyword_dedupes_and_skips_empty() {
        let e = engine();
        e.add_keyword("rust");
        e.add_keyword("rust");
        e.add_keyword("");
        assert_eq!(e.keywords.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_add_url_dedupes() {
        let e = engine();
        e.add_url("https://a.example");
        e.add_url("https://a.example");
        e.add_url("https://b.example");
        assert_eq!(e.urls.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_load_keywords_skips_blank_lines() {
        let e = engine();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "first keyword\n\n  \nsecond keyword").unwrap();

        let count = e.load_keywords(file.path()).unwrap();
        assert_eq!(count, 2);
        assert_eq!(e.keywords.lock().unwrap()[1], "second keyword");
    }

    #[test]
    fn test_load_urls_missing_file_is_io_error() {
        let e = engine();
        let err = e.load_urls(Path::new("/nonexistent/urls.txt"));
        assert!(matches!(err, Err(crate::error::TrafficError::Io(_))));
    }

    #[test]
    fn test_tracking_url_round_trip() {
        let e = engine();
        e.add_tracking_url("https://a.example", "https://t.example/track?u=a");
        assert_eq!(
            e.worker_context().tracking_url("https://a.example"),
            "https://t.example/track?u=a"
        );
        e.remove_tracking_url("https://a.example");
        assert_eq!(e.worker_context().tracking_url("https://a.example"), "https://a.example");
    }

    #[tokio::test]
    async fn test_start_twice_is_noop() {
        let e = engine();
        e.start(2);
        assert_eq!(e.state(), EngineState::Running);
        assert_eq!(e.workers.lock().unwrap().len(), 2);

        e.start(5);
        assert_eq!(e.workers.lock().unwrap().len(), 2);

        e.stop().await;
    }

    #[tokio::test]
    async fn test_worker_count_is_capped() {
        let e = engine().with_max_workers(4);
        e.start(100);
        assert_eq!(e.workers.lock().unwrap().len(), 4);
        e.stop().await;
    }

    #[tokio::test]
    async fn test_stop_when_stopped_is_noop() {
        let e = engine();
        e.stop().await;
        assert_eq!(e.state(), EngineState::Stopped);
    }

    #[tokio::test]
    async fn test_pause_and_resume_transitions() {
        let e = engine();

        // Pause before start is a no-op.
        e.pause();
        assert_eq!(e.state(), EngineState::Stopped);

        e.start(1);
        e.pause();
        assert_eq!(e.state(), EngineState::Paused);

        // Resume only applies when paused.
        e.resume();
        assert_eq!(e.state(), EngineState::Running);
        e.resume();
        assert_eq!(e.state(), EngineState::Running);

        e.stop().await;
        assert_eq!(e.state(), EngineState::Stopped);
    }

    #[tokio::test]
    async fn test_get_stats_shape() {
        let e = engine();
        let stats = e.get_stats();
        assert_eq!(stats.state, EngineState::Stopped);
        assert_eq!(stats.engine.visits, 0);
        assert_eq!(stats.scheduler.current.total, 0);

        let json = serde_json::to_value(&stats).unwrap();
        assert!(json.get("scheduler").is_some());
        assert!(json.get("engine").is_some());
    }
}
