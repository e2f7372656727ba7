//! Worker loop: pull tasks, execute them, feed derived work back.
//!
//! Workers observe the pool state through a watch channel. Pause parks the
//! loop on the channel until the state changes again, so resuming continues
//! the same workers without respawning anything.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{Local, NaiveDateTime};
use tokio::sync::watch;
use tokio::time::{Duration, sleep};

use crate::behavior::BehaviorProfile;
use crate::collab::{BrowserDriver, CaptchaSolver, NetworkIdentityProvider};
use crate::engine::EngineState;
use crate::engine::queue::{Task, TaskQueue};
use crate::engine::stats::EngineStats;
use crate::engine::visit;
use crate::schedule::TrafficSchedule;

/// Cap on visit tasks derived from one search's results.
pub(crate) const TOP_SEARCH_RESULTS: usize = 3;

/// Timing knobs for the worker loop and page interaction ticks.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    /// Bounded wait on an empty queue, so state changes are observed promptly.
    pub poll_interval_ms: u64,
    /// Delay between simulated page interactions.
    pub interaction_delay_ms: u64,
}

impl Default for Pacing {
    fn default() -> Self {
        Self { poll_interval_ms: 250, interaction_delay_ms: 2000 }
    }
}

/// Everything a worker needs, shared by reference across the pool.
#[derive(Clone)]
pub(crate) struct WorkerContext {
    pub queue: TaskQueue,
    pub schedule: Arc<Mutex<TrafficSchedule>>,
    pub stats: Arc<EngineStats>,
    pub profile: Arc<BehaviorProfile>,
    pub tracking_urls: Arc<Mutex<HashMap<String, String>>>,
    pub browser: Arc<dyn BrowserDriver>,
    pub captcha: Arc<dyn CaptchaSolver>,
    pub network: Arc<dyn NetworkIdentityProvider>,
    pub pacing: Pacing,
}

impl WorkerContext {
    pub(crate) fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    pub(crate) fn gate_allows(&self) -> bool {
        self.schedule.lock().unwrap().should_generate_traffic(self.now())
    }

    pub(crate) fn record_visit(&self) {
        self.schedule.lock().unwrap().record_visit();
    }

    /// Tracking-URL substitution: follow the configured mapping when present.
    pub(crate) fn tracking_url(&self, url: &str) -> String {
        self.tracking_urls
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| url.to_string())
    }
}

/// Run one worker until the pool stops.
pub(crate) async fn run_worker(
    id: usize,
    ctx: WorkerContext,
    mut state_rx: watch::Receiver<EngineState>,
) {
    tracing::debug!(worker = id, "worker started");

    loop {
        let state = *state_rx.borrow();
        match state {
            EngineState::Stopped => break,
            EngineState::Paused => {
                // Park until the state changes; the loop itself survives the
                // pause.
                if state_rx.changed().await.is_err() {
                    break;
                }
                continue;
            }
            EngineState::Running => {}
        }

        let Some(task) = ctx.queue.pop() else {
            tokio::select! {
                _ = sleep(Duration::from_millis(ctx.pacing.poll_interval_ms)) => {}
                changed = state_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
            continue;
        };

        match task {
            Task::Search { keyword } => match visit::execute_search(&ctx, &keyword).await {
                Ok(urls) => {
                    for url in urls.into_iter().take(TOP_SEARCH_RESULTS) {
                        ctx.queue.push(Task::Visit { url });
                    }
                }
                Err(e) => {
                    // Dropped without follow-up visits; searches never retry.
                    tracing::error!(worker = id, keyword = %keyword, error = %e, "search failed");
                    ctx.stats.record_search_failure();
                }
            },
            Task::Visit { url } => {
                if let Err(e) = visit::execute_visit(&ctx, &url).await {
                    tracing::error!(worker = id, url = %url, error = %e, "visit failed");
                    ctx.stats.record_failure();
                }
            }
        }
    }

    tracing::debug!(worker = id, "worker exited");
}
