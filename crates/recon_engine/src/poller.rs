use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use engine_logging::{engine_debug, engine_error, engine_info};
use recon_core::{Feature, Job};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::client::{ApiError, ScanApi};

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Source of the job list a poller reconciles against.
#[async_trait::async_trait]
pub trait JobFetcher: Send + Sync {
    async fn fetch_jobs(&self) -> Result<Vec<Job>, ApiError>;
}

/// Receives every successful fetch. Implementations replace what they show
/// wholesale; a failed fetch never reaches `render`.
pub trait RenderSink: Send + Sync {
    fn render(&self, jobs: &[Job], fetched_at: DateTime<Utc>);

    /// Called after a failed fetch. The last render must stay in place.
    fn fetch_failed(&self, _error: &ApiError) {}
}

/// Lists the jobs of one feature through a [`ScanApi`].
pub struct FeatureJobFetcher {
    api: Arc<dyn ScanApi>,
    feature: Feature,
}

impl FeatureJobFetcher {
    pub fn new(api: Arc<dyn ScanApi>, feature: Feature) -> Self {
        Self { api, feature }
    }
}

#[async_trait::async_trait]
impl JobFetcher for FeatureJobFetcher {
    async fn fetch_jobs(&self) -> Result<Vec<Job>, ApiError> {
        self.api.list_jobs(self.feature).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Fetched and rendered this many jobs.
    Rendered(usize),
    Paused,
    Failed,
    /// The poller was stopped or restarted while the fetch was in flight.
    Discarded,
    /// Nothing to poll: never started, or stopped.
    Idle,
}

/// What asked for a reconciliation.
#[derive(Debug, Clone, Copy)]
enum Trigger {
    /// A timer tick belonging to the given generation.
    Scheduled(u64),
    /// A caller-driven tick that still honours the pause flag.
    Manual,
    /// A fetch the user or a submission asked for; runs even while paused.
    OutOfBand,
}

#[derive(Clone)]
struct Wiring {
    fetcher: Arc<dyn JobFetcher>,
    sink: Arc<dyn RenderSink>,
    generation: u64,
}

#[derive(Default)]
struct Shared {
    paused: AtomicBool,
    generation: AtomicU64,
    active_timers: AtomicUsize,
    wiring: Mutex<Option<Wiring>>,
    last_tick: Mutex<Option<DateTime<Utc>>>,
}

impl Shared {
    fn wiring(&self) -> MutexGuard<'_, Option<Wiring>> {
        self.wiring.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn tick(&self, trigger: Trigger) -> TickOutcome {
        let current = self.wiring().clone();
        let Some(wiring) = current else {
            return TickOutcome::Idle;
        };
        match trigger {
            Trigger::Scheduled(generation) if generation != wiring.generation => {
                return TickOutcome::Discarded;
            }
            Trigger::Scheduled(_) | Trigger::Manual if self.paused.load(Ordering::SeqCst) => {
                return TickOutcome::Paused;
            }
            _ => {}
        }

        *self
            .last_tick
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(Utc::now());

        let result = wiring.fetcher.fetch_jobs().await;
        if self.generation.load(Ordering::SeqCst) != wiring.generation {
            engine_debug!("Discarding fetch result from generation {}", wiring.generation);
            return TickOutcome::Discarded;
        }

        match result {
            Ok(jobs) => {
                wiring.sink.render(&jobs, Utc::now());
                TickOutcome::Rendered(jobs.len())
            }
            Err(err) => {
                engine_error!("Job status fetch failed ({}): {}", err.kind, err.message);
                wiring.sink.fetch_failed(&err);
                TickOutcome::Failed
            }
        }
    }
}

struct Timer {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Decrements the live-timer count when the timer task goes away, however
/// it ends.
struct TimerGuard(Arc<Shared>);

impl Drop for TimerGuard {
    fn drop(&mut self) {
        self.0.active_timers.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Periodically fetches the job list of the active module and hands it to a
/// [`RenderSink`].
///
/// At most one timer is live per poller. Every scheduled tick runs in its own
/// task, so a slow fetch neither delays the next tick nor blocks `stop`.
/// Results of fetches that were in flight when the poller stopped or
/// restarted are dropped.
pub struct JobStatusPoller {
    shared: Arc<Shared>,
    timer: Mutex<Option<Timer>>,
}

impl Default for JobStatusPoller {
    fn default() -> Self {
        Self::new()
    }
}

impl JobStatusPoller {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            timer: Mutex::new(None),
        }
    }

    fn timer(&self) -> MutexGuard<'_, Option<Timer>> {
        self.timer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Starts polling, replacing any timer that is already running. The first
    /// tick fires immediately. Must be called from within a tokio runtime.
    pub fn start(
        &self,
        interval: Duration,
        fetcher: Arc<dyn JobFetcher>,
        sink: Arc<dyn RenderSink>,
    ) {
        self.stop();

        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.shared.wiring() = Some(Wiring {
            fetcher,
            sink,
            generation,
        });

        let interval = interval.max(MIN_INTERVAL);
        let cancel = CancellationToken::new();
        self.shared.active_timers.fetch_add(1, Ordering::SeqCst);
        let guard = TimerGuard(self.shared.clone());
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            let guard = guard;
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let shared = guard.0.clone();
                        tokio::spawn(async move {
                            shared.tick(Trigger::Scheduled(generation)).await;
                        });
                    }
                }
            }
        });

        engine_info!(
            "Job status poller started (generation {}, every {} ms)",
            generation,
            interval.as_millis()
        );
        *self.timer() = Some(Timer { cancel, task });
    }

    /// Cancels the timer. Safe to call any number of times. Fetches already in
    /// flight run to completion but their results are discarded.
    pub fn stop(&self) {
        let timer = self.timer().take();
        let had_wiring = self.shared.wiring().take().is_some();
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(timer) = timer {
            timer.cancel.cancel();
            timer.task.abort();
        }
        if had_wiring {
            engine_info!("Job status poller stopped");
        }
    }

    /// Runs one reconciliation right now, outside the schedule. Pausing only
    /// silences the timer, so this fetches even while paused.
    pub async fn poll_now(&self) -> TickOutcome {
        engine_debug!("Out-of-band poll");
        self.shared.tick(Trigger::OutOfBand).await
    }

    /// Runs one reconciliation the way a timer tick would; a no-op while
    /// paused.
    pub async fn tick(&self) -> TickOutcome {
        self.shared.tick(Trigger::Manual).await
    }

    pub fn pause(&self) {
        if !self.shared.paused.swap(true, Ordering::SeqCst) {
            engine_info!("Job status polling paused");
        }
    }

    pub fn resume(&self) {
        if self.shared.paused.swap(false, Ordering::SeqCst) {
            engine_info!("Job status polling resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.shared.paused.load(Ordering::SeqCst)
    }

    /// True while a timer is scheduled.
    pub fn is_active(&self) -> bool {
        self.timer()
            .as_ref()
            .is_some_and(|timer| !timer.cancel.is_cancelled())
    }

    /// Number of timer tasks still alive. A stopped timer leaves this count
    /// once its task has been torn down by the runtime.
    pub fn active_timers(&self) -> usize {
        self.shared.active_timers.load(Ordering::SeqCst)
    }

    /// Wall-clock time of the last tick that actually fetched.
    pub fn last_tick(&self) -> Option<DateTime<Utc>> {
        *self
            .shared
            .last_tick
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for JobStatusPoller {
    fn drop(&mut self) {
        self.stop();
    }
}
