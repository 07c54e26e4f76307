use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use chrono::{DateTime, Utc};
use recon_core::{Job, JobStatus};
use recon_engine::{ApiError, ApiFailureKind, JobFetcher, JobStatusPoller, RenderSink, TickOutcome};

const INTERVAL: Duration = Duration::from_millis(100);

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

/// Returns one running job per call, failing on the listed call numbers.
#[derive(Default)]
struct ScriptedFetcher {
    calls: AtomicUsize,
    fail_on: Vec<usize>,
    delay: Option<Duration>,
}

impl ScriptedFetcher {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl JobFetcher for ScriptedFetcher {
    async fn fetch_jobs(&self) -> Result<Vec<Job>, ApiError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_on.contains(&call) {
            return Err(ApiError::new(ApiFailureKind::Network, "connection refused"));
        }
        Ok(vec![Job {
            id: call as u64,
            status: JobStatus::Running,
            ..Job::default()
        }])
    }
}

#[derive(Default)]
struct RecordingSink {
    renders: Mutex<Vec<Vec<Job>>>,
    failures: AtomicUsize,
}

impl RecordingSink {
    fn render_count(&self) -> usize {
        self.renders.lock().unwrap().len()
    }

    fn last_job_ids(&self) -> Vec<u64> {
        self.renders
            .lock()
            .unwrap()
            .last()
            .map(|jobs| jobs.iter().map(|job| job.id).collect())
            .unwrap_or_default()
    }
}

impl RenderSink for RecordingSink {
    fn render(&self, jobs: &[Job], _fetched_at: DateTime<Utc>) {
        self.renders.lock().unwrap().push(jobs.to_vec());
    }

    fn fetch_failed(&self, _error: &ApiError) {
        self.failures.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test(start_paused = true)]
async fn ticks_immediately_then_on_every_interval() {
    init_logging();
    let poller = JobStatusPoller::new();
    let fetcher = Arc::new(ScriptedFetcher::default());
    let sink = Arc::new(RecordingSink::default());

    poller.start(INTERVAL, fetcher.clone(), sink.clone());
    tokio::time::sleep(Duration::from_millis(350)).await;

    assert_eq!(fetcher.calls(), 4);
    assert_eq!(sink.render_count(), 4);
    assert!(poller.is_active());
    assert!(poller.last_tick().is_some());
}

#[tokio::test(start_paused = true)]
async fn starting_twice_leaves_a_single_timer() {
    init_logging();
    let poller = JobStatusPoller::new();
    let fetcher = Arc::new(ScriptedFetcher::default());
    let sink = Arc::new(RecordingSink::default());

    poller.start(INTERVAL, fetcher.clone(), sink.clone());
    poller.start(INTERVAL, fetcher.clone(), sink.clone());
    tokio::time::sleep(Duration::from_millis(350)).await;

    assert_eq!(poller.active_timers(), 1);
    assert_eq!(fetcher.calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn stopping_twice_is_harmless() {
    init_logging();
    let poller = JobStatusPoller::new();
    let fetcher = Arc::new(ScriptedFetcher::default());
    let sink = Arc::new(RecordingSink::default());

    poller.start(INTERVAL, fetcher.clone(), sink.clone());
    tokio::time::sleep(Duration::from_millis(50)).await;
    poller.stop();
    poller.stop();
    let calls = fetcher.calls();
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert!(!poller.is_active());
    assert_eq!(poller.active_timers(), 0);
    assert_eq!(fetcher.calls(), calls);
    assert_eq!(poller.poll_now().await, TickOutcome::Idle);
}

#[tokio::test(start_paused = true)]
async fn failed_fetch_keeps_last_render_and_next_tick_fires() {
    init_logging();
    let poller = JobStatusPoller::new();
    let fetcher = Arc::new(ScriptedFetcher {
        fail_on: vec![2],
        ..ScriptedFetcher::default()
    });
    let sink = Arc::new(RecordingSink::default());

    poller.start(INTERVAL, fetcher.clone(), sink.clone());
    tokio::time::sleep(Duration::from_millis(150)).await;

    // Second tick failed: the first render is still the latest one.
    assert_eq!(fetcher.calls(), 2);
    assert_eq!(sink.render_count(), 1);
    assert_eq!(sink.last_job_ids(), vec![1]);
    assert_eq!(sink.failures.load(Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(fetcher.calls(), 3);
    assert_eq!(sink.last_job_ids(), vec![3]);
}

#[tokio::test(start_paused = true)]
async fn paused_poller_skips_fetches_until_resumed() {
    init_logging();
    let poller = JobStatusPoller::new();
    let fetcher = Arc::new(ScriptedFetcher::default());
    let sink = Arc::new(RecordingSink::default());

    poller.pause();
    poller.start(INTERVAL, fetcher.clone(), sink.clone());
    tokio::time::sleep(Duration::from_millis(350)).await;
    assert_eq!(fetcher.calls(), 0);
    assert!(poller.is_paused());
    assert!(poller.is_active());
    assert_eq!(poller.tick().await, TickOutcome::Paused);

    poller.resume();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn poll_now_fetches_while_paused_without_waking_the_timer() {
    init_logging();
    let poller = JobStatusPoller::new();
    let fetcher = Arc::new(ScriptedFetcher::default());
    let sink = Arc::new(RecordingSink::default());

    poller.pause();
    poller.start(INTERVAL, fetcher.clone(), sink.clone());
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(fetcher.calls(), 0);

    assert_eq!(poller.poll_now().await, TickOutcome::Rendered(1));
    assert_eq!(sink.last_job_ids(), vec![1]);
    assert!(poller.is_paused());
    assert!(poller.last_tick().is_some());

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn in_flight_result_is_discarded_after_stop() {
    init_logging();
    let poller = JobStatusPoller::new();
    let fetcher = Arc::new(ScriptedFetcher {
        delay: Some(Duration::from_millis(50)),
        ..ScriptedFetcher::default()
    });
    let sink = Arc::new(RecordingSink::default());

    poller.start(Duration::from_secs(60), fetcher.clone(), sink.clone());
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(fetcher.calls(), 1);

    poller.stop();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(sink.render_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn poll_now_reports_what_it_rendered() {
    init_logging();
    let poller = JobStatusPoller::new();
    let fetcher = Arc::new(ScriptedFetcher {
        fail_on: vec![3],
        ..ScriptedFetcher::default()
    });
    let sink = Arc::new(RecordingSink::default());

    assert_eq!(poller.poll_now().await, TickOutcome::Idle);

    poller.start(Duration::from_secs(60), fetcher.clone(), sink.clone());
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(fetcher.calls(), 1);

    assert_eq!(poller.poll_now().await, TickOutcome::Rendered(1));
    assert_eq!(poller.tick().await, TickOutcome::Failed);
    assert_eq!(sink.render_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_poller_stops_its_timer() {
    init_logging();
    let fetcher = Arc::new(ScriptedFetcher::default());
    let sink = Arc::new(RecordingSink::default());
    {
        let poller = JobStatusPoller::new();
        poller.start(INTERVAL, fetcher.clone(), sink.clone());
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    let calls = fetcher.calls();
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(fetcher.calls(), calls);
}
