#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use feedmovie_client::{
    error::{AppError, AppResult},
    models::{
        Batch, ContentId, FilterSelection, GenerationTicket, JobId, Rating, RecommendationItem,
        StatusReport, SwipeDecision,
    },
    services::{
        Discovery, DiscoverySettings, Notification, NotificationDispatcher, RecommendationBackend,
    },
    store::FilterStore,
};

struct Scripted<T> {
    delay: Duration,
    result: AppResult<T>,
}

/// Backend double driven by queued responses
///
/// Every call is recorded. When a queue runs dry the call falls back to a default:
/// the default batch (or an error), a declined generation, a running status.
#[derive(Default)]
pub struct ScriptedBackend {
    batches: Mutex<VecDeque<Scripted<Batch>>>,
    default_batch: Mutex<Option<Batch>>,
    generations: Mutex<VecDeque<AppResult<GenerationTicket>>>,
    statuses: Mutex<VecDeque<Scripted<StatusReport>>>,
    hang_swipes: AtomicBool,
    fail_swipes: AtomicBool,

    pub fetches: Mutex<Vec<FilterSelection>>,
    pub swipes: Mutex<Vec<(ContentId, SwipeDecision)>>,
    pub ratings: Mutex<Vec<(ContentId, f32)>>,
    pub generation_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_batch(&self, batch: Batch) {
        self.push_batch_after(Duration::ZERO, batch);
    }

    pub fn push_batch_after(&self, delay: Duration, batch: Batch) {
        self.batches.lock().unwrap().push_back(Scripted {
            delay,
            result: Ok(batch),
        });
    }

    pub fn push_fetch_error(&self, message: &str) {
        self.batches.lock().unwrap().push_back(Scripted {
            delay: Duration::ZERO,
            result: Err(AppError::ExternalApi(message.to_string())),
        });
    }

    pub fn set_default_batch(&self, batch: Batch) {
        *self.default_batch.lock().unwrap() = Some(batch);
    }

    pub fn push_generation(&self, ticket: GenerationTicket) {
        self.generations.lock().unwrap().push_back(Ok(ticket));
    }

    pub fn push_generation_error(&self, message: &str) {
        self.generations
            .lock()
            .unwrap()
            .push_back(Err(AppError::ExternalApi(message.to_string())));
    }

    /// A generation request that fails before reaching the backend
    pub fn push_generation_unreachable(&self) {
        self.generations
            .lock()
            .unwrap()
            .push_back(Err(AppError::BackendUnreachable("connection refused".to_string())));
    }

    pub fn push_status(&self, report: StatusReport) {
        self.push_status_after(Duration::ZERO, report);
    }

    pub fn push_status_after(&self, delay: Duration, report: StatusReport) {
        self.statuses.lock().unwrap().push_back(Scripted {
            delay,
            result: Ok(report),
        });
    }

    pub fn push_status_error(&self, message: &str) {
        self.statuses.lock().unwrap().push_back(Scripted {
            delay: Duration::ZERO,
            result: Err(AppError::ExternalApi(message.to_string())),
        });
    }

    pub fn hang_swipes(&self) {
        self.hang_swipes.store(true, Ordering::SeqCst);
    }

    pub fn fail_swipes(&self) {
        self.fail_swipes.store(true, Ordering::SeqCst);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().unwrap().len()
    }

    pub fn last_fetch_filters(&self) -> Option<FilterSelection> {
        self.fetches.lock().unwrap().last().cloned()
    }

    pub fn generation_count(&self) -> usize {
        self.generation_calls.load(Ordering::SeqCst)
    }

    pub fn status_count(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RecommendationBackend for ScriptedBackend {
    async fn fetch_batch(&self, _limit: u32, filters: &FilterSelection) -> AppResult<Batch> {
        self.fetches.lock().unwrap().push(filters.clone());

        let next = self.batches.lock().unwrap().pop_front();
        match next {
            Some(scripted) => {
                if !scripted.delay.is_zero() {
                    tokio::time::sleep(scripted.delay).await;
                }
                scripted.result
            }
            None => self
                .default_batch
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| AppError::ExternalApi("no batch scripted".to_string())),
        }
    }

    async fn record_swipe(&self, content_id: ContentId, decision: SwipeDecision) -> AppResult<()> {
        self.swipes.lock().unwrap().push((content_id, decision));

        if self.hang_swipes.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_swipes.load(Ordering::SeqCst) {
            return Err(AppError::ExternalApi("swipe endpoint down".to_string()));
        }
        Ok(())
    }

    async fn submit_rating(&self, item: &RecommendationItem, rating: Rating) -> AppResult<()> {
        self.ratings
            .lock()
            .unwrap()
            .push((item.content_id, rating.value()));
        Ok(())
    }

    async fn request_generation(&self) -> AppResult<GenerationTicket> {
        self.generation_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.generations.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(declined()))
    }

    async fn poll_generation_status(&self) -> AppResult<StatusReport> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);

        let next = self.statuses.lock().unwrap().pop_front();
        match next {
            Some(scripted) => {
                if !scripted.delay.is_zero() {
                    tokio::time::sleep(scripted.delay).await;
                }
                scripted.result
            }
            None => Ok(StatusReport::running(50, "working")),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Keeps every notification it is handed
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl NotificationDispatcher for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.sent.lock().unwrap().push(notification);
    }
}

pub fn item(id: u64) -> RecommendationItem {
    RecommendationItem {
        content_id: ContentId(id),
        title: format!("Movie {}", id),
        year: Some(1990 + (id % 30) as i32),
        score: Some(1.0 / id as f64),
        metadata: Default::default(),
    }
}

/// `len` items with ids starting at `first_id`
pub fn batch_from(first_id: u64, len: u64, total_unshown: u32) -> Batch {
    Batch {
        items: (first_id..first_id + len).map(item).collect(),
        total_unshown,
    }
}

pub fn batch(len: u64, total_unshown: u32) -> Batch {
    batch_from(1, len, total_unshown)
}

pub fn accepted(job_id: &str) -> GenerationTicket {
    GenerationTicket {
        generating: true,
        job_id: Some(JobId(job_id.to_string())),
        estimated_seconds: Some(90),
        message: None,
    }
}

pub fn declined() -> GenerationTicket {
    GenerationTicket {
        generating: false,
        job_id: None,
        estimated_seconds: None,
        message: Some("plenty of recommendations available".to_string()),
    }
}

pub fn settings() -> DiscoverySettings {
    DiscoverySettings {
        batch_limit: 50,
        low_watermark: 10,
        poll_interval: Duration::from_secs(2),
        max_poll_duration: Duration::from_secs(600),
    }
}

pub fn discovery_with(
    backend: Arc<ScriptedBackend>,
    notifier: Arc<RecordingNotifier>,
    settings: DiscoverySettings,
    store: Option<FilterStore>,
) -> Discovery {
    Discovery::new(backend, notifier, settings, store)
}

pub fn discovery(backend: Arc<ScriptedBackend>) -> Discovery {
    discovery_with(
        backend,
        Arc::new(RecordingNotifier::default()),
        settings(),
        None,
    )
}

/// Lets spawned background work (swipe writes, trigger, poller) run
pub async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

/// Moves the paused clock forward, then lets woken tasks run
pub async fn advance(duration: Duration) {
    tokio::time::advance(duration).await;
    settle().await;
}

/// Consumes `n` items, ignoring the outcome
pub async fn consume_n(discovery: &Discovery, n: usize, decision: SwipeDecision) {
    for _ in 0..n {
        let _ = discovery.consume(decision, None).await;
    }
}
