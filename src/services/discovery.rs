use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{
        Epoch, FilterSelection, GenerationJob, GenerationStatus, QueueState, QueueStatus, Rating,
        RecommendationItem, SwipeDecision, SwipeStats,
    },
    services::{
        backend::RecommendationBackend,
        notifications::NotificationDispatcher,
        poller::{self, PollerHandle},
        swipe::SwipeProcessor,
        trigger::{self, GenerationTrigger},
    },
    store::FilterStore,
};

/// Tunables consumed by the discovery core
#[derive(Debug, Clone)]
pub struct DiscoverySettings {
    pub batch_limit: u32,
    pub low_watermark: i64,
    pub poll_interval: Duration,
    /// Poll backstop for jobs that never finish
    pub max_poll_duration: Duration,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            batch_limit: 50,
            low_watermark: GenerationTrigger::DEFAULT_LOW_WATERMARK,
            poll_interval: Duration::from_secs(2),
            max_poll_duration: Duration::from_secs(600),
        }
    }
}

impl From<&Config> for DiscoverySettings {
    fn from(config: &Config) -> Self {
        Self {
            batch_limit: config.batch_limit,
            low_watermark: config.low_watermark,
            poll_interval: config.poll_interval(),
            max_poll_duration: config.max_poll_duration(),
        }
    }
}

/// Whether a finished fetch became the current queue
enum LoadOutcome {
    Installed(QueueSnapshot),
    /// A later load was requested meanwhile; this response was dropped
    Superseded(QueueSnapshot),
}

impl LoadOutcome {
    fn into_snapshot(self) -> QueueSnapshot {
        match self {
            LoadOutcome::Installed(snapshot) | LoadOutcome::Superseded(snapshot) => snapshot,
        }
    }
}

/// Why a batch is being fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadOrigin {
    Startup,
    /// Reload or filter change issued by the user
    User,
    /// Refresh after a generation job completed
    Generation,
}

/// Everything mutable, guarded by one lock
#[derive(Debug, Default)]
pub struct Session {
    pub(crate) queue: Option<QueueState>,
    /// Most recently requested selection
    pub(crate) filters: FilterSelection,
    pub(crate) generation: GenerationJob,
    pub(crate) poller: Option<PollerHandle>,
    /// Whether the consumption surface is on screen
    pub(crate) surface_active: bool,
    last_epoch: Epoch,
    latest_load: u64,
    loading: bool,
    load_error: Option<String>,
}

impl Session {
    pub(crate) fn current_epoch(&self) -> Option<Epoch> {
        self.queue.as_ref().map(QueueState::epoch)
    }

    pub(crate) fn is_current(&self, epoch: Epoch) -> bool {
        self.current_epoch() == Some(epoch)
    }

    /// The queue, but only while it still belongs to `epoch`
    pub(crate) fn queue_for(&mut self, epoch: Epoch) -> Option<&mut QueueState> {
        self.queue.as_mut().filter(|q| q.epoch() == epoch)
    }

    fn cancel_poller(&mut self) {
        if let Some(handle) = self.poller.take() {
            handle.cancel();
        }
    }

    fn snapshot(&self) -> QueueSnapshot {
        let queue = self.queue.as_ref();

        QueueSnapshot {
            epoch: queue.map(QueueState::epoch),
            status: queue.map_or(QueueStatus::Unloaded, QueueState::status),
            current: queue.and_then(|q| q.current().cloned()),
            cursor: queue.map_or(0, QueueState::cursor),
            remaining: queue.map_or(0, QueueState::remaining_in_batch),
            total_unshown: queue.map_or(0, QueueState::total_unshown),
            stats: queue.map(QueueState::stats).unwrap_or_default(),
            filters: self.filters.clone(),
            loading: self.loading,
            load_error: self.load_error.clone(),
            generation_triggered: queue.is_some_and(QueueState::generation_triggered),
            awaiting_generation: self.generation.is_running(),
            generation: self.generation.clone(),
        }
    }
}

/// Read-only view handed to UI surfaces
#[derive(Debug, Clone, Serialize)]
pub struct QueueSnapshot {
    pub epoch: Option<Epoch>,
    pub status: QueueStatus,
    pub current: Option<RecommendationItem>,
    pub cursor: usize,
    pub remaining: usize,
    pub total_unshown: u32,
    pub stats: SwipeStats,
    pub filters: FilterSelection,
    pub loading: bool,
    pub load_error: Option<String>,
    pub generation_triggered: bool,
    pub awaiting_generation: bool,
    pub generation: GenerationJob,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsumeOutcome {
    pub item: RecommendationItem,
    pub queue: QueueSnapshot,
}

struct Inner {
    backend: Arc<dyn RecommendationBackend>,
    notifier: Arc<dyn NotificationDispatcher>,
    filter_store: Option<FilterStore>,
    settings: DiscoverySettings,
    swipes: SwipeProcessor,
    trigger: GenerationTrigger,
    session: Mutex<Session>,
}

/// Recommendation queue consumption and background generation
///
/// Cheap to clone; all clones share one session. State only changes while the session
/// lock is held and the lock is never held across a backend call.
#[derive(Clone)]
pub struct Discovery {
    inner: Arc<Inner>,
}

impl Discovery {
    pub fn new(
        backend: Arc<dyn RecommendationBackend>,
        notifier: Arc<dyn NotificationDispatcher>,
        settings: DiscoverySettings,
        filter_store: Option<FilterStore>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                swipes: SwipeProcessor::new(backend.clone()),
                trigger: GenerationTrigger::new(settings.low_watermark),
                backend,
                notifier,
                filter_store,
                settings,
                session: Mutex::new(Session::default()),
            }),
        }
    }

    pub(crate) fn backend(&self) -> &Arc<dyn RecommendationBackend> {
        &self.inner.backend
    }

    pub(crate) fn notifier(&self) -> &Arc<dyn NotificationDispatcher> {
        &self.inner.notifier
    }

    pub(crate) fn settings(&self) -> &DiscoverySettings {
        &self.inner.settings
    }

    pub(crate) async fn session(&self) -> MutexGuard<'_, Session> {
        self.inner.session.lock().await
    }

    /// Restores the persisted filter selection and loads the first batch
    pub async fn start(&self) -> AppResult<QueueSnapshot> {
        let filters = match &self.inner.filter_store {
            Some(store) => store.load().await.unwrap_or_else(|e| {
                tracing::warn!(error = %e, path = %store.path().display(), "Ignoring unreadable filter selection");
                FilterSelection::none()
            }),
            None => FilterSelection::none(),
        };

        self.load_batch(filters, LoadOrigin::Startup)
            .await
            .map(LoadOutcome::into_snapshot)
    }

    /// Loads a fresh batch for `filters`, starting a new epoch on success
    ///
    /// On failure the current queue is left exactly as it was, including any job
    /// still being polled for it.
    pub async fn load(&self, filters: FilterSelection) -> AppResult<QueueSnapshot> {
        self.load_batch(filters, LoadOrigin::User)
            .await
            .map(LoadOutcome::into_snapshot)
    }

    pub async fn change_filters(&self, selection: FilterSelection) -> AppResult<QueueSnapshot> {
        self.load(selection).await
    }

    pub async fn reload(&self) -> AppResult<QueueSnapshot> {
        let filters = self.session().await.filters.clone();
        self.load(filters).await
    }

    /// Reload issued by the poller once its job completed
    ///
    /// `None` when nothing was installed: the epoch moved on, another load is in
    /// flight and will start the next epoch itself, or one was requested meanwhile.
    pub(crate) async fn refresh_after_generation(
        &self,
        epoch: Epoch,
    ) -> AppResult<Option<QueueSnapshot>> {
        let filters = {
            let session = self.session().await;
            if !session.is_current(epoch) {
                tracing::debug!(epoch = %epoch, "Skipping refresh for superseded epoch");
                return Ok(None);
            }
            if session.loading {
                tracing::debug!(epoch = %epoch, "Skipping refresh, a batch load is in flight");
                return Ok(None);
            }
            session.filters.clone()
        };

        match self.load_batch(filters, LoadOrigin::Generation).await? {
            LoadOutcome::Installed(snapshot) => Ok(Some(snapshot)),
            LoadOutcome::Superseded(_) => Ok(None),
        }
    }

    async fn load_batch(&self, filters: FilterSelection, origin: LoadOrigin) -> AppResult<LoadOutcome> {
        let ticket = {
            let mut session = self.session().await;
            session.latest_load += 1;
            session.loading = true;
            session.filters = filters.clone();
            session.latest_load
        };

        tracing::debug!(ticket, origin = ?origin, filters = ?filters.to_query_value(), "Fetching batch");
        let result = self
            .backend()
            .fetch_batch(self.settings().batch_limit, &filters)
            .await;

        let mut session = self.session().await;
        if ticket != session.latest_load {
            tracing::debug!(ticket, latest = session.latest_load, "Discarding superseded batch");
            return Ok(LoadOutcome::Superseded(session.snapshot()));
        }
        session.loading = false;

        let batch = match result {
            Ok(batch) => batch,
            Err(e) => {
                tracing::warn!(error = %e, origin = ?origin, "Batch fetch failed");
                session.load_error = Some(e.to_string());
                if let Some(applied) = session.queue.as_ref().map(|q| q.filters().clone()) {
                    session.filters = applied;
                }
                return Err(e);
            }
        };

        let previous_filters = session.queue.as_ref().map(|q| q.filters().clone());
        let epoch = session.last_epoch.next();
        session.last_epoch = epoch;
        session.cancel_poller();
        session.generation = GenerationJob::idle();
        session.load_error = None;
        session.queue = Some(QueueState::new(epoch, filters.clone(), batch));

        let is_empty = session.queue.as_ref().is_some_and(|q| q.items().is_empty());
        let snapshot = session.snapshot();
        drop(session);

        tracing::info!(
            epoch = %epoch,
            items = snapshot.remaining,
            total_unshown = snapshot.total_unshown,
            origin = ?origin,
            "Started new epoch"
        );

        if previous_filters.as_ref() != Some(&filters) {
            self.persist_filters(&filters).await;
        }

        if is_empty {
            tokio::spawn(self.clone().generate_on_empty(epoch));
        }

        Ok(LoadOutcome::Installed(snapshot))
    }

    async fn persist_filters(&self, filters: &FilterSelection) {
        if let Some(store) = &self.inner.filter_store {
            if let Err(e) = store.save(filters).await {
                tracing::warn!(error = %e, path = %store.path().display(), "Failed to persist filter selection");
            }
        }
    }

    /// Empty batch: adopt a job that is already running, otherwise trigger one
    async fn generate_on_empty(self, epoch: Epoch) {
        match self.backend().poll_generation_status().await {
            Ok(report) if report.has_job && report.status == GenerationStatus::Running => {
                {
                    let mut session = self.session().await;
                    match session.queue_for(epoch) {
                        Some(queue) => {
                            queue.mark_generation_triggered();
                        }
                        None => return,
                    }
                }

                let mut job = GenerationJob::started(None, report.estimated_seconds_remaining);
                job.apply(&report);
                poller::start(&self, epoch, job).await;
                return;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, epoch = %epoch, "Could not check for a running generation job");
            }
        }

        let fire = {
            let mut session = self.session().await;
            match session.queue_for(epoch) {
                Some(queue) => queue.mark_generation_triggered(),
                None => false,
            }
        };

        if fire {
            tracing::info!(epoch = %epoch, "Batch is empty, requesting generation");
            trigger::request(self, epoch).await;
        }
    }

    /// Consumes the item under the cursor
    ///
    /// Cursor and stats move before anything touches the network. The backend write
    /// and any generation request run in the background.
    pub async fn consume(
        &self,
        decision: SwipeDecision,
        rating: Option<f32>,
    ) -> AppResult<ConsumeOutcome> {
        let rating = match rating {
            Some(_) if decision != SwipeDecision::AlreadySeen => {
                return Err(AppError::InvalidInput(
                    "A rating can only accompany an already_seen decision".to_string(),
                ))
            }
            Some(value) => Some(Rating::new(value)?),
            None => None,
        };

        let mut session = self.session().await;
        let queue = session.queue.as_mut().ok_or(AppError::QueueNotLoaded)?;

        let item = SwipeProcessor::apply(queue, decision)?;
        self.inner.swipes.dispatch(item.clone(), decision, rating);

        let epoch = queue.epoch();
        if self.inner.trigger.observe(queue) {
            tokio::spawn(trigger::request(self.clone(), epoch));
        }

        tracing::debug!(
            epoch = %epoch,
            content_id = %item.content_id,
            decision = ?decision,
            cursor = queue.cursor(),
            "Consumed item"
        );

        Ok(ConsumeOutcome {
            item,
            queue: session.snapshot(),
        })
    }

    /// Explicit user retry after a failed or declined generation
    pub async fn retry_generation(&self) -> AppResult<QueueSnapshot> {
        let epoch = {
            let mut session = self.session().await;
            if session.poller.is_some() {
                return Err(AppError::GenerationInProgress);
            }
            let queue = session.queue.as_mut().ok_or(AppError::QueueNotLoaded)?;
            queue.mark_generation_triggered();
            let epoch = queue.epoch();
            session.generation = GenerationJob::idle();
            epoch
        };

        tracing::info!(epoch = %epoch, "Retrying generation on user request");
        trigger::request(self.clone(), epoch).await;
        Ok(self.snapshot().await)
    }

    pub async fn snapshot(&self) -> QueueSnapshot {
        self.session().await.snapshot()
    }

    pub async fn current_item(&self) -> Option<RecommendationItem> {
        self.session()
            .await
            .queue
            .as_ref()
            .and_then(|q| q.current().cloned())
    }

    pub async fn generation(&self) -> GenerationJob {
        self.session().await.generation.clone()
    }

    /// Records whether the consumption surface is currently on screen
    pub async fn set_surface_active(&self, active: bool) {
        self.session().await.surface_active = active;
        tracing::debug!(active, "Consumption surface visibility changed");
    }

    /// Stops background polling
    pub async fn shutdown(&self) {
        self.session().await.cancel_poller();
    }
}
