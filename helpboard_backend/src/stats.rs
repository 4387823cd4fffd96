use crate::database::models::{offer_status, request_status};
use crate::database::repositories::{HelpOfferRepository, HelpRequestRepository};
use crate::database::Database;
use crate::error::{AggregationError, ServiceError};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Where the two counts come from. The production implementation queries the
/// database; a source may legitimately report "no value" for a count, which
/// publishes as zero rather than an error.
#[async_trait]
pub trait StatsSource: Send + Sync {
    async fn count_open_requests(&self) -> Result<Option<u64>, ServiceError>;
    async fn count_available_offers(&self) -> Result<Option<u64>, ServiceError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSummary {
    pub open_request_count: u64,
    pub available_offer_count: u64,
}

/// Snapshot published to subscribers. `data` keeps the last successful
/// summary through failed refreshes so consumers can keep displaying it.
#[derive(Debug, Clone)]
pub struct StatsState {
    pub data: Option<StatsSummary>,
    pub is_loading: bool,
    pub error: Option<AggregationError>,
}

impl StatsState {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

impl Default for StatsState {
    fn default() -> Self {
        Self {
            data: None,
            is_loading: true,
            error: None,
        }
    }
}

/// Keeps a periodically refreshed summary of open requests and available
/// offers. Each refresh cycle fans out the two count queries concurrently,
/// joins them, and publishes the combined result over a watch channel. The
/// timer runs only while at least one subscription is alive.
#[derive(Clone)]
pub struct StatsAggregator {
    inner: Arc<Inner>,
}

struct Inner {
    source: Arc<dyn StatsSource>,
    refresh_interval: Duration,
    tx: watch::Sender<StatsState>,
    next_cycle: AtomicU64,
    published_cycle: AtomicU64,
    poller: Mutex<PollerState>,
}

/// Subscriber count and timer handle share one lock: a drop racing a new
/// subscribe must never abort the poller the subscribe just installed.
#[derive(Default)]
struct PollerState {
    subscribers: usize,
    handle: Option<JoinHandle<()>>,
}

impl Inner {
    fn poller_state(&self) -> std::sync::MutexGuard<'_, PollerState> {
        self.poller.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StatsAggregator {
    pub fn new(source: Arc<dyn StatsSource>, refresh_interval: Duration) -> Self {
        let (tx, _rx) = watch::channel(StatsState::default());
        Self {
            inner: Arc::new(Inner {
                source,
                refresh_interval,
                tx,
                next_cycle: AtomicU64::new(0),
                published_cycle: AtomicU64::new(0),
                poller: Mutex::new(PollerState::default()),
            }),
        }
    }

    pub fn for_database(database: Database, refresh_interval: Duration) -> Self {
        Self::new(
            Arc::new(DatabaseStatsSource::new(database)),
            refresh_interval,
        )
    }

    /// Registers interest in the stats feed. The first live subscription
    /// starts the refresh timer, whose initial tick fires immediately; later
    /// subscribers see the cached summary right away.
    pub fn subscribe(&self) -> StatsSubscription {
        let rx = self.inner.tx.subscribe();
        {
            let mut poller = self.inner.poller_state();
            poller.subscribers += 1;
            if poller.subscribers == 1 {
                poller.handle = Some(spawn_poller(&self.inner));
            }
        }
        StatsSubscription {
            inner: self.inner.clone(),
            rx,
        }
    }

    /// Current published state without registering interest.
    pub fn state(&self) -> StatsState {
        self.inner.tx.borrow().clone()
    }

    /// Runs one fetch-and-combine cycle outside the timer.
    pub async fn refresh_now(&self) {
        self.inner.refresh().await;
    }
}

fn spawn_poller(inner: &Arc<Inner>) -> JoinHandle<()> {
    let task_inner = inner.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(task_inner.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            // awaiting the refresh before the next tick keeps cycles from
            // overlapping on the timer path
            ticker.tick().await;
            task_inner.refresh().await;
        }
    })
}

impl Inner {
    async fn refresh(&self) {
        let cycle = self.next_cycle.fetch_add(1, Ordering::SeqCst) + 1;
        self.tx.send_modify(|state| {
            if state.data.is_none() {
                state.is_loading = true;
            }
        });

        let result = tokio::try_join!(
            self.source.count_open_requests(),
            self.source.count_available_offers(),
        );

        // A later cycle may already have published; its summary wins.
        if self.published_cycle.fetch_max(cycle, Ordering::SeqCst) > cycle {
            tracing::debug!(cycle, "discarding superseded stats refresh");
            return;
        }

        match result {
            Ok((open_requests, available_offers)) => {
                let summary = StatsSummary {
                    open_request_count: open_requests.unwrap_or(0),
                    available_offer_count: available_offers.unwrap_or(0),
                };
                self.tx.send_modify(|state| {
                    state.data = Some(summary);
                    state.is_loading = false;
                    state.error = None;
                });
                tracing::debug!(
                    open_requests = summary.open_request_count,
                    available_offers = summary.available_offer_count,
                    "stats refreshed"
                );
            }
            Err(err) => {
                let err = AggregationError::from(err);
                tracing::warn!(error = %err, "stats refresh failed; keeping last summary");
                self.tx.send_modify(|state| {
                    state.is_loading = false;
                    state.error = Some(err);
                });
            }
        }
    }
}

/// Handle returned by [`StatsAggregator::subscribe`]. Dropping the last
/// subscription stops the refresh timer; no further queries are issued until
/// someone subscribes again.
pub struct StatsSubscription {
    inner: Arc<Inner>,
    rx: watch::Receiver<StatsState>,
}

impl StatsSubscription {
    pub fn current(&self) -> StatsState {
        self.rx.borrow().clone()
    }

    /// Waits until the published state changes.
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        self.rx.changed().await
    }
}

impl Clone for StatsSubscription {
    fn clone(&self) -> Self {
        self.inner.poller_state().subscribers += 1;
        Self {
            inner: self.inner.clone(),
            rx: self.rx.clone(),
        }
    }
}

impl Drop for StatsSubscription {
    fn drop(&mut self) {
        let mut poller = self.inner.poller_state();
        poller.subscribers = poller.subscribers.saturating_sub(1);
        if poller.subscribers == 0 {
            if let Some(handle) = poller.handle.take() {
                handle.abort();
            }
        }
    }
}

pub struct DatabaseStatsSource {
    database: Database,
}

impl DatabaseStatsSource {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

#[async_trait]
impl StatsSource for DatabaseStatsSource {
    async fn count_open_requests(&self) -> Result<Option<u64>, ServiceError> {
        let count = self
            .database
            .with_repositories(|repos| repos.help_requests().count_by_status(request_status::OPEN))
            .map_err(ServiceError::from)?;
        Ok(Some(count))
    }

    async fn count_available_offers(&self) -> Result<Option<u64>, ServiceError> {
        let count = self
            .database
            .with_repositories(|repos| repos.help_offers().count_by_status(offer_status::AVAILABLE))
            .map_err(ServiceError::from)?;
        Ok(Some(count))
    }
}
