use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use herald_channels::PlatformSet;
use herald_core::config::DistributionConfig;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::{
    error::Result,
    state::{cutoff_before, resolve, retry_delay, schedule_after},
    store::QueueStore,
    types::{BatchReport, NewPost, QueueItem, QueueStatus},
};

/// Knobs for [`DistributionWorker`], usually built from [`DistributionConfig`].
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub poll_interval: Duration,
    pub batch_limit: usize,
    pub max_batch_limit: usize,
    pub default_max_retries: u32,
    pub retry_base_delay: Duration,
    pub retry_max_delay: Duration,
    pub stale_after: Duration,
}

impl WorkerSettings {
    /// Clamp a caller-supplied batch size into `1..=max_batch_limit`.
    pub fn clamp_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.batch_limit)
            .clamp(1, self.max_batch_limit.max(1))
    }
}

impl From<&DistributionConfig> for WorkerSettings {
    fn from(cfg: &DistributionConfig) -> Self {
        Self {
            poll_interval: Duration::from_secs(cfg.poll_interval_secs.max(1)),
            batch_limit: cfg.batch_limit,
            max_batch_limit: cfg.max_batch_limit,
            default_max_retries: cfg.default_max_retries,
            retry_base_delay: Duration::from_secs(cfg.retry_base_delay_secs),
            retry_max_delay: Duration::from_secs(cfg.retry_max_delay_secs),
            stale_after: Duration::from_secs(cfg.stale_after_secs),
        }
    }
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self::from(&DistributionConfig::default())
    }
}

/// Drives queue items through the status machine.
///
/// Batches run either from the background loop ([`run`](Self::run)) or on
/// demand from the HTTP trigger; both go through [`process_batch`](Self::process_batch).
pub struct DistributionWorker {
    store: QueueStore,
    platforms: Arc<PlatformSet>,
    settings: WorkerSettings,
}

impl DistributionWorker {
    pub fn new(store: QueueStore, platforms: Arc<PlatformSet>, settings: WorkerSettings) -> Self {
        Self {
            store,
            platforms,
            settings,
        }
    }

    pub fn store(&self) -> &QueueStore {
        &self.store
    }

    pub fn platforms(&self) -> &PlatformSet {
        &self.platforms
    }

    pub fn settings(&self) -> &WorkerSettings {
        &self.settings
    }

    /// Queue a post using the configured default retry budget.
    pub fn enqueue(&self, post: NewPost) -> Result<QueueItem> {
        self.store.enqueue(post, self.settings.default_max_retries)
    }

    /// Claim up to `limit` due items (clamped) and process them one after the
    /// other.
    ///
    /// A storage error on one item is logged and the batch continues; that
    /// item stays `processing` until stale recovery picks it up.
    pub async fn process_batch(&self, limit: Option<usize>) -> Result<BatchReport> {
        let limit = self.settings.clamp_limit(limit);
        let claimed = self.store.claim_due(Utc::now(), limit)?;

        let mut report = BatchReport::default();
        if claimed.is_empty() {
            return Ok(report);
        }
        info!(claimed = claimed.len(), limit, "distribution batch started");

        for item in claimed {
            report.processed += 1;
            let id = item.id.clone();
            match self.process_item(item).await {
                Ok(updated) => report.record(updated.status),
                Err(e) => error!(item_id = %id, error = %e, "failed to record distribution pass"),
            }
        }

        info!(
            processed = report.processed,
            posted = report.posted,
            partial = report.partial,
            failed = report.failed,
            retried = report.retried,
            "distribution batch finished"
        );
        Ok(report)
    }

    /// Post one claimed item to all of its platforms and persist the outcome.
    pub async fn process_item(&self, item: QueueItem) -> Result<QueueItem> {
        let content = item.post_content();
        let results = self.platforms.dispatch(&content, &item.platforms).await;

        let transition = resolve(&results, item.retry_count, item.max_retries);
        let retry_at = match transition.status {
            QueueStatus::Pending => {
                let delay = retry_delay(
                    transition.retry_count,
                    self.settings.retry_base_delay,
                    self.settings.retry_max_delay,
                );
                Some(schedule_after(Utc::now(), delay))
            }
            _ => None,
        };

        let updated = self.store.record_pass(&item.id, &transition, &results, retry_at)?;
        match updated.status {
            QueueStatus::Posted => info!(item_id = %updated.id, "queue item posted"),
            QueueStatus::Partial => warn!(
                item_id = %updated.id,
                last_error = ?updated.last_error,
                "queue item partially posted"
            ),
            QueueStatus::Pending => warn!(
                item_id = %updated.id,
                retry_count = updated.retry_count,
                max_retries = updated.max_retries,
                scheduled_at = %updated.scheduled_at,
                "queue item failed everywhere, retry scheduled"
            ),
            QueueStatus::Failed => error!(
                item_id = %updated.id,
                retry_count = updated.retry_count,
                last_error = ?updated.last_error,
                "queue item failed permanently"
            ),
            QueueStatus::Processing => {}
        }
        Ok(updated)
    }

    /// Background loop: recovers stale claims once, then runs a default-sized
    /// batch every `poll_interval` until `shutdown` broadcasts `true`.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        info!(
            poll_interval_secs = self.settings.poll_interval.as_secs(),
            "distribution worker started"
        );
        self.recover_stale_on_startup();

        let mut interval = tokio::time::interval(self.settings.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.process_batch(None).await {
                        error!("distribution batch error: {e}");
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("distribution worker shutting down");
                        break;
                    }
                }
            }
        }
    }

    fn recover_stale_on_startup(&self) {
        if let Err(e) = self.store.recover_stale(cutoff_before(Utc::now(), self.settings.stale_after)) {
            error!("stale-claim recovery failed: {e}");
        }
    }
}
