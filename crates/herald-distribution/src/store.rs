use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use herald_core::types::{timestamp, PlatformId, PlatformResult};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    db::init_db,
    error::{QueueError, Result},
    state::{can_retry, is_allowed, Transition},
    types::{NewPost, QueueCounts, QueueItem, QueueStatus},
};

const ITEM_COLUMNS: &str = "id, title, content, link, hashtags, platforms, status, priority,
     retry_count, max_retries, scheduled_at, results, last_error,
     created_at, updated_at, posted_at";

/// Shared handle on the `distribution_queue` table.
///
/// Cloning is cheap; every clone talks to the same connection. Each method
/// holds the lock for one statement or one short transaction.
#[derive(Clone)]
pub struct QueueStore {
    conn: Arc<Mutex<Connection>>,
}

impl QueueStore {
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Validate and persist a new `pending` item.
    pub fn enqueue(&self, post: NewPost, default_max_retries: u32) -> Result<QueueItem> {
        if post.content.trim().is_empty() {
            return Err(QueueError::InvalidItem("content must not be empty".into()));
        }
        let platforms = dedup_platforms(&post.platforms);
        if platforms.is_empty() {
            return Err(QueueError::InvalidItem("at least one platform is required".into()));
        }

        let now = timestamp(Utc::now());
        let scheduled_at = post.scheduled_at.map(timestamp).unwrap_or_else(|| now.clone());
        let max_retries = post.max_retries.unwrap_or(default_max_retries).max(1);
        let id = Uuid::now_v7().to_string();

        let item = QueueItem {
            id,
            title: post.title,
            content: post.content,
            link: post.link.filter(|l| !l.trim().is_empty()),
            hashtags: post.hashtags,
            platforms,
            status: QueueStatus::Pending,
            priority: post.priority,
            retry_count: 0,
            max_retries,
            scheduled_at,
            results: Vec::new(),
            last_error: None,
            created_at: now.clone(),
            updated_at: now,
            posted_at: None,
        };

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO distribution_queue
             (id, title, content, link, hashtags, platforms, status, priority,
              retry_count, max_retries, scheduled_at, results, last_error,
              created_at, updated_at, posted_at)
             VALUES (?1,?2,?3,?4,?5,?6,'pending',?7,0,?8,?9,'[]',NULL,?10,?10,NULL)",
            rusqlite::params![
                item.id,
                item.title,
                item.content,
                item.link,
                serde_json::to_string(&item.hashtags)?,
                serde_json::to_string(&item.platforms)?,
                item.priority,
                item.max_retries,
                item.scheduled_at,
                item.created_at,
            ],
        )?;

        info!(
            item_id = %item.id,
            platforms = ?item.platforms,
            priority = item.priority,
            scheduled_at = %item.scheduled_at,
            "queue item enqueued"
        );
        Ok(item)
    }

    pub fn get(&self, id: &str) -> Result<QueueItem> {
        let conn = self.conn.lock().unwrap();
        fetch(&conn, id)?.ok_or_else(|| QueueError::ItemNotFound { id: id.to_string() })
    }

    /// Most recently created items first, optionally filtered by status.
    pub fn list(&self, status: Option<QueueStatus>, limit: usize) -> Result<Vec<QueueItem>> {
        let conn = self.conn.lock().unwrap();
        let limit = limit as i64;
        let mut items = Vec::new();
        match status {
            Some(status) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {ITEM_COLUMNS} FROM distribution_queue
                     WHERE status = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2"
                ))?;
                let rows = stmt.query_map(rusqlite::params![status.as_str(), limit], read_row)?;
                for row in rows {
                    items.push(row_to_item(row?)?);
                }
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {ITEM_COLUMNS} FROM distribution_queue
                     ORDER BY created_at DESC, id DESC LIMIT ?1"
                ))?;
                let rows = stmt.query_map([limit], read_row)?;
                for row in rows {
                    items.push(row_to_item(row?)?);
                }
            }
        }
        Ok(items)
    }

    /// Claim up to `limit` due items, moving them to `processing`.
    ///
    /// Candidates are `pending` with `scheduled_at <= now`, ordered by
    /// priority (high first), then `scheduled_at`, then creation. Each claim
    /// is a compare-and-swap on the status, so an item already taken by
    /// another connection is skipped rather than processed twice.
    pub fn claim_due(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<QueueItem>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let now = timestamp(now);
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let candidates: Vec<String> = {
            let mut stmt = tx.prepare_cached(
                "SELECT id FROM distribution_queue
                 WHERE status = 'pending' AND scheduled_at <= ?1
                 ORDER BY priority DESC, scheduled_at ASC, created_at ASC
                 LIMIT ?2",
            )?;
            let ids = stmt
                .query_map(rusqlite::params![now, limit as i64], |row| row.get(0))?
                .collect::<std::result::Result<_, _>>()?;
            ids
        };

        let mut claimed = Vec::with_capacity(candidates.len());
        for id in candidates {
            let n = tx.execute(
                "UPDATE distribution_queue SET status = 'processing', updated_at = ?1
                 WHERE id = ?2 AND status = 'pending'",
                rusqlite::params![now, id],
            )?;
            if n == 0 {
                warn!(item_id = %id, "queue item claimed elsewhere, skipping");
                continue;
            }
            if let Some(item) = fetch(&tx, &id)? {
                claimed.push(item);
            }
        }
        tx.commit()?;
        Ok(claimed)
    }

    /// Persist the outcome of one processing pass.
    ///
    /// `results` are appended to the item's history. `retry_at` is the new
    /// `scheduled_at` when the transition sends the item back to `pending`.
    /// Fails with [`QueueError::InvalidTransition`] unless the item is still
    /// `processing` and `transition` is an edge out of it.
    pub fn record_pass(
        &self,
        id: &str,
        transition: &Transition,
        results: &[PlatformResult],
        retry_at: Option<DateTime<Utc>>,
    ) -> Result<QueueItem> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let current = fetch(&tx, id)?.ok_or_else(|| QueueError::ItemNotFound { id: id.to_string() })?;
        if current.status != QueueStatus::Processing || !is_allowed(current.status, transition.status) {
            return Err(QueueError::InvalidTransition {
                id: id.to_string(),
                status: current.status.to_string(),
                action: "record results",
            });
        }

        let now = timestamp(Utc::now());
        let mut history = current.results;
        history.extend_from_slice(results);

        let errors: Vec<String> = results
            .iter()
            .filter_map(|r| r.error.as_ref().map(|e| format!("{}: {e}", r.platform)))
            .collect();
        let last_error = if errors.is_empty() {
            current.last_error
        } else {
            Some(errors.join("; "))
        };

        let any_success = results.iter().any(|r| r.success);
        let posted_at = match current.posted_at {
            Some(at) => Some(at),
            None if any_success => Some(now.clone()),
            None => None,
        };
        let scheduled_at = match (transition.status, retry_at) {
            (QueueStatus::Pending, Some(at)) => timestamp(at),
            _ => current.scheduled_at,
        };

        tx.execute(
            "UPDATE distribution_queue
             SET status = ?1, retry_count = ?2, scheduled_at = ?3, results = ?4,
                 last_error = ?5, posted_at = ?6, updated_at = ?7
             WHERE id = ?8 AND status = 'processing'",
            rusqlite::params![
                transition.status.as_str(),
                transition.retry_count,
                scheduled_at,
                serde_json::to_string(&history)?,
                last_error,
                posted_at,
                now,
                id,
            ],
        )?;
        let item = fetch(&tx, id)?.ok_or_else(|| QueueError::ItemNotFound { id: id.to_string() })?;
        tx.commit()?;
        Ok(item)
    }

    /// Send `failed` items back to `pending` with a fresh retry budget.
    ///
    /// With `ids = None` every failed item is reset; otherwise only the named
    /// ones (ids that are unknown or not `failed` are ignored). Returns the
    /// number of items reset.
    pub fn retry_failed(&self, ids: Option<&[String]>) -> Result<usize> {
        let now = timestamp(Utc::now());
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let mut candidates: Vec<(String, QueueStatus)> = Vec::new();
        match ids {
            None => {
                let mut stmt = tx.prepare_cached("SELECT id FROM distribution_queue WHERE status = ?1")?;
                for status in QueueStatus::ALL.into_iter().filter(|s| can_retry(*s)) {
                    let found = stmt
                        .query_map([status.as_str()], |row| row.get::<_, String>(0))?
                        .collect::<std::result::Result<Vec<_>, _>>()?;
                    candidates.extend(found.into_iter().map(|id| (id, status)));
                }
            }
            Some(ids) => {
                let mut stmt = tx.prepare_cached("SELECT status FROM distribution_queue WHERE id = ?1")?;
                for id in ids {
                    let status: Option<String> = stmt.query_row([id], |row| row.get(0)).optional()?;
                    if let Some(status) = status {
                        let status = status.parse::<QueueStatus>().map_err(QueueError::InvalidItem)?;
                        candidates.push((id.clone(), status));
                    }
                }
            }
        }

        let mut reset = 0;
        {
            let mut stmt = tx.prepare_cached(
                "UPDATE distribution_queue
                 SET status = 'pending', retry_count = 0, scheduled_at = ?1, updated_at = ?1
                 WHERE id = ?2 AND status = ?3",
            )?;
            for (id, status) in candidates {
                if !can_retry(status) {
                    continue;
                }
                reset += stmt.execute(rusqlite::params![now, id, status.as_str()])?;
            }
        }
        tx.commit()?;

        if reset > 0 {
            info!(count = reset, "failed queue items reset for retry");
        }
        Ok(reset)
    }

    /// Return items left in `processing` since before `older_than` to
    /// `pending`. Such items belong to a worker that stopped mid-pass.
    pub fn recover_stale(&self, older_than: DateTime<Utc>) -> Result<usize> {
        let cutoff = timestamp(older_than);
        let now = timestamp(Utc::now());
        let conn = self.conn.lock().unwrap();
        let n = conn.execute(
            "UPDATE distribution_queue SET status = 'pending', updated_at = ?1
             WHERE status = 'processing' AND updated_at < ?2",
            rusqlite::params![now, cutoff],
        )?;
        if n > 0 {
            warn!(count = n, "stale processing items returned to pending");
        }
        Ok(n)
    }

    pub fn counts(&self) -> Result<QueueCounts> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM distribution_queue GROUP BY status")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;

        let mut counts = QueueCounts::default();
        for row in rows {
            let (status, n) = row?;
            let n = n as usize;
            match status.parse::<QueueStatus>() {
                Ok(QueueStatus::Pending) => counts.pending = n,
                Ok(QueueStatus::Processing) => counts.processing = n,
                Ok(QueueStatus::Posted) => counts.posted = n,
                Ok(QueueStatus::Partial) => counts.partial = n,
                Ok(QueueStatus::Failed) => counts.failed = n,
                Err(e) => warn!("{e}"),
            }
        }
        Ok(counts)
    }
}

// ── Row mapping ──────────────────────────────────────────────────────────────

/// Raw column values, decoded into a [`QueueItem`] outside the rusqlite
/// closure so JSON errors surface as [`QueueError::Serialization`].
struct RawItem {
    id: String,
    title: String,
    content: String,
    link: Option<String>,
    hashtags: String,
    platforms: String,
    status: String,
    priority: i64,
    retry_count: u32,
    max_retries: u32,
    scheduled_at: String,
    results: String,
    last_error: Option<String>,
    created_at: String,
    updated_at: String,
    posted_at: Option<String>,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawItem> {
    Ok(RawItem {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        link: row.get(3)?,
        hashtags: row.get(4)?,
        platforms: row.get(5)?,
        status: row.get(6)?,
        priority: row.get(7)?,
        retry_count: row.get(8)?,
        max_retries: row.get(9)?,
        scheduled_at: row.get(10)?,
        results: row.get(11)?,
        last_error: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
        posted_at: row.get(15)?,
    })
}

fn row_to_item(raw: RawItem) -> Result<QueueItem> {
    let status = raw.status.parse::<QueueStatus>().map_err(QueueError::InvalidItem)?;
    Ok(QueueItem {
        id: raw.id,
        title: raw.title,
        content: raw.content,
        link: raw.link,
        hashtags: serde_json::from_str(&raw.hashtags)?,
        platforms: serde_json::from_str(&raw.platforms)?,
        status,
        priority: raw.priority,
        retry_count: raw.retry_count,
        max_retries: raw.max_retries,
        scheduled_at: raw.scheduled_at,
        results: serde_json::from_str(&raw.results)?,
        last_error: raw.last_error,
        created_at: raw.created_at,
        updated_at: raw.updated_at,
        posted_at: raw.posted_at,
    })
}

fn fetch(conn: &Connection, id: &str) -> Result<Option<QueueItem>> {
    let raw = conn
        .query_row(
            &format!("SELECT {ITEM_COLUMNS} FROM distribution_queue WHERE id = ?1"),
            [id],
            read_row,
        )
        .optional()?;
    raw.map(row_to_item).transpose()
}

/// Drop repeated platforms, keeping first-seen order.
fn dedup_platforms(platforms: &[PlatformId]) -> Vec<PlatformId> {
    let mut out = Vec::with_capacity(platforms.len());
    for p in platforms {
        if !out.contains(p) {
            out.push(*p);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn store() -> QueueStore {
        QueueStore::new(Connection::open_in_memory().unwrap()).unwrap()
    }

    fn post(content: &str, platforms: &[PlatformId]) -> NewPost {
        NewPost {
            title: "Deal".into(),
            content: content.into(),
            platforms: platforms.to_vec(),
            ..Default::default()
        }
    }

    #[test]
    fn enqueue_persists_pending_item() {
        let store = store();
        let mut new = post("Lisbon from $199", &[PlatformId::Twitter]);
        new.hashtags = vec!["travel".into()];
        new.link = Some("https://example.com/deal".into());
        let item = store.enqueue(new, 3).unwrap();

        let loaded = store.get(&item.id).unwrap();
        assert_eq!(loaded.status, QueueStatus::Pending);
        assert_eq!(loaded.retry_count, 0);
        assert_eq!(loaded.max_retries, 3);
        assert_eq!(loaded.hashtags, vec!["travel".to_string()]);
        assert_eq!(loaded.link.as_deref(), Some("https://example.com/deal"));
        assert!(loaded.results.is_empty());
        assert!(loaded.posted_at.is_none());
    }

    #[test]
    fn enqueue_collapses_duplicate_platforms() {
        let store = store();
        let item = store
            .enqueue(
                post(
                    "x",
                    &[PlatformId::Facebook, PlatformId::Twitter, PlatformId::Facebook],
                ),
                3,
            )
            .unwrap();
        assert_eq!(item.platforms, vec![PlatformId::Facebook, PlatformId::Twitter]);
    }

    #[test]
    fn enqueue_rejects_empty_content_or_platforms() {
        let store = store();
        assert!(matches!(
            store.enqueue(post("   ", &[PlatformId::Twitter]), 3),
            Err(QueueError::InvalidItem(_))
        ));
        assert!(matches!(
            store.enqueue(post("hello", &[]), 3),
            Err(QueueError::InvalidItem(_))
        ));
        assert_eq!(store.counts().unwrap(), QueueCounts::default());
    }

    #[test]
    fn zero_max_retries_is_raised_to_one() {
        let store = store();
        let mut new = post("x", &[PlatformId::Twitter]);
        new.max_retries = Some(0);
        assert_eq!(store.enqueue(new, 3).unwrap().max_retries, 1);
    }

    #[test]
    fn get_unknown_is_not_found() {
        assert!(matches!(store().get("nope"), Err(QueueError::ItemNotFound { .. })));
    }

    #[test]
    fn claim_orders_by_priority_then_schedule() {
        let store = store();
        let now = Utc::now();

        let mut low_old = post("low old", &[PlatformId::Twitter]);
        low_old.scheduled_at = Some(now - Duration::hours(2));
        let mut high_new = post("high new", &[PlatformId::Twitter]);
        high_new.priority = 5;
        high_new.scheduled_at = Some(now - Duration::minutes(1));
        let mut low_older = post("low older", &[PlatformId::Twitter]);
        low_older.scheduled_at = Some(now - Duration::hours(3));
        let mut future = post("future", &[PlatformId::Twitter]);
        future.priority = 10;
        future.scheduled_at = Some(now + Duration::hours(1));

        for p in [low_old, high_new, low_older, future] {
            store.enqueue(p, 3).unwrap();
        }

        let claimed = store.claim_due(now, 10).unwrap();
        let order: Vec<&str> = claimed.iter().map(|i| i.content.as_str()).collect();
        assert_eq!(order, vec!["high new", "low older", "low old"]);
        assert!(claimed.iter().all(|i| i.status == QueueStatus::Processing));
        assert_eq!(store.counts().unwrap().pending, 1);
    }

    #[test]
    fn claim_respects_limit() {
        let store = store();
        for i in 0..15 {
            store.enqueue(post(&format!("post {i}"), &[PlatformId::Twitter]), 3).unwrap();
        }
        let claimed = store.claim_due(Utc::now(), 10).unwrap();
        assert_eq!(claimed.len(), 10);
        let counts = store.counts().unwrap();
        assert_eq!(counts.processing, 10);
        assert_eq!(counts.pending, 5);
    }

    #[test]
    fn claimed_items_are_not_claimed_twice() {
        let store = store();
        store.enqueue(post("once", &[PlatformId::Twitter]), 3).unwrap();
        let other = store.clone();

        let first = store.claim_due(Utc::now(), 10).unwrap();
        let second = other.claim_due(Utc::now(), 10).unwrap();
        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
    }

    #[test]
    fn record_pass_requires_processing() {
        let store = store();
        let item = store.enqueue(post("x", &[PlatformId::Twitter]), 3).unwrap();
        let t = Transition {
            status: QueueStatus::Posted,
            retry_count: 0,
        };
        let err = store.record_pass(&item.id, &t, &[], None).unwrap_err();
        assert!(matches!(err, QueueError::InvalidTransition { .. }));
    }

    #[test]
    fn record_pass_rejects_edges_outside_the_machine() {
        let store = store();
        let item = store.enqueue(post("x", &[PlatformId::Twitter]), 3).unwrap();
        store.claim_due(Utc::now(), 1).unwrap();
        let t = Transition {
            status: QueueStatus::Processing,
            retry_count: 0,
        };
        let err = store.record_pass(&item.id, &t, &[], None).unwrap_err();
        assert!(matches!(err, QueueError::InvalidTransition { .. }));

        let unchanged = store.get(&item.id).unwrap();
        assert_eq!(unchanged.status, QueueStatus::Processing);
        assert!(unchanged.results.is_empty());
    }

    #[test]
    fn retry_skips_items_outside_failed() {
        let store = store();
        let pending = store.enqueue(post("a", &[PlatformId::Twitter]), 3).unwrap();
        let mut urgent = post("b", &[PlatformId::Twitter]);
        urgent.priority = 5;
        let claimed = store.enqueue(urgent, 3).unwrap();
        store.claim_due(Utc::now(), 1).unwrap();
        assert_eq!(store.get(&claimed.id).unwrap().status, QueueStatus::Processing);

        let ids = vec![pending.id.clone(), claimed.id.clone()];
        assert_eq!(store.retry_failed(Some(ids.as_slice())).unwrap(), 0);
        assert_eq!(store.retry_failed(None).unwrap(), 0);
        assert_eq!(store.get(&claimed.id).unwrap().status, QueueStatus::Processing);
    }

    #[test]
    fn record_pass_appends_history_and_sets_posted_at() {
        let store = store();
        let item = store
            .enqueue(post("x", &[PlatformId::Twitter, PlatformId::Facebook]), 3)
            .unwrap();
        store.claim_due(Utc::now(), 1).unwrap();

        let results = vec![
            PlatformResult::succeeded(PlatformId::Twitter, Some("t1".into()), None),
            PlatformResult::failed(PlatformId::Facebook, "token expired"),
        ];
        let t = Transition {
            status: QueueStatus::Partial,
            retry_count: 0,
        };
        let updated = store.record_pass(&item.id, &t, &results, None).unwrap();
        assert_eq!(updated.status, QueueStatus::Partial);
        assert_eq!(updated.results, results);
        assert_eq!(updated.last_error.as_deref(), Some("facebook: token expired"));
        assert!(updated.posted_at.is_some());
    }

    #[test]
    fn record_pass_reschedules_retry() {
        let store = store();
        let item = store.enqueue(post("x", &[PlatformId::Twitter]), 3).unwrap();
        store.claim_due(Utc::now(), 1).unwrap();

        let retry_at = Utc::now() + Duration::minutes(5);
        let t = Transition {
            status: QueueStatus::Pending,
            retry_count: 1,
        };
        let results = vec![PlatformResult::failed(PlatformId::Twitter, "503")];
        let updated = store.record_pass(&item.id, &t, &results, Some(retry_at)).unwrap();
        assert_eq!(updated.status, QueueStatus::Pending);
        assert_eq!(updated.retry_count, 1);
        assert_eq!(updated.scheduled_at, timestamp(retry_at));
        assert!(updated.posted_at.is_none());

        // Not due until the backoff elapses.
        assert!(store.claim_due(Utc::now(), 10).unwrap().is_empty());
        assert_eq!(store.claim_due(retry_at, 10).unwrap().len(), 1);
    }

    #[test]
    fn retry_failed_resets_all_or_named() {
        let store = store();
        let mut ids = Vec::new();
        for i in 0..3 {
            let item = store.enqueue(post(&format!("p{i}"), &[PlatformId::Twitter]), 1).unwrap();
            ids.push(item.id);
        }
        store.claim_due(Utc::now(), 10).unwrap();
        let t = Transition {
            status: QueueStatus::Failed,
            retry_count: 1,
        };
        for id in &ids {
            store
                .record_pass(id, &t, &[PlatformResult::failed(PlatformId::Twitter, "down")], None)
                .unwrap();
        }

        let named = vec![ids[0].clone(), "unknown".to_string()];
        assert_eq!(store.retry_failed(Some(named.as_slice())).unwrap(), 1);
        let reset = store.get(&ids[0]).unwrap();
        assert_eq!(reset.status, QueueStatus::Pending);
        assert_eq!(reset.retry_count, 0);

        assert_eq!(store.retry_failed(None).unwrap(), 2);
        assert_eq!(store.counts().unwrap().pending, 3);
        assert_eq!(store.claim_due(Utc::now(), 10).unwrap().len(), 3);
    }

    #[test]
    fn retry_ignores_partial_items() {
        let store = store();
        let item = store.enqueue(post("x", &[PlatformId::Twitter]), 3).unwrap();
        store.claim_due(Utc::now(), 1).unwrap();
        let t = Transition {
            status: QueueStatus::Partial,
            retry_count: 0,
        };
        store.record_pass(&item.id, &t, &[], None).unwrap();
        assert_eq!(store.retry_failed(Some(&[item.id.clone()][..])).unwrap(), 0);
        assert_eq!(store.get(&item.id).unwrap().status, QueueStatus::Partial);
    }

    #[test]
    fn recover_stale_returns_old_claims_to_pending() {
        let store = store();
        store.enqueue(post("x", &[PlatformId::Twitter]), 3).unwrap();
        store.claim_due(Utc::now(), 1).unwrap();

        assert_eq!(store.recover_stale(Utc::now() - Duration::minutes(15)).unwrap(), 0);
        assert_eq!(store.recover_stale(Utc::now() + Duration::seconds(1)).unwrap(), 1);
        assert_eq!(store.counts().unwrap().pending, 1);
    }

    #[test]
    fn list_filters_by_status() {
        let store = store();
        for i in 0..3 {
            store.enqueue(post(&format!("p{i}"), &[PlatformId::Twitter]), 3).unwrap();
        }
        store.claim_due(Utc::now(), 1).unwrap();

        assert_eq!(store.list(None, 50).unwrap().len(), 3);
        assert_eq!(store.list(Some(QueueStatus::Pending), 50).unwrap().len(), 2);
        assert_eq!(store.list(Some(QueueStatus::Processing), 50).unwrap().len(), 1);
        assert_eq!(store.list(None, 2).unwrap().len(), 2);
    }
}
