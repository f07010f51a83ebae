use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use herald_core::types::PlatformResult;

use crate::types::QueueStatus;

/// Where a `processing` item goes after one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub status: QueueStatus,
    pub retry_count: u32,
}

/// Decide the next state of a `processing` item from the results of one pass.
///
/// An empty result set counts as every platform failing.
pub fn resolve(results: &[PlatformResult], retry_count: u32, max_retries: u32) -> Transition {
    let succeeded = results.iter().filter(|r| r.success).count();
    let failed = results.len() - succeeded;

    if succeeded > 0 && failed == 0 {
        return Transition {
            status: QueueStatus::Posted,
            retry_count,
        };
    }
    if succeeded > 0 {
        return Transition {
            status: QueueStatus::Partial,
            retry_count,
        };
    }

    let attempts = retry_count + 1;
    Transition {
        status: if attempts < max_retries {
            QueueStatus::Pending
        } else {
            QueueStatus::Failed
        },
        retry_count: attempts,
    }
}

/// Whether `from -> to` is an edge of the status machine.
pub fn is_allowed(from: QueueStatus, to: QueueStatus) -> bool {
    use QueueStatus::*;
    matches!(
        (from, to),
        (Pending, Processing)
            | (Processing, Posted)
            | (Processing, Partial)
            | (Processing, Pending)
            | (Processing, Failed)
            | (Failed, Pending)
    )
}

/// Whether a manual retry may send an item in `status` back to `pending`.
/// Only terminal states qualify; `processing` items belong to a running pass.
pub fn can_retry(status: QueueStatus) -> bool {
    status.is_terminal() && is_allowed(status, QueueStatus::Pending)
}

/// Delay before retry number `attempt` (1-based): `base * 2^(attempt-1)`,
/// capped at `max`.
pub fn retry_delay(attempt: u32, base: Duration, max: Duration) -> Duration {
    if base.is_zero() {
        return Duration::ZERO;
    }
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(factor).min(max)
}

/// Latest instant stored as a four-digit-year timestamp. Later instants
/// format with a `+` prefix and stop sorting after "now" as strings.
pub fn latest_schedulable() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(9999, 12, 31)
        .and_then(|d| d.and_hms_milli_opt(23, 59, 59, 999))
        .map(|n| n.and_utc())
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// `now + delay`, capped at [`latest_schedulable`].
pub fn schedule_after(now: DateTime<Utc>, delay: Duration) -> DateTime<Utc> {
    let cap = latest_schedulable();
    chrono::Duration::from_std(delay)
        .ok()
        .and_then(|d| now.checked_add_signed(d))
        .map_or(cap, |at| at.min(cap))
}

/// `now - age`, floored at the Unix epoch.
pub fn cutoff_before(now: DateTime<Utc>, age: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(age)
        .ok()
        .and_then(|d| now.checked_sub_signed(d))
        .map_or(DateTime::UNIX_EPOCH, |at| at.max(DateTime::UNIX_EPOCH))
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::types::PlatformId;

    fn ok(p: PlatformId) -> PlatformResult {
        PlatformResult::succeeded(p, Some("1".into()), None)
    }

    fn err(p: PlatformId) -> PlatformResult {
        PlatformResult::failed(p, "boom")
    }

    #[test]
    fn all_success_is_posted() {
        let t = resolve(&[ok(PlatformId::Twitter), ok(PlatformId::Facebook)], 0, 3);
        assert_eq!(t.status, QueueStatus::Posted);
        assert_eq!(t.retry_count, 0);
    }

    #[test]
    fn mixed_is_partial_without_retry_increment() {
        let t = resolve(&[ok(PlatformId::Twitter), err(PlatformId::Facebook)], 1, 3);
        assert_eq!(t.status, QueueStatus::Partial);
        assert_eq!(t.retry_count, 1);
    }

    #[test]
    fn all_failed_below_ceiling_goes_back_to_pending() {
        let t = resolve(&[err(PlatformId::Twitter), err(PlatformId::Facebook)], 0, 3);
        assert_eq!(t.status, QueueStatus::Pending);
        assert_eq!(t.retry_count, 1);

        let t = resolve(&[err(PlatformId::Twitter)], 1, 3);
        assert_eq!(t.status, QueueStatus::Pending);
        assert_eq!(t.retry_count, 2);
    }

    #[test]
    fn all_failed_at_ceiling_is_failed() {
        let t = resolve(&[err(PlatformId::Twitter)], 2, 3);
        assert_eq!(t.status, QueueStatus::Failed);
        assert_eq!(t.retry_count, 3);
    }

    #[test]
    fn single_attempt_budget_fails_immediately() {
        let t = resolve(&[err(PlatformId::Telegram)], 0, 1);
        assert_eq!(t.status, QueueStatus::Failed);
    }

    #[test]
    fn no_results_counts_as_failure() {
        let t = resolve(&[], 0, 3);
        assert_eq!(t.status, QueueStatus::Pending);
        assert_eq!(t.retry_count, 1);
    }

    #[test]
    fn resolved_states_are_allowed_edges() {
        for status in [
            QueueStatus::Posted,
            QueueStatus::Partial,
            QueueStatus::Pending,
            QueueStatus::Failed,
        ] {
            assert!(is_allowed(QueueStatus::Processing, status));
        }
        assert!(is_allowed(QueueStatus::Failed, QueueStatus::Pending));
        assert!(!is_allowed(QueueStatus::Partial, QueueStatus::Pending));
        assert!(!is_allowed(QueueStatus::Posted, QueueStatus::Processing));
        assert!(!is_allowed(QueueStatus::Pending, QueueStatus::Posted));
    }

    #[test]
    fn only_failed_items_can_be_retried() {
        let retryable: Vec<_> = QueueStatus::ALL.into_iter().filter(|s| can_retry(*s)).collect();
        assert_eq!(retryable, vec![QueueStatus::Failed]);
    }

    #[test]
    fn retry_delay_doubles_and_caps() {
        let base = Duration::from_secs(60);
        let max = Duration::from_secs(300);
        assert_eq!(retry_delay(1, base, max), Duration::from_secs(60));
        assert_eq!(retry_delay(2, base, max), Duration::from_secs(120));
        assert_eq!(retry_delay(3, base, max), Duration::from_secs(240));
        assert_eq!(retry_delay(4, base, max), Duration::from_secs(300));
        assert_eq!(retry_delay(40, base, max), Duration::from_secs(300));
        assert_eq!(retry_delay(3, Duration::ZERO, max), Duration::ZERO);
    }

    #[test]
    fn retry_time_is_capped_at_four_digit_years() {
        let now = Utc::now();
        assert_eq!(
            schedule_after(now, Duration::from_secs(60)),
            now + chrono::Duration::seconds(60)
        );

        let far = schedule_after(now, Duration::from_secs(1_000_000_000_000));
        assert_eq!(far, latest_schedulable());
        let stored = herald_core::types::timestamp(far);
        assert!(stored.starts_with("9999-12-31T23:59:59"), "{stored}");
        assert!(stored > herald_core::types::timestamp(now));

        assert_eq!(schedule_after(now, Duration::MAX), latest_schedulable());
    }

    #[test]
    fn stale_cutoff_never_precedes_the_epoch() {
        let now = Utc::now();
        assert_eq!(
            cutoff_before(now, Duration::from_secs(900)),
            now - chrono::Duration::seconds(900)
        );
        assert_eq!(cutoff_before(now, Duration::MAX), DateTime::UNIX_EPOCH);
        assert_eq!(
            cutoff_before(now, Duration::from_secs(1_000_000_000_000)),
            DateTime::UNIX_EPOCH
        );
    }
}
