use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use herald_core::types::{PlatformId, PlatformResult, PostContent};
use tracing::{error, info, warn};

use crate::{error::ChannelError, platform::Platform, types::PlatformStatus};

/// Default bound on a single adapter `post` call.
const DEFAULT_POST_TIMEOUT: Duration = Duration::from_secs(30);

/// Registry of posting adapters keyed by [`PlatformId`], and the fan-out
/// that posts one piece of content to several of them at once.
pub struct PlatformSet {
    platforms: HashMap<PlatformId, Arc<dyn Platform>>,
    post_timeout: Duration,
}

impl PlatformSet {
    /// Create an empty set with no registered adapters.
    pub fn new() -> Self {
        Self {
            platforms: HashMap::new(),
            post_timeout: DEFAULT_POST_TIMEOUT,
        }
    }

    pub fn with_post_timeout(mut self, timeout: Duration) -> Self {
        self.post_timeout = timeout;
        self
    }

    /// Register an adapter. An adapter already registered for the same
    /// platform is replaced.
    pub fn register(&mut self, platform: Arc<dyn Platform>) {
        let id = platform.id();
        info!(platform = %id, configured = platform.is_configured(), "registering platform adapter");
        self.platforms.insert(id, platform);
    }

    pub fn get(&self, id: PlatformId) -> Option<Arc<dyn Platform>> {
        self.platforms.get(&id).cloned()
    }

    /// Configuration state of every registered adapter, sorted by platform.
    pub fn statuses(&self) -> Vec<PlatformStatus> {
        let mut result: Vec<PlatformStatus> = self
            .platforms
            .iter()
            .map(|(id, p)| PlatformStatus {
                platform: *id,
                configured: p.is_configured(),
            })
            .collect();
        result.sort_by_key(|s| s.platform);
        result
    }

    /// Post `content` to every platform in `targets` concurrently and wait
    /// for all of them.
    ///
    /// Each adapter runs in its own task, so an error, timeout or panic in one
    /// only produces a failed result for that platform. Results come back in
    /// `targets` order, one per target.
    pub async fn dispatch(&self, content: &PostContent, targets: &[PlatformId]) -> Vec<PlatformResult> {
        let content = Arc::new(content.clone());

        let tasks = targets.iter().map(|&platform| {
            let adapter = self.get(platform);
            let content = Arc::clone(&content);
            let timeout = self.post_timeout;
            tokio::spawn(async move { invoke(platform, adapter, &content, timeout).await })
        });
        let joined = join_all(tasks).await;

        targets
            .iter()
            .zip(joined)
            .map(|(&platform, outcome)| match outcome {
                Ok(result) => result,
                Err(e) => {
                    error!(%platform, error = %e, "platform adapter task aborted");
                    PlatformResult::failed(platform, format!("adapter task aborted: {e}"))
                }
            })
            .collect()
    }
}

impl Default for PlatformSet {
    fn default() -> Self {
        Self::new()
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────────

/// Run one adapter through configure → validate → post, turning every
/// failure into a failed [`PlatformResult`].
async fn invoke(
    platform: PlatformId,
    adapter: Option<Arc<dyn Platform>>,
    content: &PostContent,
    timeout: Duration,
) -> PlatformResult {
    let Some(adapter) = adapter else {
        warn!(%platform, "no adapter registered for platform");
        return PlatformResult::failed(platform, format!("no adapter registered for {platform}"));
    };

    if !adapter.is_configured() {
        warn!(%platform, "platform not configured, skipping post");
        return PlatformResult::failed(platform, ChannelError::NotConfigured(platform.to_string()).to_string());
    }

    let validation = adapter.validate_content(content);
    if !validation.valid {
        warn!(%platform, errors = ?validation.errors, "content rejected by platform validation");
        return PlatformResult::failed(
            platform,
            ChannelError::InvalidContent(validation.errors.join("; ")).to_string(),
        );
    }

    match tokio::time::timeout(timeout, adapter.post(content)).await {
        Ok(Ok(receipt)) => {
            info!(%platform, post_id = ?receipt.post_id, "posted to platform");
            PlatformResult::succeeded(platform, receipt.post_id, receipt.url)
        }
        Ok(Err(e)) => {
            warn!(%platform, error = %e, "platform post failed");
            PlatformResult::failed(platform, e.to_string())
        }
        Err(_) => {
            let ms = timeout.as_millis() as u64;
            warn!(%platform, timeout_ms = ms, "platform post timed out");
            PlatformResult::failed(platform, ChannelError::Timeout { ms }.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PostReceipt;
    use async_trait::async_trait;
    use herald_core::types::ValidationResult;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behaviour {
        Succeed,
        Fail,
        Panic,
        Hang,
        Rendezvous(Arc<tokio::sync::Barrier>),
    }

    struct Stub {
        id: PlatformId,
        configured: bool,
        max_len: usize,
        behaviour: Behaviour,
        calls: Arc<AtomicUsize>,
    }

    impl Stub {
        fn new(id: PlatformId, behaviour: Behaviour) -> Self {
            Self {
                id,
                configured: true,
                max_len: 1000,
                behaviour,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl Platform for Stub {
        fn id(&self) -> PlatformId {
            self.id
        }
        fn is_configured(&self) -> bool {
            self.configured
        }
        fn validate_content(&self, content: &PostContent) -> ValidationResult {
            let mut v = ValidationResult::ok();
            crate::platform::check_length(&mut v, &content.content, self.max_len, self.id);
            v
        }
        async fn post(&self, _content: &PostContent) -> Result<PostReceipt, ChannelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behaviour {
                Behaviour::Succeed => Ok(PostReceipt {
                    post_id: Some(format!("{}-1", self.id)),
                    url: None,
                }),
                Behaviour::Fail => Err(ChannelError::SendFailed("upstream 500".into())),
                Behaviour::Panic => panic!("adapter bug"),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(PostReceipt::default())
                }
                Behaviour::Rendezvous(barrier) => {
                    barrier.wait().await;
                    Ok(PostReceipt::default())
                }
            }
        }
    }

    fn post() -> PostContent {
        PostContent {
            title: "Deal".into(),
            content: "JFK to CDG from $399".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn results_follow_target_order() {
        let mut set = PlatformSet::new();
        set.register(Arc::new(Stub::new(PlatformId::Twitter, Behaviour::Succeed)));
        set.register(Arc::new(Stub::new(PlatformId::Facebook, Behaviour::Fail)));

        let results = set
            .dispatch(&post(), &[PlatformId::Facebook, PlatformId::Twitter])
            .await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].platform, PlatformId::Facebook);
        assert!(!results[0].success);
        assert_eq!(results[0].error.as_deref(), Some("Send failed: upstream 500"));
        assert_eq!(results[1].platform, PlatformId::Twitter);
        assert!(results[1].success);
        assert_eq!(results[1].post_id.as_deref(), Some("twitter-1"));
    }

    #[tokio::test]
    async fn unconfigured_adapter_is_never_called() {
        let mut stub = Stub::new(PlatformId::Telegram, Behaviour::Succeed);
        stub.configured = false;
        let calls = Arc::clone(&stub.calls);
        let mut set = PlatformSet::new();
        set.register(Arc::new(stub));

        let results = set.dispatch(&post(), &[PlatformId::Telegram]).await;
        assert!(!results[0].success);
        assert_eq!(results[0].error.as_deref(), Some("telegram is not configured"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_adapter_yields_failure() {
        let set = PlatformSet::new();
        let results = set.dispatch(&post(), &[PlatformId::Facebook]).await;
        assert!(!results[0].success);
        assert!(results[0].error.as_deref().unwrap().contains("no adapter"));
    }

    #[tokio::test]
    async fn invalid_content_skips_post() {
        let mut stub = Stub::new(PlatformId::Twitter, Behaviour::Succeed);
        stub.max_len = 5;
        let calls = Arc::clone(&stub.calls);
        let mut set = PlatformSet::new();
        set.register(Arc::new(stub));

        let results = set.dispatch(&post(), &[PlatformId::Twitter]).await;
        assert!(!results[0].success);
        assert!(results[0].error.as_deref().unwrap().starts_with("Invalid content"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn panicking_adapter_does_not_affect_others() {
        let mut set = PlatformSet::new();
        set.register(Arc::new(Stub::new(PlatformId::Twitter, Behaviour::Panic)));
        set.register(Arc::new(Stub::new(PlatformId::Facebook, Behaviour::Succeed)));

        let results = set
            .dispatch(&post(), &[PlatformId::Twitter, PlatformId::Facebook])
            .await;
        assert!(!results[0].success);
        assert!(results[0].error.as_deref().unwrap().contains("aborted"));
        assert!(results[1].success);
    }

    #[tokio::test]
    async fn hanging_adapter_times_out() {
        let mut set = PlatformSet::new().with_post_timeout(Duration::from_millis(50));
        set.register(Arc::new(Stub::new(PlatformId::Facebook, Behaviour::Hang)));
        set.register(Arc::new(Stub::new(PlatformId::Twitter, Behaviour::Succeed)));

        let results = set
            .dispatch(&post(), &[PlatformId::Facebook, PlatformId::Twitter])
            .await;
        assert_eq!(results[0].error.as_deref(), Some("Operation timed out after 50ms"));
        assert!(results[1].success);
    }

    #[tokio::test]
    async fn adapters_run_concurrently() {
        // Each adapter blocks until the other has started; a sequential
        // dispatcher would never get past the first one.
        let barrier = Arc::new(tokio::sync::Barrier::new(2));
        let mut set = PlatformSet::new();
        set.register(Arc::new(Stub::new(
            PlatformId::Twitter,
            Behaviour::Rendezvous(Arc::clone(&barrier)),
        )));
        set.register(Arc::new(Stub::new(
            PlatformId::Facebook,
            Behaviour::Rendezvous(Arc::clone(&barrier)),
        )));

        let results = tokio::time::timeout(
            Duration::from_secs(5),
            set.dispatch(&post(), &[PlatformId::Twitter, PlatformId::Facebook]),
        )
        .await
        .expect("dispatch must not serialise adapters");
        assert!(results.iter().all(|r| r.success));
    }

    #[test]
    fn statuses_are_sorted() {
        let mut set = PlatformSet::new();
        let mut tg = Stub::new(PlatformId::Telegram, Behaviour::Succeed);
        tg.configured = false;
        set.register(Arc::new(tg));
        set.register(Arc::new(Stub::new(PlatformId::Twitter, Behaviour::Succeed)));

        let statuses = set.statuses();
        assert_eq!(statuses[0].platform, PlatformId::Twitter);
        assert!(statuses[0].configured);
        assert_eq!(statuses[1].platform, PlatformId::Telegram);
        assert!(!statuses[1].configured);
    }
}
