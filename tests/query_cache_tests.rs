//! Behavioral tests for the query cache: freshness, stale-while-revalidate,
//! request deduplication and supersede safety.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;

use judolwatch::error::PipelineError;
use judolwatch::models::domain::{DomainStatus, DomainSummary, PageResult};
use judolwatch::models::query::QueryKey;
use judolwatch::services::query_cache::{EntryState, PageFetcher, QueryCache};

fn summary(id: i64, name: &str) -> DomainSummary {
    DomainSummary {
        id,
        domain_name: name.to_string(),
        status: DomainStatus::ManualCheck,
        confidence_score: Some(88.0),
        latest_keyword: Some("slot gacor".to_string()),
        last_crawled_at: Some("2025-11-02T08:00:00Z".to_string()),
        last_verified_at: None,
    }
}

/// Fetcher that counts calls, optionally delays, and can be told to fail.
struct CountingFetcher {
    calls: AtomicUsize,
    fail: AtomicBool,
    delay: Duration,
}

impl CountingFetcher {
    fn new(delay: Duration) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
            delay,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for CountingFetcher {
    async fn fetch_page(&self, key: &QueryKey) -> Result<PageResult, PipelineError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(PipelineError::Network("backend unreachable".to_string()));
        }
        // Encode the call number and the requested page so tests can tell
        // fetches apart.
        Ok(PageResult {
            items: vec![summary(call as i64, &format!("page-{}.example", key.page))],
            total: key.page_size * 2 + 3,
        })
    }
}

fn cache_with(
    fetcher: Arc<CountingFetcher>,
    stale: Duration,
    evict: Duration,
) -> QueryCache {
    let (bus, _) = broadcast::channel(16);
    QueryCache::new(fetcher, stale, evict, bus)
}

#[tokio::test]
async fn fresh_hit_issues_no_second_fetch() {
    let fetcher = Arc::new(CountingFetcher::new(Duration::ZERO));
    let cache = cache_with(
        fetcher.clone(),
        Duration::from_secs(300),
        Duration::from_secs(1800),
    );
    let key = QueryKey::default();

    let first = cache.resolve(&key).await.unwrap();
    let second = cache.resolve(&key).await.unwrap();

    assert_eq!(fetcher.calls(), 1);
    assert_eq!(first.items[0].id, second.items[0].id);
    assert_eq!(cache.entry_state(&key).await, Some(EntryState::Fresh));
}

#[tokio::test]
async fn concurrent_resolves_share_one_fetch() {
    let fetcher = Arc::new(CountingFetcher::new(Duration::from_millis(50)));
    let cache = cache_with(
        fetcher.clone(),
        Duration::from_secs(300),
        Duration::from_secs(1800),
    );
    let key = QueryKey::default();

    let (a, b) = tokio::join!(cache.resolve(&key), cache.resolve(&key));

    assert_eq!(fetcher.calls(), 1);
    assert_eq!(a.unwrap().items[0].id, b.unwrap().items[0].id);
}

#[tokio::test]
async fn stale_hit_returns_placeholder_and_revalidates_once() {
    let fetcher = Arc::new(CountingFetcher::new(Duration::ZERO));
    let cache = cache_with(
        fetcher.clone(),
        Duration::from_millis(50),
        Duration::from_secs(1800),
    );
    let key = QueryKey::default();

    let first = cache.resolve(&key).await.unwrap();
    assert_eq!(first.items[0].id, 1);

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(cache.entry_state(&key).await, Some(EntryState::Stale));

    // Both stale reads get the old page back immediately; only one
    // background revalidation is issued between them.
    let stale_a = cache.resolve(&key).await.unwrap();
    let stale_b = cache.resolve(&key).await.unwrap();
    assert_eq!(stale_a.items[0].id, 1);
    assert_eq!(stale_b.items[0].id, 1);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(fetcher.calls(), 2);

    // The revalidated page is now what fresh reads see.
    let refreshed = cache.resolve(&key).await.unwrap();
    assert_eq!(refreshed.items[0].id, 2);
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test]
async fn entries_past_the_eviction_window_are_refetched() {
    let fetcher = Arc::new(CountingFetcher::new(Duration::ZERO));
    let cache = cache_with(
        fetcher.clone(),
        Duration::from_millis(20),
        Duration::from_millis(60),
    );
    let key = QueryKey::default();

    cache.resolve(&key).await.unwrap();
    tokio::time::sleep(Duration::from_millis(90)).await;
    assert_eq!(cache.entry_state(&key).await, None);

    // The caller waits on a real fetch instead of seeing evicted data.
    let second = cache.resolve(&key).await.unwrap();
    assert_eq!(second.items[0].id, 2);
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test]
async fn distinct_keys_never_share_entries() {
    let fetcher = Arc::new(CountingFetcher::new(Duration::ZERO));
    let cache = cache_with(
        fetcher.clone(),
        Duration::from_secs(300),
        Duration::from_secs(1800),
    );

    let page_one = QueryKey::default();
    let page_two = QueryKey {
        page: 2,
        ..QueryKey::default()
    };

    let a = cache.resolve(&page_one).await.unwrap();
    let b = cache.resolve(&page_two).await.unwrap();

    assert_eq!(fetcher.calls(), 2);
    assert_eq!(a.items[0].domain_name, "page-1.example");
    assert_eq!(b.items[0].domain_name, "page-2.example");

    // Both keys stay resolvable from cache afterwards.
    assert_eq!(cache.entry_state(&page_one).await, Some(EntryState::Fresh));
    assert_eq!(cache.entry_state(&page_two).await, Some(EntryState::Fresh));
}

#[tokio::test]
async fn failed_revalidation_keeps_stale_data_and_defers_the_error() {
    let fetcher = Arc::new(CountingFetcher::new(Duration::ZERO));
    let cache = cache_with(
        fetcher.clone(),
        Duration::from_millis(40),
        Duration::from_secs(1800),
    );
    let key = QueryKey::default();

    cache.resolve(&key).await.unwrap();
    tokio::time::sleep(Duration::from_millis(60)).await;

    // The revalidation fails in the background; the stale read that
    // triggered it still got its placeholder.
    fetcher.fail.store(true, Ordering::SeqCst);
    let placeholder = cache.resolve(&key).await.unwrap();
    assert_eq!(placeholder.items[0].id, 1);

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(cache.entry_state(&key).await, Some(EntryState::Error));

    // The next caller fetches in the foreground and sees the failure.
    let err = cache.resolve(&key).await.unwrap_err();
    assert!(matches!(err, PipelineError::Network(_)));

    // Recovery: backend comes back, the same path succeeds again.
    fetcher.fail.store(false, Ordering::SeqCst);
    let recovered = cache.resolve(&key).await.unwrap();
    assert_eq!(recovered.items[0].id, 4);
}

#[tokio::test]
async fn foreground_failure_does_not_clobber_an_existing_entry() {
    let fetcher = Arc::new(CountingFetcher::new(Duration::ZERO));
    let cache = cache_with(
        fetcher.clone(),
        Duration::from_secs(300),
        Duration::from_secs(1800),
    );

    let good_key = QueryKey::default();
    cache.resolve(&good_key).await.unwrap();

    let bad_key = QueryKey {
        page: 9,
        ..QueryKey::default()
    };
    fetcher.fail.store(true, Ordering::SeqCst);
    cache.resolve(&bad_key).await.unwrap_err();
    fetcher.fail.store(false, Ordering::SeqCst);

    // The failure was scoped to its own resolution.
    assert_eq!(cache.entry_state(&good_key).await, Some(EntryState::Fresh));
    assert_eq!(cache.entry_state(&bad_key).await, None);
    let still_cached = cache.resolve(&good_key).await.unwrap();
    assert_eq!(still_cached.items[0].id, 1);
}
