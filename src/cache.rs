//! Single-slot, time-windowed cache for the companies listing.
//!
//! Concurrent reads during a miss are coalesced onto one outstanding fetch:
//! the first caller spawns the fetch and installs a shared completion channel
//! while holding the state lock, every later caller attaches to that channel.
//! The fetch runs on its own task, so it completes even if all callers go away.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::channel::oneshot;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::models::Company;

type FetchResult = std::result::Result<Arc<Vec<Company>>, Arc<AppError>>;
type FetchChannel = Shared<oneshot::Receiver<FetchResult>>;

/// Where the cache gets its companies from on a miss.
pub trait CompaniesSource: Send + Sync + 'static {
    fn fetch_companies(&self) -> BoxFuture<'_, Result<Vec<Company>>>;
}

struct Snapshot {
    companies: Arc<Vec<Company>>,
    fetched_at: Instant,
}

#[derive(Default)]
struct CacheState {
    snapshot: Option<Snapshot>,
    pending: Option<FetchChannel>,
    /// Bumped by every invalidation. A fetch started under an older
    /// generation must not write back into the cache.
    generation: u64,
}

impl CacheState {
    fn fresh(&self, ttl: Duration) -> Option<&Snapshot> {
        self.snapshot
            .as_ref()
            .filter(|snapshot| snapshot.fetched_at.elapsed() < ttl)
    }
}

pub struct CompaniesCache<S> {
    source: Arc<S>,
    ttl: Duration,
    state: Arc<Mutex<CacheState>>,
}

impl<S: CompaniesSource> CompaniesCache<S> {
    pub fn new(source: Arc<S>, ttl: Duration) -> Self {
        CompaniesCache {
            source,
            ttl,
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    /// Returns the companies, fetching them only when the snapshot is stale
    /// and no fetch is already in flight.
    pub async fn get(&self) -> Result<Arc<Vec<Company>>> {
        let channel = {
            let mut state = self.state.lock();

            if let Some(snapshot) = state.fresh(self.ttl) {
                debug!(
                    age_secs = snapshot.fetched_at.elapsed().as_secs(),
                    "Cache hit: returning companies data from cache"
                );
                return Ok(Arc::clone(&snapshot.companies));
            }

            match state.pending.clone() {
                Some(pending) => {
                    debug!("Pending request: joining existing companies fetch");
                    pending
                }
                None => {
                    info!("Cache miss: fetching companies data");
                    let channel = self.spawn_fetch(state.generation);
                    state.pending = Some(channel.clone());
                    channel
                }
            }
        };

        match channel.await {
            Ok(result) => result.map_err(AppError::from),
            Err(oneshot::Canceled) => Err(AppError::Internal(
                "companies fetch ended without a result".to_string(),
            )),
        }
    }

    fn spawn_fetch(&self, generation: u64) -> FetchChannel {
        let (sender, receiver) = oneshot::channel();
        let source = Arc::clone(&self.source);
        let state = Arc::clone(&self.state);
        let started = Instant::now();

        tokio::spawn(async move {
            let result = AssertUnwindSafe(source.fetch_companies())
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(AppError::Internal("companies fetch panicked".to_string())))
                .map(Arc::new)
                .map_err(Arc::new);

            {
                let mut state = state.lock();
                if state.generation == generation {
                    if let Ok(companies) = &result {
                        state.snapshot = Some(Snapshot {
                            companies: Arc::clone(companies),
                            fetched_at: started,
                        });
                        info!(count = companies.len(), "Cache updated: companies data cached");
                    }
                    state.pending = None;
                } else {
                    warn!("Discarding companies fetch superseded by an invalidation");
                }
            }

            // Nobody waiting any more is fine.
            let _ = sender.send(result);
        });

        receiver.shared()
    }

    /// Drops the snapshot and detaches any in-flight fetch.
    pub fn invalidate(&self) {
        let mut state = self.state.lock();
        state.snapshot = None;
        state.pending = None;
        state.generation += 1;
        info!("Companies cache cleared");
    }

    /// The snapshot if it is still fresh. Never triggers a fetch.
    pub fn peek(&self) -> Option<Arc<Vec<Company>>> {
        let state = self.state.lock();
        state
            .fresh(self.ttl)
            .map(|snapshot| Arc::clone(&snapshot.companies))
    }

    pub fn is_fresh(&self) -> bool {
        self.state.lock().fresh(self.ttl).is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::Notify;
    use tokio::time;

    use super::*;

    const TTL: Duration = Duration::from_secs(300);

    fn company(name: &str) -> Company {
        Company {
            company_name: name.to_string(),
            company_url: format!("https://{name}.example"),
            jobs_url: format!("https://{name}.example/jobs"),
        }
    }

    /// Counts fetches and optionally blocks each one until released.
    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
        gate: Option<Notify>,
        fail: bool,
    }

    impl CountingSource {
        fn gated() -> Self {
            CountingSource {
                gate: Some(Notify::new()),
                ..Default::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl CompaniesSource for CountingSource {
        fn fetch_companies(&self) -> BoxFuture<'_, Result<Vec<Company>>> {
            Box::pin(async move {
                let call = self.calls.fetch_add(1, Ordering::SeqCst);
                if let Some(gate) = &self.gate {
                    gate.notified().await;
                }
                time::sleep(Duration::from_millis(10)).await;
                if self.fail {
                    return Err(AppError::Status(500));
                }
                Ok(vec![company(&format!("company-{call}"))])
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_reads_share_one_fetch() {
        let source = Arc::new(CountingSource::default());
        let cache = CompaniesCache::new(Arc::clone(&source), TTL);

        let (a, b, c) = futures::join!(cache.get(), cache.get(), cache.get());
        assert_eq!(source.calls(), 1);
        assert_eq!(a.unwrap()[0].company_name, "company-0");
        assert_eq!(b.unwrap()[0].company_name, "company-0");
        assert_eq!(c.unwrap()[0].company_name, "company-0");
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_snapshot_is_served_without_fetching() {
        let source = Arc::new(CountingSource::default());
        let cache = CompaniesCache::new(Arc::clone(&source), TTL);

        cache.get().await.unwrap();
        time::advance(Duration::from_secs(60)).await;
        let companies = cache.get().await.unwrap();

        assert_eq!(source.calls(), 1);
        assert_eq!(companies[0].company_name, "company-0");
        assert!(cache.is_fresh());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_snapshot_triggers_exactly_one_refetch() {
        let source = Arc::new(CountingSource::default());
        let cache = CompaniesCache::new(Arc::clone(&source), TTL);

        cache.get().await.unwrap();
        time::advance(TTL + Duration::from_secs(1)).await;
        assert!(!cache.is_fresh());
        assert!(cache.peek().is_none());

        let (a, b) = futures::join!(cache.get(), cache.get());
        assert_eq!(source.calls(), 2);
        assert_eq!(a.unwrap()[0].company_name, "company-1");
        assert_eq!(b.unwrap()[0].company_name, "company-1");
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_forces_a_fetch() {
        let source = Arc::new(CountingSource::default());
        let cache = CompaniesCache::new(Arc::clone(&source), TTL);

        cache.get().await.unwrap();
        cache.invalidate();
        assert!(!cache.is_fresh());

        let companies = cache.get().await.unwrap();
        assert_eq!(source.calls(), 2);
        assert_eq!(companies[0].company_name, "company-1");
    }

    #[tokio::test(start_paused = true)]
    async fn peek_never_fetches() {
        let source = Arc::new(CountingSource::default());
        let cache = CompaniesCache::new(Arc::clone(&source), TTL);

        assert!(cache.peek().is_none());
        assert_eq!(source.calls(), 0);

        cache.get().await.unwrap();
        assert_eq!(cache.peek().unwrap()[0].company_name, "company-0");
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_clears_pending_without_caching() {
        let source = Arc::new(CountingSource {
            fail: true,
            ..Default::default()
        });
        let cache = CompaniesCache::new(Arc::clone(&source), TTL);

        let (a, b) = futures::join!(cache.get(), cache.get());
        assert_eq!(source.calls(), 1);
        assert!(matches!(a.unwrap_err(), AppError::Shared(inner) if matches!(*inner, AppError::Status(500))));
        assert!(b.is_err());
        assert!(cache.peek().is_none());

        // the next read retries
        assert!(cache.get().await.is_err());
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidation_fences_in_flight_fetch() {
        let source = Arc::new(CountingSource::gated());
        let cache = Arc::new(CompaniesCache::new(Arc::clone(&source), TTL));

        let reader = tokio::spawn({
            let cache = Arc::clone(&cache);
            async move { cache.get().await }
        });
        while source.calls() == 0 {
            tokio::task::yield_now().await;
        }

        cache.invalidate();
        source.gate.as_ref().unwrap().notify_one();

        // the superseded fetch still answers its own waiters
        let companies = reader.await.unwrap().unwrap();
        assert_eq!(companies[0].company_name, "company-0");
        assert!(cache.peek().is_none());
        assert!(!cache.is_fresh());
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_completes_when_callers_are_dropped() {
        let source = Arc::new(CountingSource::gated());
        let cache = CompaniesCache::new(Arc::clone(&source), TTL);

        {
            let read = cache.get();
            futures::pin_mut!(read);
            assert!(futures::poll!(read.as_mut()).is_pending());
        }
        while source.calls() == 0 {
            tokio::task::yield_now().await;
        }
        source.gate.as_ref().unwrap().notify_one();

        let companies = cache.get().await.unwrap();
        assert_eq!(source.calls(), 1);
        assert_eq!(companies[0].company_name, "company-0");
    }

    #[tokio::test(start_paused = true)]
    async fn freshness_counts_from_fetch_start() {
        let source = Arc::new(CountingSource::gated());
        let cache = Arc::new(CompaniesCache::new(Arc::clone(&source), TTL));
        let in_flight = Duration::from_secs(100);

        let reader = tokio::spawn({
            let cache = Arc::clone(&cache);
            async move { cache.get().await }
        });
        while source.calls() == 0 {
            tokio::task::yield_now().await;
        }

        time::advance(in_flight).await;
        source.gate.as_ref().unwrap().notify_one();
        reader.await.unwrap().unwrap();
        assert!(cache.is_fresh());

        time::advance(TTL - in_flight).await;
        assert!(!cache.is_fresh());
        assert!(cache.peek().is_none());
    }
}
