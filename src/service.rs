use std::sync::Arc;

use tracing::info;

use crate::cache::CompaniesCache;
use crate::config::Config;
use crate::error::Result;
use crate::fetcher::RemoteFetcher;
use crate::models::{Company, Job, JobFilters, JobStats};
use crate::{filter, links, stats};

/// Entry point for the presentation layer.
///
/// Owns the remote fetcher and the companies cache. Construct one per process
/// (or per test) and share it behind an `Arc`.
pub struct JobsData {
    fetcher: Arc<RemoteFetcher>,
    companies: CompaniesCache<RemoteFetcher>,
}

impl JobsData {
    pub fn new(config: &Config) -> Result<Self> {
        let fetcher = Arc::new(RemoteFetcher::new(config)?);
        let companies = CompaniesCache::new(Arc::clone(&fetcher), config.cache_ttl);
        Ok(JobsData { fetcher, companies })
    }

    pub async fn fetch_jobs_data(&self) -> Result<Vec<Job>> {
        self.fetcher.fetch_jobs_data().await
    }

    /// Companies through the cache.
    pub async fn fetch_companies_data(&self) -> Result<Arc<Vec<Company>>> {
        self.companies.get().await
    }

    pub fn process_jobs_data(&self, jobs: &[Job]) -> JobStats {
        stats::process_jobs_data(jobs)
    }

    pub fn filter_jobs(&self, jobs: &[Job], filters: &JobFilters) -> Vec<Job> {
        filter::filter_jobs(jobs, filters)
    }

    pub fn extract_application_link(&self, link: Option<&str>) -> String {
        links::extract_application_link(link)
    }

    pub fn clear_companies_cache(&self) {
        self.companies.invalidate();
    }

    pub fn clear_all_caches(&self) {
        self.clear_companies_cache();
        self.fetcher.reset_transport();
        info!("All caches cleared");
    }

    pub fn cached_companies_data(&self) -> Option<Arc<Vec<Company>>> {
        self.companies.peek()
    }

    pub fn is_cache_valid(&self) -> bool {
        self.companies.is_fresh()
    }
}
