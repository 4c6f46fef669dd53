pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod filter;
pub mod links;
pub mod models;
pub mod service;
pub mod stats;

use std::sync::Arc;
use config::Config;
use service::JobsData;

pub use filter::filter_jobs;
pub use links::extract_application_link;
pub use models::{Company, Job, JobFilters, JobStats};
pub use stats::process_jobs_data;

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub data: Arc<JobsData>,
}

impl AppState {
    pub fn new(config: Config) -> error::Result<Self> {
        let data = JobsData::new(&config)?;
        Ok(AppState {
            config: Arc::new(config),
            data: Arc::new(data),
        })
    }
}
