use std::time::Duration;

use chrono::Utc;
use futures::future::{BoxFuture, FutureExt};
use parking_lot::RwLock;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::{Client, ClientBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::cache::CompaniesSource;
use crate::config::{Config, FailurePolicy};
use crate::error::{AppError, Result};
use crate::models::{Company, Job};

/// Query parameter carrying the cache-defeating timestamp.
const CACHE_BUSTER_PARAM: &str = "t";

fn cache_buster() -> String {
    Utc::now().timestamp_millis().to_string()
}

fn build_client(timeout: Option<Duration>) -> Result<Client> {
    let mut builder = ClientBuilder::new()
        .connect_timeout(Duration::from_secs(5))
        .pool_max_idle_per_host(10);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

/// Retrieves the jobs and companies listings from the crawler endpoints.
pub struct RemoteFetcher {
    // Rebuilt by `reset_transport`, which drops pooled connections.
    client: RwLock<Client>,
    jobs_url: String,
    companies_url: String,
    policy: FailurePolicy,
    request_timeout: Option<Duration>,
}

impl RemoteFetcher {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(RemoteFetcher {
            client: RwLock::new(build_client(config.request_timeout)?),
            jobs_url: config.jobs_url.clone(),
            companies_url: config.companies_url.clone(),
            policy: config.failure_policy,
            request_timeout: config.request_timeout,
        })
    }

    /// Fetches the job listings.
    ///
    /// A failure of the primary transport is retried once through the blocking
    /// fallback transport. If that fails too, the failure policy decides between
    /// an empty list and the error.
    pub async fn fetch_jobs_data(&self) -> Result<Vec<Job>> {
        let error = match self.fetch_jobs_primary().await {
            Ok(jobs) => return Ok(jobs),
            Err(err) => err,
        };
        error!("Error fetching jobs data: {}", error);

        info!("Trying blocking fallback for jobs data");
        let url = self.jobs_url.clone();
        let timeout = self.request_timeout;
        let fallback = tokio::task::spawn_blocking(move || fetch_blocking(&url, timeout))
            .await
            .map_err(AppError::from)
            .and_then(|result| result)
            .and_then(jobs_from_fallback);

        match fallback {
            Ok(jobs) => {
                info!(count = jobs.len(), "Fallback transport returned jobs");
                Ok(jobs)
            }
            Err(err) => {
                error!("Fallback transport also failed: {}", err);
                self.on_failure(err)
            }
        }
    }

    /// Fetches the companies listing straight from the endpoint, without any
    /// fallback transport. Callers normally go through the companies cache.
    pub async fn fetch_companies_data(&self) -> Result<Vec<Company>> {
        let result = self.get_json(&self.companies_url).await.and_then(|value| match value {
            Value::Array(records) => Ok(decode_records::<Company>(records, "company")),
            _ => Err(AppError::Shape("companies payload is not an array".to_string())),
        });

        match result {
            Ok(companies) => {
                info!(count = companies.len(), "Companies data received");
                Ok(companies)
            }
            Err(err) => {
                error!("Error fetching companies data: {}", err);
                self.on_failure(err)
            }
        }
    }

    /// Best-effort drop of transport-level state for both endpoints.
    pub fn reset_transport(&self) {
        match build_client(self.request_timeout) {
            Ok(client) => {
                *self.client.write() = client;
                debug!("HTTP client rebuilt, pooled connections dropped");
            }
            Err(err) => warn!("Transport reset failed: {}", err),
        }
    }

    async fn fetch_jobs_primary(&self) -> Result<Vec<Job>> {
        let value = self.get_json(&self.jobs_url).await?;
        let jobs = match value {
            Value::Object(mut payload) => match payload.remove("data") {
                Some(Value::Array(records)) => decode_records::<Job>(records, "job"),
                _ => return Err(AppError::Shape("jobs payload has no `data` array".to_string())),
            },
            _ => return Err(AppError::Shape("jobs payload is not an object".to_string())),
        };
        info!(count = jobs.len(), "Jobs data received");
        Ok(jobs)
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        info!("Fetching from: {}", url);
        let client = self.client.read().clone();
        let response = client
            .get(url)
            .query(&[(CACHE_BUSTER_PARAM, cache_buster())])
            .header(ACCEPT, "application/json")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;

        let status = response.status();
        debug!(status = status.as_u16(), "Response status");
        if !status.is_success() {
            return Err(AppError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    fn on_failure<T: Default>(&self, err: AppError) -> Result<T> {
        match self.policy {
            FailurePolicy::ReturnEmpty => Ok(T::default()),
            FailurePolicy::Propagate => Err(err),
        }
    }
}

impl CompaniesSource for RemoteFetcher {
    fn fetch_companies(&self) -> BoxFuture<'_, Result<Vec<Company>>> {
        self.fetch_companies_data().boxed()
    }
}

/// Fallback transport: a plain synchronous request. Only an exact `200 OK` counts.
///
/// The client is built per call and never pooled, so `reset_transport` has
/// nothing to drop here.
fn fetch_blocking(url: &str, timeout: Option<Duration>) -> Result<Value> {
    let mut builder = reqwest::blocking::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    let client = builder.build()?;

    let response = client
        .get(url)
        .query(&[(CACHE_BUSTER_PARAM, cache_buster())])
        .send()?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(AppError::Status(status.as_u16()));
    }

    let body = response.text()?;
    Ok(serde_json::from_str(&body)?)
}

// The fallback is lenient: a missing or non-array `data` field is no data.
fn jobs_from_fallback(mut value: Value) -> Result<Vec<Job>> {
    match value.get_mut("data").map(Value::take) {
        Some(Value::Array(records)) => Ok(decode_records(records, "job")),
        _ => Ok(Vec::new()),
    }
}

/// Decodes each record on its own. Records that do not decode are logged and skipped.
fn decode_records<T: DeserializeOwned>(records: Vec<Value>, kind: &str) -> Vec<T> {
    let total = records.len();
    let decoded: Vec<T> = records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value(record) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                warn!(index, "Skipping malformed {} record: {}", kind, err);
                None
            }
        })
        .collect();

    if decoded.len() < total {
        warn!(skipped = total - decoded.len(), total, "Some {} records were skipped", kind);
    }
    decoded
}
