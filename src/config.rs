use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;
use crate::error::{AppError, Result};

pub const DEFAULT_JOBS_DATA_URL: &str =
    "https://raw.githubusercontent.com/crypto-jobs-fyi/crawler/refs/heads/main/jobs.json";
pub const DEFAULT_COMPANIES_DATA_URL: &str =
    "https://raw.githubusercontent.com/crypto-jobs-fyi/crawler/refs/heads/main/companies.json";

/// How long a successful companies fetch is served from memory.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// What the remote fetchers hand back once every transport has failed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Swallow the failure and return an empty collection.
    #[default]
    ReturnEmpty,
    /// Return the last error to the caller.
    Propagate,
}

impl FromStr for FailurePolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "empty" | "return-empty" => Ok(FailurePolicy::ReturnEmpty),
            "propagate" => Ok(FailurePolicy::Propagate),
            other => Err(AppError::Config(format!("Invalid failure policy: {}", other))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: SocketAddr,
    pub jobs_url: String,
    pub companies_url: String,
    pub cache_ttl: Duration,
    pub failure_policy: FailurePolicy,
    pub request_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            jobs_url: DEFAULT_JOBS_DATA_URL.to_string(),
            companies_url: DEFAULT_COMPANIES_DATA_URL.to_string(),
            cache_ttl: DEFAULT_CACHE_TTL,
            failure_policy: FailurePolicy::default(),
            request_timeout: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
        let port = port.parse::<u16>().map_err(|e| AppError::Config(format!("Invalid port: {}", e)))?;
        let ip = IpAddr::from_str(&host).map_err(|e| AppError::Config(format!("Invalid host address: {}", e)))?;

        let jobs_url = env::var("JOBS_DATA_URL").unwrap_or_else(|_| DEFAULT_JOBS_DATA_URL.to_string());
        let companies_url =
            env::var("COMPANIES_DATA_URL").unwrap_or_else(|_| DEFAULT_COMPANIES_DATA_URL.to_string());

        let cache_ttl = match env::var("COMPANIES_CACHE_TTL_SECS") {
            Ok(secs) => Duration::from_secs(
                secs.parse::<u64>()
                    .map_err(|e| AppError::Config(format!("Invalid cache TTL: {}", e)))?,
            ),
            Err(_) => DEFAULT_CACHE_TTL,
        };

        let failure_policy = match env::var("FAILURE_POLICY") {
            Ok(policy) => policy.parse()?,
            Err(_) => FailurePolicy::default(),
        };

        let request_timeout = env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .map(|secs| {
                secs.parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|e| AppError::Config(format!("Invalid request timeout: {}", e)))
            })
            .transpose()?;

        Ok(Config {
            server_addr: SocketAddr::new(ip, port),
            jobs_url,
            companies_url,
            cache_ttl,
            failure_policy,
            request_timeout,
        })
    }
}
