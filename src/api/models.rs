use serde::{Deserialize, Serialize};

use crate::links::extract_application_link;
use crate::models::Job;

/// A job as shown to clients, with its application link normalized.
#[derive(Debug, Serialize)]
pub struct JobView {
    pub company: String,
    pub title: String,
    pub location: String,
    pub apply_url: String,
}

impl From<Job> for JobView {
    fn from(job: Job) -> Self {
        let apply_url = extract_application_link(job.link.as_deref());
        JobView {
            company: job.company,
            title: job.title,
            location: job.location,
            apply_url,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CacheStatus {
    pub fresh: bool,
    pub cached_companies: Option<usize>,
    pub ttl_secs: u64,
}

#[derive(Deserialize)]
pub struct LinkQuery {
    pub raw: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub link: String,
}
