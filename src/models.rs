use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One job posting as published by the crawler.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub company: String,
    pub title: String,
    pub location: String,
    /// Either a bare URL or a legacy `<a href=...>` fragment. May be absent or null.
    #[serde(default)]
    pub link: Option<String>,
}

/// One tracked employer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub company_name: String,
    pub company_url: String,
    pub jobs_url: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStats {
    pub total_jobs: usize,
    pub total_companies: usize,
    pub companies_data: BTreeMap<String, usize>,
    pub locations_data: BTreeMap<String, usize>,
    pub jobs_by_company: BTreeMap<String, Vec<Job>>,
    pub jobs_by_location: BTreeMap<String, Vec<Job>>,
}

/// Optional case-insensitive substring filters. Unset or empty fields match everything.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct JobFilters {
    pub company: Option<String>,
    pub location: Option<String>,
    pub title: Option<String>,
}

impl JobFilters {
    pub fn company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}
