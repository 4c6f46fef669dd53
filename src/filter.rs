use crate::models::{Job, JobFilters};

fn matches(field: &str, pattern: Option<&str>) -> bool {
    match pattern {
        None | Some("") => true,
        Some(pattern) => field.to_lowercase().contains(&pattern.to_lowercase()),
    }
}

/// Keeps the jobs matching every set filter, in their original order.
pub fn filter_jobs(jobs: &[Job], filters: &JobFilters) -> Vec<Job> {
    jobs.iter()
        .filter(|job| {
            matches(&job.company, filters.company.as_deref())
                && matches(&job.location, filters.location.as_deref())
                && matches(&job.title, filters.title.as_deref())
        })
        .cloned()
        .collect()
}
