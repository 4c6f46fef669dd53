use crate::models::{Job, JobStats};

/// Groups the jobs by company and location and counts them.
///
/// Keys are compared exactly, without any case or whitespace normalization.
/// Inside each group jobs keep their original relative order.
pub fn process_jobs_data(jobs: &[Job]) -> JobStats {
    let mut stats = JobStats {
        total_jobs: jobs.len(),
        ..JobStats::default()
    };

    for job in jobs {
        *stats.companies_data.entry(job.company.clone()).or_default() += 1;
        *stats.locations_data.entry(job.location.clone()).or_default() += 1;

        stats
            .jobs_by_company
            .entry(job.company.clone())
            .or_default()
            .push(job.clone());
        stats
            .jobs_by_location
            .entry(job.location.clone())
            .or_default()
            .push(job.clone());
    }

    stats.total_companies = stats.companies_data.len();
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(company: &str, title: &str, location: &str) -> Job {
        Job {
            company: company.to_string(),
            title: title.to_string(),
            location: location.to_string(),
            link: None,
        }
    }

    #[test]
    fn empty_jobs_yield_empty_stats() {
        let stats = process_jobs_data(&[]);
        assert_eq!(stats, JobStats::default());

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "totalJobs": 0,
                "totalCompanies": 0,
                "companiesData": {},
                "locationsData": {},
                "jobsByCompany": {},
                "jobsByLocation": {}
            })
        );
    }

    #[test]
    fn counts_and_groups() {
        let jobs = vec![
            job("Kraken", "Backend Engineer", "Remote"),
            job("Coinbase", "Rust Engineer", "Remote"),
            job("Kraken", "SRE", "London"),
            job("kraken", "Designer", "London"),
        ];
        let stats = process_jobs_data(&jobs);

        assert_eq!(stats.total_jobs, 4);
        assert_eq!(stats.total_companies, 3);
        assert_eq!(stats.companies_data["Kraken"], 2);
        assert_eq!(stats.companies_data["kraken"], 1);
        assert_eq!(stats.locations_data["Remote"], 2);
        assert_eq!(stats.locations_data["London"], 2);
        assert_eq!(stats.companies_data.values().sum::<usize>(), stats.total_jobs);

        let kraken: Vec<_> = stats.jobs_by_company["Kraken"].iter().map(|job| job.title.as_str()).collect();
        assert_eq!(kraken, ["Backend Engineer", "SRE"]);

        let london: Vec<_> = stats.jobs_by_location["London"].iter().map(|job| job.title.as_str()).collect();
        assert_eq!(london, ["SRE", "Designer"]);
    }

    #[test]
    fn every_job_lands_in_its_own_company_bucket() {
        let jobs = vec![
            job("A", "one", "x"),
            job("B", "two", "y"),
            job("A", "three", "y"),
        ];
        let stats = process_jobs_data(&jobs);

        let bucketed: usize = stats.jobs_by_company.values().map(Vec::len).sum();
        assert_eq!(bucketed, jobs.len());
        for (company, bucket) in &stats.jobs_by_company {
            assert!(bucket.iter().all(|job| &job.company == company));
        }
    }
}
