use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const UNCATEGORIZED: &str = "uncategorized";

/// Time spent on one domain, as returned by `GET /analytics/usage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainUsage {
    pub domain: String,
    #[serde(default)]
    pub category: Option<String>,
    pub total_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 0,
            total: 0,
            total_pages: 1,
        }
    }
}

impl Pagination {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsagePage {
    #[serde(default)]
    pub pagination: Pagination,
    #[serde(default)]
    pub data: Vec<DomainUsage>,
}

/// One row of the dashboard table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainShare {
    pub domain: String,
    pub category: String,
    pub seconds: u64,
    /// Fraction of the total, 0.0 to 1.0.
    pub share: f64,
}

/// Derived totals for a set of usage records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UsageSummary {
    pub total_seconds: u64,
    /// Busiest first; ties broken by domain name.
    pub domains: Vec<DomainShare>,
    /// Busiest first; ties broken by category name.
    pub categories: Vec<(String, u64)>,
}

impl UsageSummary {
    /// Aggregate records, merging repeated domains.
    pub fn from_records(records: &[DomainUsage]) -> Self {
        let mut by_domain: BTreeMap<&str, (u64, &str)> = BTreeMap::new();
        for record in records {
            let category = record.category.as_deref().unwrap_or(UNCATEGORIZED);
            let entry = by_domain
                .entry(record.domain.as_str())
                .or_insert((0, category));
            entry.0 += record.total_seconds;
        }

        let total_seconds: u64 = by_domain.values().map(|(secs, _)| secs).sum();

        let mut by_category: BTreeMap<String, u64> = BTreeMap::new();
        let mut domains: Vec<DomainShare> = by_domain
            .into_iter()
            .map(|(domain, (seconds, category))| {
                *by_category.entry(category.to_string()).or_default() += seconds;
                DomainShare {
                    domain: domain.to_string(),
                    category: category.to_string(),
                    seconds,
                    share: if total_seconds == 0 {
                        0.0
                    } else {
                        seconds as f64 / total_seconds as f64
                    },
                }
            })
            .collect();
        domains.sort_by(|a, b| b.seconds.cmp(&a.seconds).then_with(|| a.domain.cmp(&b.domain)));

        let mut categories: Vec<(String, u64)> = by_category.into_iter().collect();
        categories.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Self {
            total_seconds,
            domains,
            categories,
        }
    }

    pub fn top(&self, n: usize) -> &[DomainShare] {
        &self.domains[..n.min(self.domains.len())]
    }
}

/// Compact human duration: `45s`, `3m 20s`, `1h 05m`.
pub fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    if hours > 0 {
        format!("{hours}h {minutes:02}m")
    } else if minutes > 0 {
        format!("{minutes}m {seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}
