use std::sync::atomic::{AtomicU64, Ordering};

use mindful_core::{DateRange, UsagePage, UsageSummary};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::ClientError;
use crate::services::AnalyticsApi;

/// Upper bound on pages fetched by [`AnalyticsView::load_all`].
pub const MAX_PAGES: u32 = 50;

/// A fetched usage window plus its derived totals.
#[derive(Debug, Clone, Serialize)]
pub struct UsageReport {
    pub range: DateRange,
    pub page: UsagePage,
    pub summary: UsageSummary,
}

impl UsageReport {
    pub fn new(range: DateRange, page: UsagePage) -> Self {
        let summary = UsageSummary::from_records(&page.data);
        Self {
            range,
            page,
            summary,
        }
    }
}

/// Dashboard data source.
///
/// Each load takes a ticket from a monotonically increasing sequence. When a
/// response arrives after a newer load has started it is discarded, so
/// switching date ranges quickly can never show an older window.
pub struct AnalyticsView {
    api: AnalyticsApi,
    sequence: AtomicU64,
    latest: RwLock<Option<UsageReport>>,
}

impl AnalyticsView {
    pub fn new(api: AnalyticsApi) -> Self {
        Self {
            api,
            sequence: AtomicU64::new(0),
            latest: RwLock::new(None),
        }
    }

    /// Load one page. `Ok(None)` means a newer load superseded this one.
    pub async fn load(&self, range: DateRange, page: u32) -> Result<Option<UsageReport>, ClientError> {
        let ticket = self.next_ticket();
        let result = self.api.usage(&range, page).await;
        if !self.is_current(ticket) {
            tracing::debug!(ticket, range = %range, "Discarding superseded usage response");
            return Ok(None);
        }
        let report = UsageReport::new(range, result?);
        Ok(self.publish(ticket, report).await)
    }

    /// Load every page of `range` into one report.
    pub async fn load_all(&self, range: DateRange) -> Result<Option<UsageReport>, ClientError> {
        let ticket = self.next_ticket();
        let mut merged = UsagePage::default();
        let mut page = 1;
        loop {
            let next = self.api.usage(&range, page).await;
            if !self.is_current(ticket) {
                tracing::debug!(ticket, range = %range, "Discarding superseded usage response");
                return Ok(None);
            }
            let next = next?;
            let has_next = next.pagination.has_next();
            merged.pagination = next.pagination;
            merged.data.extend(next.data);
            if !has_next || page >= MAX_PAGES {
                break;
            }
            page += 1;
        }

        let report = UsageReport::new(range, merged);
        Ok(self.publish(ticket, report).await)
    }

    /// Most recent report that was not superseded.
    pub async fn latest(&self) -> Option<UsageReport> {
        self.latest.read().await.clone()
    }

    /// Store `report` as the latest unless a newer load has started. The
    /// ticket is re-checked under the write lock so a newer report that
    /// already landed is never overwritten.
    async fn publish(&self, ticket: u64, report: UsageReport) -> Option<UsageReport> {
        let mut latest = self.latest.write().await;
        if !self.is_current(ticket) {
            tracing::debug!(ticket, range = %report.range, "Discarding superseded usage response");
            return None;
        }
        *latest = Some(report.clone());
        Some(report)
    }

    fn next_ticket(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.sequence.load(Ordering::SeqCst) == ticket
    }
}
