use mindful_core::{DateRange, UsagePage};

use crate::error::ClientError;
use crate::http::ApiClient;

#[derive(Clone)]
pub struct AnalyticsApi {
    api: ApiClient,
}

impl AnalyticsApi {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `GET /analytics/usage?from=YYYY-MM-DD&to=YYYY-MM-DD&page=N`
    pub async fn usage(&self, range: &DateRange, page: u32) -> Result<UsagePage, ClientError> {
        let (from, to) = range.query_bounds();
        let query = [("from", from), ("to", to), ("page", page.max(1).to_string())];
        self.api.get_json("/analytics/usage", &query).await
    }
}
