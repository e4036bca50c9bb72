//! Read-only access to the backend's history, summaries and configuration.

use crate::api::ApiClient;
use crate::error::Result;
use chrono::NaiveDate;
use serde_json::Value;
use timesetor_protocol::{
    paths, DailyDataResponse, GenerateSummaryRequest, GenerateSummaryResponse, HealthResponse,
    SummariesResponse, WeeklyDataResponse,
};

#[derive(Debug, Clone)]
pub struct DataClient {
    api: ApiClient,
}

impl DataClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Records for `date`, or today when `None`.
    pub async fn daily(&self, date: Option<NaiveDate>) -> Result<DailyDataResponse> {
        match date {
            Some(date) => {
                let date = date.format("%Y-%m-%d").to_string();
                self.api
                    .get_with_query(paths::DATA_DAILY, &[("date", date.as_str())])
                    .await
            }
            None => self.api.get(paths::DATA_DAILY).await,
        }
    }

    pub async fn weekly(&self) -> Result<WeeklyDataResponse> {
        self.api.get(paths::DATA_WEEKLY).await
    }

    pub async fn summaries(
        &self,
        summary_type: Option<&str>,
        limit: Option<u32>,
    ) -> Result<SummariesResponse> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(summary_type) = summary_type {
            query.push(("type", summary_type.to_string()));
        }
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        self.api.get_with_query(paths::SUMMARIES, &query).await
    }

    pub async fn generate_summary(&self, summary_type: &str) -> Result<GenerateSummaryResponse> {
        let request = GenerateSummaryRequest {
            summary_type: summary_type.to_string(),
        };
        self.api.post(paths::SUMMARIES_GENERATE, &request).await
    }

    /// Client-facing part of the backend configuration (time targets, pomodoro
    /// defaults, app lists), passed through untyped. Requires a session.
    pub async fn server_config(&self) -> Result<Value> {
        self.api.get(paths::CONFIG).await
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        self.api.get(paths::HEALTH).await
    }
}
