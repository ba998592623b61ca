//! Client for the external ranking service. It receives the assembled feature vectors and
//! returns its ordering, which is forwarded to the caller untouched.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::matching::builder::RankingRequest;

#[async_trait]
pub trait RankingService: Send + Sync {
    async fn rank(&self, request: &RankingRequest) -> Result<Value, AppError>;
}

/// Posts ranking requests as JSON. No retries: a failed call surfaces as `Upstream`.
#[derive(Clone)]
pub struct HttpRankingService {
    client: Client,
    url: String,
}

impl HttpRankingService {
    pub fn new(url: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build ranking HTTP client")?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl RankingService for HttpRankingService {
    async fn rank(&self, request: &RankingRequest) -> Result<Value, AppError> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                warn!("Ranking service unreachable: {e}");
                AppError::Upstream(format!("ranking service unreachable: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Ranking service returned {status}: {body}");
            return Err(AppError::Upstream(format!(
                "ranking service returned {status}"
            )));
        }

        let ranking: Value = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("invalid ranking response: {e}")))?;

        debug!("Ranked {} offers", request.job_offers.len());
        Ok(ranking)
    }
}
