//! Komerce (RajaOngkir) domestic cost client.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use crate::services::delivery::{RateApi, RateQuery, RateReply};
use crate::{CommerceError, Result};

pub struct KomerceRateClient {
    client: reqwest::Client,
    cost_url: String,
}

impl KomerceRateClient {
    pub fn new(cost_url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self { client: super::http_client(timeout)?, cost_url: cost_url.into() })
    }
}

#[async_trait]
impl RateApi for KomerceRateClient {
    async fn domestic_cost(&self, api_key: &str, query: &RateQuery) -> Result<RateReply> {
        let weight = query.weight_grams.to_string();
        let params = [
            ("origin", query.origin.as_str()),
            ("destination", query.destination.as_str()),
            ("weight", weight.as_str()),
            ("courier", query.courier.as_str()),
        ];
        let response = self
            .client
            .post(&self.cost_url)
            .header("key", api_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| CommerceError::RateProviderError(format!("request failed: {e}")))?;

        let status = response.status().as_u16();
        let body: Value = response
            .json()
            .await
            .map_err(|e| CommerceError::RateProviderError(format!("unreadable response: {e}")))?;
        Ok(RateReply { status, body })
    }
}
