//! Snap hosted payment page client.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info};
use crate::config::GatewayConfig;
use crate::gateway::{PaymentGateway, TransactionRequest, TransactionResponse};
use crate::{CommerceError, Result};

pub struct SnapClient {
    client: reqwest::Client,
    config: GatewayConfig,
}

#[derive(Deserialize)]
struct SnapErrorBody {
    #[serde(default)]
    error_messages: Vec<String>,
}

impl SnapClient {
    pub fn new(config: GatewayConfig, timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self { client: super::http_client(timeout)?, config })
    }
}

#[async_trait]
impl PaymentGateway for SnapClient {
    async fn create_transaction(&self, request: &TransactionRequest) -> Result<TransactionResponse> {
        let response = self
            .client
            .post(self.config.snap_url())
            .basic_auth(&self.config.server_key, Some(""))
            .json(request)
            .send()
            .await
            .map_err(|e| CommerceError::PaymentGatewayError(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, %body, payment_id = %request.transaction_details.order_id, "snap transaction rejected");
            let detail = serde_json::from_str::<SnapErrorBody>(&body)
                .ok()
                .map(|b| b.error_messages.join("; "))
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("status {status}"));
            return Err(CommerceError::PaymentGatewayError(detail));
        }

        let transaction: TransactionResponse = response
            .json()
            .await
            .map_err(|e| CommerceError::PaymentGatewayError(format!("unreadable response: {e}")))?;
        info!(payment_id = %request.transaction_details.order_id, "snap transaction created");
        Ok(transaction)
    }
}
