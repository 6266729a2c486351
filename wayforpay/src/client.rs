//! HTTP adapter for the WayForPay gateway.

use std::time::Duration;

use donate_types::{GatewayError, PaymentGateway, PurchaseForm, TransactionListQuery};
use serde::Deserialize;

/// Endpoints and limits for [`WayforpayClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Hosted payment page that accepts the form-encoded purchase.
    pub payment_url: String,
    /// JSON API endpoint for `TRANSACTION_LIST`.
    pub transaction_list_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            payment_url: "https://secure.wayforpay.com/pay".to_string(),
            transaction_list_url: "https://api.wayforpay.com/api".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionListResponse {
    #[serde(default)]
    transaction_list: Option<Vec<serde_json::Value>>,
}

/// Sends already-signed requests to the gateway. No retries.
#[derive(Debug, Clone)]
pub struct WayforpayClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl WayforpayClient {
    pub fn new(config: ClientConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self { http, config })
    }
}

#[async_trait::async_trait]
impl PaymentGateway for WayforpayClient {
    async fn submit_purchase(&self, form: PurchaseForm) -> Result<String, GatewayError> {
        let response = self
            .http
            .post(&self.config.payment_url)
            .form(&form.to_pairs())
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status(status.as_u16()));
        }

        // reqwest follows redirects; the final URL is the checkout page.
        Ok(response.url().to_string())
    }

    async fn list_transactions(
        &self,
        query: TransactionListQuery,
    ) -> Result<Vec<serde_json::Value>, GatewayError> {
        let response = self
            .http
            .post(&self.config.transaction_list_url)
            .json(&query)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status(status.as_u16()));
        }

        let body: TransactionListResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        Ok(body.transaction_list.unwrap_or_default())
    }
}
