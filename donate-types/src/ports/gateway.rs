//! Payment gateway port.
//!
//! Requests arrive here already signed. Implementations only move bytes.

use crate::domain::{PurchaseForm, TransactionListQuery};

/// Error type for outbound gateway calls.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Gateway answered with status {0}")]
    Status(u16),

    #[error("Invalid gateway response: {0}")]
    InvalidResponse(String),
}

/// Port trait for the payment gateway.
#[async_trait::async_trait]
pub trait PaymentGateway: Send + Sync + 'static {
    /// Submits a signed purchase form and returns the URL the payer should be
    /// sent to (the final URL after the gateway's redirects).
    async fn submit_purchase(&self, form: PurchaseForm) -> Result<String, GatewayError>;

    /// Runs a signed transaction-list query and returns the raw transaction
    /// records.
    async fn list_transactions(
        &self,
        query: TransactionListQuery,
    ) -> Result<Vec<serde_json::Value>, GatewayError>;
}
