//! Payment gateway adapter. The gateway itself is an external service: this
//! module only registers a payment and hands back the URL the funder pays at.
//! Status changes arrive later through the notification webhook.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

pub const SANDBOX_ENDPOINT: &str = "https://app.sandbox.midtrans.com/snap/v1/transactions";

#[derive(Debug, Clone)]
pub struct PaymentRequest {
    /// Our transaction id; the gateway echoes it back as `order_id`.
    pub order_id: String,
    pub amount: i64,
    pub customer_name: String,
    pub customer_email: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn payment_url(&self, request: &PaymentRequest) -> Result<String>;
}

/// Snap-style hosted checkout over HTTPS, authenticated with the server key.
pub struct SnapGateway {
    client: reqwest::Client,
    endpoint: String,
    server_key: String,
}

#[derive(Deserialize)]
struct SnapResponse {
    redirect_url: String,
}

impl SnapGateway {
    pub fn new(endpoint: impl Into<String>, server_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            server_key: server_key.into(),
        }
    }
}

#[async_trait]
impl PaymentGateway for SnapGateway {
    async fn payment_url(&self, request: &PaymentRequest) -> Result<String> {
        let body = serde_json::json!({
            "transaction_details": {
                "order_id": request.order_id,
                "gross_amount": request.amount,
            },
            "customer_details": {
                "first_name": request.customer_name,
                "email": request.customer_email,
            },
        });

        let response: SnapResponse = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.server_key, Some(""))
            .json(&body)
            .send()
            .await
            .context("payment gateway unreachable")?
            .error_for_status()
            .context("payment gateway rejected the request")?
            .json()
            .await
            .context("malformed payment gateway response")?;

        debug!("Payment registered for order {}", request.order_id);
        Ok(response.redirect_url)
    }
}
