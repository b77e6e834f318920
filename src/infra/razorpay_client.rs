use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::payment_gateway::{GatewayOrder, PaymentGateway},
    infra::{http_client::build_client, payment_signature::verify_payment_signature},
};

pub const RAZORPAY_API_BASE: &str = "https://api.razorpay.com/v1/";

#[derive(Clone)]
pub struct RazorpayClient {
    client: Client,
    api_base: Url,
    key_id: String,
    key_secret: SecretString,
}

impl RazorpayClient {
    pub fn new(api_base: Url, key_id: String, key_secret: SecretString) -> Self {
        Self {
            client: build_client(),
            api_base,
            key_id,
            key_secret,
        }
    }

    fn auth_header(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(format!(
            "{}:{}",
            self.key_id,
            self.key_secret.expose_secret()
        ));
        format!("Basic {encoded}")
    }

    fn orders_url(&self) -> AppResult<Url> {
        self.api_base
            .join("orders")
            .map_err(|e| AppError::Internal(format!("Invalid RAZORPAY_API_BASE: {e}")))
    }

    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> AppResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Gateway(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            tracing::error!(status = %status, body = %body, "Razorpay API error");
            if let Ok(error) = serde_json::from_str::<RazorpayErrorResponse>(&body) {
                return Err(AppError::Gateway(format!(
                    "Razorpay error {}: {}",
                    error.error.code, error.error.description
                )));
            }
            return Err(AppError::Gateway(format!("Razorpay API error: {status}")));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(body = %body, error = %e, "Failed to parse Razorpay response");
            AppError::Gateway(format!("Failed to parse Razorpay response: {e}"))
        })
    }
}

#[async_trait]
impl PaymentGateway for RazorpayClient {
    fn key_id(&self) -> &str {
        &self.key_id
    }

    #[tracing::instrument(skip(self))]
    async fn create_order(
        &self,
        amount_paise: i64,
        currency: &str,
        receipt: &str,
    ) -> AppResult<GatewayOrder> {
        let request = CreateOrderRequest {
            amount: amount_paise,
            currency,
            receipt,
        };

        let response = self
            .client
            .post(self.orders_url()?)
            .header("Authorization", self.auth_header())
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("Razorpay request failed: {e}")))?;

        let order: RazorpayOrder = self.handle_response(response).await?;
        tracing::info!(order_id = %order.id, amount_paise = order.amount, "Razorpay order created");

        Ok(GatewayOrder {
            id: order.id,
            amount_paise: order.amount,
            currency: order.currency,
            receipt: order.receipt.unwrap_or_else(|| receipt.to_string()),
        })
    }

    fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        verify_payment_signature(
            self.key_secret.expose_secret(),
            order_id,
            payment_id,
            signature,
        )
    }
}

// ============================================================================
// Razorpay Types
// ============================================================================

#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct RazorpayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub receipt: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RazorpayErrorResponse {
    error: RazorpayError,
}

#[derive(Debug, Deserialize)]
struct RazorpayError {
    code: String,
    description: String,
}
