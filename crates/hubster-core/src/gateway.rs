use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("payment '{0}' is unknown to the gateway")]
    UnknownPayment(String),

    #[error("gateway responded {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("gateway unreachable: {0}")]
    Transport(String),

    #[error("unexpected gateway payload: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackUrls {
    pub success: String,
    pub failure: String,
    pub pending: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceRequest {
    pub item_id: String,
    pub title: String,
    pub description: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub currency: String,
    pub back_urls: BackUrls,
    pub external_reference: String,
    pub notification_url: String,
}

/// Gateway-side checkout handle for a payment request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Preference {
    pub preference_id: String,
    pub init_point: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentResult {
    pub payment_id: String,
    pub status: String,
    pub status_detail: Option<String>,
    pub external_reference: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_preference(&self, request: PreferenceRequest)
    -> Result<Preference, GatewayError>;
    async fn get_payment(&self, payment_id: &str) -> Result<PaymentResult, GatewayError>;
}
