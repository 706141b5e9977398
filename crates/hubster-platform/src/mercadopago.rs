use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use hubster_core::{
    BackUrls, GatewayError, PaymentGateway, PaymentResult, Preference, PreferenceRequest,
};
use reqwest::{Client, StatusCode, Url};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::PaymentConfig;

#[derive(Debug, Serialize)]
struct PreferenceItem<'a> {
    id: &'a str,
    title: &'a str,
    description: &'a str,
    quantity: u32,
    currency_id: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    unit_price: Decimal,
}

#[derive(Debug, Serialize)]
struct PreferenceBody<'a> {
    items: Vec<PreferenceItem<'a>>,
    back_urls: &'a BackUrls,
    auto_return: &'static str,
    external_reference: &'a str,
    notification_url: &'a str,
}

impl<'a> PreferenceBody<'a> {
    fn from_request(request: &'a PreferenceRequest) -> Self {
        Self {
            items: vec![PreferenceItem {
                id: &request.item_id,
                title: &request.title,
                description: &request.description,
                quantity: request.quantity,
                currency_id: &request.currency,
                unit_price: request.unit_price,
            }],
            back_urls: &request.back_urls,
            auto_return: "approved",
            external_reference: &request.external_reference,
            notification_url: &request.notification_url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PreferenceResponse {
    id: String,
    init_point: String,
}

#[derive(Debug, Deserialize)]
struct PaymentResponse {
    id: Value,
    status: String,
    status_detail: Option<String>,
    external_reference: Option<String>,
}

impl PaymentResponse {
    fn into_result(self) -> Result<PaymentResult, GatewayError> {
        let payment_id = match self.id {
            Value::String(id) => id,
            Value::Number(id) => id.to_string(),
            other => {
                return Err(GatewayError::Decode(format!(
                    "payment id has unexpected shape: {other}"
                )));
            }
        };

        Ok(PaymentResult {
            payment_id,
            status: self.status,
            status_detail: self.status_detail,
            external_reference: self
                .external_reference
                .filter(|reference| !reference.trim().is_empty()),
        })
    }
}

/// Checkout Pro client: preference creation and payment lookup.
pub struct MercadoPagoClient {
    client: Client,
    api_base: Url,
    access_token: String,
}

impl MercadoPagoClient {
    pub fn new(config: &PaymentConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build payment gateway http client")?;

        let api_base = Url::parse(config.api_base.trim())
            .with_context(|| format!("MP_API_BASE '{}' is not a valid url", config.api_base))?;
        if api_base.cannot_be_a_base() {
            bail!("MP_API_BASE '{}' cannot carry a path", config.api_base);
        }

        Ok(Self {
            client,
            api_base,
            access_token: config.access_token.clone(),
        })
    }

    /// Each segment is percent-encoded, so ids can never add path components or a query.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|()| GatewayError::Transport(format!("api base '{}' has no path", self.api_base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn read_failure(response: reqwest::Response) -> GatewayError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        GatewayError::Rejected { status, body }
    }
}

fn transport(err: reqwest::Error) -> GatewayError {
    GatewayError::Transport(err.to_string())
}

#[async_trait]
impl PaymentGateway for MercadoPagoClient {
    async fn create_preference(
        &self,
        request: PreferenceRequest,
    ) -> Result<Preference, GatewayError> {
        let url = self.endpoint(&["checkout", "preferences"])?;
        debug!(external_reference = %request.external_reference, "creating payment preference");

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .json(&PreferenceBody::from_request(&request))
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(Self::read_failure(response).await);
        }

        let created: PreferenceResponse = response
            .json()
            .await
            .map_err(|err| GatewayError::Decode(err.to_string()))?;

        Ok(Preference {
            preference_id: created.id,
            init_point: created.init_point,
        })
    }

    async fn get_payment(&self, payment_id: &str) -> Result<PaymentResult, GatewayError> {
        let url = self.endpoint(&["v1", "payments", payment_id])?;

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(transport)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(GatewayError::UnknownPayment(payment_id.to_string()));
        }
        if !response.status().is_success() {
            return Err(Self::read_failure(response).await);
        }

        let payment: PaymentResponse = response
            .json()
            .await
            .map_err(|err| GatewayError::Decode(err.to_string()))?;
        payment.into_result()
    }
}
