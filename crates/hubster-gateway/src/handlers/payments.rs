use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::Utc;
use hubster_core::{PaymentNotification, Preference};
use hubster_platform::{CreatePaymentRequest, PaymentConfigResponse, WebhookAck};
use tracing::info;

use crate::AppState;
use crate::error::{ApiResult, error_response, invalid_request, proposal_error};

pub async fn create_payment(
    State(state): State<AppState>,
    payload: Result<Json<CreatePaymentRequest>, JsonRejection>,
) -> ApiResult<Preference> {
    let Json(payload) = payload.map_err(|rejection| invalid_request(rejection.body_text()))?;

    let initiation = payload.into_initiation().map_err(|missing| {
        error_response(
            StatusCode::BAD_REQUEST,
            "Missing required fields",
            format!("missing: {}", missing.join(", ")),
        )
    })?;

    let preference = state
        .lifecycle
        .initiate_payment(initiation)
        .await
        .map_err(proposal_error)?;
    Ok(Json(preference))
}

pub async fn payment_config(State(state): State<AppState>) -> Json<PaymentConfigResponse> {
    Json(PaymentConfigResponse {
        public_key: state.public_key.clone(),
    })
}

/// Answers 200 for anything that is not a payment so the provider stops redelivering it.
pub async fn payment_webhook(State(state): State<AppState>, body: Bytes) -> ApiResult<WebhookAck> {
    let notification = PaymentNotification::from_json(&body).map_err(proposal_error)?;
    info!(?notification, "payment notification received");

    let outcome = state
        .reconciler
        .handle(notification, Utc::now())
        .await
        .map_err(proposal_error)?;

    Ok(Json(WebhookAck {
        received: true,
        outcome,
    }))
}
