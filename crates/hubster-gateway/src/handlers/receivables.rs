use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use hubster_core::{NewReceivable, Receivable};
use hubster_platform::{OwnerQuery, UpdateReceivableRequest};

use crate::AppState;
use crate::error::{ApiError, ApiResult, proposal_error};

pub async fn list_receivables(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> ApiResult<Vec<Receivable>> {
    let receivables = state
        .receivables
        .list(&query.user_id)
        .await
        .map_err(proposal_error)?;
    Ok(Json(receivables))
}

pub async fn create_receivable(
    State(state): State<AppState>,
    Json(payload): Json<NewReceivable>,
) -> Result<(StatusCode, Json<Receivable>), ApiError> {
    let receivable = state
        .receivables
        .create(payload, Utc::now())
        .await
        .map_err(proposal_error)?;
    Ok((StatusCode::CREATED, Json(receivable)))
}

pub async fn update_receivable(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateReceivableRequest>,
) -> ApiResult<Receivable> {
    let receivable = state
        .receivables
        .edit(&id, payload.into(), Utc::now())
        .await
        .map_err(proposal_error)?;
    Ok(Json(receivable))
}

pub async fn delete_receivable(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.receivables.delete(&id).await.map_err(proposal_error)?;
    Ok(StatusCode::NO_CONTENT)
}
