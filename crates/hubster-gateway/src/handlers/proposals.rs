use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use hubster_core::{NewProposal, Proposal};
use hubster_platform::{OwnerQuery, RespondRequest, SendProposalResponse, UpdateProposalRequest};

use crate::AppState;
use crate::error::{ApiError, ApiResult, proposal_error};

pub async fn create_proposal(
    State(state): State<AppState>,
    Json(payload): Json<NewProposal>,
) -> Result<(StatusCode, Json<Proposal>), ApiError> {
    let proposal = state
        .lifecycle
        .create(payload, Utc::now())
        .await
        .map_err(proposal_error)?;
    Ok((StatusCode::CREATED, Json(proposal)))
}

pub async fn list_proposals(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> ApiResult<Vec<Proposal>> {
    let proposals = state
        .lifecycle
        .list(&query.user_id)
        .await
        .map_err(proposal_error)?;
    Ok(Json(proposals))
}

pub async fn get_proposal(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Proposal> {
    let proposal = state.lifecycle.get(&id).await.map_err(proposal_error)?;
    Ok(Json(proposal))
}

pub async fn update_proposal(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateProposalRequest>,
) -> ApiResult<Proposal> {
    let proposal = state
        .lifecycle
        .edit(&id, payload.into(), Utc::now())
        .await
        .map_err(proposal_error)?;
    Ok(Json(proposal))
}

pub async fn delete_proposal(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.lifecycle.delete(&id).await.map_err(proposal_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn send_proposal(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<SendProposalResponse> {
    let outcome = state
        .lifecycle
        .send(&id, Utc::now())
        .await
        .map_err(proposal_error)?;

    Ok(Json(SendProposalResponse {
        link_id: outcome.link.id,
        link_url: outcome.link_url,
        expires_at: outcome.link.expires_at,
        notified: outcome.notified,
        proposal: outcome.proposal,
    }))
}

pub async fn respond_proposal(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<RespondRequest>,
) -> ApiResult<Proposal> {
    let proposal = state
        .lifecycle
        .respond(&id, payload.accept, Utc::now())
        .await
        .map_err(proposal_error)?;
    Ok(Json(proposal))
}
