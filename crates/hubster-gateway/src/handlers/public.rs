use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use hubster_core::LinkStatus;
use hubster_platform::PublicProposalView;

use crate::AppState;
use crate::error::{ApiResult, proposal_error};

pub async fn view_proposal(
    State(state): State<AppState>,
    Path(link_id): Path<String>,
) -> ApiResult<PublicProposalView> {
    let (link, proposal) = state
        .lifecycle
        .resolve_link(&link_id)
        .await
        .map_err(proposal_error)?;
    link.ensure_active(Utc::now()).map_err(proposal_error)?;

    Ok(Json(PublicProposalView::new(
        &link.id,
        link.status,
        link.expires_at,
        proposal,
    )))
}

pub async fn accept_proposal(
    state: State<AppState>,
    link_id: Path<String>,
) -> ApiResult<PublicProposalView> {
    decide(state, link_id, true).await
}

pub async fn decline_proposal(
    state: State<AppState>,
    link_id: Path<String>,
) -> ApiResult<PublicProposalView> {
    decide(state, link_id, false).await
}

async fn decide(
    State(state): State<AppState>,
    Path(link_id): Path<String>,
    accept: bool,
) -> ApiResult<PublicProposalView> {
    let now = Utc::now();
    let (link, _) = state
        .lifecycle
        .resolve_link(&link_id)
        .await
        .map_err(proposal_error)?;
    link.ensure_active(now).map_err(proposal_error)?;

    let proposal = state
        .lifecycle
        .respond_via_link(&link, accept, now)
        .await
        .map_err(proposal_error)?;
    let link_status = if accept {
        LinkStatus::Accepted
    } else {
        LinkStatus::Declined
    };

    Ok(Json(PublicProposalView::new(
        &link.id,
        link_status,
        link.expires_at,
        proposal,
    )))
}
