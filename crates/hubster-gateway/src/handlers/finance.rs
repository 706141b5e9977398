use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{Datelike, Utc};
use hubster_finance::{
    DashboardSummary, FinanceMetrics, MonthlyFinance, dashboard_summary, finance_metrics,
    monthly_finance,
};
use hubster_platform::{FinanceQuery, OwnerQuery};

use crate::AppState;
use crate::error::{ApiResult, proposal_error};

pub async fn monthly(
    State(state): State<AppState>,
    Query(query): Query<FinanceQuery>,
) -> ApiResult<Vec<MonthlyFinance>> {
    let year = query.year.unwrap_or_else(|| Utc::now().year());
    let proposals = state
        .lifecycle
        .list(&query.user_id)
        .await
        .map_err(proposal_error)?;
    Ok(Json(monthly_finance(&proposals, year)))
}

pub async fn metrics(
    State(state): State<AppState>,
    Query(query): Query<FinanceQuery>,
) -> ApiResult<FinanceMetrics> {
    let today = Utc::now().date_naive();
    let year = query.year.unwrap_or(today.year());
    // Past years are compared on their last month.
    let current_month0 = if year == today.year() {
        today.month0() as usize
    } else {
        11
    };

    let proposals = state
        .lifecycle
        .list(&query.user_id)
        .await
        .map_err(proposal_error)?;
    let data = monthly_finance(&proposals, year);
    Ok(Json(finance_metrics(&data, current_month0)))
}

pub async fn dashboard(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> ApiResult<DashboardSummary> {
    let proposals = state
        .lifecycle
        .list(&query.user_id)
        .await
        .map_err(proposal_error)?;
    let receivables = state
        .receivables
        .list(&query.user_id)
        .await
        .map_err(proposal_error)?;
    Ok(Json(dashboard_summary(
        &proposals,
        &receivables,
        Utc::now().date_naive(),
    )))
}
