use std::sync::Arc;

use axum::{
    Router,
    routing::{get, patch, post},
};
use hubster_core::{PaymentReconciler, ProposalLifecycle, ReceivableLedger};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod error;
pub mod handlers {
    pub mod finance;
    pub mod payments;
    pub mod proposals;
    pub mod public;
    pub mod receivables;
}

use handlers::{finance, payments, proposals, public, receivables};

#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Arc<ProposalLifecycle>,
    pub reconciler: Arc<PaymentReconciler>,
    pub receivables: Arc<ReceivableLedger>,
    pub public_key: Option<String>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(
            "/proposals",
            post(proposals::create_proposal).get(proposals::list_proposals),
        )
        .route(
            "/proposals/{id}",
            get(proposals::get_proposal)
                .patch(proposals::update_proposal)
                .delete(proposals::delete_proposal),
        )
        .route("/proposals/{id}/send", post(proposals::send_proposal))
        .route("/proposals/{id}/respond", post(proposals::respond_proposal))
        .route("/public/proposals/{link_id}", get(public::view_proposal))
        .route(
            "/public/proposals/{link_id}/accept",
            post(public::accept_proposal),
        )
        .route(
            "/public/proposals/{link_id}/decline",
            post(public::decline_proposal),
        )
        .route("/api/create-payment", post(payments::create_payment))
        .route("/api/payment-config", get(payments::payment_config))
        .route("/api/webhooks/mercadopago", post(payments::payment_webhook))
        .route("/finance/monthly", get(finance::monthly))
        .route("/finance/metrics", get(finance::metrics))
        .route(
            "/finance/receivables",
            get(receivables::list_receivables).post(receivables::create_receivable),
        )
        .route(
            "/finance/receivables/{id}",
            patch(receivables::update_receivable).delete(receivables::delete_receivable),
        )
        .route("/dashboard", get(finance::dashboard))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}
