use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use hubster_core::{
    LifecycleSettings, NewProposal, PaymentReconciler, Proposal, ProposalCategory,
    ProposalLifecycle, ProposalStore, ProposalType,
};
use hubster_store::{InMemoryGateway, InMemoryLinkStore, InMemoryProposalStore, RecordingNotifier};
use rust_decimal_macros::dec;

pub struct Harness {
    pub proposals: Arc<InMemoryProposalStore>,
    pub links: Arc<InMemoryLinkStore>,
    pub gateway: Arc<InMemoryGateway>,
    pub notifier: Arc<RecordingNotifier>,
    pub lifecycle: ProposalLifecycle,
    pub reconciler: PaymentReconciler,
}

#[allow(dead_code)]
pub fn harness() -> Harness {
    harness_with_notifier(RecordingNotifier::default())
}

#[allow(dead_code)]
pub fn harness_with_notifier(notifier: RecordingNotifier) -> Harness {
    let proposals = Arc::new(InMemoryProposalStore::default());
    let links = Arc::new(InMemoryLinkStore::default());
    let gateway = Arc::new(InMemoryGateway::default());
    let notifier = Arc::new(notifier);

    let lifecycle = ProposalLifecycle::new(
        proposals.clone(),
        links.clone(),
        gateway.clone(),
        notifier.clone(),
        LifecycleSettings::new("https://hubster.test/", "brl"),
    );
    let reconciler = PaymentReconciler::new(proposals.clone(), links.clone(), gateway.clone());

    Harness {
        proposals,
        links,
        gateway,
        notifier,
        lifecycle,
        reconciler,
    }
}

#[allow(dead_code)]
pub fn site_draft() -> NewProposal {
    NewProposal {
        client: "Studio Aurora".to_string(),
        phone: "(11) 91234-5678".to_string(),
        value: dec!(2400.00),
        category: ProposalCategory::Sites,
        proposal_type: ProposalType::Ecommerce,
        description: Some("Loja virtual com 30 produtos".to_string()),
        date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
        user_id: "owner-1".to_string(),
    }
}

/// Inserts a proposal with a fixed id, bypassing the lifecycle.
#[allow(dead_code)]
pub async fn seed(harness: &Harness, id: &str, status: hubster_core::ProposalStatus) -> Proposal {
    let mut proposal = site_draft().into_proposal(id.to_string(), Utc::now());
    proposal.status = status;
    harness.proposals.insert(proposal).await.unwrap()
}
