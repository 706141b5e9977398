mod common;

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use hubster_core::{
    NewReceivable, ProposalError, ProposalStatus, ReceivableLedger, ReceivablePatch,
    ReceivableStatus,
};
use hubster_store::InMemoryReceivableStore;
use rust_decimal_macros::dec;

use crate::common::{harness, seed};

fn due(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 11, day).unwrap()
}

fn draft(proposal_id: Option<&str>, due_date: NaiveDate) -> NewReceivable {
    NewReceivable {
        proposal_id: proposal_id.map(str::to_string),
        client: "Studio Aurora".to_string(),
        value: dec!(1200),
        due_date,
        status: None,
        user_id: "owner-1".to_string(),
    }
}

#[tokio::test]
async fn receivables_list_by_due_date() {
    let h = harness();
    seed(&h, "PROP1", ProposalStatus::Accepted).await;
    let ledger = ReceivableLedger::new(Arc::new(InMemoryReceivableStore::default()), h.proposals.clone());
    let now = Utc::now();

    let later = ledger.create(draft(Some("PROP1"), due(20)), now).await.unwrap();
    let sooner = ledger.create(draft(None, due(5)), now).await.unwrap();

    let listed = ledger.list("owner-1").await.unwrap();
    assert_eq!(
        listed.iter().map(|receivable| receivable.id.as_str()).collect::<Vec<_>>(),
        vec![sooner.id.as_str(), later.id.as_str()]
    );
    assert_eq!(later.proposal_id.as_deref(), Some("PROP1"));
    assert!(ledger.list("owner-2").await.unwrap().is_empty());
}

#[tokio::test]
async fn receivable_for_unknown_proposal_is_rejected() {
    let h = harness();
    let ledger = ReceivableLedger::new(Arc::new(InMemoryReceivableStore::default()), h.proposals.clone());

    let err = ledger
        .create(draft(Some("GHOST"), due(1)), Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, ProposalError::NotFound { entity: "proposal", .. }));
}

#[tokio::test]
async fn edit_and_delete_report_missing_receivables() {
    let h = harness();
    let ledger = ReceivableLedger::new(Arc::new(InMemoryReceivableStore::default()), h.proposals.clone());
    let created = ledger.create(draft(None, due(9)), Utc::now()).await.unwrap();

    let paid = ledger
        .edit(
            &created.id,
            ReceivablePatch {
                status: Some(ReceivableStatus::Paid),
                client: Some("  Studio Aurora Ltda ".to_string()),
                ..ReceivablePatch::default()
            },
            Utc::now(),
        )
        .await
        .unwrap();
    assert_eq!(paid.status, ReceivableStatus::Paid);
    assert_eq!(paid.client, "Studio Aurora Ltda");

    let blank = ledger
        .edit(
            &created.id,
            ReceivablePatch {
                client: Some(" ".to_string()),
                ..ReceivablePatch::default()
            },
            Utc::now(),
        )
        .await;
    assert!(matches!(blank, Err(ProposalError::Validation(_))));

    ledger.delete(&created.id).await.unwrap();
    assert!(matches!(
        ledger.delete(&created.id).await,
        Err(ProposalError::NotFound { entity: "receivable", .. })
    ));
    assert!(matches!(
        ledger
            .edit(&created.id, ReceivablePatch::default(), Utc::now())
            .await,
        Err(ProposalError::NotFound { entity: "receivable", .. })
    ));
}
