use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hubster_core::{
    GatewayError, LinkStatus, PaymentGateway, PaymentResult, Preference, PreferenceRequest,
    Proposal, ProposalLink, ProposalLinkStore, ProposalNotifier, ProposalPatch,
    ProposalSentEvent, ProposalStore, Receivable, ReceivablePatch, ReceivableStore, StoreError,
};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryProposalStore {
    records: RwLock<HashMap<String, Proposal>>,
}

#[async_trait]
impl ProposalStore for InMemoryProposalStore {
    async fn insert(&self, proposal: Proposal) -> Result<Proposal, StoreError> {
        let mut records = self.records.write().await;
        if records.contains_key(&proposal.id) {
            return Err(StoreError::Backend(format!(
                "proposal '{}' already exists",
                proposal.id
            )));
        }
        records.insert(proposal.id.clone(), proposal.clone());
        Ok(proposal)
    }

    async fn get(&self, id: &str) -> Result<Option<Proposal>, StoreError> {
        let records = self.records.read().await;
        Ok(records.get(id).cloned())
    }

    async fn list_by_owner(&self, user_id: &str) -> Result<Vec<Proposal>, StoreError> {
        let records = self.records.read().await;
        let mut owned: Vec<Proposal> = records
            .values()
            .filter(|proposal| proposal.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(owned)
    }

    async fn update(
        &self,
        id: &str,
        expected_version: i64,
        patch: ProposalPatch,
    ) -> Result<Proposal, StoreError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if record.version != expected_version {
            return Err(StoreError::VersionConflict {
                id: id.to_string(),
                expected: expected_version,
                actual: record.version,
            });
        }

        patch.apply_to(record);
        record.version += 1;
        Ok(record.clone())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;
        Ok(records.remove(id).is_some())
    }
}

#[derive(Default)]
pub struct InMemoryLinkStore {
    links: RwLock<HashMap<String, ProposalLink>>,
}

impl InMemoryLinkStore {
    pub async fn links_for(&self, proposal_id: &str) -> Vec<ProposalLink> {
        let links = self.links.read().await;
        links
            .values()
            .filter(|link| link.proposal_id == proposal_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ProposalLinkStore for InMemoryLinkStore {
    async fn insert(&self, link: ProposalLink) -> Result<ProposalLink, StoreError> {
        let mut links = self.links.write().await;
        links.insert(link.id.clone(), link.clone());
        Ok(link)
    }

    async fn get(&self, id: &str) -> Result<Option<ProposalLink>, StoreError> {
        let links = self.links.read().await;
        Ok(links.get(id).cloned())
    }

    async fn set_status(
        &self,
        id: &str,
        status: LinkStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut links = self.links.write().await;
        let link = links
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        link.status = status;
        link.updated_at = updated_at;
        Ok(())
    }

    async fn record_payment(
        &self,
        id: &str,
        payment_id: &str,
        payment_status: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut links = self.links.write().await;
        let link = links
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        link.status = LinkStatus::Paid;
        link.payment_id = Some(payment_id.to_string());
        link.payment_status = Some(payment_status.to_string());
        link.updated_at = updated_at;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut links = self.links.write().await;
        Ok(links.remove(id).is_some())
    }
}

#[derive(Default)]
pub struct InMemoryReceivableStore {
    records: RwLock<HashMap<String, Receivable>>,
}

#[async_trait]
impl ReceivableStore for InMemoryReceivableStore {
    async fn insert(&self, receivable: Receivable) -> Result<Receivable, StoreError> {
        let mut records = self.records.write().await;
        if records.contains_key(&receivable.id) {
            return Err(StoreError::Backend(format!(
                "receivable '{}' already exists",
                receivable.id
            )));
        }
        records.insert(receivable.id.clone(), receivable.clone());
        Ok(receivable)
    }

    async fn get(&self, id: &str) -> Result<Option<Receivable>, StoreError> {
        let records = self.records.read().await;
        Ok(records.get(id).cloned())
    }

    async fn list_by_owner(&self, user_id: &str) -> Result<Vec<Receivable>, StoreError> {
        let records = self.records.read().await;
        let mut owned: Vec<Receivable> = records
            .values()
            .filter(|receivable| receivable.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|left, right| {
            left.due_date
                .cmp(&right.due_date)
                .then_with(|| left.created_at.cmp(&right.created_at))
        });
        Ok(owned)
    }

    async fn update(&self, id: &str, patch: ReceivablePatch) -> Result<Receivable, StoreError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        patch.apply_to(record);
        Ok(record.clone())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;
        Ok(records.remove(id).is_some())
    }
}

/// Gateway double: payments are seeded by the caller, preferences are recorded.
#[derive(Default)]
pub struct InMemoryGateway {
    payments: RwLock<HashMap<String, PaymentResult>>,
    preferences: RwLock<Vec<PreferenceRequest>>,
}

impl InMemoryGateway {
    pub async fn put_payment(&self, payment: PaymentResult) {
        let mut payments = self.payments.write().await;
        payments.insert(payment.payment_id.clone(), payment);
    }

    pub async fn created_preferences(&self) -> Vec<PreferenceRequest> {
        self.preferences.read().await.clone()
    }
}

#[async_trait]
impl PaymentGateway for InMemoryGateway {
    async fn create_preference(
        &self,
        request: PreferenceRequest,
    ) -> Result<Preference, GatewayError> {
        let mut preferences = self.preferences.write().await;
        preferences.push(request);
        let preference_id = format!("pref-{}", preferences.len());

        Ok(Preference {
            init_point: format!("https://checkout.invalid/{preference_id}"),
            preference_id,
        })
    }

    async fn get_payment(&self, payment_id: &str) -> Result<PaymentResult, GatewayError> {
        let payments = self.payments.read().await;
        payments
            .get(payment_id)
            .cloned()
            .ok_or_else(|| GatewayError::UnknownPayment(payment_id.to_string()))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    events: RwLock<Vec<ProposalSentEvent>>,
    failing: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            events: RwLock::default(),
            failing: true,
        }
    }

    pub async fn events(&self) -> Vec<ProposalSentEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl ProposalNotifier for RecordingNotifier {
    async fn proposal_sent(&self, event: &ProposalSentEvent) -> anyhow::Result<()> {
        if self.failing {
            anyhow::bail!("notification channel unavailable");
        }
        self.events.write().await.push(event.clone());
        Ok(())
    }
}
