use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const PROPOSAL_SENT_CHANNEL: &str = "proposals.sent";

/// Emitted when a proposal is dispatched to its client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProposalSentEvent {
    pub event_id: Uuid,
    pub proposal_id: String,
    pub link_id: String,
    pub client: String,
    pub phone: String,
    pub link_url: String,
    pub expires_at: DateTime<Utc>,
    pub occurred_at: DateTime<Utc>,
}

#[async_trait]
pub trait ProposalNotifier: Send + Sync {
    async fn proposal_sent(&self, event: &ProposalSentEvent) -> anyhow::Result<()>;
}
