use anyhow::Result;
use async_trait::async_trait;
use hubster_core::{PROPOSAL_SENT_CHANNEL, ProposalNotifier, ProposalSentEvent};
use redis::{AsyncCommands, Client};
use serde::Serialize;
use tracing::info;

#[derive(Clone)]
pub struct RedisBus {
    client: Client,
}

impl RedisBus {
    pub fn connect(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url)?;
        Ok(Self { client })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub async fn publish_json<T: Serialize>(&self, channel: &str, payload: &T) -> Result<()> {
        let mut connection = self.client.get_multiplexed_async_connection().await?;
        let serialized = serde_json::to_string(payload)?;
        let _: i64 = connection.publish(channel, serialized).await?;
        Ok(())
    }
}

#[async_trait]
impl ProposalNotifier for RedisBus {
    async fn proposal_sent(&self, event: &ProposalSentEvent) -> Result<()> {
        self.publish_json(PROPOSAL_SENT_CHANNEL, event).await
    }
}

/// Used when no message bus is configured: the event only reaches the logs.
#[derive(Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl ProposalNotifier for LogNotifier {
    async fn proposal_sent(&self, event: &ProposalSentEvent) -> Result<()> {
        info!(
            proposal_id = %event.proposal_id,
            link_url = %event.link_url,
            "no message bus configured; proposal link not delivered"
        );
        Ok(())
    }
}
