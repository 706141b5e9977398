use anyhow::{Context, Result};
use chrono::Utc;
use futures_util::StreamExt;
use hubster_core::{PROPOSAL_SENT_CHANNEL, ProposalSentEvent};
use hubster_platform::{RedisBus, ServiceConfig, connect_database, ensure_schema};
use redis::Msg;
use sqlx::PgPool;
use tracing::{error, info, warn};
use uuid::Uuid;

mod whatsapp;

const CHANNEL_WHATSAPP: &str = "whatsapp";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "hubster_notifier=info".to_string()),
        )
        .init();

    let config = ServiceConfig::worker_from_env()?;
    let pool = connect_database(&config.database_url).await?;
    ensure_schema(&pool).await?;
    let redis = RedisBus::connect(&config.redis_url)?;

    let mut pubsub = redis.client().get_async_pubsub().await?;
    pubsub.subscribe(PROPOSAL_SENT_CHANNEL).await?;
    let mut messages = pubsub.on_message();

    info!("notifier subscribed to {}", PROPOSAL_SENT_CHANNEL);

    loop {
        let msg = messages
            .next()
            .await
            .with_context(|| format!("{PROPOSAL_SENT_CHANNEL} stream ended unexpectedly"))?;
        if let Err(err) = handle_message(&pool, msg).await {
            error!("failed to process message: {err:#}");
        }
    }
}

async fn handle_message(pool: &PgPool, msg: Msg) -> Result<()> {
    let payload: String = msg.get_payload()?;
    let event: ProposalSentEvent = serde_json::from_str(&payload)?;

    if event.phone.trim().is_empty() {
        warn!(proposal_id = %event.proposal_id, "proposal has no phone; nothing to deliver");
        return Ok(());
    }

    let message = whatsapp::build_message(&event)
        .with_context(|| format!("cannot build message for proposal {}", event.proposal_id))?;

    // Redelivered events hit the unique event_id and are dropped.
    let result = sqlx::query(
        r#"
        INSERT INTO outbound_messages (
            id, event_id, proposal_id, link_id, channel, recipient, body, delivery_url, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (event_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(event.event_id)
    .bind(&event.proposal_id)
    .bind(&event.link_id)
    .bind(CHANNEL_WHATSAPP)
    .bind(&message.recipient)
    .bind(&message.body)
    .bind(&message.url)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        info!(event_id = %event.event_id, "duplicate proposal notification ignored");
    } else {
        info!(
            proposal_id = %event.proposal_id,
            recipient = %message.recipient,
            "whatsapp message queued"
        );
    }
    Ok(())
}
