use std::{net::SocketAddr, sync::Arc};

use anyhow::Result;
use hubster_core::{
    LifecycleSettings, PaymentGateway, PaymentReconciler, ProposalLifecycle, ProposalLinkStore,
    ProposalNotifier, ProposalStore, ReceivableLedger, ReceivableStore,
};
use hubster_gateway::{AppState, build_router};
use hubster_platform::{
    LogNotifier, MercadoPagoClient, PgLinkStore, PgProposalStore, PgReceivableStore, RedisBus,
    ServiceConfig, connect_database, ensure_schema,
};
use hubster_store::{InMemoryLinkStore, InMemoryProposalStore, InMemoryReceivableStore};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "hubster_gateway=info,hubster_core=info,tower_http=info".to_string()),
        )
        .init();

    let config = ServiceConfig::from_env("0.0.0.0:8080")?;

    let (proposals, links, receivables): (
        Arc<dyn ProposalStore>,
        Arc<dyn ProposalLinkStore>,
        Arc<dyn ReceivableStore>,
    ) = match &config.database_url {
        Some(database_url) => {
            let pool = connect_database(database_url).await?;
            ensure_schema(&pool).await?;
            (
                Arc::new(PgProposalStore::new(pool.clone())),
                Arc::new(PgLinkStore::new(pool.clone())),
                Arc::new(PgReceivableStore::new(pool)),
            )
        }
        None => {
            warn!("DATABASE_URL not set; proposals are kept in memory");
            (
                Arc::new(InMemoryProposalStore::default()),
                Arc::new(InMemoryLinkStore::default()),
                Arc::new(InMemoryReceivableStore::default()),
            )
        }
    };

    let notifier: Arc<dyn ProposalNotifier> = match &config.redis_url {
        Some(redis_url) => Arc::new(RedisBus::connect(redis_url)?),
        None => {
            warn!("REDIS_URL not set; sent proposals are only logged");
            Arc::new(LogNotifier)
        }
    };

    let gateway: Arc<dyn PaymentGateway> = Arc::new(MercadoPagoClient::new(&config.payment)?);
    let settings = LifecycleSettings::new(&config.app_url, &config.payment.currency);

    let state = AppState {
        lifecycle: Arc::new(ProposalLifecycle::new(
            proposals.clone(),
            links.clone(),
            gateway.clone(),
            notifier,
            settings,
        )),
        reconciler: Arc::new(PaymentReconciler::new(proposals.clone(), links, gateway)),
        receivables: Arc::new(ReceivableLedger::new(receivables, proposals)),
        public_key: config.payment.public_key.clone(),
    };
    let router = build_router(state);

    let addr: SocketAddr = config.http_addr.parse()?;
    info!("gateway listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
