pub mod config;
pub mod contracts;
pub mod db;
pub mod mercadopago;
pub mod redis_bus;
pub mod store;

pub use config::{PaymentConfig, ServiceConfig, WorkerConfig};
pub use contracts::{
    CreatePaymentRequest, ErrorBody, FinanceQuery, OwnerQuery, PaymentConfigResponse,
    PublicProposalView, RespondRequest, SendProposalResponse, UpdateProposalRequest,
    UpdateReceivableRequest, WebhookAck,
};
pub use db::{connect_database, ensure_schema};
pub use mercadopago::MercadoPagoClient;
pub use redis_bus::{LogNotifier, RedisBus};
pub use store::{PgLinkStore, PgProposalStore, PgReceivableStore};
