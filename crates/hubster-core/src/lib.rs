pub mod error;
pub mod events;
pub mod gateway;
pub mod lifecycle;
pub mod models;
pub mod receivables;
pub mod reconcile;
pub mod reference;
pub mod status;
pub mod storage;

pub use error::{ProposalError, StoreError};
pub use events::{PROPOSAL_SENT_CHANNEL, ProposalNotifier, ProposalSentEvent};
pub use gateway::{BackUrls, GatewayError, PaymentGateway, PaymentResult, Preference, PreferenceRequest};
pub use lifecycle::{
    LINK_TTL_DAYS, LifecycleSettings, PaymentInitiation, ProposalEdit, ProposalLifecycle,
    SendOutcome,
};
pub use models::{
    LinkStatus, NewProposal, PaymentRecord, Proposal, ProposalCategory, ProposalLink,
    ProposalPatch, ProposalType, new_record_id,
};
pub use receivables::{
    NewReceivable, Receivable, ReceivableLedger, ReceivablePatch, ReceivableStatus,
};
pub use reconcile::{PaymentNotification, PaymentReconciler, ReconcileOutcome};
pub use reference::{ProposalRef, ReferenceParseError};
pub use status::{GatewayPaymentStatus, LifecycleEvent, ProposalStatus};
pub use storage::{ProposalLinkStore, ProposalStore, ReceivableStore};
