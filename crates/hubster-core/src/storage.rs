use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::warn;

use crate::error::{ProposalError, StoreError};
use crate::models::{LinkStatus, Proposal, ProposalLink, ProposalPatch};
use crate::receivables::{Receivable, ReceivablePatch};

/// Attempts per read-modify-write before a version conflict is surfaced.
pub const MAX_UPDATE_ATTEMPTS: usize = 3;

#[async_trait]
pub trait ProposalStore: Send + Sync {
    async fn insert(&self, proposal: Proposal) -> Result<Proposal, StoreError>;
    async fn get(&self, id: &str) -> Result<Option<Proposal>, StoreError>;
    /// Newest first.
    async fn list_by_owner(&self, user_id: &str) -> Result<Vec<Proposal>, StoreError>;
    /// Applies `patch` only if the stored version equals `expected_version`; bumps the version.
    async fn update(
        &self,
        id: &str,
        expected_version: i64,
        patch: ProposalPatch,
    ) -> Result<Proposal, StoreError>;
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait ProposalLinkStore: Send + Sync {
    async fn insert(&self, link: ProposalLink) -> Result<ProposalLink, StoreError>;
    async fn get(&self, id: &str) -> Result<Option<ProposalLink>, StoreError>;
    async fn set_status(
        &self,
        id: &str,
        status: LinkStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
    /// Marks the link `paid` and keeps the gateway payment it was paid with.
    async fn record_payment(
        &self,
        id: &str,
        payment_id: &str,
        payment_status: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait ReceivableStore: Send + Sync {
    async fn insert(&self, receivable: Receivable) -> Result<Receivable, StoreError>;
    async fn get(&self, id: &str) -> Result<Option<Receivable>, StoreError>;
    /// Earliest due date first.
    async fn list_by_owner(&self, user_id: &str) -> Result<Vec<Receivable>, StoreError>;
    async fn update(&self, id: &str, patch: ReceivablePatch) -> Result<Receivable, StoreError>;
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;
}

pub async fn load_proposal(store: &dyn ProposalStore, id: &str) -> Result<Proposal, ProposalError> {
    store
        .get(id)
        .await?
        .ok_or_else(|| ProposalError::proposal_not_found(id))
}

/// Optimistic read-modify-write. `build` sees the freshly read record and returns the
/// patch to apply, or `None` to leave the record as it is.
pub async fn update_with_retry<F>(
    store: &dyn ProposalStore,
    id: &str,
    mut build: F,
) -> Result<Proposal, ProposalError>
where
    F: FnMut(&Proposal) -> Result<Option<ProposalPatch>, ProposalError> + Send,
{
    for attempt in 1..=MAX_UPDATE_ATTEMPTS {
        let current = load_proposal(store, id).await?;
        let Some(patch) = build(&current)? else {
            return Ok(current);
        };

        match store.update(id, current.version, patch).await {
            Ok(updated) => return Ok(updated),
            Err(StoreError::VersionConflict {
                expected, actual, ..
            }) => {
                warn!(
                    proposal_id = id,
                    attempt, expected, actual, "stale proposal version, re-reading"
                );
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(ProposalError::Conflict(id.to_string()))
}
