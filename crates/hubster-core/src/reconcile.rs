use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{ProposalError, StoreError};
use crate::gateway::{PaymentGateway, PaymentResult};
use crate::models::{PaymentRecord, Proposal, ProposalPatch};
use crate::reference::ProposalRef;
use crate::status::{GatewayPaymentStatus, ProposalStatus, next_status};
use crate::storage::{ProposalLinkStore, ProposalStore, update_with_retry};

/// Webhook body as delivered. Both `{type, data}` and `{action, data}` shapes occur.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawNotification {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub action: Option<String>,
    pub data: Option<RawNotificationData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawNotificationData {
    pub id: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentNotification {
    Payment { payment_id: String },
    Other { kind: String },
}

impl PaymentNotification {
    pub fn from_json(body: &[u8]) -> Result<Self, ProposalError> {
        let raw: RawNotification = serde_json::from_slice(body)
            .map_err(|err| ProposalError::Validation(format!("invalid notification body: {err}")))?;
        Self::from_raw(raw)
    }

    pub fn from_raw(raw: RawNotification) -> Result<Self, ProposalError> {
        let kind = raw.kind.as_deref().map(str::trim).unwrap_or_default();
        let action = raw.action.as_deref().map(str::trim).unwrap_or_default();

        let is_payment = kind == "payment" || action.starts_with("payment.");
        if !is_payment {
            let kind = [kind, action]
                .into_iter()
                .find(|value| !value.is_empty())
                .unwrap_or("unknown")
                .to_string();
            return Ok(PaymentNotification::Other { kind });
        }

        let payment_id = match raw.data.and_then(|data| data.id) {
            Some(Value::String(id)) if !id.trim().is_empty() => id.trim().to_string(),
            Some(Value::Number(id)) => id.to_string(),
            _ => {
                return Err(ProposalError::Validation(
                    "payment notification without data.id".to_string(),
                ));
            }
        };

        if !is_gateway_id(&payment_id) {
            return Err(ProposalError::Validation(format!(
                "payment id '{payment_id}' has unexpected characters"
            )));
        }

        Ok(PaymentNotification::Payment { payment_id })
    }
}

/// Gateway payment ids are alphanumeric; they end up as a URL path segment.
fn is_gateway_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentDecision {
    /// Status moved (or confirmed) along the payment transitions.
    Applied(ProposalStatus),
    /// Payment attributes written, status held.
    Recorded,
    /// Same payment already recorded with the same outcome.
    Unchanged,
    /// A paid proposal is not touched by a non-approved result.
    Skipped,
}

/// Decides how a payment result lands on `current`. Pure; the caller persists the patch.
pub fn plan_payment_update(
    current: &Proposal,
    result: &PaymentResult,
    now: DateTime<Utc>,
) -> (PaymentDecision, Option<ProposalPatch>) {
    let gateway_status = GatewayPaymentStatus::parse(&result.status);

    if current.status == ProposalStatus::Paid && gateway_status != GatewayPaymentStatus::Approved {
        return (PaymentDecision::Skipped, None);
    }

    let target = gateway_status
        .lifecycle_event()
        .and_then(|event| next_status(current.status, event));
    let new_status = target.unwrap_or(current.status);

    if let Some(existing) = &current.payment {
        if existing.payment_id == result.payment_id
            && existing.payment_status == result.status
            && existing.payment_status_detail == result.status_detail
            && new_status == current.status
        {
            return (PaymentDecision::Unchanged, None);
        }
    }

    let payment_date = current
        .payment
        .as_ref()
        .filter(|existing| existing.payment_id == result.payment_id)
        .map(|existing| existing.payment_date)
        .unwrap_or(now);

    let patch = ProposalPatch {
        status: (new_status != current.status).then_some(new_status),
        payment: Some(PaymentRecord {
            payment_id: result.payment_id.clone(),
            payment_status: result.status.clone(),
            payment_status_detail: result.status_detail.clone(),
            payment_date,
            payment_updated_at: now,
        }),
        updated_at: Some(now),
        ..ProposalPatch::default()
    };

    let decision = match target {
        Some(status) => PaymentDecision::Applied(status),
        None => PaymentDecision::Recorded,
    };

    (decision, Some(patch))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ReconcileOutcome {
    Ignored {
        kind: String,
    },
    Applied {
        proposal_id: String,
        payment_id: String,
        status: ProposalStatus,
    },
    Recorded {
        proposal_id: String,
        payment_id: String,
        status: ProposalStatus,
    },
    Unchanged {
        proposal_id: String,
        payment_id: String,
    },
    Skipped {
        proposal_id: String,
        payment_id: String,
    },
}

pub struct PaymentReconciler {
    proposals: Arc<dyn ProposalStore>,
    links: Arc<dyn ProposalLinkStore>,
    gateway: Arc<dyn PaymentGateway>,
}

impl PaymentReconciler {
    pub fn new(
        proposals: Arc<dyn ProposalStore>,
        links: Arc<dyn ProposalLinkStore>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            proposals,
            links,
            gateway,
        }
    }

    pub async fn handle(
        &self,
        notification: PaymentNotification,
        now: DateTime<Utc>,
    ) -> Result<ReconcileOutcome, ProposalError> {
        let payment_id = match notification {
            PaymentNotification::Payment { payment_id } => payment_id,
            PaymentNotification::Other { kind } => {
                info!(kind = %kind, "ignoring non-payment notification");
                return Ok(ReconcileOutcome::Ignored { kind });
            }
        };

        let result = self
            .gateway
            .get_payment(&payment_id)
            .await
            .map_err(|err| ProposalError::GatewayLookup(err.to_string()))?;

        let raw_reference = result.external_reference.as_deref().ok_or_else(|| {
            ProposalError::Validation(format!("payment '{payment_id}' has no external reference"))
        })?;
        let reference = ProposalRef::parse(raw_reference)
            .map_err(|err| ProposalError::Validation(err.to_string()))?;
        let proposal_id = reference.proposal_id().to_string();

        let mut decision = PaymentDecision::Unchanged;
        let proposal = update_with_retry(self.proposals.as_ref(), &proposal_id, |current| {
            let (planned, patch) = plan_payment_update(current, &result, now);
            decision = planned;
            Ok(patch)
        })
        .await?;

        if proposal.status == ProposalStatus::Paid {
            if let Some(link_id) = reference.link_id() {
                self.mark_link_paid(link_id, &proposal_id, &result, now)
                    .await?;
            }
        }

        let payment_id = result.payment_id.clone();
        let outcome = match decision {
            PaymentDecision::Applied(status) => ReconcileOutcome::Applied {
                proposal_id,
                payment_id,
                status,
            },
            PaymentDecision::Recorded => {
                warn!(
                    proposal_id = %proposal_id,
                    status = %proposal.status,
                    gateway_status = %result.status,
                    "payment recorded without status change"
                );
                ReconcileOutcome::Recorded {
                    proposal_id,
                    payment_id,
                    status: proposal.status,
                }
            }
            PaymentDecision::Unchanged => ReconcileOutcome::Unchanged {
                proposal_id,
                payment_id,
            },
            PaymentDecision::Skipped => {
                warn!(
                    proposal_id = %proposal_id,
                    gateway_status = %result.status,
                    "paid proposal left untouched"
                );
                ReconcileOutcome::Skipped {
                    proposal_id,
                    payment_id,
                }
            }
        };

        info!(payment_id = %result.payment_id, gateway_status = %result.status, "payment notification reconciled");
        Ok(outcome)
    }

    async fn mark_link_paid(
        &self,
        link_id: &str,
        proposal_id: &str,
        result: &PaymentResult,
        now: DateTime<Utc>,
    ) -> Result<(), ProposalError> {
        let Some(link) = self.links.get(link_id).await? else {
            warn!(link_id, "payment references an unknown link");
            return Ok(());
        };
        if link.proposal_id != proposal_id {
            warn!(
                link_id,
                proposal_id,
                link_proposal_id = %link.proposal_id,
                "payment reference pairs the link with another proposal; link left untouched"
            );
            return Ok(());
        }

        match self
            .links
            .record_payment(link_id, &result.payment_id, &result.status, now)
            .await
        {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound(_)) => {
                warn!(link_id, "link removed before the payment was recorded");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}
