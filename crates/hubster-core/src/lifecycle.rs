use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ProposalError;
use crate::events::{ProposalNotifier, ProposalSentEvent};
use crate::gateway::{BackUrls, PaymentGateway, Preference, PreferenceRequest};
use crate::models::{
    LinkStatus, NewProposal, Proposal, ProposalCategory, ProposalLink, ProposalPatch,
    ProposalType, new_record_id, validate_catalog, validate_value,
};
use crate::reference::ProposalRef;
use crate::status::{LifecycleEvent, transition};
use crate::storage::{ProposalLinkStore, ProposalStore, load_proposal, update_with_retry};

pub const LINK_TTL_DAYS: i64 = 7;
const DEFAULT_ITEM_DESCRIPTION: &str = "Sem descrição";

#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    pub app_url: String,
    pub currency: String,
    pub link_ttl: Duration,
}

impl LifecycleSettings {
    pub fn new(app_url: &str, currency: &str) -> Self {
        Self {
            app_url: app_url.trim_end_matches('/').to_string(),
            currency: currency.trim().to_ascii_uppercase(),
            link_ttl: Duration::days(LINK_TTL_DAYS),
        }
    }

    pub fn notification_url(&self) -> String {
        format!("{}/api/webhooks/mercadopago", self.app_url)
    }

    fn back_urls(&self, proposal_id: &str) -> BackUrls {
        let base = format!("{}/proposta/{}", self.app_url, proposal_id);
        BackUrls {
            success: format!("{base}/success"),
            failure: format!("{base}/failure"),
            pending: format!("{base}/pending"),
        }
    }
}

/// Operator edit of the non-status fields.
#[derive(Debug, Clone, Default)]
pub struct ProposalEdit {
    pub client: Option<String>,
    pub phone: Option<String>,
    pub value: Option<Decimal>,
    pub category: Option<ProposalCategory>,
    pub proposal_type: Option<ProposalType>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct SendOutcome {
    pub proposal: Proposal,
    pub link: ProposalLink,
    pub link_url: String,
    pub notified: bool,
}

#[derive(Debug, Clone)]
pub struct PaymentInitiation {
    pub proposal_id: String,
    pub title: String,
    pub price: Decimal,
    pub description: Option<String>,
    pub link_id: Option<String>,
}

pub struct ProposalLifecycle {
    proposals: Arc<dyn ProposalStore>,
    links: Arc<dyn ProposalLinkStore>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn ProposalNotifier>,
    settings: LifecycleSettings,
}

impl ProposalLifecycle {
    pub fn new(
        proposals: Arc<dyn ProposalStore>,
        links: Arc<dyn ProposalLinkStore>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn ProposalNotifier>,
        settings: LifecycleSettings,
    ) -> Self {
        Self {
            proposals,
            links,
            gateway,
            notifier,
            settings,
        }
    }

    pub fn settings(&self) -> &LifecycleSettings {
        &self.settings
    }

    pub async fn create(
        &self,
        draft: NewProposal,
        now: DateTime<Utc>,
    ) -> Result<Proposal, ProposalError> {
        draft.validate()?;
        let proposal = draft.into_proposal(new_record_id(), now);
        let stored = self.proposals.insert(proposal).await?;
        info!(proposal_id = %stored.id, user_id = %stored.user_id, "proposal created");
        Ok(stored)
    }

    pub async fn get(&self, id: &str) -> Result<Proposal, ProposalError> {
        load_proposal(self.proposals.as_ref(), id).await
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<Proposal>, ProposalError> {
        if user_id.trim().is_empty() {
            return Err(ProposalError::Validation("userId is required".to_string()));
        }
        Ok(self.proposals.list_by_owner(user_id.trim()).await?)
    }

    pub async fn edit(
        &self,
        id: &str,
        edit: ProposalEdit,
        now: DateTime<Utc>,
    ) -> Result<Proposal, ProposalError> {
        if let Some(client) = &edit.client {
            if client.trim().is_empty() {
                return Err(ProposalError::Validation("client must not be empty".to_string()));
            }
        }
        if let Some(value) = edit.value {
            validate_value(value)?;
        }

        update_with_retry(self.proposals.as_ref(), id, |current| {
            let category = edit.category.unwrap_or(current.category);
            let proposal_type = edit.proposal_type.unwrap_or(current.proposal_type);
            validate_catalog(category, proposal_type)?;

            let patch = ProposalPatch {
                client: edit.client.as_deref().map(str::trim).map(str::to_string),
                phone: edit.phone.as_deref().map(str::trim).map(str::to_string),
                value: edit.value,
                category: edit.category,
                proposal_type: edit.proposal_type,
                description: edit.description.as_deref().map(|text| {
                    Some(text.trim())
                        .filter(|text| !text.is_empty())
                        .map(str::to_string)
                }),
                date: edit.date,
                updated_at: Some(now),
                ..ProposalPatch::default()
            };
            Ok(Some(patch))
        })
        .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ProposalError> {
        if !self.proposals.delete(id).await? {
            return Err(ProposalError::proposal_not_found(id));
        }
        info!(proposal_id = id, "proposal deleted");
        Ok(())
    }

    /// Moves the proposal to `waiting_client`, issues a fresh link and triggers the
    /// outbound notification. A failed notification leaves the record sent and linked.
    pub async fn send(&self, id: &str, now: DateTime<Utc>) -> Result<SendOutcome, ProposalError> {
        let current = self.get(id).await?;
        transition(current.status, LifecycleEvent::Send)?;

        let link = self
            .links
            .insert(ProposalLink::issue(&current.id, now, self.settings.link_ttl))
            .await?;

        let updated = update_with_retry(self.proposals.as_ref(), id, |fresh| {
            let status = transition(fresh.status, LifecycleEvent::Send)?;
            Ok(Some(ProposalPatch {
                status: Some(status),
                link_id: Some(link.id.clone()),
                link_expires_at: Some(link.expires_at),
                updated_at: Some(now),
                ..ProposalPatch::default()
            }))
        })
        .await;
        let proposal = match updated {
            Ok(proposal) => proposal,
            Err(err) => {
                self.discard_link(&link.id).await;
                return Err(err);
            }
        };

        let link_url = link.public_url(&self.settings.app_url);
        let event = ProposalSentEvent {
            event_id: Uuid::new_v4(),
            proposal_id: proposal.id.clone(),
            link_id: link.id.clone(),
            client: proposal.client.clone(),
            phone: proposal.phone.clone(),
            link_url: link_url.clone(),
            expires_at: link.expires_at,
            occurred_at: now,
        };

        let notified = match self.notifier.proposal_sent(&event).await {
            Ok(()) => true,
            Err(err) => {
                warn!(proposal_id = %proposal.id, "proposal sent but notification failed: {err:#}");
                false
            }
        };

        info!(proposal_id = %proposal.id, link_id = %link.id, notified, "proposal sent to client");

        Ok(SendOutcome {
            proposal,
            link,
            link_url,
            notified,
        })
    }

    /// Records the client's decision as reported by the operator.
    pub async fn respond(
        &self,
        id: &str,
        accept: bool,
        now: DateTime<Utc>,
    ) -> Result<Proposal, ProposalError> {
        self.record_decision(id, accept, None, now).await
    }

    async fn record_decision(
        &self,
        id: &str,
        accept: bool,
        via_link: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Proposal, ProposalError> {
        let event = if accept {
            LifecycleEvent::ClientAccept
        } else {
            LifecycleEvent::ClientDecline
        };

        let proposal = update_with_retry(self.proposals.as_ref(), id, |fresh| {
            if let Some(link_id) = via_link {
                if fresh.link_id.as_deref() != Some(link_id) {
                    return Err(ProposalError::LinkSuperseded {
                        link_id: link_id.to_string(),
                    });
                }
            }
            let status = transition(fresh.status, event)?;
            Ok(Some(ProposalPatch {
                status: Some(status),
                updated_at: Some(now),
                ..ProposalPatch::default()
            }))
        })
        .await?;

        info!(proposal_id = id, status = %proposal.status, "client decision recorded");
        Ok(proposal)
    }

    async fn discard_link(&self, link_id: &str) {
        match self.links.delete(link_id).await {
            Ok(_) => info!(link_id, "unused link discarded"),
            Err(err) => warn!(link_id, "failed to discard unused link: {err}"),
        }
    }

    /// Looks up a link and the proposal behind it. Expiry is left to the caller.
    pub async fn resolve_link(
        &self,
        link_id: &str,
    ) -> Result<(ProposalLink, Proposal), ProposalError> {
        let link = self
            .links
            .get(link_id)
            .await?
            .ok_or_else(|| ProposalError::link_not_found(link_id))?;
        let proposal = self.get(&link.proposal_id).await?;
        Ok((link, proposal))
    }

    /// Client decision through a public link; the link status mirrors the proposal.
    /// Only the link most recently sent for the proposal is honoured.
    pub async fn respond_via_link(
        &self,
        link: &ProposalLink,
        accept: bool,
        now: DateTime<Utc>,
    ) -> Result<Proposal, ProposalError> {
        let proposal = self
            .record_decision(&link.proposal_id, accept, Some(&link.id), now)
            .await?;
        let link_status = if accept {
            LinkStatus::Accepted
        } else {
            LinkStatus::Declined
        };
        self.links.set_status(&link.id, link_status, now).await?;
        Ok(proposal)
    }

    /// Creates a gateway payment request. The proposal status does not change.
    pub async fn initiate_payment(
        &self,
        request: PaymentInitiation,
    ) -> Result<Preference, ProposalError> {
        let title = request.title.trim();
        if title.is_empty() {
            return Err(ProposalError::Validation("title is required".to_string()));
        }
        if request.price <= Decimal::ZERO {
            return Err(ProposalError::Validation("price must be positive".to_string()));
        }

        let proposal = self.get(&request.proposal_id).await?;
        transition(proposal.status, LifecycleEvent::InitiatePayment)?;

        let reference = match request.link_id.as_deref().map(str::trim) {
            Some(link_id) if !link_id.is_empty() => {
                let link = self
                    .links
                    .get(link_id)
                    .await?
                    .ok_or_else(|| ProposalError::link_not_found(link_id))?;
                if link.proposal_id != proposal.id {
                    return Err(ProposalError::Validation(format!(
                        "link '{link_id}' does not belong to proposal '{}'",
                        proposal.id
                    )));
                }
                ProposalRef::Linked {
                    proposal_id: proposal.id.clone(),
                    link_id: link.id,
                }
            }
            _ => ProposalRef::Plain(proposal.id.clone()),
        };

        let description = request
            .description
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .unwrap_or(DEFAULT_ITEM_DESCRIPTION)
            .to_string();

        let preference = self
            .gateway
            .create_preference(PreferenceRequest {
                item_id: proposal.id.clone(),
                title: title.to_string(),
                description,
                unit_price: request.price,
                quantity: 1,
                currency: self.settings.currency.clone(),
                back_urls: self.settings.back_urls(&proposal.id),
                external_reference: reference.external_reference(),
                notification_url: self.settings.notification_url(),
            })
            .await
            .map_err(|err| ProposalError::GatewayCreate(err.to_string()))?;

        info!(
            proposal_id = %proposal.id,
            preference_id = %preference.preference_id,
            "payment preference created"
        );
        Ok(preference)
    }
}
