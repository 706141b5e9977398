use std::{fmt, str::FromStr};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ProposalError;
use crate::status::ProposalStatus;

/// Record ids are hyphen-free so that `"<proposalId>-<linkId>"` stays unambiguous.
pub fn new_record_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ProposalCategory {
    #[serde(rename = "Sites")]
    Sites,
    #[serde(rename = "Configuração e Manutenção")]
    SetupAndMaintenance,
    #[serde(rename = "Infraestrutura")]
    Infrastructure,
}

impl ProposalCategory {
    pub const ALL: [ProposalCategory; 3] = [
        ProposalCategory::Sites,
        ProposalCategory::SetupAndMaintenance,
        ProposalCategory::Infrastructure,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalCategory::Sites => "Sites",
            ProposalCategory::SetupAndMaintenance => "Configuração e Manutenção",
            ProposalCategory::Infrastructure => "Infraestrutura",
        }
    }

    pub fn subtypes(&self) -> &'static [ProposalType] {
        match self {
            ProposalCategory::Sites => &[
                ProposalType::LandingPage,
                ProposalType::Ecommerce,
                ProposalType::WebSystem,
            ],
            ProposalCategory::SetupAndMaintenance => &[
                ProposalType::Desktop,
                ProposalType::Notebook,
                ProposalType::Printer,
            ],
            ProposalCategory::Infrastructure => &[
                ProposalType::NetworkEquipmentSetup,
                ProposalType::CableRouting,
            ],
        }
    }

    pub fn allows(&self, proposal_type: ProposalType) -> bool {
        self.subtypes().contains(&proposal_type)
    }
}

impl fmt::Display for ProposalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProposalCategory {
    type Err = ProposalError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == trimmed)
            .ok_or_else(|| ProposalError::Validation(format!("unknown category '{trimmed}'")))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ProposalType {
    #[serde(rename = "Landing Page")]
    LandingPage,
    #[serde(rename = "Ecommerce")]
    Ecommerce,
    #[serde(rename = "Sistema Web")]
    WebSystem,
    #[serde(rename = "Computador")]
    Desktop,
    #[serde(rename = "Notebook")]
    Notebook,
    #[serde(rename = "Impressora")]
    Printer,
    #[serde(rename = "Configuração de equipamentos de rede")]
    NetworkEquipmentSetup,
    #[serde(rename = "Passagem de Cabos")]
    CableRouting,
}

impl ProposalType {
    pub const ALL: [ProposalType; 8] = [
        ProposalType::LandingPage,
        ProposalType::Ecommerce,
        ProposalType::WebSystem,
        ProposalType::Desktop,
        ProposalType::Notebook,
        ProposalType::Printer,
        ProposalType::NetworkEquipmentSetup,
        ProposalType::CableRouting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalType::LandingPage => "Landing Page",
            ProposalType::Ecommerce => "Ecommerce",
            ProposalType::WebSystem => "Sistema Web",
            ProposalType::Desktop => "Computador",
            ProposalType::Notebook => "Notebook",
            ProposalType::Printer => "Impressora",
            ProposalType::NetworkEquipmentSetup => "Configuração de equipamentos de rede",
            ProposalType::CableRouting => "Passagem de Cabos",
        }
    }
}

impl fmt::Display for ProposalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProposalType {
    type Err = ProposalError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|proposal_type| proposal_type.as_str() == trimmed)
            .ok_or_else(|| ProposalError::Validation(format!("unknown proposal type '{trimmed}'")))
    }
}

/// Gateway-side payment attributes, present once a payment attempt was reported.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub payment_id: String,
    pub payment_status: String,
    pub payment_status_detail: Option<String>,
    pub payment_date: DateTime<Utc>,
    pub payment_updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: String,
    pub client: String,
    pub phone: String,
    pub value: Decimal,
    pub category: ProposalCategory,
    #[serde(rename = "type")]
    pub proposal_type: ProposalType,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub status: ProposalStatus,
    pub user_id: String,
    pub link_id: Option<String>,
    pub link_expires_at: Option<DateTime<Utc>>,
    pub payment: Option<PaymentRecord>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for a new proposal. Status is always `pending` on creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProposal {
    pub client: String,
    #[serde(default)]
    pub phone: String,
    pub value: Decimal,
    pub category: ProposalCategory,
    #[serde(rename = "type")]
    pub proposal_type: ProposalType,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub user_id: String,
}

impl NewProposal {
    pub fn validate(&self) -> Result<(), ProposalError> {
        if self.client.trim().is_empty() {
            return Err(ProposalError::Validation("client is required".to_string()));
        }
        if self.user_id.trim().is_empty() {
            return Err(ProposalError::Validation("userId is required".to_string()));
        }
        validate_value(self.value)?;
        validate_catalog(self.category, self.proposal_type)
    }

    pub fn into_proposal(self, id: String, now: DateTime<Utc>) -> Proposal {
        Proposal {
            id,
            client: self.client.trim().to_string(),
            phone: self.phone.trim().to_string(),
            value: self.value,
            category: self.category,
            proposal_type: self.proposal_type,
            description: self
                .description
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty()),
            date: self.date,
            status: ProposalStatus::Pending,
            user_id: self.user_id.trim().to_string(),
            link_id: None,
            link_expires_at: None,
            payment: None,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update. `None` leaves the stored field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProposalPatch {
    pub client: Option<String>,
    pub phone: Option<String>,
    pub value: Option<Decimal>,
    pub category: Option<ProposalCategory>,
    pub proposal_type: Option<ProposalType>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    pub date: Option<NaiveDate>,
    pub status: Option<ProposalStatus>,
    pub link_id: Option<String>,
    pub link_expires_at: Option<DateTime<Utc>>,
    pub payment: Option<PaymentRecord>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProposalPatch {
    pub fn is_empty(&self) -> bool {
        *self == ProposalPatch::default()
    }

    /// Applies the patch in place. Stores call this so every backend merges identically.
    pub fn apply_to(&self, proposal: &mut Proposal) {
        if let Some(client) = &self.client {
            proposal.client = client.clone();
        }
        if let Some(phone) = &self.phone {
            proposal.phone = phone.clone();
        }
        if let Some(value) = self.value {
            proposal.value = value;
        }
        if let Some(category) = self.category {
            proposal.category = category;
        }
        if let Some(proposal_type) = self.proposal_type {
            proposal.proposal_type = proposal_type;
        }
        if let Some(description) = &self.description {
            proposal.description = description.clone();
        }
        if let Some(date) = self.date {
            proposal.date = date;
        }
        if let Some(status) = self.status {
            proposal.status = status;
        }
        if let Some(link_id) = &self.link_id {
            proposal.link_id = Some(link_id.clone());
        }
        if let Some(expires_at) = self.link_expires_at {
            proposal.link_expires_at = Some(expires_at);
        }
        if let Some(payment) = &self.payment {
            proposal.payment = Some(payment.clone());
        }
        if let Some(updated_at) = self.updated_at {
            proposal.updated_at = updated_at;
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    Pending,
    Accepted,
    Declined,
    Paid,
}

impl LinkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStatus::Pending => "pending",
            LinkStatus::Accepted => "accepted",
            LinkStatus::Declined => "declined",
            LinkStatus::Paid => "paid",
        }
    }
}

impl FromStr for LinkStatus {
    type Err = ProposalError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "pending" => Ok(LinkStatus::Pending),
            "accepted" => Ok(LinkStatus::Accepted),
            "declined" => Ok(LinkStatus::Declined),
            "paid" => Ok(LinkStatus::Paid),
            other => Err(ProposalError::Validation(format!(
                "unknown link status '{other}'"
            ))),
        }
    }
}

/// Client-facing link. Expiry is exposed here and enforced by the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProposalLink {
    pub id: String,
    pub proposal_id: String,
    pub status: LinkStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Set once the payment made through this link is approved.
    pub payment_id: Option<String>,
    pub payment_status: Option<String>,
}

impl ProposalLink {
    pub fn issue(proposal_id: &str, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            id: new_record_id(),
            proposal_id: proposal_id.to_string(),
            status: LinkStatus::Pending,
            created_at: now,
            updated_at: now,
            expires_at: now + ttl,
            payment_id: None,
            payment_status: None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn ensure_active(&self, now: DateTime<Utc>) -> Result<(), ProposalError> {
        if self.is_expired(now) {
            return Err(ProposalError::LinkExpired {
                link_id: self.id.clone(),
                expired_at: self.expires_at,
            });
        }
        Ok(())
    }

    pub fn public_url(&self, base_url: &str) -> String {
        format!("{}/proposta/{}", base_url.trim_end_matches('/'), self.id)
    }
}

pub fn validate_value(value: Decimal) -> Result<(), ProposalError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ProposalError::Validation(
            "value must not be negative".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_catalog(
    category: ProposalCategory,
    proposal_type: ProposalType,
) -> Result<(), ProposalError> {
    if !category.allows(proposal_type) {
        return Err(ProposalError::Validation(format!(
            "type '{proposal_type}' does not belong to category '{category}'"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> NewProposal {
        NewProposal {
            client: "  Padaria Central ".to_string(),
            phone: "(11) 98888-7777".to_string(),
            value: dec!(1500.00),
            category: ProposalCategory::Sites,
            proposal_type: ProposalType::Ecommerce,
            description: Some("   ".to_string()),
            date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            user_id: "owner-1".to_string(),
        }
    }

    #[test]
    fn catalog_membership_follows_category() {
        assert!(ProposalCategory::Sites.allows(ProposalType::Ecommerce));
        assert!(ProposalCategory::Infrastructure.allows(ProposalType::CableRouting));
        assert!(!ProposalCategory::Sites.allows(ProposalType::Printer));
        assert!(validate_catalog(ProposalCategory::SetupAndMaintenance, ProposalType::LandingPage).is_err());
    }

    #[test]
    fn labels_round_trip_through_from_str() {
        for category in ProposalCategory::ALL {
            assert_eq!(category.as_str().parse::<ProposalCategory>().unwrap(), category);
        }
        for proposal_type in ProposalType::ALL {
            assert_eq!(proposal_type.as_str().parse::<ProposalType>().unwrap(), proposal_type);
        }
        assert!("Hardware".parse::<ProposalCategory>().is_err());
    }

    #[test]
    fn new_proposal_starts_pending_and_trims_input() {
        let now = Utc::now();
        let draft = sample();
        draft.validate().unwrap();
        let proposal = draft.into_proposal("abc".to_string(), now);

        assert_eq!(proposal.status, ProposalStatus::Pending);
        assert_eq!(proposal.client, "Padaria Central");
        assert_eq!(proposal.description, None);
        assert_eq!(proposal.version, 1);
        assert!(proposal.payment.is_none());
    }

    #[test]
    fn new_proposal_rejects_negative_value_and_foreign_type() {
        let mut draft = sample();
        draft.value = dec!(-1);
        assert!(matches!(draft.validate(), Err(ProposalError::Validation(_))));

        let mut draft = sample();
        draft.proposal_type = ProposalType::Notebook;
        assert!(matches!(draft.validate(), Err(ProposalError::Validation(_))));
    }

    #[test]
    fn serializes_with_original_labels() {
        let proposal = sample().into_proposal(new_record_id(), Utc::now());
        let json = serde_json::to_value(&proposal).unwrap();
        assert_eq!(json["category"], "Sites");
        assert_eq!(json["type"], "Ecommerce");
        assert_eq!(json["status"], "pending");
        assert!(!proposal.id.contains('-'));
    }

    #[test]
    fn patch_leaves_unset_fields_alone() {
        let mut proposal = sample().into_proposal("p1".to_string(), Utc::now());
        let patch = ProposalPatch {
            status: Some(ProposalStatus::WaitingClient),
            ..ProposalPatch::default()
        };
        patch.apply_to(&mut proposal);

        assert_eq!(proposal.status, ProposalStatus::WaitingClient);
        assert_eq!(proposal.client, "Padaria Central");
        assert_eq!(proposal.value, dec!(1500.00));
    }

    #[test]
    fn link_expiry_is_inclusive_of_deadline() {
        let now = Utc::now();
        let link = ProposalLink {
            id: "l1".to_string(),
            ..ProposalLink::issue("p1", now, Duration::days(7))
        };

        assert!(link.ensure_active(now + Duration::days(6)).is_ok());
        assert!(matches!(
            link.ensure_active(now + Duration::days(7)),
            Err(ProposalError::LinkExpired { .. })
        ));
        assert_eq!(link.public_url("https://app.example/"), "https://app.example/proposta/l1");
    }
}
