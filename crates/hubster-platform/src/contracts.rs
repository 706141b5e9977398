use chrono::{DateTime, NaiveDate, Utc};
use hubster_core::{
    LinkStatus, PaymentInitiation, Proposal, ProposalCategory, ProposalEdit, ProposalStatus,
    ProposalType, ReceivablePatch, ReceivableStatus, ReconcileOutcome,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub details: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerQuery {
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceQuery {
    pub user_id: String,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProposalRequest {
    pub client: Option<String>,
    pub phone: Option<String>,
    pub value: Option<Decimal>,
    pub category: Option<ProposalCategory>,
    #[serde(rename = "type")]
    pub proposal_type: Option<ProposalType>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
}

impl From<UpdateProposalRequest> for ProposalEdit {
    fn from(request: UpdateProposalRequest) -> Self {
        ProposalEdit {
            client: request.client,
            phone: request.phone,
            value: request.value,
            category: request.category,
            proposal_type: request.proposal_type,
            description: request.description,
            date: request.date,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReceivableRequest {
    pub client: Option<String>,
    pub value: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<ReceivableStatus>,
}

impl From<UpdateReceivableRequest> for ReceivablePatch {
    fn from(request: UpdateReceivableRequest) -> Self {
        ReceivablePatch {
            client: request.client,
            value: request.value,
            due_date: request.due_date,
            status: request.status,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RespondRequest {
    pub accept: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendProposalResponse {
    pub proposal: Proposal,
    pub link_id: String,
    pub link_url: String,
    pub expires_at: DateTime<Utc>,
    pub notified: bool,
}

/// What a client sees through a public link: no owner or payment internals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProposalView {
    pub link_id: String,
    pub link_status: LinkStatus,
    pub expires_at: DateTime<Utc>,
    pub proposal_id: String,
    pub client: String,
    pub value: Decimal,
    pub category: ProposalCategory,
    #[serde(rename = "type")]
    pub proposal_type: ProposalType,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub status: ProposalStatus,
}

impl PublicProposalView {
    pub fn new(
        link_id: &str,
        link_status: LinkStatus,
        expires_at: DateTime<Utc>,
        proposal: Proposal,
    ) -> Self {
        Self {
            link_id: link_id.to_string(),
            link_status,
            expires_at,
            proposal_id: proposal.id,
            client: proposal.client,
            value: proposal.value,
            category: proposal.category,
            proposal_type: proposal.proposal_type,
            description: proposal.description,
            date: proposal.date,
            status: proposal.status,
        }
    }
}

/// Every field is optional on the wire so that missing ones can be reported together.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub proposal_id: Option<String>,
    pub title: Option<String>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub link_id: Option<String>,
}

impl CreatePaymentRequest {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let blank = |field: &Option<String>| {
            field
                .as_deref()
                .map(|value| value.trim().is_empty())
                .unwrap_or(true)
        };

        let mut missing = Vec::new();
        if blank(&self.proposal_id) {
            missing.push("proposalId");
        }
        if blank(&self.title) {
            missing.push("title");
        }
        if self.price.is_none() {
            missing.push("price");
        }
        missing
    }

    pub fn into_initiation(self) -> Result<PaymentInitiation, Vec<&'static str>> {
        let missing = self.missing_fields();
        match (self.proposal_id, self.title, self.price) {
            (Some(proposal_id), Some(title), Some(price)) if missing.is_empty() => {
                Ok(PaymentInitiation {
                    proposal_id: proposal_id.trim().to_string(),
                    title,
                    price,
                    description: self.description,
                    link_id: self.link_id,
                })
            }
            _ => Err(missing),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfigResponse {
    pub public_key: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WebhookAck {
    pub received: bool,
    #[serde(flatten)]
    pub outcome: ReconcileOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn payment_request_reports_every_missing_field() {
        let request: CreatePaymentRequest =
            serde_json::from_str(r#"{"title":"  ","description":"x"}"#).unwrap();
        assert_eq!(request.missing_fields(), vec!["proposalId", "title", "price"]);
    }

    #[test]
    fn payment_request_accepts_numeric_price() {
        let request: CreatePaymentRequest = serde_json::from_str(
            r#"{"proposalId":"abc","title":"Site","price":1500.5,"linkId":"l1"}"#,
        )
        .unwrap();
        let initiation = request.into_initiation().unwrap();

        assert_eq!(initiation.proposal_id, "abc");
        assert_eq!(initiation.price, dec!(1500.5));
        assert_eq!(initiation.link_id.as_deref(), Some("l1"));
    }

    #[test]
    fn update_request_uses_catalog_labels() {
        let request: UpdateProposalRequest = serde_json::from_str(
            r#"{"category":"Infraestrutura","type":"Passagem de Cabos"}"#,
        )
        .unwrap();
        let edit = ProposalEdit::from(request);

        assert_eq!(edit.category, Some(ProposalCategory::Infrastructure));
        assert_eq!(edit.proposal_type, Some(ProposalType::CableRouting));
        assert!(edit.client.is_none());
    }

    #[test]
    fn receivable_update_reads_due_date_and_status() {
        let request: UpdateReceivableRequest =
            serde_json::from_str(r#"{"dueDate":"2026-12-05","status":"paid"}"#).unwrap();
        let patch = ReceivablePatch::from(request);

        assert_eq!(patch.due_date, NaiveDate::from_ymd_opt(2026, 12, 5));
        assert_eq!(patch.status, Some(ReceivableStatus::Paid));
        assert!(patch.value.is_none());

        let unknown = serde_json::from_str::<UpdateReceivableRequest>(r#"{"status":"late"}"#);
        assert!(unknown.is_err());
    }
}
