use std::{fmt, str::FromStr, sync::Arc};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ProposalError, StoreError};
use crate::models::{new_record_id, validate_value};
use crate::storage::{ProposalStore, ReceivableStore, load_proposal};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReceivableStatus {
    Pending,
    Paid,
    Overdue,
}

impl ReceivableStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceivableStatus::Pending => "pending",
            ReceivableStatus::Paid => "paid",
            ReceivableStatus::Overdue => "overdue",
        }
    }
}

impl fmt::Display for ReceivableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReceivableStatus {
    type Err = ProposalError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "pending" => Ok(ReceivableStatus::Pending),
            "paid" => Ok(ReceivableStatus::Paid),
            "overdue" => Ok(ReceivableStatus::Overdue),
            other => Err(ProposalError::Validation(format!(
                "unknown receivable status '{other}'"
            ))),
        }
    }
}

/// An amount the owner expects to collect by `due_date`, optionally tied to a proposal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Receivable {
    pub id: String,
    pub proposal_id: Option<String>,
    pub client: String,
    pub value: Decimal,
    pub due_date: NaiveDate,
    pub status: ReceivableStatus,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Receivable {
    /// A pending receivable past its due date counts as overdue.
    pub fn status_on(&self, today: NaiveDate) -> ReceivableStatus {
        match self.status {
            ReceivableStatus::Pending if self.due_date < today => ReceivableStatus::Overdue,
            status => status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReceivable {
    pub proposal_id: Option<String>,
    pub client: String,
    pub value: Decimal,
    pub due_date: NaiveDate,
    pub status: Option<ReceivableStatus>,
    pub user_id: String,
}

impl NewReceivable {
    pub fn validate(&self) -> Result<(), ProposalError> {
        if self.client.trim().is_empty() {
            return Err(ProposalError::Validation("client is required".to_string()));
        }
        if self.user_id.trim().is_empty() {
            return Err(ProposalError::Validation("userId is required".to_string()));
        }
        validate_value(self.value)
    }

    pub fn into_receivable(self, id: String, now: DateTime<Utc>) -> Receivable {
        Receivable {
            id,
            proposal_id: self
                .proposal_id
                .map(|proposal_id| proposal_id.trim().to_string())
                .filter(|proposal_id| !proposal_id.is_empty()),
            client: self.client.trim().to_string(),
            value: self.value,
            due_date: self.due_date,
            status: self.status.unwrap_or(ReceivableStatus::Pending),
            user_id: self.user_id.trim().to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReceivablePatch {
    pub client: Option<String>,
    pub value: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<ReceivableStatus>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ReceivablePatch {
    pub fn apply_to(&self, receivable: &mut Receivable) {
        if let Some(client) = &self.client {
            receivable.client = client.clone();
        }
        if let Some(value) = self.value {
            receivable.value = value;
        }
        if let Some(due_date) = self.due_date {
            receivable.due_date = due_date;
        }
        if let Some(status) = self.status {
            receivable.status = status;
        }
        if let Some(updated_at) = self.updated_at {
            receivable.updated_at = updated_at;
        }
    }
}

fn receivable_error(id: &str) -> impl FnOnce(StoreError) -> ProposalError + '_ {
    move |err| match err {
        StoreError::NotFound(_) => ProposalError::receivable_not_found(id),
        other => other.into(),
    }
}

pub struct ReceivableLedger {
    receivables: Arc<dyn ReceivableStore>,
    proposals: Arc<dyn ProposalStore>,
}

impl ReceivableLedger {
    pub fn new(receivables: Arc<dyn ReceivableStore>, proposals: Arc<dyn ProposalStore>) -> Self {
        Self {
            receivables,
            proposals,
        }
    }

    pub async fn create(
        &self,
        draft: NewReceivable,
        now: DateTime<Utc>,
    ) -> Result<Receivable, ProposalError> {
        draft.validate()?;
        let receivable = draft.into_receivable(new_record_id(), now);

        if let Some(proposal_id) = &receivable.proposal_id {
            let proposal = load_proposal(self.proposals.as_ref(), proposal_id).await?;
            if proposal.user_id != receivable.user_id {
                return Err(ProposalError::Validation(format!(
                    "proposal '{proposal_id}' belongs to another owner"
                )));
            }
        }

        let stored = self.receivables.insert(receivable).await?;
        info!(receivable_id = %stored.id, due_date = %stored.due_date, "receivable created");
        Ok(stored)
    }

    /// Earliest due date first.
    pub async fn list(&self, user_id: &str) -> Result<Vec<Receivable>, ProposalError> {
        if user_id.trim().is_empty() {
            return Err(ProposalError::Validation("userId is required".to_string()));
        }
        Ok(self.receivables.list_by_owner(user_id.trim()).await?)
    }

    pub async fn edit(
        &self,
        id: &str,
        mut patch: ReceivablePatch,
        now: DateTime<Utc>,
    ) -> Result<Receivable, ProposalError> {
        if let Some(client) = patch.client.take() {
            let client = client.trim().to_string();
            if client.is_empty() {
                return Err(ProposalError::Validation("client must not be empty".to_string()));
            }
            patch.client = Some(client);
        }
        if let Some(value) = patch.value {
            validate_value(value)?;
        }
        patch.updated_at = Some(now);

        let updated = self
            .receivables
            .update(id, patch)
            .await
            .map_err(receivable_error(id))?;
        info!(receivable_id = id, status = %updated.status, "receivable updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ProposalError> {
        let removed = self
            .receivables
            .delete(id)
            .await
            .map_err(receivable_error(id))?;
        if !removed {
            return Err(ProposalError::receivable_not_found(id));
        }
        info!(receivable_id = id, "receivable deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn draft() -> NewReceivable {
        NewReceivable {
            proposal_id: Some("  ".to_string()),
            client: " Padaria Central ".to_string(),
            value: dec!(750),
            due_date: ymd(2026, 11, 10),
            status: None,
            user_id: "owner-1".to_string(),
        }
    }

    #[test]
    fn new_receivable_defaults_to_pending() {
        let receivable = draft().into_receivable("r1".to_string(), Utc::now());

        assert_eq!(receivable.status, ReceivableStatus::Pending);
        assert_eq!(receivable.client, "Padaria Central");
        assert_eq!(receivable.proposal_id, None);
    }

    #[test]
    fn pending_past_due_reads_as_overdue() {
        let receivable = draft().into_receivable("r1".to_string(), Utc::now());

        assert_eq!(receivable.status_on(ymd(2026, 11, 10)), ReceivableStatus::Pending);
        assert_eq!(receivable.status_on(ymd(2026, 11, 11)), ReceivableStatus::Overdue);

        let paid = Receivable {
            status: ReceivableStatus::Paid,
            ..receivable
        };
        assert_eq!(paid.status_on(ymd(2027, 1, 1)), ReceivableStatus::Paid);
    }

    #[test]
    fn validation_rejects_blank_client_and_negative_value() {
        let mut blank = draft();
        blank.client = " ".to_string();
        assert!(matches!(blank.validate(), Err(ProposalError::Validation(_))));

        let mut negative = draft();
        negative.value = dec!(-5);
        assert!(matches!(negative.validate(), Err(ProposalError::Validation(_))));
    }

    #[test]
    fn status_labels_round_trip() {
        for status in [
            ReceivableStatus::Pending,
            ReceivableStatus::Paid,
            ReceivableStatus::Overdue,
        ] {
            assert_eq!(status.as_str().parse::<ReceivableStatus>().unwrap(), status);
        }
        assert!("late".parse::<ReceivableStatus>().is_err());
    }
}
