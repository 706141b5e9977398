use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ProposalError;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Pending,
    WaitingClient,
    Accepted,
    Declined,
    Paid,
    PaymentPending,
    PaymentFailed,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Pending => "pending",
            ProposalStatus::WaitingClient => "waiting_client",
            ProposalStatus::Accepted => "accepted",
            ProposalStatus::Declined => "declined",
            ProposalStatus::Paid => "paid",
            ProposalStatus::PaymentPending => "payment_pending",
            ProposalStatus::PaymentFailed => "payment_failed",
        }
    }

    /// Statuses where a gateway payment outcome may move the proposal.
    pub fn in_payment_region(&self) -> bool {
        matches!(
            self,
            ProposalStatus::Accepted
                | ProposalStatus::PaymentPending
                | ProposalStatus::PaymentFailed
                | ProposalStatus::Paid
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProposalStatus::Declined | ProposalStatus::Paid)
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProposalStatus {
    type Err = ProposalError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" | "draft" => Ok(ProposalStatus::Pending),
            "waiting_client" | "sent" => Ok(ProposalStatus::WaitingClient),
            "accepted" => Ok(ProposalStatus::Accepted),
            "declined" | "rejected" => Ok(ProposalStatus::Declined),
            "paid" => Ok(ProposalStatus::Paid),
            "payment_pending" => Ok(ProposalStatus::PaymentPending),
            "payment_failed" => Ok(ProposalStatus::PaymentFailed),
            other => Err(ProposalError::Validation(format!(
                "unknown proposal status '{other}'"
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for ProposalStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Send,
    ClientAccept,
    ClientDecline,
    InitiatePayment,
    PaymentApproved,
    PaymentPending,
    PaymentRejected,
}

impl LifecycleEvent {
    /// Status the event asks for; used to report rejected transitions.
    pub fn requested_status(&self) -> ProposalStatus {
        match self {
            LifecycleEvent::Send => ProposalStatus::WaitingClient,
            LifecycleEvent::ClientAccept => ProposalStatus::Accepted,
            LifecycleEvent::ClientDecline => ProposalStatus::Declined,
            LifecycleEvent::InitiatePayment => ProposalStatus::Accepted,
            LifecycleEvent::PaymentApproved => ProposalStatus::Paid,
            LifecycleEvent::PaymentPending => ProposalStatus::PaymentPending,
            LifecycleEvent::PaymentRejected => ProposalStatus::PaymentFailed,
        }
    }
}

/// The transition table. `None` means the event is not allowed from `current`.
pub fn next_status(current: ProposalStatus, event: LifecycleEvent) -> Option<ProposalStatus> {
    use LifecycleEvent as E;
    use ProposalStatus as S;

    match (current, event) {
        (S::Pending | S::WaitingClient, E::Send) => Some(S::WaitingClient),
        (S::WaitingClient, E::ClientAccept) => Some(S::Accepted),
        (S::WaitingClient, E::ClientDecline) => Some(S::Declined),
        (S::Accepted | S::PaymentFailed, E::InitiatePayment) => Some(current),
        (S::Accepted | S::PaymentPending | S::PaymentFailed | S::Paid, E::PaymentApproved) => {
            Some(S::Paid)
        }
        (S::Accepted | S::PaymentPending | S::PaymentFailed, E::PaymentPending) => {
            Some(S::PaymentPending)
        }
        (S::Accepted | S::PaymentPending | S::PaymentFailed, E::PaymentRejected) => {
            Some(S::PaymentFailed)
        }
        _ => None,
    }
}

pub fn transition(
    current: ProposalStatus,
    event: LifecycleEvent,
) -> Result<ProposalStatus, ProposalError> {
    next_status(current, event).ok_or(ProposalError::InvalidTransition {
        current,
        requested: event.requested_status(),
    })
}

/// Gateway status as reported on a payment lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayPaymentStatus {
    Approved,
    Pending,
    Rejected,
    Other(String),
}

impl GatewayPaymentStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "approved" => GatewayPaymentStatus::Approved,
            "pending" => GatewayPaymentStatus::Pending,
            "rejected" => GatewayPaymentStatus::Rejected,
            _ => GatewayPaymentStatus::Other(raw.trim().to_string()),
        }
    }

    /// Unrecognized statuses carry no lifecycle event.
    pub fn lifecycle_event(&self) -> Option<LifecycleEvent> {
        match self {
            GatewayPaymentStatus::Approved => Some(LifecycleEvent::PaymentApproved),
            GatewayPaymentStatus::Pending => Some(LifecycleEvent::PaymentPending),
            GatewayPaymentStatus::Rejected => Some(LifecycleEvent::PaymentRejected),
            GatewayPaymentStatus::Other(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ProposalStatus; 7] = [
        ProposalStatus::Pending,
        ProposalStatus::WaitingClient,
        ProposalStatus::Accepted,
        ProposalStatus::Declined,
        ProposalStatus::Paid,
        ProposalStatus::PaymentPending,
        ProposalStatus::PaymentFailed,
    ];

    #[test]
    fn synonyms_map_to_canonical_labels() {
        assert_eq!("draft".parse::<ProposalStatus>().unwrap(), ProposalStatus::Pending);
        assert_eq!("sent".parse::<ProposalStatus>().unwrap(), ProposalStatus::WaitingClient);
        assert_eq!("rejected".parse::<ProposalStatus>().unwrap(), ProposalStatus::Declined);
        assert!("payment_processing".parse::<ProposalStatus>().is_err());

        let parsed: ProposalStatus = serde_json::from_str("\"sent\"").unwrap();
        assert_eq!(parsed, ProposalStatus::WaitingClient);
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"waiting_client\"");
    }

    #[test]
    fn send_moves_pending_to_waiting_client() {
        assert_eq!(
            transition(ProposalStatus::Pending, LifecycleEvent::Send).unwrap(),
            ProposalStatus::WaitingClient
        );
        assert_eq!(
            transition(ProposalStatus::WaitingClient, LifecycleEvent::Send).unwrap(),
            ProposalStatus::WaitingClient
        );
        assert!(transition(ProposalStatus::Accepted, LifecycleEvent::Send).is_err());
    }

    #[test]
    fn client_decision_only_from_waiting_client() {
        for status in ALL {
            for event in [LifecycleEvent::ClientAccept, LifecycleEvent::ClientDecline] {
                let result = transition(status, event);
                if status == ProposalStatus::WaitingClient {
                    assert!(result.is_ok());
                } else {
                    match result {
                        Err(ProposalError::InvalidTransition { current, requested }) => {
                            assert_eq!(current, status);
                            assert_eq!(requested, event.requested_status());
                        }
                        other => panic!("expected invalid transition, got {other:?}"),
                    }
                }
            }
        }
    }

    #[test]
    fn payment_outcomes_follow_the_table() {
        for from in [
            ProposalStatus::Accepted,
            ProposalStatus::PaymentPending,
            ProposalStatus::PaymentFailed,
        ] {
            assert_eq!(next_status(from, LifecycleEvent::PaymentApproved), Some(ProposalStatus::Paid));
            assert_eq!(
                next_status(from, LifecycleEvent::PaymentPending),
                Some(ProposalStatus::PaymentPending)
            );
            assert_eq!(
                next_status(from, LifecycleEvent::PaymentRejected),
                Some(ProposalStatus::PaymentFailed)
            );
        }

        assert_eq!(
            next_status(ProposalStatus::Paid, LifecycleEvent::PaymentApproved),
            Some(ProposalStatus::Paid)
        );
        assert_eq!(next_status(ProposalStatus::Paid, LifecycleEvent::PaymentRejected), None);
        assert_eq!(next_status(ProposalStatus::Declined, LifecycleEvent::PaymentApproved), None);
        assert_eq!(next_status(ProposalStatus::Pending, LifecycleEvent::PaymentPending), None);
    }

    #[test]
    fn payment_initiation_keeps_status() {
        assert_eq!(
            next_status(ProposalStatus::Accepted, LifecycleEvent::InitiatePayment),
            Some(ProposalStatus::Accepted)
        );
        assert_eq!(
            next_status(ProposalStatus::PaymentFailed, LifecycleEvent::InitiatePayment),
            Some(ProposalStatus::PaymentFailed)
        );
        assert_eq!(next_status(ProposalStatus::WaitingClient, LifecycleEvent::InitiatePayment), None);
        assert_eq!(next_status(ProposalStatus::Paid, LifecycleEvent::InitiatePayment), None);
    }

    #[test]
    fn gateway_status_mapping() {
        assert_eq!(
            GatewayPaymentStatus::parse("approved").lifecycle_event(),
            Some(LifecycleEvent::PaymentApproved)
        );
        assert_eq!(
            GatewayPaymentStatus::parse(" Rejected ").lifecycle_event(),
            Some(LifecycleEvent::PaymentRejected)
        );
        let other = GatewayPaymentStatus::parse("in_process");
        assert_eq!(other, GatewayPaymentStatus::Other("in_process".to_string()));
        assert_eq!(other.lifecycle_event(), None);
    }
}
