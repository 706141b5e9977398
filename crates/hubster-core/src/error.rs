use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::status::ProposalStatus;

#[derive(Debug, Error)]
pub enum ProposalError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("cannot move proposal from '{current}' to '{requested}'")]
    InvalidTransition {
        current: ProposalStatus,
        requested: ProposalStatus,
    },

    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("link '{link_id}' expired at {expired_at}")]
    LinkExpired {
        link_id: String,
        expired_at: DateTime<Utc>,
    },

    #[error("link '{link_id}' was replaced by a newer link")]
    LinkSuperseded { link_id: String },

    #[error("proposal '{0}' kept changing concurrently; giving up")]
    Conflict(String),

    #[error("payment lookup failed: {0}")]
    GatewayLookup(String),

    #[error("payment preference creation failed: {0}")]
    GatewayCreate(String),

    #[error("persistence failed: {0}")]
    Persistence(String),
}

impl ProposalError {
    pub fn proposal_not_found(id: &str) -> Self {
        ProposalError::NotFound {
            entity: "proposal",
            id: id.to_string(),
        }
    }

    pub fn link_not_found(id: &str) -> Self {
        ProposalError::NotFound {
            entity: "link",
            id: id.to_string(),
        }
    }

    pub fn receivable_not_found(id: &str) -> Self {
        ProposalError::NotFound {
            entity: "receivable",
            id: id.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record '{0}' not found")]
    NotFound(String),

    #[error("record '{id}' is at version {actual}, expected {expected}")]
    VersionConflict {
        id: String,
        expected: i64,
        actual: i64,
    },

    #[error("{0}")]
    Backend(String),
}

impl From<StoreError> for ProposalError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ProposalError::proposal_not_found(&id),
            StoreError::VersionConflict { id, .. } => ProposalError::Conflict(id),
            StoreError::Backend(message) => ProposalError::Persistence(message),
        }
    }
}
