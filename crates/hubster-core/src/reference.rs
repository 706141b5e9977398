use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceParseError {
    #[error("external reference is empty")]
    Empty,
    #[error("external reference '{0}' has an empty segment")]
    EmptySegment(String),
    #[error("external reference '{0}' has more than two segments")]
    TooManySegments(String),
}

/// Correlation key echoed back by the gateway: a plain proposal id or
/// `"<proposalId>-<linkId>"` when the payment was started from a client link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposalRef {
    Plain(String),
    Linked { proposal_id: String, link_id: String },
}

impl ProposalRef {
    pub fn parse(raw: &str) -> Result<Self, ReferenceParseError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ReferenceParseError::Empty);
        }

        let segments: Vec<&str> = trimmed.split('-').collect();
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(ReferenceParseError::EmptySegment(trimmed.to_string()));
        }

        match segments.as_slice() {
            [proposal_id] => Ok(ProposalRef::Plain(proposal_id.to_string())),
            [proposal_id, link_id] => Ok(ProposalRef::Linked {
                proposal_id: proposal_id.to_string(),
                link_id: link_id.to_string(),
            }),
            _ => Err(ReferenceParseError::TooManySegments(trimmed.to_string())),
        }
    }

    pub fn proposal_id(&self) -> &str {
        match self {
            ProposalRef::Plain(proposal_id) => proposal_id,
            ProposalRef::Linked { proposal_id, .. } => proposal_id,
        }
    }

    pub fn link_id(&self) -> Option<&str> {
        match self {
            ProposalRef::Plain(_) => None,
            ProposalRef::Linked { link_id, .. } => Some(link_id),
        }
    }

    pub fn external_reference(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ProposalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProposalRef::Plain(proposal_id) => f.write_str(proposal_id),
            ProposalRef::Linked {
                proposal_id,
                link_id,
            } => write!(f, "{proposal_id}-{link_id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_reference_is_the_proposal_id() {
        let parsed = ProposalRef::parse(" PROP42 ").unwrap();
        assert_eq!(parsed, ProposalRef::Plain("PROP42".to_string()));
        assert_eq!(parsed.link_id(), None);
    }

    #[test]
    fn compound_reference_splits_on_the_dash() {
        let parsed = ProposalRef::parse("abc123-link9").unwrap();
        assert_eq!(parsed.proposal_id(), "abc123");
        assert_eq!(parsed.link_id(), Some("link9"));
        assert_eq!(parsed.external_reference(), "abc123-link9");
    }

    #[test]
    fn unexpected_shapes_fail_loudly() {
        assert_eq!(ProposalRef::parse("   "), Err(ReferenceParseError::Empty));
        assert!(matches!(
            ProposalRef::parse("abc-"),
            Err(ReferenceParseError::EmptySegment(_))
        ));
        assert!(matches!(
            ProposalRef::parse("-abc"),
            Err(ReferenceParseError::EmptySegment(_))
        ));
        assert!(matches!(
            ProposalRef::parse("6f1c9a52-0d2e-4b8f-9a61-2c0e5b7d8e90"),
            Err(ReferenceParseError::TooManySegments(_))
        ));
    }
}
