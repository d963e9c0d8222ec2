//! Proposals and the votes cast on them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::VoterAddress;

/// Opaque proposal identifier assigned by the registry.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProposalId(String);

impl ProposalId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProposalId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A closed proposal in the target space.
///
/// The registry listing is the only producer; the length of that listing is
/// the denominator of every voting rate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
}

impl Proposal {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: ProposalId::new(id),
        }
    }
}

/// One address's ballot on one proposal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vote {
    pub voter: VoterAddress,
    pub proposal: ProposalId,
}

impl Vote {
    pub fn new(voter: impl Into<VoterAddress>, proposal: ProposalId) -> Self {
        Self {
            voter: voter.into(),
            proposal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proposal_deserializes_from_listing_row() {
        let p: Proposal = serde_json::from_str(r#"{"id":"0xprop"}"#).unwrap();
        assert_eq!(p.id.as_str(), "0xprop");
    }

    #[test]
    fn vote_carries_voter_and_proposal() {
        let vote = Vote::new("0xvoter", ProposalId::new("0xprop"));
        assert_eq!(vote.voter.as_str(), "0xvoter");
        assert_eq!(vote.proposal.to_string(), "0xprop");
    }
}
