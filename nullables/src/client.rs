//! Nullable query client: an in-memory registry.

use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use tally_client::{ClientError, GraphQlQuery, QueryClient};
use tally_types::{ProposalId, VoterAddress};

/// Which error a scripted failure produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    Protocol,
}

impl FailureKind {
    fn to_error(self, what: &str) -> ClientError {
        match self {
            Self::Transport => ClientError::Transport(format!("scripted transport failure: {what}")),
            Self::Protocol => ClientError::Protocol(format!("scripted protocol failure: {what}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Proposals,
    Votes(ProposalId),
}

#[derive(Debug)]
struct FailureRule {
    target: Target,
    /// Only fail the page at this offset; any page when `None`.
    skip: Option<u64>,
    remaining: u32,
    kind: FailureKind,
}

/// A test registry that serves fixed data instead of calling the network.
#[derive(Default)]
pub struct NullQueryClient {
    /// space → closed proposal ids, newest first.
    proposals: HashMap<String, Vec<ProposalId>>,
    /// proposal → voters, newest first.
    votes: HashMap<ProposalId, Vec<VoterAddress>>,
    failures: Mutex<Vec<FailureRule>>,
    requests: Mutex<Vec<GraphQlQuery>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl NullQueryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `ids` as the closed proposals of `space`.
    pub fn with_proposals(mut self, space: &str, ids: &[&str]) -> Self {
        self.proposals.insert(
            space.to_string(),
            ids.iter().map(|id| ProposalId::new(*id)).collect(),
        );
        self
    }

    /// Serve `voters` as the votes cast on `proposal`.
    pub fn with_votes<S: AsRef<str>>(mut self, proposal: &str, voters: &[S]) -> Self {
        self.votes.insert(
            ProposalId::new(proposal),
            voters.iter().map(|v| VoterAddress::new(v.as_ref())).collect(),
        );
        self
    }

    /// Serve `count` distinct generated voters on `proposal`.
    pub fn with_generated_votes(self, proposal: &str, count: usize) -> Self {
        let voters: Vec<String> = (0..count).map(|i| format!("0x{i:040x}")).collect();
        self.with_votes(proposal, &voters)
    }

    /// Fail the next `times` vote requests for `proposal`, whatever the page.
    pub fn fail_votes(self, proposal: &str, times: u32, kind: FailureKind) -> Self {
        self.push_rule(Target::Votes(ProposalId::new(proposal)), None, times, kind)
    }

    /// Fail the next `times` requests for the vote page of `proposal` at `skip`.
    pub fn fail_votes_page(self, proposal: &str, skip: u64, times: u32, kind: FailureKind) -> Self {
        self.push_rule(Target::Votes(ProposalId::new(proposal)), Some(skip), times, kind)
    }

    /// Fail the next `times` proposal listing requests.
    pub fn fail_proposals(self, times: u32, kind: FailureKind) -> Self {
        self.push_rule(Target::Proposals, None, times, kind)
    }

    fn push_rule(self, target: Target, skip: Option<u64>, times: u32, kind: FailureKind) -> Self {
        lock(&self.failures).push(FailureRule {
            target,
            skip,
            remaining: times,
            kind,
        });
        self
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<GraphQlQuery> {
        lock(&self.requests).clone()
    }

    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Number of vote page requests made for `proposal`.
    pub fn vote_requests_for(&self, proposal: &ProposalId) -> usize {
        lock(&self.requests)
            .iter()
            .filter(|q| matches!(q, GraphQlQuery::Votes { proposal: p, .. } if p == proposal))
            .count()
    }

    fn take_failure(&self, target: &Target, skip: u64) -> Option<FailureKind> {
        let mut failures = lock(&self.failures);
        let rule = failures.iter_mut().find(|r| {
            r.remaining > 0 && &r.target == target && r.skip.map_or(true, |s| s == skip)
        })?;
        rule.remaining -= 1;
        Some(rule.kind)
    }
}

fn page<T>(rows: &[T], first: u32, skip: u64) -> &[T] {
    let start = (skip as usize).min(rows.len());
    let end = start.saturating_add(first as usize).min(rows.len());
    &rows[start..end]
}

impl QueryClient for NullQueryClient {
    async fn query(&self, query: &GraphQlQuery) -> Result<Value, ClientError> {
        lock(&self.requests).push(query.clone());

        match query {
            GraphQlQuery::Proposals { space, first, skip } => {
                if let Some(kind) = self.take_failure(&Target::Proposals, *skip) {
                    return Err(kind.to_error(&format!("proposals of {space}")));
                }
                let ids = self.proposals.get(space).map(Vec::as_slice).unwrap_or(&[]);
                let rows: Vec<Value> = page(ids, *first, *skip)
                    .iter()
                    .map(|id| json!({ "id": id.as_str() }))
                    .collect();
                Ok(json!({ "proposals": rows }))
            }
            GraphQlQuery::Votes {
                proposal,
                first,
                skip,
            } => {
                if let Some(kind) = self.take_failure(&Target::Votes(proposal.clone()), *skip) {
                    return Err(kind.to_error(&format!("votes of {proposal} at {skip}")));
                }
                let voters = self.votes.get(proposal).map(Vec::as_slice).unwrap_or(&[]);
                let rows: Vec<Value> = page(voters, *first, *skip)
                    .iter()
                    .map(|voter| json!({ "voter": voter.as_str(), "proposal": { "id": proposal.as_str() } }))
                    .collect();
                Ok(json!({ "votes": rows }))
            }
        }
    }
}
