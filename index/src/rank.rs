//! Vote counts per address, maintained incrementally as batches arrive.
//!
//! The index is built from scratch on every run: each proposal's votes are
//! applied once, in fetch order, and every vote moves its voter up exactly one
//! bucket. Nothing is ever decremented.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tally_types::{VoterAddress, Vote};

use crate::IndexError;

/// Bidirectional count/address index.
#[derive(Debug, Default)]
pub struct RankIndex {
    /// address → number of votes seen.
    counts: HashMap<VoterAddress, u32>,
    /// count → addresses currently at that count. Never holds an empty set.
    buckets: BTreeMap<u32, BTreeSet<VoterAddress>>,
    /// Total votes applied across all batches.
    votes_applied: u64,
}

impl RankIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a batch of votes in sequence order.
    pub fn apply_votes(&mut self, votes: &[Vote]) {
        for vote in votes {
            self.apply_vote(&vote.voter);
        }
    }

    /// Count one vote for `voter` and return its new count.
    pub fn apply_vote(&mut self, voter: &VoterAddress) -> u32 {
        let next = match self.counts.get(voter).copied() {
            Some(previous) => {
                self.detach(previous, voter);
                previous.saturating_add(1)
            }
            None => 1,
        };

        match self.counts.get_mut(voter) {
            Some(count) => *count = next,
            None => {
                self.counts.insert(voter.clone(), next);
            }
        }
        self.buckets.entry(next).or_default().insert(voter.clone());
        self.votes_applied += 1;
        next
    }

    /// Remove `voter` from bucket `count`, dropping the bucket once empty.
    fn detach(&mut self, count: u32, voter: &VoterAddress) {
        if let Some(bucket) = self.buckets.get_mut(&count) {
            bucket.remove(voter);
            if bucket.is_empty() {
                self.buckets.remove(&count);
            }
        }
    }

    /// Votes recorded for `voter`. Returns 0 if it never voted.
    pub fn count_of(&self, voter: &VoterAddress) -> u32 {
        self.counts.get(voter).copied().unwrap_or(0)
    }

    /// `voter`'s count divided by the number of proposals considered.
    pub fn rate_of(&self, voter: &VoterAddress, total_proposals: usize) -> Result<f64, IndexError> {
        voting_rate(self.count_of(voter), total_proposals)
    }

    /// Addresses currently at exactly `count` votes.
    pub fn bucket(&self, count: u32) -> Option<&BTreeSet<VoterAddress>> {
        self.buckets.get(&count)
    }

    /// Non-empty buckets from the highest count down.
    pub fn buckets_descending(&self) -> impl Iterator<Item = (u32, &BTreeSet<VoterAddress>)> {
        self.buckets.iter().rev().map(|(count, set)| (*count, set))
    }

    /// Number of distinct addresses seen.
    pub fn voter_count(&self) -> usize {
        self.counts.len()
    }

    pub fn votes_applied(&self) -> u64 {
        self.votes_applied
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Check that both views agree: every address sits in exactly the bucket
    /// for its count, no bucket is empty, and bucket sizes sum to the number
    /// of distinct addresses.
    pub fn is_consistent(&self) -> bool {
        let members: usize = self.buckets.values().map(BTreeSet::len).sum();
        if members != self.counts.len() {
            return false;
        }
        if self.buckets.values().any(BTreeSet::is_empty) {
            return false;
        }
        self.counts.iter().all(|(voter, count)| {
            self.buckets
                .get(count)
                .is_some_and(|bucket| bucket.contains(voter))
        })
    }
}

/// `count / total_proposals`, refusing an empty denominator.
pub fn voting_rate(count: u32, total_proposals: usize) -> Result<f64, IndexError> {
    if total_proposals == 0 {
        return Err(IndexError::NoProposals);
    }
    Ok(count as f64 / total_proposals as f64)
}
