//! Top-K voter selection.

use serde::Serialize;
use tally_types::VoterAddress;

use crate::rank::{voting_rate, RankIndex};
use crate::IndexError;

/// Leaderboard length used by the reports.
pub const DEFAULT_TOP_K: usize = 20;

/// One ranked leaderboard entry. Derived on demand, never stored.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LeaderboardRow {
    /// 1-based position after sorting by rate.
    pub rank: usize,
    pub address: VoterAddress,
    pub vote_count: u32,
    pub voting_rate: f64,
}

impl RankIndex {
    /// The `k` addresses with the most votes, ranked by voting rate.
    ///
    /// Buckets are consumed from the highest count down. When a bucket would
    /// overflow `k`, its members are taken in ascending address order until
    /// exactly `k` are collected.
    ///
    /// Fails with [`IndexError::InsufficientVoters`] when fewer than `k`
    /// distinct addresses are indexed, and with [`IndexError::NoProposals`]
    /// when `total_proposals` is zero.
    pub fn top(&self, k: usize, total_proposals: usize) -> Result<Vec<LeaderboardRow>, IndexError> {
        if total_proposals == 0 {
            return Err(IndexError::NoProposals);
        }
        if self.voter_count() < k {
            return Err(IndexError::InsufficientVoters {
                requested: k,
                available: self.voter_count(),
            });
        }

        let mut picked: Vec<(&VoterAddress, u32)> = Vec::with_capacity(k);
        for (count, bucket) in self.buckets_descending() {
            let room = k - picked.len();
            if room == 0 {
                break;
            }
            picked.extend(bucket.iter().take(room).map(|address| (address, count)));
        }

        let mut rows = picked
            .into_iter()
            .map(|(address, count)| {
                Ok(LeaderboardRow {
                    rank: 0,
                    address: address.clone(),
                    vote_count: count,
                    voting_rate: voting_rate(count, total_proposals)?,
                })
            })
            .collect::<Result<Vec<_>, IndexError>>()?;

        rows.sort_by(|a, b| b.voting_rate.total_cmp(&a.voting_rate));
        for (i, row) in rows.iter_mut().enumerate() {
            row.rank = i + 1;
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn addr(i: usize) -> VoterAddress {
        VoterAddress::new(format!("0x{i:04}"))
    }

    /// Voter `i` casts `i + 1` votes.
    fn staircase(voters: usize) -> RankIndex {
        let mut index = RankIndex::new();
        for i in 0..voters {
            for _ in 0..=i {
                index.apply_vote(&addr(i));
            }
        }
        index
    }

    #[test]
    fn top_returns_exactly_k_ranked_rows() {
        let index = staircase(30);
        let rows = index.top(DEFAULT_TOP_K, 40).unwrap();

        assert_eq!(rows.len(), 20);
        let ranks: Vec<usize> = rows.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, (1..=20).collect::<Vec<_>>());

        let unique: HashSet<&VoterAddress> = rows.iter().map(|r| &r.address).collect();
        assert_eq!(unique.len(), 20);

        assert!(rows
            .windows(2)
            .all(|w| w[0].voting_rate >= w[1].voting_rate));
        assert_eq!(rows[0].address, addr(29));
        assert_eq!(rows[0].vote_count, 30);
        assert!((rows[0].voting_rate - 0.75).abs() < f64::EPSILON);
        assert_eq!(rows[19].vote_count, 11);
    }

    #[test]
    fn overflowing_bucket_is_cut_at_k() {
        let mut index = RankIndex::new();
        // Two heavy voters, then a tie of 25 voters at one vote each.
        for _ in 0..5 {
            index.apply_vote(&VoterAddress::new("0xheavy_a"));
            index.apply_vote(&VoterAddress::new("0xheavy_b"));
        }
        for i in 0..25 {
            index.apply_vote(&addr(i));
        }

        let rows = index.top(20, 5).unwrap();
        assert_eq!(rows.len(), 20);
        assert_eq!(rows[0].vote_count, 5);
        assert_eq!(rows[1].vote_count, 5);
        // Ties are filled in ascending address order.
        assert_eq!(rows[2].address, addr(0));
        assert_eq!(rows[19].address, addr(17));
    }

    #[test]
    fn short_index_signals_insufficient_voters() {
        let index = staircase(5);
        assert_eq!(
            index.top(20, 10),
            Err(IndexError::InsufficientVoters {
                requested: 20,
                available: 5
            })
        );
        assert_eq!(index.top(5, 10).unwrap().len(), 5);
    }

    #[test]
    fn zero_proposals_is_rejected() {
        let index = staircase(25);
        assert_eq!(index.top(20, 0), Err(IndexError::NoProposals));
    }

    #[test]
    fn zero_k_is_empty() {
        let index = staircase(3);
        assert!(index.top(0, 3).unwrap().is_empty());
    }
}
