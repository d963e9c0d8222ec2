use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

use tally_index::RankIndex;
use tally_types::{ProposalId, Vote, VoterAddress};

/// Batches of votes drawn from a small address pool so repeats are common.
fn vote_batches() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(0u8..40, 0..60), 0..12)
}

fn to_votes(batch_no: usize, voters: &[u8]) -> Vec<Vote> {
    voters
        .iter()
        .map(|v| {
            Vote::new(
                VoterAddress::new(format!("0x{v:02x}")),
                ProposalId::new(format!("p{batch_no}")),
            )
        })
        .collect()
}

proptest! {
    /// Both views agree after every batch.
    #[test]
    fn views_stay_consistent(batches in vote_batches()) {
        let mut index = RankIndex::new();
        let mut distinct = HashSet::new();
        for (i, batch) in batches.iter().enumerate() {
            index.apply_votes(&to_votes(i, batch));
            distinct.extend(batch.iter().copied());
            prop_assert!(index.is_consistent(), "views diverged after batch {}", i);
            let members: usize = index.buckets_descending().map(|(_, b)| b.len()).sum();
            prop_assert_eq!(members, distinct.len());
            prop_assert_eq!(index.voter_count(), distinct.len());
        }
    }

    /// A count never decreases and grows by exactly one per vote.
    #[test]
    fn counts_grow_by_one_per_vote(batches in vote_batches()) {
        let mut index = RankIndex::new();
        let mut expected: HashMap<u8, u32> = HashMap::new();
        for batch in &batches {
            for v in batch {
                let voter = VoterAddress::new(format!("0x{v:02x}"));
                let before = index.count_of(&voter);
                let after = index.apply_vote(&voter);
                prop_assert_eq!(after, before + 1);
                *expected.entry(*v).or_insert(0) += 1;
            }
        }
        for (v, count) in expected {
            let voter = VoterAddress::new(format!("0x{v:02x}"));
            prop_assert_eq!(index.count_of(&voter), count);
        }
    }

    /// The leaderboard never holds a lower count above a higher one and
    /// always takes the heaviest voters.
    #[test]
    fn top_k_takes_heaviest_voters(batches in vote_batches(), k in 1usize..25) {
        let mut index = RankIndex::new();
        for (i, batch) in batches.iter().enumerate() {
            index.apply_votes(&to_votes(i, batch));
        }
        let total = batches.len().max(1);
        match index.top(k, total) {
            Ok(rows) => {
                prop_assert_eq!(rows.len(), k);
                for pair in rows.windows(2) {
                    prop_assert!(pair[0].vote_count >= pair[1].vote_count);
                }
                let cutoff = rows.last().map(|r| r.vote_count).unwrap_or(0);
                let picked: HashSet<_> = rows.iter().map(|r| r.address.clone()).collect();
                for (count, bucket) in index.buckets_descending() {
                    if count > cutoff {
                        prop_assert!(bucket.iter().all(|a| picked.contains(a)));
                    }
                }
            }
            Err(_) => prop_assert!(index.voter_count() < k),
        }
    }
}
