//! Per-proposal ingestion loop.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use tally_client::QueryClient;
use tally_index::RankIndex;
use tally_types::{Proposal, Vote};

use crate::fetcher::VoteFetcher;
use crate::retry::{retry, Exhausted, RetryPolicy};
use crate::IngestError;

/// Knobs for one ingestion run.
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    pub retry: RetryPolicy,
    /// Count an address at most once per proposal.
    pub dedupe_votes: bool,
}

/// What an ingestion run did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    pub proposals: usize,
    /// Rows returned by the registry across all proposals.
    pub votes_fetched: u64,
    /// Votes that reached the index (fewer than fetched when deduplicating).
    pub votes_applied: u64,
    /// Failed attempts that were followed by another attempt.
    pub retries: u32,
    pub elapsed: Duration,
}

/// Drives the fetcher over a space's proposals and fills a [`RankIndex`].
pub struct Ingestor<C> {
    fetcher: VoteFetcher<C>,
    options: IngestOptions,
}

impl<C: QueryClient> Ingestor<C> {
    pub fn new(fetcher: VoteFetcher<C>, options: IngestOptions) -> Self {
        Self { fetcher, options }
    }

    pub fn fetcher(&self) -> &VoteFetcher<C> {
        &self.fetcher
    }

    /// List the closed proposals of `space`, retrying the listing as a whole.
    pub async fn list_proposals(&self, space: &str) -> Result<Vec<Proposal>, IngestError> {
        let label = format!("proposals of {space}");
        let fetcher = &self.fetcher;
        let listed = retry(&self.options.retry, &label, move || {
            fetcher.fetch_closed_proposals(space)
        })
        .await
        .map_err(|e| exhausted(label.clone(), e))?;

        tracing::info!(space, proposals = listed.value.len(), "listed closed proposals");
        Ok(listed.value)
    }

    /// Fetch and apply every proposal's votes, strictly in order.
    ///
    /// A proposal whose fetch fails is retried as a whole before the next
    /// one starts. Only complete vote lists are applied, so a retry can never
    /// double-count votes from an earlier partial attempt.
    pub async fn ingest(
        &self,
        proposals: &[Proposal],
        index: &mut RankIndex,
    ) -> Result<IngestReport, IngestError> {
        let started = Instant::now();
        let total = proposals.len();
        let mut report = IngestReport {
            proposals: total,
            ..Default::default()
        };

        for (i, proposal) in proposals.iter().enumerate() {
            tracing::info!(proposal = %proposal.id, "processing proposal {}/{}", i + 1, total);

            let label = format!("votes of {}", proposal.id);
            let fetcher = &self.fetcher;
            let id = &proposal.id;
            let fetched = retry(&self.options.retry, &label, move || fetcher.fetch_all_votes(id))
                .await
                .map_err(|e| exhausted(label.clone(), e))?;

            report.retries += fetched.retries();
            report.votes_fetched += fetched.value.len() as u64;

            let votes = if self.options.dedupe_votes {
                dedupe_voters(fetched.value)
            } else {
                fetched.value
            };
            index.apply_votes(&votes);
            report.votes_applied += votes.len() as u64;

            tracing::debug!(
                proposal = %proposal.id,
                votes = votes.len(),
                voters = index.voter_count(),
                "applied votes"
            );
        }

        report.elapsed = started.elapsed();
        Ok(report)
    }

    /// List `space`'s closed proposals and ingest all of them.
    pub async fn run(
        &self,
        space: &str,
        index: &mut RankIndex,
    ) -> Result<(Vec<Proposal>, IngestReport), IngestError> {
        let proposals = self.list_proposals(space).await?;
        if proposals.is_empty() {
            return Err(IngestError::NoProposals(space.to_string()));
        }
        let report = self.ingest(&proposals, index).await?;
        Ok((proposals, report))
    }
}

fn exhausted(target: String, e: Exhausted) -> IngestError {
    IngestError::RetriesExhausted {
        target,
        attempts: e.attempts,
        last_error: e.last_error,
    }
}

/// Keep the first vote of each address within one proposal's list.
fn dedupe_voters(votes: Vec<Vote>) -> Vec<Vote> {
    let mut seen = HashSet::with_capacity(votes.len());
    votes
        .into_iter()
        .filter(|vote| seen.insert(vote.voter.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_client::{ClientError, GraphQlQuery};
    use tally_nullables::{FailureKind, NullQueryClient};
    use tally_types::{ProposalId, VoterAddress};

    fn ingestor(client: NullQueryClient, retry: RetryPolicy) -> Ingestor<NullQueryClient> {
        Ingestor::new(
            VoteFetcher::new(client),
            IngestOptions {
                retry,
                dedupe_votes: false,
            },
        )
    }

    fn proposals(ids: &[&str]) -> Vec<Proposal> {
        ids.iter().map(|id| Proposal::new(*id)).collect()
    }

    #[tokio::test]
    async fn counts_votes_across_proposals() {
        let client = NullQueryClient::new()
            .with_votes("p1", &["0xa", "0xb"])
            .with_votes("p2", &["0xa"])
            .with_votes("p3", &["0xa", "0xc"]);
        let ingestor = ingestor(client, RetryPolicy::immediate(1));
        let mut index = RankIndex::new();

        let report = ingestor
            .ingest(&proposals(&["p1", "p2", "p3"]), &mut index)
            .await
            .unwrap();

        assert_eq!(report.proposals, 3);
        assert_eq!(report.votes_applied, 5);
        assert_eq!(report.retries, 0);
        assert_eq!(index.count_of(&VoterAddress::new("0xa")), 3);
        assert_eq!(index.count_of(&VoterAddress::new("0xb")), 1);
        assert!(index.is_consistent());
    }

    #[tokio::test]
    async fn failed_attempt_is_retried_without_double_counting() {
        // The second page fails once, after the first page already succeeded.
        let client = NullQueryClient::new()
            .with_generated_votes("p1", 1500)
            .fail_votes_page("p1", 1000, 1, FailureKind::Transport);
        let ingestor = ingestor(client, RetryPolicy::immediate(3));
        let mut index = RankIndex::new();

        let report = ingestor.ingest(&proposals(&["p1"]), &mut index).await.unwrap();

        assert_eq!(report.retries, 1);
        assert_eq!(report.votes_applied, 1500);
        assert_eq!(index.voter_count(), 1500);
        assert_eq!(index.votes_applied(), 1500);
        assert_eq!(index.bucket(1).map(|b| b.len()), Some(1500));
        // Page 0 twice, page 1000 failed once then succeeded.
        assert_eq!(ingestor.fetcher().client().vote_requests_for(&ProposalId::new("p1")), 4);
    }

    #[tokio::test]
    async fn retry_completes_before_next_proposal_starts() {
        let client = NullQueryClient::new()
            .with_votes("p1", &["0xa"])
            .with_votes("p2", &["0xb"])
            .fail_votes("p1", 2, FailureKind::Protocol);
        let ingestor = ingestor(client, RetryPolicy::immediate(5));
        let mut index = RankIndex::new();

        ingestor.ingest(&proposals(&["p1", "p2"]), &mut index).await.unwrap();

        let order: Vec<String> = ingestor
            .fetcher()
            .client()
            .requests()
            .into_iter()
            .map(|q| match q {
                GraphQlQuery::Votes { proposal, .. } => proposal.to_string(),
                other => panic!("unexpected request {other:?}"),
            })
            .collect();
        assert_eq!(order, vec!["p1", "p1", "p1", "p2"]);
        assert_eq!(index.count_of(&VoterAddress::new("0xa")), 1);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_as_error() {
        let client = NullQueryClient::new()
            .with_votes("p1", &["0xa"])
            .fail_votes("p1", u32::MAX, FailureKind::Transport);
        let ingestor = ingestor(client, RetryPolicy::immediate(3));
        let mut index = RankIndex::new();

        let err = ingestor
            .ingest(&proposals(&["p1"]), &mut index)
            .await
            .unwrap_err();

        match err {
            IngestError::RetriesExhausted {
                target,
                attempts,
                last_error,
            } => {
                assert_eq!(target, "votes of p1");
                assert_eq!(attempts, 3);
                assert!(matches!(last_error, ClientError::Transport(_)));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(index.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn default_policy_waits_eleven_seconds_per_retry() {
        let client = NullQueryClient::new()
            .with_votes("p1", &["0xa"])
            .fail_votes("p1", 2, FailureKind::Transport);
        let ingestor = ingestor(client, RetryPolicy::default());
        let mut index = RankIndex::new();

        let start = tokio::time::Instant::now();
        let report = ingestor.ingest(&proposals(&["p1"]), &mut index).await.unwrap();

        assert_eq!(report.retries, 2);
        assert!(start.elapsed() >= std::time::Duration::from_secs(22));
        assert_eq!(index.count_of(&VoterAddress::new("0xa")), 1);
    }

    #[tokio::test]
    async fn dedupe_counts_each_address_once_per_proposal() {
        let client = NullQueryClient::new().with_votes("p1", &["0xa", "0xa", "0xb"]);
        let ingestor = Ingestor::new(
            VoteFetcher::new(client),
            IngestOptions {
                retry: RetryPolicy::immediate(1),
                dedupe_votes: true,
            },
        );
        let mut index = RankIndex::new();

        let report = ingestor.ingest(&proposals(&["p1"]), &mut index).await.unwrap();

        assert_eq!(report.votes_fetched, 3);
        assert_eq!(report.votes_applied, 2);
        assert_eq!(index.count_of(&VoterAddress::new("0xa")), 1);
    }

    #[tokio::test]
    async fn raw_duplicates_count_twice_by_default() {
        let client = NullQueryClient::new().with_votes("p1", &["0xa", "0xa"]);
        let ingestor = ingestor(client, RetryPolicy::immediate(1));
        let mut index = RankIndex::new();

        ingestor.ingest(&proposals(&["p1"]), &mut index).await.unwrap();
        assert_eq!(index.count_of(&VoterAddress::new("0xa")), 2);
    }

    #[tokio::test]
    async fn run_lists_then_ingests() {
        let client = NullQueryClient::new()
            .with_proposals("aave.eth", &["p2", "p1"])
            .with_votes("p1", &["0xa"])
            .with_votes("p2", &["0xa", "0xb"])
            .fail_proposals(1, FailureKind::Transport);
        let ingestor = ingestor(client, RetryPolicy::immediate(2));
        let mut index = RankIndex::new();

        let (listed, report) = ingestor.run("aave.eth", &mut index).await.unwrap();

        assert_eq!(listed.len(), 2);
        assert_eq!(report.votes_applied, 3);
        assert_eq!(index.rate_of(&VoterAddress::new("0xa"), listed.len()), Ok(1.0));
    }

    #[tokio::test]
    async fn run_on_empty_space_is_an_error() {
        let ingestor = ingestor(NullQueryClient::new(), RetryPolicy::immediate(1));
        let mut index = RankIndex::new();
        let err = ingestor.run("ghost.eth", &mut index).await.unwrap_err();
        assert!(matches!(err, IngestError::NoProposals(space) if space == "ghost.eth"));
    }
}
