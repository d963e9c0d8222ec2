//! One tally run: ingest the space, then answer the requested questions.

use std::time::Instant;

use tally_client::QueryClient;
use tally_index::RankIndex;
use tally_ingest::{Ingestor, VoteFetcher};
use tally_types::VoterAddress;
use tally_utils::format_duration;

use crate::config::TallyConfig;
use crate::report;

/// What to print once the index is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Question {
    /// The top-K leaderboard and the target address's rate.
    Both,
    /// Only the leaderboard.
    Top,
    /// Only the target address's rate.
    Rate,
}

/// Ingest `config.space` through `client` and render the answer to `question`.
pub async fn execute<C: QueryClient>(
    client: C,
    config: &TallyConfig,
    question: Question,
    json: bool,
) -> anyhow::Result<String> {
    let started = Instant::now();
    let fetcher = VoteFetcher::with_page_size(client, config.page_size);
    let ingestor = Ingestor::new(fetcher, config.ingest_options());
    let mut index = RankIndex::new();

    let (proposals, ingest) = ingestor.run(&config.space, &mut index).await?;
    let total = proposals.len();
    tracing::info!(
        proposals = total,
        votes = ingest.votes_applied,
        voters = index.voter_count(),
        retries = ingest.retries,
        elapsed = %format_duration(started.elapsed()),
        "ingestion complete"
    );

    let board = match question {
        Question::Both | Question::Top => Some(report::leaderboard(&index, config.top_k, total)?),
        Question::Rate => None,
    };
    let address = match question {
        Question::Both | Question::Rate => {
            let target = VoterAddress::new(config.target_address.as_str());
            Some(report::address_report(&index, &target, total)?)
        }
        Question::Top => None,
    };

    if json {
        return Ok(report::render_json(
            &config.space,
            total,
            board.as_ref(),
            address.as_ref(),
        )?);
    }

    let mut out = String::new();
    if let Some(board) = &board {
        out.push_str(&report::render_leaderboard(board, &config.space, total));
    }
    if let Some(address) = &address {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&report::render_address(address));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_ingest::IngestError;
    use tally_nullables::{FailureKind, NullQueryClient};

    fn config() -> TallyConfig {
        let mut config = TallyConfig {
            space: "test.eth".into(),
            target_address: "0xa".into(),
            top_k: 2,
            ..Default::default()
        };
        config.retry.max_attempts = 2;
        config.retry.initial_delay_secs = 0;
        config
    }

    fn registry() -> NullQueryClient {
        NullQueryClient::new()
            .with_proposals("test.eth", &["p3", "p2", "p1"])
            .with_votes("p1", &["0xa", "0xb", "0xc"])
            .with_votes("p2", &["0xa", "0xb"])
            .with_votes("p3", &["0xa"])
    }

    #[tokio::test]
    async fn prints_leaderboard_and_address_rate() {
        let out = execute(registry(), &config(), Question::Both, false)
            .await
            .unwrap();
        assert!(out.contains("Top 2 voters in test.eth across 3 closed proposals"));
        assert!(out.contains("100.00%"));
        assert!(out.contains("66.67%"));
        assert!(!out.contains("33.33%"));
        assert!(out.ends_with("0xa: voting rate 100.00% (3 votes)\n"));
    }

    #[tokio::test]
    async fn json_rate_only() {
        let out = execute(registry(), &config(), Question::Rate, true)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["address"]["vote_count"], 3);
        assert_eq!(value["address"]["voting_rate"], 1.0);
        assert!(value.get("top_voters").is_none());
    }

    #[tokio::test]
    async fn transient_failure_is_absorbed() {
        let client = registry().fail_votes("p2", 1, FailureKind::Transport);
        let out = execute(client, &config(), Question::Top, true).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["top_voters"][1]["vote_count"], 2);
    }

    #[tokio::test]
    async fn persistent_failure_is_reported() {
        let client = registry().fail_votes("p2", 5, FailureKind::Protocol);
        let err = execute(client, &config(), Question::Both, false)
            .await
            .unwrap_err();
        let ingest = err.downcast_ref::<IngestError>().expect("ingest error");
        assert!(matches!(
            ingest,
            IngestError::RetriesExhausted { attempts: 2, .. }
        ));
    }
}
