//! Console output for the leaderboard and the single-address report.

use serde::Serialize;
use std::fmt::Write;

use tally_index::{IndexError, LeaderboardRow, RankIndex};
use tally_types::VoterAddress;

/// Participation of one address.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AddressReport {
    pub address: VoterAddress,
    pub voting_rate: f64,
    pub vote_count: u32,
}

/// A leaderboard that may be shorter than requested.
#[derive(Clone, Debug, PartialEq)]
pub struct Leaderboard {
    pub requested: usize,
    pub rows: Vec<LeaderboardRow>,
}

impl Leaderboard {
    pub fn is_complete(&self) -> bool {
        self.rows.len() == self.requested
    }
}

/// Build the top-`k` leaderboard, settling for every indexed voter when the
/// space has fewer than `k`.
pub fn leaderboard(index: &RankIndex, k: usize, total_proposals: usize) -> Result<Leaderboard, IndexError> {
    let rows = match index.top(k, total_proposals) {
        Ok(rows) => rows,
        Err(IndexError::InsufficientVoters { requested, available }) => {
            tracing::warn!(requested, available, "fewer voters than leaderboard slots");
            index.top(available, total_proposals)?
        }
        Err(e) => return Err(e),
    };
    Ok(Leaderboard { requested: k, rows })
}

pub fn address_report(
    index: &RankIndex,
    address: &VoterAddress,
    total_proposals: usize,
) -> Result<AddressReport, IndexError> {
    Ok(AddressReport {
        address: address.clone(),
        voting_rate: index.rate_of(address, total_proposals)?,
        vote_count: index.count_of(address),
    })
}

pub fn render_leaderboard(board: &Leaderboard, space: &str, total_proposals: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Top {} voters in {space} across {total_proposals} closed proposals",
        board.requested
    );
    if !board.is_complete() {
        let _ = writeln!(out, "(only {} voters found)", board.rows.len());
    }
    let _ = writeln!(out, "{:>4}  {:<42}  {:>8}  {:>6}", "rank", "address", "rate", "votes");
    for row in &board.rows {
        let _ = writeln!(
            out,
            "{:>4}  {:<42}  {:>7.2}%  {:>6}",
            row.rank,
            row.address.as_str(),
            row.voting_rate * 100.0,
            row.vote_count
        );
    }
    out
}

pub fn render_address(report: &AddressReport) -> String {
    format!(
        "{}: voting rate {:.2}% ({} votes)\n",
        report.address,
        report.voting_rate * 100.0,
        report.vote_count
    )
}

#[derive(Serialize)]
struct JsonReport<'a> {
    space: &'a str,
    total_proposals: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_voters: Option<&'a [LeaderboardRow]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<&'a AddressReport>,
}

pub fn render_json(
    space: &str,
    total_proposals: usize,
    board: Option<&Leaderboard>,
    address: Option<&AddressReport>,
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&JsonReport {
        space,
        total_proposals,
        top_voters: board.map(|b| b.rows.as_slice()),
        address,
    })
}
