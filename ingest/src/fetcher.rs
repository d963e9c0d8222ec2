//! Paginated listing of proposals and votes.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use tally_client::{ClientError, GraphQlQuery, PageCursor, QueryClient, PAGE_SIZE};
use tally_types::{Proposal, ProposalId, Vote, VoterAddress};

/// A vote row as the registry returns it.
#[derive(Debug, Deserialize)]
struct VoteRow {
    voter: VoterAddress,
    proposal: ProposalRef,
}

#[derive(Debug, Deserialize)]
struct ProposalRef {
    id: ProposalId,
}

impl From<VoteRow> for Vote {
    fn from(row: VoteRow) -> Self {
        Vote {
            voter: row.voter,
            proposal: row.proposal.id,
        }
    }
}

/// Fetches complete listings by walking pages until a short one.
///
/// No deduplication is done across pages: if the registry's ordering shifts
/// between requests, rows may repeat or go missing.
pub struct VoteFetcher<C> {
    client: C,
    page_size: u32,
}

impl<C: QueryClient> VoteFetcher<C> {
    /// Fetcher requesting full registry pages of [`PAGE_SIZE`] rows.
    pub fn new(client: C) -> Self {
        Self::with_page_size(client, PAGE_SIZE)
    }

    pub fn with_page_size(client: C, page_size: u32) -> Self {
        Self {
            client,
            page_size: page_size.max(1),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Every vote on `proposal`, newest first, in fetch order.
    ///
    /// Any failed page aborts the whole listing; nothing fetched before the
    /// failure is returned. Rows with a blank voter are dropped after paging,
    /// so they still count towards a full page.
    pub async fn fetch_all_votes(&self, proposal: &ProposalId) -> Result<Vec<Vote>, ClientError> {
        let rows: Vec<VoteRow> = self
            .fetch_all(|cursor| GraphQlQuery::votes(proposal, cursor))
            .await?;
        let fetched = rows.len();
        let votes: Vec<Vote> = rows
            .into_iter()
            .filter(|row| row.voter.is_valid())
            .map(Vote::from)
            .collect();
        if votes.len() < fetched {
            tracing::warn!(
                proposal = %proposal,
                dropped = fetched - votes.len(),
                "skipping vote rows without a voter"
            );
        }
        Ok(votes)
    }

    /// Every closed proposal of `space`, newest first.
    pub async fn fetch_closed_proposals(&self, space: &str) -> Result<Vec<Proposal>, ClientError> {
        self.fetch_all(|cursor| GraphQlQuery::proposals(space, cursor))
            .await
    }

    async fn fetch_all<T, F>(&self, mut make_query: F) -> Result<Vec<T>, ClientError>
    where
        T: DeserializeOwned,
        F: FnMut(PageCursor) -> GraphQlQuery,
    {
        let mut cursor = PageCursor::first(self.page_size);
        let mut rows = Vec::new();
        loop {
            let query = make_query(cursor);
            let page: Vec<T> = self.fetch_page(&query).await?;
            let returned = page.len();
            tracing::debug!(
                field = query.root_field(),
                offset = cursor.offset(),
                returned,
                "fetched page"
            );
            rows.extend(page);
            match cursor.next(returned) {
                Some(next) => cursor = next,
                None => return Ok(rows),
            }
        }
    }

    async fn fetch_page<T: DeserializeOwned>(&self, query: &GraphQlQuery) -> Result<Vec<T>, ClientError> {
        let mut data = self.client.query(query).await?;
        let field = query.root_field();
        let rows = data
            .get_mut(field)
            .map(serde_json::Value::take)
            .ok_or_else(|| ClientError::Protocol(format!("response is missing `{field}`")))?;
        serde_json::from_value(rows)
            .map_err(|e| ClientError::Protocol(format!("malformed `{field}` rows: {e}")))
    }
}
