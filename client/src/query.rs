//! GraphQL query shapes and the client seam.

use serde::Deserialize;
use serde_json::{json, Value};
use tally_types::ProposalId;

use crate::error::ClientError;
use crate::pagination::PageCursor;

/// Closed proposals of a space, newest first.
const PROPOSALS_DOCUMENT: &str = r#"query Proposals($space: String!, $first: Int!, $skip: Int!) {
  proposals(
    first: $first
    skip: $skip
    where: { space: $space, state: "closed" }
    orderBy: "created"
    orderDirection: desc
  ) {
    id
  }
}"#;

/// Votes on one proposal, newest first.
const VOTES_DOCUMENT: &str = r#"query Votes($proposal: String!, $first: Int!, $skip: Int!) {
  votes(
    first: $first
    skip: $skip
    where: { proposal: $proposal }
    orderBy: "created"
    orderDirection: desc
  ) {
    voter
    proposal {
      id
    }
  }
}"#;

/// One page of one of the two read-only listings the registry serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphQlQuery {
    Proposals {
        space: String,
        first: u32,
        skip: u64,
    },
    Votes {
        proposal: ProposalId,
        first: u32,
        skip: u64,
    },
}

impl GraphQlQuery {
    pub fn proposals(space: &str, cursor: PageCursor) -> Self {
        Self::Proposals {
            space: space.to_string(),
            first: cursor.page_size(),
            skip: cursor.offset(),
        }
    }

    pub fn votes(proposal: &ProposalId, cursor: PageCursor) -> Self {
        Self::Votes {
            proposal: proposal.clone(),
            first: cursor.page_size(),
            skip: cursor.offset(),
        }
    }

    /// Name of the field under `data` that holds the returned rows.
    pub fn root_field(&self) -> &'static str {
        match self {
            Self::Proposals { .. } => "proposals",
            Self::Votes { .. } => "votes",
        }
    }

    pub fn document(&self) -> &'static str {
        match self {
            Self::Proposals { .. } => PROPOSALS_DOCUMENT,
            Self::Votes { .. } => VOTES_DOCUMENT,
        }
    }

    pub fn variables(&self) -> Value {
        match self {
            Self::Proposals { space, first, skip } => {
                json!({ "space": space, "first": first, "skip": skip })
            }
            Self::Votes {
                proposal,
                first,
                skip,
            } => json!({ "proposal": proposal.as_str(), "first": first, "skip": skip }),
        }
    }

    /// The POST body: `{"query": ..., "variables": ...}`.
    pub fn to_body(&self) -> Value {
        json!({ "query": self.document(), "variables": self.variables() })
    }
}

/// A single request/response round trip against the registry.
///
/// Implementations return the `data` object of the response. Failures are
/// reported as-is; retrying is the caller's business.
#[allow(async_fn_in_trait)]
pub trait QueryClient {
    async fn query(&self, query: &GraphQlQuery) -> Result<Value, ClientError>;
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<Value>,
    /// Some hubs send `"errors": null` alongside good data.
    #[serde(default)]
    errors: Option<Vec<ErrorEntry>>,
}

#[derive(Debug, Deserialize)]
struct ErrorEntry {
    #[serde(default)]
    message: Option<String>,
}

/// Unwrap a GraphQL response envelope into its `data` object.
///
/// A non-empty `errors` array wins over any partial `data`.
pub fn extract_data(body: Value) -> Result<Value, ClientError> {
    let envelope: Envelope = serde_json::from_value(body)
        .map_err(|e| ClientError::Protocol(format!("malformed response envelope: {e}")))?;

    let errors = envelope.errors.unwrap_or_default();
    if !errors.is_empty() {
        let messages: Vec<&str> = errors
            .iter()
            .map(|e| e.message.as_deref().unwrap_or("unknown error"))
            .collect();
        return Err(ClientError::Protocol(format!(
            "registry returned errors: {}",
            messages.join("; ")
        )));
    }

    match envelope.data {
        Some(data) if !data.is_null() => Ok(data),
        _ => Err(ClientError::Protocol("response carried no data".into())),
    }
}
