//! Ingestion: registry → rank index.
//!
//! [`VoteFetcher`] walks the registry's `first`/`skip` pages until a short
//! page ends the listing. [`Ingestor`] drives it once per closed proposal,
//! retrying a failed proposal as a whole under a [`RetryPolicy`] and applying
//! only complete vote lists to the [`tally_index::RankIndex`].
//!
//! Proposals are processed strictly in order: a retry is awaited before the
//! next proposal starts, so the index is complete when `ingest` returns.

pub mod error;
pub mod fetcher;
pub mod ingestor;
pub mod retry;

pub use error::IngestError;
pub use fetcher::VoteFetcher;
pub use ingestor::{IngestOptions, IngestReport, Ingestor};
pub use retry::{Attempted, Exhausted, RetryPolicy};
