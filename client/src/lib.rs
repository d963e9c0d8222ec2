//! Query client for the governance registry.
//!
//! The registry is a Snapshot-style GraphQL hub reached over a single POST
//! endpoint. This crate knows how to phrase the two read-only queries tally
//! needs and how to unwrap the GraphQL response envelope; it never retries.
//!
//! Design:
//! - [`QueryClient`] is the seam: one request in, the `data` object out.
//! - [`HttpQueryClient`] is the production implementation over `reqwest`.
//! - Pagination is `first`/`skip` based; [`PageCursor`] tracks the offset and
//!   decides when the last page has been seen.

pub mod error;
pub mod http;
pub mod pagination;
pub mod query;

pub use error::ClientError;
pub use http::HttpQueryClient;
pub use pagination::{PageCursor, PAGE_SIZE};
pub use query::{extract_data, GraphQlQuery, QueryClient};
