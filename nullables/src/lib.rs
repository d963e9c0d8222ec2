//! Nullable infrastructure for deterministic testing.
//!
//! The registry is the only external dependency tally has. This crate
//! provides an in-memory stand-in that:
//! - Serves proposals and votes from fixed data, honouring `first`/`skip`
//! - Fails on demand, per proposal and per page
//! - Records every request for assertions
//! - Never touches the network
//!
//! Usage: hand a [`NullQueryClient`] to anything generic over `QueryClient`.

pub mod client;

pub use client::{FailureKind, NullQueryClient};
