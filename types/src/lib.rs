//! Fundamental types for tally.
//!
//! Value types shared by every other crate in the workspace: voter
//! addresses, proposal identifiers, and the vote records pulled from the
//! registry. All of them are immutable once constructed.

pub mod address;
pub mod proposal;

pub use address::VoterAddress;
pub use proposal::{Proposal, ProposalId, Vote};
