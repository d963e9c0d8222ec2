//! Rank index over per-address vote counts.
//!
//! Two views over the same fact, "how many proposals has this address voted
//! on", are kept in lockstep:
//! - address → count, for point lookups and rate queries;
//! - count → addresses, ordered by count, so the top-K leaderboard is read
//!   off the highest buckets without scanning every voter.

pub mod error;
pub mod leaderboard;
pub mod rank;

pub use error::IndexError;
pub use leaderboard::{LeaderboardRow, DEFAULT_TOP_K};
pub use rank::{voting_rate, RankIndex};
