use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("only {available} distinct voters indexed, {requested} requested")]
    InsufficientVoters { requested: usize, available: usize },

    #[error("no proposals to compute a voting rate against")]
    NoProposals,
}
