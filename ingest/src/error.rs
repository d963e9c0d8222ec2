use tally_client::ClientError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("giving up on {target} after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        target: String,
        attempts: u32,
        #[source]
        last_error: ClientError,
    },

    #[error("space {0} has no closed proposals")]
    NoProposals(String),
}
