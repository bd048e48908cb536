use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BallotError {
    #[error("Round not configured properly: missing {0}")]
    ConfigurationError(&'static str),
    #[error("Voting has ended")]
    VotingClosed,
    #[error("Ballot already published")]
    AlreadyPublished,
    #[error("Ballot must have a maximum of {max_total} votes and {max_project} per project")]
    CapExceeded { max_total: f64, max_project: f64 },
    #[error("Invalid vote amount {amount} for project {project_id}")]
    InvalidAmount { project_id: String, amount: f64 },
    #[error("Project {0} appears more than once in the ballot")]
    DuplicateProject(String),
    #[error("Votes hash mismatch")]
    HashMismatch,
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),
    #[error("Results are not revealed yet")]
    ResultsNotReady,
}

impl BallotError {
    /// Stable machine-readable identifier for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            BallotError::ConfigurationError(_) => "configuration_error",
            BallotError::VotingClosed => "voting_closed",
            BallotError::AlreadyPublished => "already_published",
            BallotError::CapExceeded { .. } => "cap_exceeded",
            BallotError::InvalidAmount { .. } => "invalid_amount",
            BallotError::DuplicateProject(_) => "duplicate_project",
            BallotError::HashMismatch => "hash_mismatch",
            BallotError::Unauthorized(_) | BallotError::InvalidSignature(_) => "unauthorized",
            BallotError::ResultsNotReady => "results_not_ready",
        }
    }
}
