//! Ballot pipeline for retroactive funding rounds: cap validation, vote
//! commitments, typed-data signatures and results aggregation.

pub mod commitment;
pub mod error;
pub mod results;
pub mod state;
pub mod typed_data;
pub mod validation;

pub use commitment::{hash_votes, verify_votes_hash};
pub use error::BallotError;
pub use results::{calculate_votes, Calculation, CalculationOptions, PublishedBallot, RoundResults};
pub use state::*;
pub use typed_data::{Address, BallotMessage};
pub use validation::{validate_ballot, VoteCaps};
