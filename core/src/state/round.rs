use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BallotError;
use crate::results::{Calculation, CalculationOptions};
use crate::validation::VoteCaps;

/// Stage of a round, derived from its configured timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    Upcoming,
    Application,
    Review,
    Voting,
    Result,
    Payout,
}

/// A configured voting/funding cycle with caps and timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    /// Taken from the request path when omitted
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub review_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub vote_at: Option<DateTime<Utc>>,
    /// Results are revealed and voting closes after this instant
    #[serde(default)]
    pub result_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payout_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub max_votes_total: Option<f64>,
    #[serde(default)]
    pub max_votes_project: Option<f64>,
    /// Chain id bound into the typed-data signing domain
    pub chain_id: u64,
    #[serde(default)]
    pub calculation: Calculation,
    /// Minimum distinct voters for a project to appear in results
    #[serde(default)]
    pub threshold: Option<u32>,
    /// Funds distributed proportionally to votes
    #[serde(default)]
    pub pool_amount: Option<f64>,
}

impl Round {
    pub fn new(id: impl Into<String>, chain_id: u64) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            start_at: None,
            review_at: None,
            vote_at: None,
            result_at: None,
            payout_at: None,
            max_votes_total: None,
            max_votes_project: None,
            chain_id,
            calculation: Calculation::default(),
            threshold: None,
            pool_amount: None,
        }
    }

    /// Caps used by the validator. Unset caps allow nothing.
    pub fn caps(&self) -> VoteCaps {
        VoteCaps {
            max_votes_total: self.max_votes_total.unwrap_or(0.0),
            max_votes_project: self.max_votes_project.unwrap_or(0.0),
        }
    }

    pub fn phase(&self, now: DateTime<Utc>) -> RoundPhase {
        let steps = [
            (RoundPhase::Application, self.start_at),
            (RoundPhase::Review, self.review_at),
            (RoundPhase::Voting, self.vote_at),
            (RoundPhase::Result, self.result_at),
            (RoundPhase::Payout, self.payout_at),
        ];

        steps
            .iter()
            .filter_map(|(phase, at)| at.filter(|at| *at <= now).map(|_| *phase))
            .last()
            .unwrap_or(RoundPhase::Upcoming)
    }

    /// Gate for saving a ballot: the round must have a reveal time that has not passed.
    pub fn ensure_accepts_ballots(&self, now: DateTime<Utc>) -> Result<(), BallotError> {
        let result_at = self
            .result_at
            .ok_or(BallotError::ConfigurationError("result_at"))?;
        if now > result_at {
            return Err(BallotError::VotingClosed);
        }
        Ok(())
    }

    /// Gate for publishing: saving rules plus a positive total cap.
    pub fn ensure_accepts_publish(&self, now: DateTime<Utc>) -> Result<(), BallotError> {
        match self.max_votes_total {
            Some(total) if total > 0.0 => {}
            _ => return Err(BallotError::ConfigurationError("max_votes_total")),
        }
        self.ensure_accepts_ballots(now)
    }

    pub fn results_revealed(&self, now: DateTime<Utc>) -> bool {
        self.result_at.is_some_and(|result_at| now >= result_at)
    }

    pub fn calculation_options(&self) -> CalculationOptions {
        CalculationOptions {
            calculation: self.calculation,
            threshold: self.threshold,
        }
    }
}
