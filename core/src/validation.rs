use std::collections::HashSet;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::BallotError;
use crate::state::{sum_votes, Vote};

/// Round-configured allocation limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoteCaps {
    pub max_votes_total: f64,
    pub max_votes_project: f64,
}

/// Check a candidate vote list against the round caps.
///
/// Amounts must be finite and non-negative, a project may appear once, no
/// entry may exceed the per-project cap and the sum may not exceed the total
/// cap. Nothing is persisted here; callers reject the request on error.
pub fn validate_ballot(votes: &[Vote], caps: &VoteCaps) -> Result<(), BallotError> {
    let mut seen = HashSet::with_capacity(votes.len());

    for vote in votes {
        if !vote.amount.is_finite() || vote.amount < 0.0 {
            return Err(BallotError::InvalidAmount {
                project_id: vote.project_id.clone(),
                amount: vote.amount,
            });
        }
        if !seen.insert(vote.project_id.as_str()) {
            return Err(BallotError::DuplicateProject(vote.project_id.clone()));
        }
    }

    let within_project_cap = votes
        .iter()
        .all(|vote| vote.amount <= caps.max_votes_project);
    let total = sum_votes(votes);

    if !within_project_cap || total > caps.max_votes_total {
        debug!(
            "Ballot rejected: total={} caps={:?} within_project_cap={}",
            total, caps, within_project_cap
        );
        return Err(BallotError::CapExceeded {
            max_total: caps.max_votes_total,
            max_project: caps.max_votes_project,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAPS: VoteCaps = VoteCaps {
        max_votes_total: 100.0,
        max_votes_project: 40.0,
    };

    fn votes(amounts: &[f64]) -> Vec<Vote> {
        amounts
            .iter()
            .enumerate()
            .map(|(i, amount)| Vote::new(format!("project-{i}"), *amount))
            .collect()
    }

    #[test]
    fn accepts_ballots_within_caps() {
        assert!(validate_ballot(&[], &CAPS).is_ok());
        assert!(validate_ballot(&votes(&[40.0, 40.0, 20.0]), &CAPS).is_ok());
        assert!(validate_ballot(&votes(&[0.5, 39.5, 0.0]), &CAPS).is_ok());
    }

    #[test]
    fn accepts_every_split_within_caps() {
        for a in (0..=40).step_by(5) {
            for b in (0..=40).step_by(5) {
                let c = (100 - a - b).min(40);
                let ballot = votes(&[a as f64, b as f64, c as f64]);
                assert!(validate_ballot(&ballot, &CAPS).is_ok(), "{a} {b} {c}");
            }
        }
    }

    #[test]
    fn rejects_project_over_cap() {
        let err = validate_ballot(&votes(&[40.5]), &CAPS).unwrap_err();
        assert_eq!(
            err,
            BallotError::CapExceeded {
                max_total: 100.0,
                max_project: 40.0
            }
        );
    }

    #[test]
    fn rejects_total_over_cap() {
        let err = validate_ballot(&votes(&[40.0, 40.0, 20.5]), &CAPS).unwrap_err();
        assert!(matches!(err, BallotError::CapExceeded { .. }));
    }

    #[test]
    fn rejects_any_ballot_when_caps_unset() {
        let caps = VoteCaps {
            max_votes_total: 0.0,
            max_votes_project: 0.0,
        };
        assert!(validate_ballot(&votes(&[1.0]), &caps).is_err());
        assert!(validate_ballot(&votes(&[0.0]), &caps).is_ok());
    }

    #[test]
    fn rejects_negative_and_nan_amounts() {
        assert!(matches!(
            validate_ballot(&votes(&[-1.0]), &CAPS),
            Err(BallotError::InvalidAmount { .. })
        ));
        assert!(matches!(
            validate_ballot(&votes(&[f64::NAN]), &CAPS),
            Err(BallotError::InvalidAmount { .. })
        ));
        assert!(matches!(
            validate_ballot(&votes(&[f64::INFINITY]), &CAPS),
            Err(BallotError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_projects() {
        let ballot = vec![Vote::new("p1", 10.0), Vote::new("p1", 5.0)];
        assert_eq!(
            validate_ballot(&ballot, &CAPS),
            Err(BallotError::DuplicateProject("p1".to_string()))
        );
    }
}
