//! Aggregation of published ballots into per-project results

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::state::Vote;

/// How individual vote amounts are combined per project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Calculation {
    /// Quadratic-style: sum of square roots of the amounts. Rounds
    /// configured with the name `sum` get this mode.
    #[default]
    #[serde(alias = "sum", alias = "quadratic")]
    Sqrt,
    /// Linear sum of the raw amounts.
    Linear,
    /// Median of the amounts.
    Median,
}

impl FromStr for Calculation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqrt" | "sum" | "quadratic" => Ok(Calculation::Sqrt),
            "linear" => Ok(Calculation::Linear),
            "median" | "op" => Ok(Calculation::Median),
            _ => Err(format!("invalid calculation: {}", s)),
        }
    }
}

impl fmt::Display for Calculation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Calculation::Sqrt => "sqrt",
            Calculation::Linear => "linear",
            Calculation::Median => "median",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationOptions {
    pub calculation: Calculation,
    /// Projects with fewer distinct voters are left out
    pub threshold: Option<u32>,
}

/// The part of a published ballot the aggregator needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedBallot {
    pub voter_id: String,
    pub votes: Vec<Vote>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectResult {
    pub voters: u32,
    pub votes: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payout: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundResults {
    pub total_voters: u32,
    pub total_votes: f64,
    pub projects: BTreeMap<String, ProjectResult>,
}

impl RoundResults {
    /// Distribute `pool_amount` across projects proportionally to their votes.
    pub fn with_payouts(mut self, pool_amount: f64) -> Self {
        for project in self.projects.values_mut() {
            let share = if self.total_votes > 0.0 {
                project.votes / self.total_votes
            } else {
                0.0
            };
            project.payout = Some(pool_amount * share);
        }
        self
    }
}

/// Fold published ballots into per-project `{voters, votes}`.
///
/// Amounts are collected per project and sorted before being combined, so
/// the output does not depend on the order of `ballots`. Zero allocations do
/// not count as a vote.
pub fn calculate_votes(ballots: &[PublishedBallot], options: &CalculationOptions) -> RoundResults {
    let mut per_project: BTreeMap<&str, (BTreeSet<&str>, Vec<f64>)> = BTreeMap::new();

    for ballot in ballots {
        for vote in ballot.votes.iter().filter(|vote| vote.amount > 0.0) {
            let (voters, amounts) = per_project.entry(vote.project_id.as_str()).or_default();
            voters.insert(ballot.voter_id.as_str());
            amounts.push(vote.amount);
        }
    }

    let threshold = options.threshold.unwrap_or(0) as usize;
    let mut all_voters = BTreeSet::new();
    let mut projects = BTreeMap::new();

    for (project_id, (voters, mut amounts)) in per_project {
        if voters.len() < threshold {
            continue;
        }
        amounts.sort_by(f64::total_cmp);
        let votes: f64 = match options.calculation {
            Calculation::Sqrt => amounts.iter().map(|amount| amount.sqrt()).sum(),
            Calculation::Linear => amounts.iter().sum(),
            Calculation::Median => median(&amounts),
        };

        all_voters.extend(voters.iter().copied());
        projects.insert(
            project_id.to_string(),
            ProjectResult {
                voters: voters.len() as u32,
                votes,
                payout: None,
            },
        );
    }

    let mut totals: Vec<f64> = projects.values().map(|p| p.votes).collect();
    totals.sort_by(f64::total_cmp);

    RoundResults {
        total_voters: all_voters.len() as u32,
        total_votes: totals.iter().sum(),
        projects,
    }
}

/// Median of sorted values; mean of the two middle values for even lengths.
fn median(sorted: &[f64]) -> f64 {
    let len = sorted.len();
    if len == 0 {
        return 0.0;
    }
    if len % 2 == 0 {
        (sorted[len / 2 - 1] + sorted[len / 2]) / 2.0
    } else {
        sorted[len / 2]
    }
}
