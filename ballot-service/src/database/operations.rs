use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use retro_core::{commitment::canonical_votes, Round, Vote};
use sqlx::{
    sqlite::{SqlitePool, SqliteRow},
    Row,
};
use tracing::debug;

use super::models::*;
use super::sql::{PUBLISH_BALLOT_SQL, SAVE_BALLOT_SQL, UPSERT_ROUND_SQL};

/// Database operations for round configuration
impl RoundRecord {
    pub async fn upsert(round: &Round, pool: &SqlitePool) -> Result<()> {
        debug!("Upserting round {}", round.id);

        sqlx::query(UPSERT_ROUND_SQL)
            .bind(&round.id)
            .bind(&round.name)
            .bind(round.start_at)
            .bind(round.review_at)
            .bind(round.vote_at)
            .bind(round.result_at)
            .bind(round.payout_at)
            .bind(round.max_votes_total)
            .bind(round.max_votes_project)
            .bind(i64::try_from(round.chain_id)?)
            .bind(round.calculation.to_string())
            .bind(round.threshold.map(i64::from))
            .bind(round.pool_amount)
            .bind(Utc::now())
            .execute(pool)
            .await?;

        Ok(())
    }

    pub async fn get(pool: &SqlitePool, round_id: &str) -> Result<Option<RoundRecord>> {
        let row = sqlx::query("SELECT * FROM rounds WHERE id = ?")
            .bind(round_id)
            .fetch_optional(pool)
            .await?;

        row.map(|row| Self::from_row(&row)).transpose()
    }

    fn from_row(row: &SqliteRow) -> Result<Self> {
        let chain_id: i64 = row.try_get("chain_id")?;
        let calculation: String = row.try_get("calculation")?;
        let threshold: Option<i64> = row.try_get("threshold")?;

        Ok(RoundRecord {
            round: Round {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                start_at: row.try_get("start_at")?,
                review_at: row.try_get("review_at")?,
                vote_at: row.try_get("vote_at")?,
                result_at: row.try_get("result_at")?,
                payout_at: row.try_get("payout_at")?,
                max_votes_total: row.try_get("max_votes_total")?,
                max_votes_project: row.try_get("max_votes_project")?,
                chain_id: u64::try_from(chain_id)?,
                calculation: calculation.parse().map_err(|e: String| anyhow!(e))?,
                threshold: threshold.map(u32::try_from).transpose()?,
                pool_amount: row.try_get("pool_amount")?,
            },
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Database operations for voter approvals
impl VoterRecord {
    /// Returns false when the voter was already approved.
    pub async fn insert(&self, pool: &SqlitePool) -> Result<bool> {
        debug!(
            "Approving voter {} for round {}",
            self.voter_id, self.round_id
        );

        let result = sqlx::query(
            "INSERT OR IGNORE INTO voters (round_id, voter_id, approved_at) VALUES (?, ?, ?)",
        )
        .bind(&self.round_id)
        .bind(&self.voter_id)
        .bind(self.approved_at)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn is_approved(pool: &SqlitePool, round_id: &str, voter_id: &str) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM voters WHERE round_id = ? AND voter_id = ?")
                .bind(round_id)
                .bind(voter_id)
                .fetch_one(pool)
                .await?;
        Ok(count > 0)
    }
}

/// Database operations for ballots
impl BallotRecord {
    pub async fn get(
        pool: &SqlitePool,
        round_id: &str,
        voter_id: &str,
    ) -> Result<Option<BallotRecord>> {
        let row = sqlx::query("SELECT * FROM ballots WHERE round_id = ? AND voter_id = ?")
            .bind(round_id)
            .bind(voter_id)
            .fetch_optional(pool)
            .await?;

        row.map(|row| Self::from_row(&row)).transpose()
    }

    /// Create or replace the voter's votes. Returns false if the ballot is already published.
    pub async fn save(
        pool: &SqlitePool,
        round_id: &str,
        voter_id: &str,
        votes: &[Vote],
        now: DateTime<Utc>,
    ) -> Result<bool> {
        debug!(
            "Saving ballot for voter {} in round {} ({} votes)",
            voter_id,
            round_id,
            votes.len()
        );

        let result = sqlx::query(SAVE_BALLOT_SQL)
            .bind(round_id)
            .bind(voter_id)
            .bind(canonical_votes(votes))
            .bind(now)
            .bind(now)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Attach the signature if the stored votes are still `votes` and the ballot
    /// is unpublished. Returns false when no row qualified.
    pub async fn publish(
        pool: &SqlitePool,
        round_id: &str,
        voter_id: &str,
        votes: &[Vote],
        signature: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        debug!("Publishing ballot for voter {} in round {}", voter_id, round_id);

        let result = sqlx::query(PUBLISH_BALLOT_SQL)
            .bind(now)
            .bind(signature)
            .bind(round_id)
            .bind(voter_id)
            .bind(canonical_votes(votes))
            .execute(pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn list_published(pool: &SqlitePool, round_id: &str) -> Result<Vec<BallotRecord>> {
        let rows = sqlx::query(
            "SELECT * FROM ballots WHERE round_id = ? AND published_at IS NOT NULL ORDER BY id",
        )
        .bind(round_id)
        .fetch_all(pool)
        .await?;

        rows.iter().map(Self::from_row).collect()
    }

    fn from_row(row: &SqliteRow) -> Result<Self> {
        let votes_json: String = row.try_get("votes")?;

        Ok(BallotRecord {
            id: row.try_get("id")?,
            round_id: row.try_get("round_id")?,
            voter_id: row.try_get("voter_id")?,
            votes: serde_json::from_str(&votes_json)?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            published_at: row.try_get("published_at")?,
            signature: row.try_get("signature")?,
        })
    }
}
