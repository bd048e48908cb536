//! Round results, revealed once the round reaches its result time

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use chrono::{DateTime, Utc};
use retro_core::{calculate_votes, BallotError, PublishedBallot};
use tracing::info;

use crate::database::models::BallotRecord;
use crate::database::Database;
use crate::error::ApiError;
use crate::metrics;
use crate::rounds::load_round;
use crate::state::AppState;
use crate::types::{ResultsQuery, ResultsResponse};

/// Handle GET /rounds/{round_id}/results
pub async fn handle_get_results(
    State(app_state): State<AppState>,
    Path(round_id): Path<String>,
    Query(query): Query<ResultsQuery>,
) -> Result<Json<ResultsResponse>, ApiError> {
    info!("GET /rounds/{}/results - Results requested", round_id);

    let response = round_results(&app_state.db, &round_id, &query, Utc::now()).await?;
    metrics::record_results_read();
    Ok(Json(response))
}

pub async fn round_results(
    db: &Database,
    round_id: &str,
    query: &ResultsQuery,
    now: DateTime<Utc>,
) -> Result<ResultsResponse, ApiError> {
    let round = load_round(db, round_id).await?;
    if !round.results_revealed(now) {
        return Err(BallotError::ResultsNotReady.into());
    }

    let mut options = round.calculation_options();
    if let Some(calculation) = query.calculation {
        options.calculation = calculation;
    }
    if query.threshold.is_some() {
        options.threshold = query.threshold;
    }

    let ballots: Vec<PublishedBallot> = BallotRecord::list_published(db.pool(), &round.id)
        .await?
        .into_iter()
        .map(PublishedBallot::from)
        .collect();

    let mut results = calculate_votes(&ballots, &options);
    if let Some(pool_amount) = round.pool_amount {
        results = results.with_payouts(pool_amount);
    }

    info!(
        "Results for round {}: {} ballots, {} projects ({})",
        round.id,
        ballots.len(),
        results.projects.len(),
        options.calculation
    );

    Ok(ResultsResponse {
        round_id: round.id,
        calculation: options.calculation,
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::RoundRecord;
    use chrono::Duration;
    use retro_core::{Calculation, Round, Vote};

    const ROUND: &str = "round-1";

    async fn setup(result_at: DateTime<Utc>) -> Database {
        let db = Database::connect(":memory:").await.unwrap();
        let round = Round {
            result_at: Some(result_at),
            max_votes_total: Some(100.0),
            max_votes_project: Some(100.0),
            pool_amount: Some(1000.0),
            ..Round::new(ROUND, 10)
        };
        RoundRecord::upsert(&round, db.pool()).await.unwrap();
        db
    }

    async fn publish(db: &Database, voter: &str, votes: Vec<Vote>) {
        let now = Utc::now() - Duration::hours(1);
        BallotRecord::save(db.pool(), ROUND, voter, &votes, now)
            .await
            .unwrap();
        assert!(
            BallotRecord::publish(db.pool(), ROUND, voter, &votes, "0xsig", now)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn hidden_before_result_time() {
        let db = setup(Utc::now() + Duration::days(1)).await;
        let result = round_results(&db, ROUND, &ResultsQuery::default(), Utc::now()).await;
        assert!(matches!(
            result,
            Err(ApiError::Ballot(BallotError::ResultsNotReady))
        ));
    }

    #[tokio::test]
    async fn ignores_unpublished_ballots() {
        let db = setup(Utc::now() - Duration::minutes(1)).await;
        publish(&db, "0xa", vec![Vote::new("p1", 4.0), Vote::new("p2", 0.0)]).await;
        publish(&db, "0xb", vec![Vote::new("p1", 9.0)]).await;
        BallotRecord::save(
            db.pool(),
            ROUND,
            "0xc",
            &[Vote::new("p2", 100.0)],
            Utc::now(),
        )
        .await
        .unwrap();

        let query = ResultsQuery {
            calculation: Some(Calculation::Linear),
            threshold: None,
        };
        let response = round_results(&db, ROUND, &query, Utc::now()).await.unwrap();
        assert_eq!(response.calculation, Calculation::Linear);
        assert_eq!(response.results.total_voters, 2);
        assert_eq!(response.results.total_votes, 13.0);
        assert_eq!(response.results.projects["p1"].voters, 2);
        assert_eq!(response.results.projects["p1"].payout, Some(1000.0));
        assert!(!response.results.projects.contains_key("p2"));
    }

    #[tokio::test]
    async fn defaults_to_round_calculation() {
        let db = setup(Utc::now() - Duration::minutes(1)).await;
        publish(&db, "0xa", vec![Vote::new("p1", 4.0)]).await;
        publish(&db, "0xb", vec![Vote::new("p1", 9.0)]).await;

        let response = round_results(&db, ROUND, &ResultsQuery::default(), Utc::now())
            .await
            .unwrap();
        assert_eq!(response.calculation, Calculation::Sqrt);
        assert_eq!(response.results.projects["p1"].votes, 5.0);

        let query = ResultsQuery {
            calculation: None,
            threshold: Some(3),
        };
        let response = round_results(&db, ROUND, &query, Utc::now()).await.unwrap();
        assert!(response.results.projects.is_empty());
    }
}
