mod common;
use common::{admin, setup_server, Wallet};

use chrono::{Duration, Utc};
use reqwest::{Client, Response, StatusCode};
use retro_core::{typed_data::sign_ballot, BallotMessage, Vote};
use serde_json::{json, Value};

const ROUND: &str = "round-1";
const CHAIN_ID: u64 = 10;

async fn error_kind(resp: Response, expected: StatusCode) -> anyhow::Result<String> {
    assert_eq!(resp.status(), expected);
    let body: Value = resp.json().await?;
    Ok(body["error"].as_str().unwrap_or_default().to_string())
}

fn round_config(result_at: chrono::DateTime<Utc>) -> Value {
    json!({
        "name": "Retro Round 1",
        "vote_at": (Utc::now() - Duration::days(1)).to_rfc3339(),
        "result_at": result_at.to_rfc3339(),
        "max_votes_total": 100,
        "max_votes_project": 50,
        "chain_id": CHAIN_ID,
        "pool_amount": 1000,
    })
}

fn publish_body(wallet: &Wallet, votes: &[Vote]) -> anyhow::Result<Value> {
    let message = BallotMessage::for_votes(votes);
    let signature = sign_ballot(&wallet.key, CHAIN_ID, &message)?;
    Ok(json!({
        "signature": signature,
        "chainId": CHAIN_ID,
        "message": message,
    }))
}

#[tokio::test]
#[serial_test::serial]
async fn e2e_binary_endpoints() -> anyhow::Result<()> {
    let (base_url, _guard) = setup_server().await?;
    let client = Client::new();

    // Test GET /healthz
    let health = client.get(format!("{}/healthz", base_url)).send().await?;
    assert!(health.status().is_success());

    // Test GET /meta
    let meta: Value = client
        .get(format!("{}/meta", base_url))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    assert_eq!(meta["service"], "ballot-service");
    assert_eq!(meta["schema_version"], meta["expected_schema_version"]);

    // Admin routes need the token
    let resp = client
        .put(format!("{}/admin/rounds/{}", base_url, ROUND))
        .json(&round_config(Utc::now() + Duration::days(1)))
        .send()
        .await?;
    assert_eq!(error_kind(resp, StatusCode::UNAUTHORIZED).await?, "unauthenticated");

    let round: Value = admin(client.put(format!("{}/admin/rounds/{}", base_url, ROUND)))
        .json(&round_config(Utc::now() + Duration::days(1)))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    assert_eq!(round["id"], ROUND);
    assert_eq!(round["phase"], "voting");
    assert_eq!(round["calculation"], "sqrt");

    let round: Value = client
        .get(format!("{}/rounds/{}", base_url, ROUND))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    assert_eq!(round["chain_id"], CHAIN_ID);

    let alice = Wallet::new(0x11);
    let bob = Wallet::new(0x22);

    let approved: Value = admin(client.post(format!("{}/admin/rounds/{}/voters", base_url, ROUND)))
        .json(&json!({ "voters": [alice.address.to_string().to_uppercase().replace("0X", "0x")] }))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    assert_eq!(approved["approved"], 1);

    // Ballot routes need a session
    let resp = client
        .get(format!("{}/rounds/{}/ballot", base_url, ROUND))
        .send()
        .await?;
    assert_eq!(error_kind(resp, StatusCode::UNAUTHORIZED).await?, "unauthenticated");

    let token = alice.sign_in(&client, &base_url).await?;
    let ballot_url = format!("{}/rounds/{}/ballot", base_url, ROUND);

    let draft: Value = client
        .get(&ballot_url)
        .bearer_auth(&token)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    assert_eq!(draft["status"], "draft");
    assert_eq!(draft["voter_id"], alice.address.to_string());

    // Over the per-project cap
    let resp = client
        .put(&ballot_url)
        .bearer_auth(&token)
        .json(&json!({ "votes": [{ "projectId": "p1", "amount": 60 }] }))
        .send()
        .await?;
    assert_eq!(error_kind(resp, StatusCode::BAD_REQUEST).await?, "cap_exceeded");

    let votes = vec![Vote::new("p1", 20.0), Vote::new("p2", 30.0)];
    let saved: Value = client
        .put(&ballot_url)
        .bearer_auth(&token)
        .json(&json!({ "votes": votes }))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    assert_eq!(saved["status"], "saved");
    assert_eq!(saved["hashed_votes"], retro_core::hash_votes(&votes));

    // A message committing to different votes is rejected
    let tampered = publish_body(&alice, &[Vote::new("p1", 50.0), Vote::new("p2", 50.0)])?;
    let resp = client
        .post(format!("{}/publish", ballot_url))
        .bearer_auth(&token)
        .json(&tampered)
        .send()
        .await?;
    assert_eq!(error_kind(resp, StatusCode::BAD_REQUEST).await?, "hash_mismatch");

    let published: Value = client
        .post(format!("{}/publish", ballot_url))
        .bearer_auth(&token)
        .json(&publish_body(&alice, &votes)?)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    assert_eq!(published["status"], "published");
    assert!(published["published_at"].is_string());

    let resp = client
        .post(format!("{}/publish", ballot_url))
        .bearer_auth(&token)
        .json(&publish_body(&alice, &votes)?)
        .send()
        .await?;
    assert_eq!(error_kind(resp, StatusCode::FORBIDDEN).await?, "already_published");

    let resp = client
        .put(&ballot_url)
        .bearer_auth(&token)
        .json(&json!({ "votes": [{ "projectId": "p1", "amount": 1 }] }))
        .send()
        .await?;
    assert_eq!(error_kind(resp, StatusCode::FORBIDDEN).await?, "already_published");

    // Bob is not on the approved list
    let bob_token = bob.sign_in(&client, &base_url).await?;
    let bob_votes = vec![Vote::new("p2", 40.0)];
    client
        .put(&ballot_url)
        .bearer_auth(&bob_token)
        .json(&json!({ "votes": bob_votes }))
        .send()
        .await?
        .error_for_status()?;
    let resp = client
        .post(format!("{}/publish", ballot_url))
        .bearer_auth(&bob_token)
        .json(&publish_body(&bob, &bob_votes)?)
        .send()
        .await?;
    assert_eq!(error_kind(resp, StatusCode::UNAUTHORIZED).await?, "unauthorized");

    // Results stay hidden until the result time
    let results_url = format!("{}/rounds/{}/results", base_url, ROUND);
    let resp = client.get(&results_url).send().await?;
    assert_eq!(error_kind(resp, StatusCode::FORBIDDEN).await?, "results_not_ready");

    admin(client.put(format!("{}/admin/rounds/{}", base_url, ROUND)))
        .json(&round_config(Utc::now() - Duration::seconds(1)))
        .send()
        .await?
        .error_for_status()?;

    let resp = client
        .put(&ballot_url)
        .bearer_auth(&bob_token)
        .json(&json!({ "votes": bob_votes }))
        .send()
        .await?;
    assert_eq!(error_kind(resp, StatusCode::FORBIDDEN).await?, "voting_closed");

    let results: Value = client
        .get(format!("{}?calculation=linear", results_url))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    assert_eq!(results["calculation"], "linear");
    assert_eq!(results["total_voters"], 1);
    assert_eq!(results["total_votes"], 50.0);
    assert_eq!(results["projects"]["p1"]["votes"], 20.0);
    assert_eq!(results["projects"]["p2"]["votes"], 30.0);
    assert_eq!(results["projects"]["p2"]["payout"], 600.0);

    let stats: Value = admin(client.get(format!("{}/admin/stats", base_url)))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    let ballot_totals = stats["ballot_total"].as_array().unwrap();
    assert!(ballot_totals
        .iter()
        .any(|e| e["action"] == "publish" && e["outcome"] == "hash_mismatch" && e["count"] == 1));
    assert!(ballot_totals
        .iter()
        .any(|e| e["action"] == "publish" && e["outcome"] == "success" && e["count"] == 1));
    assert_eq!(stats["sessions_total"], 2);
    assert_eq!(stats["results_reads_total"], 1);

    Ok(())
}

#[tokio::test]
#[serial_test::serial]
async fn e2e_sign_in_rejects_reused_nonce() -> anyhow::Result<()> {
    let (base_url, _guard) = setup_server().await?;
    let client = Client::new();
    let wallet = Wallet::new(0x33);

    let nonce: Value = client
        .post(format!("{}/auth/nonce", base_url))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    let signature = retro_core::typed_data::sign_personal_message(
        &wallet.key,
        nonce["message"].as_str().unwrap(),
    )?;
    let body = json!({
        "address": wallet.address.to_string(),
        "nonce": nonce["nonce"],
        "signature": signature,
    });

    client
        .post(format!("{}/auth/session", base_url))
        .json(&body)
        .send()
        .await?
        .error_for_status()?;

    let resp = client
        .post(format!("{}/auth/session", base_url))
        .json(&body)
        .send()
        .await?;
    assert_eq!(error_kind(resp, StatusCode::UNAUTHORIZED).await?, "unauthorized");

    // Signature by another wallet for a fresh nonce
    let other = Wallet::new(0x44);
    let nonce: Value = client
        .post(format!("{}/auth/nonce", base_url))
        .send()
        .await?
        .json()
        .await?;
    let signature = retro_core::typed_data::sign_personal_message(
        &other.key,
        nonce["message"].as_str().unwrap(),
    )?;
    let resp = client
        .post(format!("{}/auth/session", base_url))
        .json(&json!({
            "address": wallet.address.to_string(),
            "nonce": nonce["nonce"],
            "signature": signature,
        }))
        .send()
        .await?;
    assert_eq!(error_kind(resp, StatusCode::UNAUTHORIZED).await?, "unauthorized");

    Ok(())
}
