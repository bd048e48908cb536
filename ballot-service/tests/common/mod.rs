use reqwest::{Client, RequestBuilder};
use retro_core::{
    typed_data::{parse_secret_key, sign_personal_message},
    Address,
};
use secp256k1::SecretKey;
use serde_json::Value;
use std::process::{Command, Stdio};
use std::{
    net::TcpListener,
    path::{Path, PathBuf},
    time::Duration,
};
use tokio::time::sleep;

pub const ADMIN_TOKEN: &str = "test-admin-token";

/// Get an available ephemeral port on localhost.
pub fn find_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

/// Resolve the ballot-service binary path from env or common target dirs.
pub fn resolve_binary_path() -> String {
    if let Some(p) = option_env!("CARGO_BIN_EXE_ballot-service") {
        return p.to_string();
    }

    let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let workspace_root = manifest.parent().unwrap_or(&manifest).to_path_buf();
    let candidates = [
        workspace_root.join("target/debug/ballot-service"),
        workspace_root.join("target/release/ballot-service"),
        manifest.join("target/debug/ballot-service"),
    ];
    for cand in candidates.iter() {
        if Path::new(&cand).exists() {
            return cand.to_string_lossy().to_string();
        }
    }

    "ballot-service".to_string()
}

/// Poll /healthz until the server responds OK or timeout.
pub async fn wait_ready(base: &str, timeout_ms: u64) -> anyhow::Result<()> {
    let client = Client::new();
    let mut waited = 0u64;
    loop {
        if waited >= timeout_ms {
            anyhow::bail!("server not ready after {}ms", timeout_ms);
        }
        if let Ok(resp) = client.get(format!("{}/healthz", base)).send().await {
            if resp.status().is_success() {
                return Ok(());
            }
        }
        sleep(Duration::from_millis(50)).await;
        waited += 50;
    }
}

// Kills the child process on drop
pub struct ChildGuard(std::process::Child);
impl Drop for ChildGuard {
    fn drop(&mut self) {
        let _ = self.0.kill();
    }
}

pub async fn setup_server() -> anyhow::Result<(String, ChildGuard)> {
    let bin = resolve_binary_path();
    assert!(Path::new(&bin).exists(), "binary not found at {}", bin);

    let port = find_free_port();
    let base_url = format!("http://127.0.0.1:{}", port);

    let child = Command::new(&bin)
        .env("ADMIN_AUTH_TOKEN", ADMIN_TOKEN)
        .env("DB_PATH", ":memory:")
        .env("PORT", port.to_string())
        .env("RATE_LIMIT_BURST", "1000")
        .env("RATE_LIMIT_REPLENISH_MS", "1")
        .env("RUST_LOG", "warn")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    let guard = ChildGuard(child);
    wait_ready(&base_url, 10_000).await?;

    Ok((base_url, guard))
}

/// Test wallet with a deterministic key
pub struct Wallet {
    pub key: SecretKey,
    pub address: Address,
}

impl Wallet {
    pub fn new(byte: u8) -> Self {
        let key = parse_secret_key(&format!("{:02x}", byte).repeat(32)).unwrap();
        Self {
            address: Address::from_secret_key(&key),
            key,
        }
    }

    /// Run the nonce/sign/session exchange and return the bearer token.
    pub async fn sign_in(&self, client: &Client, base_url: &str) -> anyhow::Result<String> {
        let nonce: Value = client
            .post(format!("{}/auth/nonce", base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let message = nonce["message"].as_str().unwrap();
        let signature = sign_personal_message(&self.key, message)?;

        let session: Value = client
            .post(format!("{}/auth/session", base_url))
            .json(&serde_json::json!({
                "address": self.address.to_string(),
                "nonce": nonce["nonce"],
                "signature": signature,
            }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        assert_eq!(session["voter"], self.address.to_string());
        Ok(session["token"].as_str().unwrap().to_string())
    }
}

pub fn admin(request: RequestBuilder) -> RequestBuilder {
    request.header("x-admin-token", ADMIN_TOKEN)
}
