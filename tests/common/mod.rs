#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

static SERVER: OnceLock<TestServer> = OnceLock::new();
static COUNTER: AtomicU32 = AtomicU32::new(0);

pub const PASSWORD: &str = "correct-horse-9";

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    /// Spawn the server binary on a free port with extra environment overrides
    pub fn spawn(envs: &[(&str, &str)]) -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_mini-notes-api"));
        cmd.env("MINI_NOTES_PORT", port.to_string())
            .env("APP_ENV", "development")
            .env("BCRYPT_COST", "4")
            .env("SEED_DEMO_ACCOUNT", "false")
            .env("REGISTER_RATE_LIMIT_REQUESTS", "10000")
            .env("AUTH_RATE_LIMIT_REQUESTS", "10000")
            .env("API_RATE_LIMIT_REQUESTS", "10000")
            .env("RUST_LOG", "warn")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        for (key, value) in envs {
            cmd.env(key, value);
        }

        // DATABASE_URL is inherited from the test environment
        let child = cmd.spawn().context("failed to spawn server binary")?;
        Ok(Self { port, base_url, child })
    }

    pub async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = client.get(format!("{}/health", self.base_url)).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
    }
}

/// The server needs PostgreSQL; scenarios are skipped when DATABASE_URL is unset
pub fn database_available() -> bool {
    match std::env::var("DATABASE_URL") {
        Ok(url) if !url.is_empty() => true,
        _ => {
            eprintln!("DATABASE_URL not set; skipping database-backed test");
            false
        }
    }
}

pub async fn ensure_server() -> Result<Option<&'static TestServer>> {
    if !database_available() {
        return Ok(None);
    }
    let server = SERVER.get_or_init(|| TestServer::spawn(&[]).expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(20)).await?;
    Ok(Some(server))
}

/// A registered account and its current tokens
#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
}

pub fn unique_identity() -> (String, String) {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() % 1_000_000_000_000)
        .unwrap_or_default();
    let n = COUNTER.fetch_add(1, Ordering::SeqCst);
    let username = format!("u{}_{}", nanos, n);
    let email = format!("{}@example.com", username);
    (username, email)
}

pub async fn register(client: &reqwest::Client, server: &TestServer) -> Result<Account> {
    let (username, email) = unique_identity();
    let res = client
        .post(server.url("/api/auth/register"))
        .json(&json!({
            "username": username,
            "email": email,
            "password": PASSWORD,
            "tosAccepted": true
        }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED, "register failed: {}", res.status());
    let body: Value = res.json().await?;
    Ok(Account {
        id: body["data"]["user"]["id"].as_i64().context("user id")?,
        username,
        email,
        access_token: body["data"]["accessToken"].as_str().context("access token")?.to_string(),
        refresh_token: body["data"]["refreshToken"].as_str().context("refresh token")?.to_string(),
    })
}

pub async fn create_note(client: &reqwest::Client, server: &TestServer, account: &Account, body: Value) -> Result<Value> {
    let res = client
        .post(server.url("/api/notes"))
        .bearer_auth(&account.access_token)
        .json(&body)
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED, "create note failed: {}", res.status());
    let body: Value = res.json().await?;
    Ok(body["data"].clone())
}
