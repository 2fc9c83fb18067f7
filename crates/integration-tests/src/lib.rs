//! Integration tests for the Brightkit API.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and the API
//! docker compose up -d postgres
//! cargo run -p brightkit-api
//!
//! # Run the ignored integration tests against it
//! cargo test -p brightkit-integration-tests -- --ignored
//! ```
//!
//! Tests talk to a running server over HTTP; the base URL comes from
//! `API_BASE_URL` (default `http://localhost:8000`). Each test registers
//! its own throwaway customer account, so tests are independent and can
//! run against a shared database.

use reqwest::Client;
use serde_json::{Value, json};

/// Base URL for the API (configurable via environment).
#[must_use]
pub fn api_base_url() -> String {
    std::env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:8000".to_string())
}

/// A cookie-holding HTTP client, so session logins persist across requests.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// A username that won't collide with earlier test runs.
#[must_use]
pub fn unique_username(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos();
    format!("{prefix}-{nanos}")
}

/// Log in with the seeded staff account, if `STAFF_USERNAME` and
/// `STAFF_PASSWORD` are configured. Tests for staff-only behavior return
/// early when they aren't.
pub async fn staff_client() -> Option<Client> {
    let username = std::env::var("STAFF_USERNAME").ok()?;
    let password = std::env::var("STAFF_PASSWORD").ok()?;

    let client = client();
    let resp = client
        .post(format!("{}/api/auth/login", api_base_url()))
        .json(&json!({"username": username, "password": password}))
        .send()
        .await
        .expect("Failed to log in staff account");
    assert_eq!(resp.status().as_u16(), 200, "staff login failed");

    Some(client)
}

/// Register a fresh customer account and leave the client logged in.
///
/// Returns the created user object from the register response.
pub async fn register_customer(client: &Client, prefix: &str) -> Value {
    let base_url = api_base_url();
    let username = unique_username(prefix);

    let resp = client
        .post(format!("{base_url}/api/auth/register"))
        .json(&json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "correct-horse-battery",
        }))
        .send()
        .await
        .expect("Failed to register test account");

    assert_eq!(resp.status().as_u16(), 201, "register should return 201");
    resp.json().await.expect("Failed to parse register response")
}
