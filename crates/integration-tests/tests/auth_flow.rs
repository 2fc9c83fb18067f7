//! Integration tests for registration, login, and session handling.
//!
//! These tests require a running API server and database.
//!
//! Run with: cargo test -p brightkit-integration-tests -- --ignored

use brightkit_integration_tests::{api_base_url, client, register_customer, unique_username};
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_register_logs_the_session_in() {
    let client = client();
    let base_url = api_base_url();

    let user = register_customer(&client, "auth-reg").await;
    assert_eq!(user["role"], "customer");

    // The register response set a session cookie
    let resp = client
        .get(format!("{base_url}/api/auth/me"))
        .send()
        .await
        .expect("Failed to get current user");

    assert_eq!(resp.status(), StatusCode::OK);
    let me: Value = resp.json().await.expect("Failed to parse me response");
    assert_eq!(me["username"], user["username"]);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_duplicate_username_is_rejected() {
    let client = client();
    let base_url = api_base_url();
    let username = unique_username("auth-dup");

    let body = json!({
        "username": username,
        "email": format!("{username}@example.com"),
        "password": "correct-horse-battery",
    });

    let resp = client
        .post(format!("{base_url}/api/auth/register"))
        .json(&body)
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = client
        .post(format!("{base_url}/api/auth/register"))
        .json(&body)
        .send()
        .await
        .expect("Failed to send duplicate register");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_login_with_wrong_password_is_401() {
    let client = client();
    let base_url = api_base_url();

    let user = register_customer(&client, "auth-pw").await;

    let resp = client
        .post(format!("{base_url}/api/auth/login"))
        .json(&json!({
            "username": user["username"],
            "password": "not-the-password",
        }))
        .send()
        .await
        .expect("Failed to send login");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_logout_clears_the_session() {
    let client = client();
    let base_url = api_base_url();

    register_customer(&client, "auth-out").await;

    let resp = client
        .post(format!("{base_url}/api/auth/logout"))
        .send()
        .await
        .expect("Failed to log out");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client
        .get(format!("{base_url}/api/auth/me"))
        .send()
        .await
        .expect("Failed to get current user");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_short_password_is_rejected() {
    let client = client();
    let base_url = api_base_url();
    let username = unique_username("auth-short");

    let resp = client
        .post(format!("{base_url}/api/auth/register"))
        .json(&json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "short",
        }))
        .send()
        .await
        .expect("Failed to send register");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
