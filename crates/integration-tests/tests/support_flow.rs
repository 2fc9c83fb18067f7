//! Integration tests for support tickets and lab-support quotas.
//!
//! The quota test needs a seeded lab with a support limit; set
//! `QUOTA_LAB_ID` and `QUOTA_MAX` to point at it.
//!
//! Run with: cargo test -p brightkit-integration-tests -- --ignored

use brightkit_integration_tests::{api_base_url, client, register_customer, staff_client};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

/// First lab in the catalog, found through the product listing. Customers
/// can't browse `/api/labs` before unlocking anything, but product detail
/// pages list lab summaries for everyone.
async fn any_lab_id(client: &Client) -> Option<Value> {
    let base_url = api_base_url();

    let resp = client
        .get(format!("{base_url}/api/products"))
        .send()
        .await
        .expect("Failed to list products");
    assert_eq!(resp.status(), StatusCode::OK);
    let products: Vec<Value> = resp.json().await.expect("Failed to parse products");

    for product in products {
        let resp = client
            .get(format!("{base_url}/api/products/{}/labs", product["id"]))
            .send()
            .await
            .expect("Failed to list product labs");
        assert_eq!(resp.status(), StatusCode::OK);

        let labs: Vec<Value> = resp.json().await.expect("Failed to parse labs");
        if let Some(lab) = labs.into_iter().next() {
            return Some(lab["id"].clone());
        }
    }

    None
}

#[tokio::test]
#[ignore = "Requires running API server and seeded catalog"]
async fn test_ticket_thread_round() {
    let client = client();
    let user = register_customer(&client, "ticket").await;

    // A customer can open a ticket against any lab, unlocked or not
    let Some(lab_id) = any_lab_id(&client).await else {
        return;
    };

    let resp = client
        .post(format!("{}/api/support/tickets", api_base_url()))
        .json(&json!({
            "title": "Motor won't spin",
            "description": "Step 4 of the robotics lab",
            "lab_id": lab_id,
        }))
        .send()
        .await
        .expect("Failed to open ticket");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let ticket: Value = resp.json().await.expect("Failed to parse ticket");
    assert_eq!(ticket["status"], "open");
    assert_eq!(ticket["user"]["username"], user["username"]);

    let resp = client
        .post(format!(
            "{}/api/support/tickets/{}/messages",
            api_base_url(),
            ticket["id"]
        ))
        .json(&json!({"message": "Also the LED stays red."}))
        .send()
        .await
        .expect("Failed to add message");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let ticket: Value = resp.json().await.expect("Failed to parse ticket");
    assert_eq!(ticket["messages"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_customer_cannot_read_statistics() {
    let client = client();
    register_customer(&client, "stats").await;

    let resp = client
        .get(format!(
            "{}/api/support/lab-support/statistics",
            api_base_url()
        ))
        .send()
        .await
        .expect("Failed to get statistics");

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_customer_cannot_see_other_users_tickets() {
    let base_url = api_base_url();

    let first = client();
    register_customer(&first, "isolation-a").await;

    let Some(lab_id) = any_lab_id(&first).await else {
        return;
    };

    let resp = first
        .post(format!("{base_url}/api/support/tickets"))
        .json(&json!({"title": "Mine", "lab_id": lab_id}))
        .send()
        .await
        .expect("Failed to open ticket");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let ticket: Value = resp.json().await.expect("Failed to parse ticket");

    let second = client();
    register_customer(&second, "isolation-b").await;

    let resp = second
        .get(format!("{base_url}/api/support/tickets/{}", ticket["id"]))
        .send()
        .await
        .expect("Failed to get ticket");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_customer_can_read_limits_but_not_write_them() {
    let client = client();
    register_customer(&client, "limits-read").await;
    let base_url = api_base_url();

    // Reads are open to any authenticated user
    let resp = client
        .get(format!("{base_url}/api/support/lab-support-limits"))
        .send()
        .await
        .expect("Failed to list limits");
    assert_eq!(resp.status(), StatusCode::OK);

    let limits: Vec<Value> = resp.json().await.expect("Failed to parse limits");
    if let Some(limit) = limits.first() {
        let resp = client
            .get(format!(
                "{base_url}/api/support/lab-support-limits/{}",
                limit["id"]
            ))
            .send()
            .await
            .expect("Failed to get limit");
        assert_eq!(resp.status(), StatusCode::OK);
    }

    // Writes stay restricted
    let resp = client
        .post(format!("{base_url}/api/support/lab-support-limits"))
        .json(&json!({
            "lab_id": 1,
            "max_support_count": 5,
            "support_duration_limit": 60,
        }))
        .send()
        .await
        .expect("Failed to send limit create");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running API server, seeded catalog, and staff account"]
async fn test_limit_update_changes_caps_only() {
    let Some(staff) = staff_client().await else {
        return;
    };
    let base_url = api_base_url();

    let Some(lab_id) = any_lab_id(&staff).await else {
        return;
    };

    // Reuse the lab's existing limit if one is already seeded
    let resp = staff
        .get(format!("{base_url}/api/support/lab-support-limits"))
        .send()
        .await
        .expect("Failed to list limits");
    assert_eq!(resp.status(), StatusCode::OK);
    let limits: Vec<Value> = resp.json().await.expect("Failed to parse limits");

    let limit = match limits.into_iter().find(|l| l["lab"]["id"] == lab_id) {
        Some(limit) => limit,
        None => {
            let resp = staff
                .post(format!("{base_url}/api/support/lab-support-limits"))
                .json(&json!({
                    "lab_id": lab_id,
                    "max_support_count": 3,
                    "support_duration_limit": 60,
                }))
                .send()
                .await
                .expect("Failed to create limit");
            assert_eq!(resp.status(), StatusCode::CREATED);
            resp.json().await.expect("Failed to parse limit")
        }
    };

    let resp = staff
        .put(format!(
            "{base_url}/api/support/lab-support-limits/{}",
            limit["id"]
        ))
        .json(&json!({
            "max_support_count": 7,
            "support_duration_limit": 45,
        }))
        .send()
        .await
        .expect("Failed to update limit");
    assert_eq!(resp.status(), StatusCode::OK);

    let updated: Value = resp.json().await.expect("Failed to parse limit");
    assert_eq!(updated["max_support_count"], 7);
    assert_eq!(updated["support_duration_limit"], 45);
    // The lab binding never moves on update
    assert_eq!(updated["lab"]["id"], limit["lab"]["id"]);
}

#[tokio::test]
#[ignore = "Requires running API server and a seeded quota lab"]
async fn test_support_quota_is_enforced() {
    let Ok(lab_id) = std::env::var("QUOTA_LAB_ID") else {
        return;
    };
    let max: usize = std::env::var("QUOTA_MAX")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3);

    let client = client();
    register_customer(&client, "quota").await;

    let lab_id: i64 = lab_id.parse().expect("QUOTA_LAB_ID is numeric");
    let body = json!({
        "lab_id": lab_id,
        "support_type": "technical",
        "description": "Sensor calibration help",
    });

    // Sessions up to the cap are accepted
    for _ in 0..max {
        let resp = client
            .post(format!("{}/api/support/lab-support", api_base_url()))
            .json(&body)
            .send()
            .await
            .expect("Failed to log session");
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    // The one past the cap is rejected with the quota message
    let resp = client
        .post(format!("{}/api/support/lab-support", api_base_url()))
        .json(&body)
        .send()
        .await
        .expect("Failed to send session past quota");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let err: Value = resp.json().await.expect("Failed to parse error");
    assert_eq!(err["error"], "Maximum support limit reached for this lab");
}

#[tokio::test]
#[ignore = "Requires running API server and seeded catalog"]
async fn test_resolve_is_idempotent() {
    let client = client();
    register_customer(&client, "resolve").await;

    let Some(lab_id) = any_lab_id(&client).await else {
        return;
    };

    let resp = client
        .post(format!("{}/api/support/lab-support", api_base_url()))
        .json(&json!({
            "lab_id": lab_id,
            "support_type": "guidance",
            "description": "Typo in step 2",
        }))
        .send()
        .await
        .expect("Failed to log session");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let session: Value = resp.json().await.expect("Failed to parse session");

    let resolve_url = format!(
        "{}/api/support/lab-support/{}/resolve",
        api_base_url(),
        session["id"]
    );

    let resp = client
        .post(&resolve_url)
        .send()
        .await
        .expect("Failed to resolve");
    assert_eq!(resp.status(), StatusCode::OK);
    let first: Value = resp.json().await.expect("Failed to parse session");
    assert_eq!(first["is_resolved"], true);

    let resp = client
        .post(&resolve_url)
        .send()
        .await
        .expect("Failed to resolve again");
    assert_eq!(resp.status(), StatusCode::OK);
    let second: Value = resp.json().await.expect("Failed to parse session");

    // Second resolve keeps the original timestamp
    assert_eq!(first["resolved_at"], second["resolved_at"]);
}
