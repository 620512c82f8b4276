use axum::http::StatusCode;
use serde_json::json;
use serial_test::serial;

use crate::common::{test_email, test_password, TestContext};

#[tokio::test]
#[serial]
async fn register_with_valid_data_creates_unverified_active_user() {
    let ctx = TestContext::new().await;
    let email = test_email();

    let response = ctx
        .server
        .post("/auth/register")
        .json(&json!({
            "email": &email,
            "password": test_password(),
            "full_name": "Jess Park",
            "role": "user",
            "phone": "+15550001111"
        }))
        .await;

    response.assert_status(StatusCode::CREATED);

    let body: serde_json::Value = response.json();
    assert_eq!(body["user"]["email"], email);
    assert_eq!(body["user"]["is_verified"], false);
    assert_eq!(body["user"]["is_active"], true);
    assert_eq!(body["user"]["role"], "user");
    assert!(body["user"].get("password_hash").is_none());

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn register_normalizes_email_case_and_whitespace() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/auth/register")
        .json(&json!({
            "email": "MixedCase@Example.COM",
            "password": test_password(),
            "full_name": "Case Test"
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["user"]["email"], "mixedcase@example.com");

    // The normalized form is taken, so the variant collides.
    let response = ctx
        .server
        .post("/auth/register")
        .json(&json!({
            "email": "mixedcase@example.com",
            "password": test_password(),
            "full_name": "Case Test"
        }))
        .await;

    response.assert_status(StatusCode::CONFLICT);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn register_with_duplicate_email_returns_conflict() {
    let ctx = TestContext::new().await;
    let email = test_email();
    ctx.register_user(&email).await;

    let response = ctx
        .server
        .post("/auth/register")
        .json(&json!({
            "email": &email,
            "password": test_password(),
            "full_name": "Another Person"
        }))
        .await;

    response.assert_status(StatusCode::CONFLICT);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn register_with_short_password_returns_bad_request() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/auth/register")
        .json(&json!({
            "email": test_email(),
            "password": "short7!",
            "full_name": "Weak Password"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn register_with_invalid_role_returns_bad_request() {
    let ctx = TestContext::new().await;

    for role in ["admin", "superuser"] {
        let response = ctx
            .server
            .post("/auth/register")
            .json(&json!({
                "email": test_email(),
                "password": test_password(),
                "full_name": "Role Test",
                "role": role
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn register_facility_owner_role_is_allowed() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/auth/register")
        .json(&json!({
            "email": test_email(),
            "password": test_password(),
            "full_name": "Owner Person",
            "role": "facility_owner"
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["user"]["role"], "facility_owner");

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn register_with_malformed_email_returns_bad_request() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/auth/register")
        .json(&json!({
            "email": "not-an-email",
            "password": test_password(),
            "full_name": "Bad Email"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);

    ctx.cleanup().await;
}
