use axum::http::StatusCode;
use serde_json::json;
use serial_test::serial;

use crate::common::{test_email, TestContext};

#[tokio::test]
#[serial]
async fn request_otp_for_registered_user_returns_code_in_dev() {
    let ctx = TestContext::new().await;
    let email = test_email();
    ctx.register_user(&email).await;

    let response = ctx
        .server
        .post("/auth/otp/request")
        .json(&json!({
            "email": &email,
            "otp_type": "email_verification"
        }))
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    let code = body["otp_code"].as_str().expect("dev responses carry the code");
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_digit()));

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn request_otp_for_unknown_email_returns_not_found() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/auth/otp/request")
        .json(&json!({
            "email": "ghost@example.com",
            "otp_type": "password_reset"
        }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn immediate_rerequest_is_rate_limited_with_time_left() {
    let ctx = TestContext::new().await;
    let email = test_email();
    ctx.register_user(&email).await;

    let first = ctx
        .server
        .post("/auth/otp/request")
        .json(&json!({
            "email": &email,
            "otp_type": "email_verification"
        }))
        .await;
    first.assert_status(StatusCode::OK);

    let second = ctx
        .server
        .post("/auth/otp/request")
        .json(&json!({
            "email": &email,
            "otp_type": "email_verification"
        }))
        .await;

    second.assert_status(StatusCode::TOO_MANY_REQUESTS);
    let body: serde_json::Value = second.json();
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("seconds"));

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn new_code_supersedes_the_previous_one() {
    let ctx = TestContext::new().await;
    let email = test_email();
    ctx.register_user(&email).await;

    let first = ctx
        .server
        .post("/auth/otp/request")
        .json(&json!({
            "email": &email,
            "otp_type": "email_verification"
        }))
        .await;
    let first_body: serde_json::Value = first.json();
    let old_code = first_body["otp_code"].as_str().unwrap().to_string();

    // Age the first issuance past the cooldown window.
    sqlx::query("UPDATE otp_codes SET created_at = DATE_SUB(NOW(), INTERVAL 2 MINUTE) WHERE email = ?")
        .bind(&email)
        .execute(&ctx.db)
        .await
        .unwrap();

    let second = ctx
        .server
        .post("/auth/otp/request")
        .json(&json!({
            "email": &email,
            "otp_type": "email_verification"
        }))
        .await;
    second.assert_status(StatusCode::OK);

    // The superseded code no longer verifies.
    let response = ctx
        .server
        .post("/auth/otp/verify")
        .json(&json!({
            "email": &email,
            "otp_code": old_code,
            "otp_type": "email_verification"
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    ctx.cleanup().await;
}
