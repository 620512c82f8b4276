use axum::http::StatusCode;
use serde_json::json;
use serial_test::serial;

use crate::common::{test_email, test_password, TestContext};

async fn fail_login(ctx: &TestContext, email: &str) -> StatusCode {
    let response = ctx
        .server
        .post("/auth/login")
        .json(&json!({
            "email": email,
            "password": "WrongPassword123!"
        }))
        .await;
    response.status_code()
}

#[tokio::test]
#[serial]
async fn fifth_failure_locks_the_account_even_for_correct_password() {
    let ctx = TestContext::new().await;
    let email = test_email();
    ctx.register_user(&email).await;

    for _ in 0..5 {
        assert_eq!(fail_login(&ctx, &email).await, StatusCode::UNAUTHORIZED);
    }

    // Correct password, but the lock has engaged.
    let response = ctx
        .server
        .post("/auth/login")
        .json(&json!({
            "email": &email,
            "password": test_password()
        }))
        .await;

    response.assert_status(StatusCode::LOCKED);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn failures_below_threshold_do_not_lock() {
    let ctx = TestContext::new().await;
    let email = test_email();
    ctx.register_user(&email).await;

    for _ in 0..4 {
        assert_eq!(fail_login(&ctx, &email).await, StatusCode::UNAUTHORIZED);
    }

    let response = ctx
        .server
        .post("/auth/login")
        .json(&json!({
            "email": &email,
            "password": test_password()
        }))
        .await;

    response.assert_status(StatusCode::OK);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn lock_clears_once_locked_until_elapses() {
    let ctx = TestContext::new().await;
    let email = test_email();
    let user_id = ctx.register_user(&email).await;

    for _ in 0..5 {
        fail_login(&ctx, &email).await;
    }

    // Simulate the lock window passing instead of sleeping 15 minutes.
    sqlx::query("UPDATE users SET locked_until = DATE_SUB(NOW(), INTERVAL 1 MINUTE) WHERE id = ?")
        .bind(&user_id)
        .execute(&ctx.db)
        .await
        .unwrap();

    let response = ctx
        .server
        .post("/auth/login")
        .json(&json!({
            "email": &email,
            "password": test_password()
        }))
        .await;

    response.assert_status(StatusCode::OK);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn lapsed_lock_restores_the_full_attempt_budget() {
    let ctx = TestContext::new().await;
    let email = test_email();
    let user_id = ctx.register_user(&email).await;

    for _ in 0..5 {
        fail_login(&ctx, &email).await;
    }

    sqlx::query("UPDATE users SET locked_until = DATE_SUB(NOW(), INTERVAL 1 MINUTE) WHERE id = ?")
        .bind(&user_id)
        .execute(&ctx.db)
        .await
        .unwrap();

    // A single wrong password after the lock lapses must not re-lock from
    // the stale counter.
    assert_eq!(fail_login(&ctx, &email).await, StatusCode::UNAUTHORIZED);

    let response = ctx
        .server
        .post("/auth/login")
        .json(&json!({
            "email": &email,
            "password": test_password()
        }))
        .await;
    response.assert_status(StatusCode::OK);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn successful_login_resets_the_failure_counter() {
    let ctx = TestContext::new().await;
    let email = test_email();
    let user_id = ctx.register_user(&email).await;

    for _ in 0..3 {
        fail_login(&ctx, &email).await;
    }

    let response = ctx
        .server
        .post("/auth/login")
        .json(&json!({
            "email": &email,
            "password": test_password()
        }))
        .await;
    response.assert_status(StatusCode::OK);

    let (attempts,): (i32,) =
        sqlx::query_as("SELECT failed_login_attempts FROM users WHERE id = ?")
            .bind(&user_id)
            .fetch_one(&ctx.db)
            .await
            .unwrap();
    assert_eq!(attempts, 0);

    ctx.cleanup().await;
}
