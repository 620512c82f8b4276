use axum::http::StatusCode;
use serial_test::serial;

use crate::common::{test_email, TestContext};

#[tokio::test]
#[serial]
async fn logout_invalidates_the_session() {
    let ctx = TestContext::new().await;
    let email = test_email();
    ctx.login_user(&email).await;

    let response = ctx.server.post("/auth/logout").await;
    response.assert_status(StatusCode::OK);

    // The revoked session no longer validates.
    let response = ctx.server.get("/auth/session").await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["valid"], false);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn logout_without_a_session_still_succeeds() {
    let ctx = TestContext::new().await;

    let response = ctx.server.post("/auth/logout").await;
    response.assert_status(StatusCode::OK);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn logout_clears_the_session_cookie() {
    let ctx = TestContext::new().await;
    let email = test_email();
    ctx.login_user(&email).await;

    let response = ctx.server.post("/auth/logout").await;
    let cookie = response.cookie("session_token");
    assert!(cookie.value().is_empty());

    ctx.cleanup().await;
}
