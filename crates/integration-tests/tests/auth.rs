//! Registration, login and logout flows.

#![allow(clippy::unwrap_used)]

use playdeck_core::UserRole;
use playdeck_integration_tests::{TestContext, location};
use reqwest::StatusCode;

#[tokio::test]
async fn test_register_then_login() {
    let ctx = TestContext::new().await;
    let client = TestContext::client();

    let resp = ctx
        .post(
            &client,
            "/register",
            &[
                ("name", "Ana"),
                ("email", "ana@example.com"),
                ("password", "secret"),
            ],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/login?success=registered"));

    let (status, body) = ctx.get(&client, "/login?success=registered").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Account created"));

    let client = ctx.login("ana@example.com", "secret").await;
    let (status, body) = ctx.get(&client, "/dashboard").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Ana"));
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let ctx = TestContext::new().await;
    ctx.create_user("Ana", "ana@example.com", "secret", UserRole::User)
        .await;

    let resp = ctx
        .post(
            &TestContext::client(),
            "/register",
            &[
                ("name", "Other"),
                ("email", "ana@EXAMPLE.com"),
                ("password", "x"),
            ],
        )
        .await;
    assert_eq!(location(&resp), Some("/register?error=email_taken"));
}

#[tokio::test]
async fn test_register_invalid_input() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .post(
            &TestContext::client(),
            "/register",
            &[("name", "Ana"), ("email", "nope"), ("password", "x")],
        )
        .await;
    assert_eq!(location(&resp), Some("/register?error=invalid"));
}

#[tokio::test]
async fn test_login_wrong_password() {
    let ctx = TestContext::new().await;
    ctx.create_user("Ana", "ana@example.com", "secret", UserRole::User)
        .await;
    let client = TestContext::client();

    let resp = ctx
        .post(
            &client,
            "/login",
            &[("email", "ana@example.com"), ("password", "wrong")],
        )
        .await;
    assert_eq!(location(&resp), Some("/login?error=credentials"));

    let (_, body) = ctx.get(&client, "/login?error=credentials").await;
    assert!(body.contains("Invalid email or password."));

    let (status, _) = ctx.get(&client, "/dashboard").await;
    assert_eq!(status, StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_logout_clears_session() {
    let ctx = TestContext::new().await;
    let (_, client) = ctx
        .signed_in("Ana", "ana@example.com", UserRole::User)
        .await;

    let resp = ctx.post(&client, "/logout", &[]).await;
    assert_eq!(location(&resp), Some("/login"));

    let resp = client.get(ctx.url("/dashboard")).send().await.unwrap();
    assert_eq!(location(&resp), Some("/login"));
}

#[tokio::test]
async fn test_protected_pages_redirect_anonymous() {
    let ctx = TestContext::new().await;
    let client = TestContext::client();

    for path in ["/dashboard", "/favourites", "/chat", "/admin"] {
        let resp = client.get(ctx.url(path)).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&resp), Some("/login"), "{path}");
    }
}

#[tokio::test]
async fn test_landing_and_health() {
    let ctx = TestContext::new().await;
    let client = TestContext::client();

    for path in ["/", "/home"] {
        let (status, body) = ctx.get(&client, path).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("/register"));
    }

    let (status, body) = ctx.get(&client, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");

    let (status, _) = ctx.get(&client, "/health/ready").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_security_headers_and_static_files() {
    let ctx = TestContext::new().await;

    let resp = TestContext::client()
        .get(ctx.url("/static/css/main.css"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("x-frame-options").unwrap(),
        "DENY"
    );
    assert_eq!(
        resp.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
}
