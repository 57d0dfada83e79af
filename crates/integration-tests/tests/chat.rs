//! Shared chat room.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use playdeck_core::UserRole;
use playdeck_integration_tests::{TestContext, location};
use playdeck_web::db::ChatRepository;
use reqwest::StatusCode;

#[tokio::test]
async fn test_messages_are_shown_to_everyone_in_order() {
    let ctx = TestContext::new().await;
    let (_, ana) = ctx
        .signed_in("Ana", "ana@example.com", UserRole::User)
        .await;
    let (_, rui) = ctx
        .signed_in("Rui", "rui@example.com", UserRole::User)
        .await;

    let resp = ctx
        .post(&ana, "/chat/send", &[("message", "First!")])
        .await;
    assert_eq!(location(&resp), Some("/chat"));
    ctx.post(&rui, "/chat/send", &[("message", "Second")]).await;

    let (status, body) = ctx.get(&rui, "/chat").await;
    assert_eq!(status, StatusCode::OK);
    let first = body.find("First!").unwrap();
    let second = body.find("Second").unwrap();
    assert!(first < second);
    assert!(body.contains("Ana"));
}

#[tokio::test]
async fn test_messages_are_escaped() {
    let ctx = TestContext::new().await;
    let (_, client) = ctx
        .signed_in("Ana", "ana@example.com", UserRole::User)
        .await;

    ctx.post(
        &client,
        "/chat/send",
        &[("message", "<script>alert(1)</script>")],
    )
    .await;

    let (_, body) = ctx.get(&client, "/chat").await;
    assert!(!body.contains("<script>alert(1)</script>"));
    assert!(body.contains("alert(1)"));
}

#[tokio::test]
async fn test_blank_and_oversized_messages() {
    let ctx = TestContext::new().await;
    let (_, client) = ctx
        .signed_in("Ana", "ana@example.com", UserRole::User)
        .await;

    let resp = ctx
        .post(&client, "/chat/send", &[("message", "   ")])
        .await;
    assert_eq!(location(&resp), Some("/chat"));

    let long = "x".repeat(2001);
    let resp = ctx
        .post(&client, "/chat/send", &[("message", long.as_str())])
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let messages = ChatRepository::new(&ctx.pool).list_messages().await.unwrap();
    assert!(messages.is_empty());
}

#[tokio::test]
async fn test_length_limit_applies_after_trimming() {
    let ctx = TestContext::new().await;
    let (_, client) = ctx
        .signed_in("Ana", "ana@example.com", UserRole::User)
        .await;

    let padded = format!("  {}   ", "y".repeat(2000));
    let resp = ctx
        .post(&client, "/chat/send", &[("message", padded.as_str())])
        .await;
    assert_eq!(location(&resp), Some("/chat"));

    let messages = ChatRepository::new(&ctx.pool).list_messages().await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].body.chars().count(), 2000);
}

#[tokio::test]
async fn test_message_keeps_author_after_user_is_deleted() {
    let ctx = TestContext::new().await;
    let (_, admin) = ctx
        .signed_in("Root", "root@example.com", UserRole::Admin)
        .await;
    let (rui, rui_client) = ctx
        .signed_in("Rui", "rui@example.com", UserRole::User)
        .await;

    ctx.post(&rui_client, "/chat/send", &[("message", "Bye")])
        .await;
    ctx.post(&admin, &format!("/admin/delete/{}", rui.id), &[])
        .await;

    let messages = ChatRepository::new(&ctx.pool).list_messages().await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].author_name, "Rui");
    assert!(messages[0].user_id.is_none());

    let (_, body) = ctx.get(&admin, "/chat").await;
    assert!(body.contains("Rui"));
}
