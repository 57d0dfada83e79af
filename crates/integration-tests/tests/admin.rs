//! Admin panel: access control and user management.

#![allow(clippy::unwrap_used)]

use playdeck_core::UserRole;
use playdeck_integration_tests::{TestContext, location};
use playdeck_web::db::{FavouriteRepository, UserRepository};
use reqwest::StatusCode;

#[tokio::test]
async fn test_regular_users_are_forbidden() {
    let ctx = TestContext::new().await;
    let (_, client) = ctx
        .signed_in("Ana", "ana@example.com", UserRole::User)
        .await;

    let (status, _) = ctx.get(&client, "/admin").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let resp = ctx.post(&client, "/admin/promote/1", &[]).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_lists_users() {
    let ctx = TestContext::new().await;
    let (_, admin) = ctx
        .signed_in("Root", "root@example.com", UserRole::Admin)
        .await;
    ctx.create_user("Ana", "ana@example.com", "pw", UserRole::User)
        .await;

    let (status, body) = ctx.get(&admin, "/admin").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("root@example.com"));
    assert!(body.contains("ana@example.com"));
}

#[tokio::test]
async fn test_promote_and_demote() {
    let ctx = TestContext::new().await;
    let (_, admin) = ctx
        .signed_in("Root", "root@example.com", UserRole::Admin)
        .await;
    let ana = ctx
        .create_user("Ana", "ana@example.com", "pw", UserRole::User)
        .await;
    let users = UserRepository::new(&ctx.pool);

    let resp = ctx
        .post(&admin, &format!("/admin/promote/{}", ana.id), &[])
        .await;
    assert_eq!(location(&resp), Some("/admin"));
    assert!(users.get_by_id(ana.id).await.unwrap().unwrap().is_admin());

    ctx.post(&admin, &format!("/admin/demote/{}", ana.id), &[])
        .await;
    assert!(!users.get_by_id(ana.id).await.unwrap().unwrap().is_admin());

    // Unknown ids are ignored
    let resp = ctx.post(&admin, "/admin/promote/9999", &[]).await;
    assert_eq!(location(&resp), Some("/admin"));
}

#[tokio::test]
async fn test_last_admin_is_protected() {
    let ctx = TestContext::new().await;
    let (root, admin) = ctx
        .signed_in("Root", "root@example.com", UserRole::Admin)
        .await;

    let resp = ctx
        .post(&admin, &format!("/admin/demote/{}", root.id), &[])
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.text().await.unwrap(),
        "Cannot remove the last administrator"
    );

    let resp = ctx
        .post(&admin, &format!("/admin/delete/{}", root.id), &[])
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.text().await.unwrap(),
        "You cannot delete your own account"
    );
}

#[tokio::test]
async fn test_deleting_other_admin_leaves_sole_admin_protected() {
    let ctx = TestContext::new().await;
    let other = ctx
        .create_user("Boss", "boss@example.com", "pw", UserRole::Admin)
        .await;
    let (root, admin) = ctx
        .signed_in("Root", "root@example.com", UserRole::Admin)
        .await;

    // Two admins: Root may delete Boss
    let resp = ctx
        .post(&admin, &format!("/admin/delete/{}", other.id), &[])
        .await;
    assert_eq!(location(&resp), Some("/admin"));

    // Root is now the only admin
    let resp = ctx
        .post(&admin, &format!("/admin/demote/{}", root.id), &[])
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_demoted_admin_loses_access_immediately() {
    let ctx = TestContext::new().await;
    let (_, root) = ctx
        .signed_in("Root", "root@example.com", UserRole::Admin)
        .await;
    let (boss, boss_client) = ctx
        .signed_in("Boss", "boss@example.com", UserRole::Admin)
        .await;

    let (status, _) = ctx.get(&boss_client, "/admin").await;
    assert_eq!(status, StatusCode::OK);

    ctx.post(&root, &format!("/admin/demote/{}", boss.id), &[])
        .await;

    let (status, _) = ctx.get(&boss_client, "/admin").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_delete_user_removes_favourites() {
    let ctx = TestContext::new().await;
    let (_, admin) = ctx
        .signed_in("Root", "root@example.com", UserRole::Admin)
        .await;
    let (ana, ana_client) = ctx
        .signed_in("Ana", "ana@example.com", UserRole::User)
        .await;
    ctx.post(&ana_client, "/favourites/add", &[("song", "Levitating")])
        .await;

    let resp = ctx
        .post(&admin, &format!("/admin/delete/{}", ana.id), &[])
        .await;
    assert_eq!(location(&resp), Some("/admin"));

    assert!(
        UserRepository::new(&ctx.pool)
            .get_by_id(ana.id)
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        FavouriteRepository::new(&ctx.pool)
            .list_for_user(ana.id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_create_user_form() {
    let ctx = TestContext::new().await;
    let (_, admin) = ctx
        .signed_in("Root", "root@example.com", UserRole::Admin)
        .await;

    let resp = ctx
        .post(
            &admin,
            "/admin/create",
            &[
                ("name", "Ana"),
                ("email", "ana@example.com"),
                ("password", "pw"),
                ("role", ""),
            ],
        )
        .await;
    assert_eq!(location(&resp), Some("/admin"));

    let client = ctx.login("ana@example.com", "pw").await;
    let (status, _) = ctx.get(&client, "/admin").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let resp = ctx
        .post(
            &admin,
            "/admin/create",
            &[
                ("name", "Ana Again"),
                ("email", "ana@example.com"),
                ("password", "pw"),
                ("role", "user"),
            ],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.text().await.unwrap(), "Email already exists");

    let resp = ctx
        .post(
            &admin,
            "/admin/create",
            &[
                ("name", "Eve"),
                ("email", "eve@example.com"),
                ("password", "pw"),
                ("role", "owner"),
            ],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.text().await.unwrap(), "Invalid role");
}
