//! Integration tests for the session-guarded admin API.

mod support;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};
use support::{setup_test_server, ADMIN_PASSWORD, ADMIN_USERNAME};

/// Log in and return the `Cookie` header value for the new session.
async fn login(server: &TestServer) -> HeaderValue {
    let response = server
        .post("/admin/login")
        .json(&json!({ "username": ADMIN_USERNAME, "password": ADMIN_PASSWORD }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let set_cookie = response.header("set-cookie");
    let set_cookie = set_cookie.to_str().unwrap();
    assert!(set_cookie.contains("HttpOnly"));
    let pair = set_cookie.split(';').next().unwrap();
    HeaderValue::from_str(pair).unwrap()
}

fn cookie() -> HeaderName {
    HeaderName::from_static("cookie")
}

async fn create(server: &TestServer, body: Value) -> Value {
    server.post("/api/pastes").json(&body).await.json()
}

#[tokio::test]
async fn test_admin_requires_session() {
    let (server, _dir) = setup_test_server().await;

    for path in ["/admin/pastes", "/admin/stats", "/admin/pastes/abc"] {
        let response = server.get(path).expect_failure().await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED, "{path}");
    }

    let forged = server
        .get("/admin/pastes")
        .add_header(cookie(), HeaderValue::from_static("pasty_admin=forged"))
        .expect_failure()
        .await;
    assert_eq!(forged.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_login_rejects_bad_credentials() {
    let (server, _dir) = setup_test_server().await;
    let response = server
        .post("/admin/login")
        .json(&json!({ "username": ADMIN_USERNAME, "password": "nope" }))
        .expect_failure()
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_search_sort_and_delete() {
    let (server, _dir) = setup_test_server().await;
    let session = login(&server).await;

    let first = create(&server, json!({ "title": "shopping list", "content": "eggs" })).await;
    let second = create(&server, json!({ "title": "notes", "content": "buy EGGS too" })).await;
    let third = create(&server, json!({ "title": "other", "content": "nothing" })).await;

    // give the third paste some views
    for _ in 0..3 {
        server
            .get(&format!("/api/pastes/{}", third["id"].as_str().unwrap()))
            .await;
    }

    let all: Vec<Value> = server
        .get("/admin/pastes")
        .add_header(cookie(), session.clone())
        .await
        .json();
    let ids: Vec<&Value> = all.iter().map(|p| &p["id"]).collect();
    assert_eq!(ids, [&third["id"], &second["id"], &first["id"]]);
    assert!(all[0].get("expires_at").is_some());

    let found: Vec<Value> = server
        .get("/admin/pastes")
        .add_query_param("search", "eggs")
        .add_header(cookie(), session.clone())
        .await
        .json();
    assert_eq!(found.len(), 2);

    let by_views: Vec<Value> = server
        .get("/admin/pastes")
        .add_query_param("sort", "views")
        .add_query_param("order", "desc")
        .add_query_param("limit", 1)
        .add_header(cookie(), session.clone())
        .await
        .json();
    assert_eq!(by_views.len(), 1);
    assert_eq!(by_views[0]["id"], third["id"]);
    assert_eq!(by_views[0]["views"], 3);

    let detail: Value = server
        .get(&format!("/admin/pastes/{}", first["id"].as_str().unwrap()))
        .add_header(cookie(), session.clone())
        .await
        .json();
    assert_eq!(detail["secret_key"], first["secret_key"]);
    assert_eq!(detail["views"], 0);

    let deleted = server
        .delete(&format!("/admin/pastes/{}", first["id"].as_str().unwrap()))
        .add_header(cookie(), session.clone())
        .await;
    assert_eq!(deleted.status_code(), StatusCode::OK);

    let gone = server
        .get(&format!("/api/pastes/{}", first["id"].as_str().unwrap()))
        .expect_failure()
        .await;
    assert_eq!(gone.status_code(), StatusCode::NOT_FOUND);

    let missing = server
        .delete("/admin/pastes/doesnotexist")
        .add_header(cookie(), session)
        .expect_failure()
        .await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_lists_expired_pastes() {
    let (server, _dir) = setup_test_server().await;
    let session = login(&server).await;

    let expired = create(&server, json!({ "content": "old", "expires_in": -1 })).await;

    let all: Vec<Value> = server
        .get("/admin/pastes")
        .add_header(cookie(), session)
        .await
        .json();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0]["id"], expired["id"]);
}

#[tokio::test]
async fn test_admin_stats_and_logout() {
    let (server, _dir) = setup_test_server().await;
    let session = login(&server).await;

    server.post("/api/stats/visits").await;

    let stats: Value = server
        .get("/admin/stats")
        .add_header(cookie(), session.clone())
        .await
        .json();
    assert_eq!(stats["visit_count"], 1);

    let logout = server
        .post("/admin/logout")
        .add_header(cookie(), session.clone())
        .await;
    assert_eq!(logout.status_code(), StatusCode::OK);

    let after = server
        .get("/admin/stats")
        .add_header(cookie(), session)
        .expect_failure()
        .await;
    assert_eq!(after.status_code(), StatusCode::UNAUTHORIZED);
}
