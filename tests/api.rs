//! HTTP integration tests against the in-process router.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header::WWW_AUTHENTICATE};
use common::{TestApp, request, strings};
use serde_json::json;
use snowline::config::ServerConfig;
use snowline::store::Store;
use tower::ServiceExt;

const COMMENTS_URI: &str = "/api/v1/comments?report_key=alice&track_id=MOBILE&milestone=2";

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let response = app
        .send(Request::get("/health").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_missing_identity_is_401_before_anything_else() {
    let app = TestApp::new();
    app.user("alice");

    let uris = [
        "/api/v1/comments",
        "/api/v1/milestones",
        "/api/v1/archived?report_key=alice",
        "/api/v1/report-keys",
        "/api/v1/report-users",
        "/api/v1/me",
        "/api/v1/admin/users",
    ];
    for uri in uris {
        let response = app.get(None, uri).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "GET {uri}");
        assert_eq!(response.body["error"], "Unauthorized");
    }

    let response = app
        .post(None, "/api/v1/report-access", json!({}))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_401_sets_www_authenticate() {
    let app = TestApp::new();
    let response = app
        .router()
        .oneshot(request("GET", "/api/v1/me", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(WWW_AUTHENTICATE));
}

#[tokio::test]
async fn test_blank_identity_is_401() {
    let app = TestApp::new();
    let response = app.get(Some("   "), "/api/v1/me").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_report_key_is_400_even_without_access() {
    let app = TestApp::new();
    app.user("alice");
    app.user("mallory");

    let response = app.get(Some("mallory"), "/api/v1/milestones").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .get(Some("mallory"), "/api/v1/archived?report_key=%20%20")
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .post(
            Some("mallory"),
            "/api/v1/comments",
            json!({ "report_key": "alice", "track_id": "MOBILE" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .post(Some("mallory"), "/api/v1/report-access", json!({ "report_key": "alice" }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "report_key and user_id are required");
}

#[tokio::test]
async fn test_malformed_body_is_400_not_403() {
    let app = TestApp::new();
    app.user("alice");

    let req = Request::post("/api/v1/milestones")
        .header("x-forwarded-user", "mallory")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.send(req).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["data"].is_null());
}

#[tokio::test]
async fn test_non_owner_is_forbidden() {
    let app = TestApp::new();
    app.user("alice");
    app.user("mallory");

    let response = app.get(Some("mallory"), COMMENTS_URI).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["error"], "Forbidden");

    let response = app
        .get(Some("mallory"), "/api/v1/milestones?report_key=alice")
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .post(
            Some("mallory"),
            "/api/v1/archived",
            json!({ "report_key": "alice", "track_id": "MOBILE", "milestone": 1 }),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    // Nothing was written.
    let key = snowline::types::ReportKey::new("alice").unwrap();
    assert!(app.store.get_archived(&key).unwrap().is_empty());
}

#[tokio::test]
async fn test_first_request_provisions_user_with_own_report() {
    let app = TestApp::new();

    let response = app.get(Some("Carol"), "/api/v1/me").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["username"], "Carol");
    assert_eq!(response.body["data"]["report_key"], "carol");
    assert_eq!(response.body["data"]["is_admin"], false);

    let response = app
        .get(Some("Carol"), "/api/v1/milestones?report_key=CAROL")
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_owner_comments_round_trip() {
    let app = TestApp::new();
    app.user("alice");

    let response = app
        .post(
            Some("alice"),
            "/api/v1/comments",
            json!({
                "report_key": " Alice ",
                "track_id": "MOBILE",
                "milestone": 2,
                "text": "Shipped the offline mode",
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["data"]["report_key"], "alice");
    assert_eq!(response.body["data"]["author"], "alice");

    let response = app.get(Some("alice"), COMMENTS_URI).await;
    assert_eq!(response.status, StatusCode::OK);
    let comments = response.body["data"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["text"], "Shipped the offline mode");
}

#[tokio::test]
async fn test_grant_then_revoke() {
    let app = TestApp::new();
    app.user("alice");
    app.user("bob");

    let response = app
        .post(
            Some("alice"),
            "/api/v1/report-access",
            json!({ "report_key": "alice", "user_id": "bob" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["data"]["granted"], true);

    let response = app.get(Some("bob"), COMMENTS_URI).await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app.get(Some("bob"), "/api/v1/report-keys").await;
    assert_eq!(strings(&response.body), vec!["alice", "bob"]);

    let response = app
        .delete(
            Some("alice"),
            "/api/v1/report-access",
            Some(json!({ "report_key": "alice", "user_id": "bob" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["removed"], true);
    assert_eq!(response.body["data"]["username"], "bob");

    let response = app.get(Some("bob"), COMMENTS_URI).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app.get(Some("bob"), "/api/v1/report-keys").await;
    assert_eq!(strings(&response.body), vec!["bob"]);
}

#[tokio::test]
async fn test_grantee_cannot_grant_onward() {
    let app = TestApp::new();
    app.user("alice");
    app.user("bob");
    app.user("carol");
    app.store
        .grant(&snowline::types::ReportKey::new("alice").unwrap(), "bob")
        .unwrap();

    let response = app
        .post(
            Some("bob"),
            "/api/v1/report-access",
            json!({ "report_key": "alice", "user_id": "carol" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .delete(
            Some("bob"),
            "/api/v1/report-access",
            Some(json!({ "report_key": "alice", "user_id": "bob" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_grant_to_unknown_user_reports_not_granted() {
    let app = TestApp::new();
    app.user("alice");

    let response = app
        .post(
            Some("alice"),
            "/api/v1/report-access",
            json!({ "report_key": "alice", "user_id": "ghost" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["data"]["granted"], false);
    assert!(app.store.get_user("ghost").unwrap().is_none());
}

#[tokio::test]
async fn test_admin_reads_everything_but_cannot_grant_by_default() {
    let app = TestApp::new();
    app.user("alice");
    app.user("bob");
    app.admin("root");

    let response = app.get(Some("root"), COMMENTS_URI).await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app.get(Some("root"), "/api/v1/report-keys").await;
    assert_eq!(strings(&response.body), vec!["alice", "bob", "root"]);

    let response = app
        .post(
            Some("root"),
            "/api/v1/report-access",
            json!({ "report_key": "alice", "user_id": "bob" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admins_manage_access_toggle() {
    let app = TestApp::with_config(ServerConfig {
        admins_manage_access: true,
        ..ServerConfig::default()
    });
    app.user("alice");
    app.user("bob");
    app.admin("root");

    let response = app
        .post(
            Some("root"),
            "/api/v1/report-access",
            json!({ "report_key": "alice", "user_id": "bob" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["data"]["granted"], true);

    let response = app.get(Some("bob"), COMMENTS_URI).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_report_users_is_owner_or_admin_only() {
    let app = TestApp::new();
    app.user("alice");
    app.user("bob");
    app.admin("root");
    app.store
        .grant(&snowline::types::ReportKey::new("alice").unwrap(), "bob")
        .unwrap();

    let response = app
        .get(Some("bob"), "/api/v1/report-users?report_key=alice")
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .get(Some("alice"), "/api/v1/report-users?report_key=alice")
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(strings(&response.body), vec!["alice", "bob", "root"]);

    let response = app
        .get(Some("root"), "/api/v1/report-access?report_key=alice")
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let grants = response.body["data"].as_array().unwrap();
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0]["username"], "bob");
}

#[tokio::test]
async fn test_milestones_and_archived() {
    let app = TestApp::new();
    app.user("alice");

    let response = app
        .post(
            Some("alice"),
            "/api/v1/milestones",
            json!({ "report_key": "alice", "track_id": "MOBILE", "milestone": 3 }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["MOBILE"], 3);

    let response = app
        .post(
            Some("alice"),
            "/api/v1/milestones",
            json!({ "report_key": "alice" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let toggle = json!({ "report_key": "alice", "track_id": "MOBILE", "milestone": 2 });
    let response = app
        .post(Some("alice"), "/api/v1/archived", toggle.clone())
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["MOBILE"]["2"], true);

    let response = app.post(Some("alice"), "/api/v1/archived", toggle).await;
    assert_eq!(response.body["data"]["MOBILE"]["2"], false);

    let response = app
        .post(
            Some("alice"),
            "/api/v1/archived",
            json!({ "report_key": "alice", "archived_by_track": { "WEB": { "1": true } } }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"], json!({ "WEB": { "1": true } }));
}

#[tokio::test]
async fn test_admin_endpoints() {
    let app = TestApp::new();
    app.admin("root");
    app.user("alice");

    let response = app.get(Some("alice"), "/api/v1/admin/admins").await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .post(Some("root"), "/api/v1/admin/admins", json!({ "username": "alice" }))
        .await;
    assert_eq!(response.status, StatusCode::CREATED);

    let response = app.get(Some("root"), "/api/v1/admin/admins").await;
    assert_eq!(strings(&response.body), vec!["alice", "root"]);

    let response = app
        .delete(Some("root"), "/api/v1/admin/admins/alice", None)
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert!(!app.store.is_admin("alice").unwrap());

    let response = app
        .post(
            Some("root"),
            "/api/v1/admin/users",
            json!({ "username": "dave", "email": "dave@example.com" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["data"]["report_key"], "dave");

    let response = app
        .post(Some("root"), "/api/v1/admin/users", json!({ "username": "dave" }))
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    let response = app.get(Some("root"), "/api/v1/admin/users").await;
    assert_eq!(strings(&response.body), vec!["alice", "dave", "root"]);
}

#[tokio::test]
async fn test_custom_identity_header() {
    let app = TestApp::with_config(ServerConfig {
        identity_header: "x-remote-user".to_string(),
        ..ServerConfig::default()
    });

    let response = app.get(Some("alice"), "/api/v1/me").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let req = Request::get("/api/v1/me")
        .header("x-remote-user", "alice")
        .body(Body::empty())
        .unwrap();
    let response = app.router().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_case_variant_of_owner_is_refused() {
    let app = TestApp::new();
    app.user("alice");

    let response = app
        .post(
            Some("alice"),
            "/api/v1/milestones",
            json!({ "report_key": "alice", "track_id": "MOBILE", "milestone": 3 }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .get(Some("ALICE"), "/api/v1/milestones?report_key=alice")
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert!(response.body["data"].is_null());

    let response = app
        .post(
            Some("ALICE"),
            "/api/v1/report-access",
            json!({ "report_key": "alice", "user_id": "ALICE" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    assert!(app.store.get_user("ALICE").unwrap().is_none());
    let response = app
        .get(Some("alice"), "/api/v1/report-users?report_key=alice")
        .await;
    assert_eq!(strings(&response.body), vec!["alice"]);
}

#[tokio::test]
async fn test_admin_add_of_case_variant_conflicts() {
    let app = TestApp::new();
    app.admin("root");
    app.user("alice");

    let response = app
        .post(Some("root"), "/api/v1/admin/admins", json!({ "username": "Alice" }))
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert!(!app.store.is_admin("alice").unwrap());
}

#[tokio::test]
async fn test_store_failure_in_access_check_is_500_not_403() {
    let app = TestApp::new();
    app.user("bob");
    app.user("mallory");
    app.store
        .connection()
        .execute_batch("DROP TABLE report_access")
        .unwrap();

    let response = app
        .get(Some("mallory"), "/api/v1/milestones?report_key=bob")
        .await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["error"], "Failed to check report access");
}

#[tokio::test]
async fn test_store_failure_in_manage_check_is_500_not_403() {
    let app = TestApp::with_config(ServerConfig {
        admins_manage_access: true,
        ..ServerConfig::default()
    });
    app.user("bob");
    app.user("carol");
    app.user("mallory");
    app.store
        .connection()
        .execute_batch("DROP TABLE user_roles")
        .unwrap();

    let response = app
        .post(
            Some("mallory"),
            "/api/v1/report-access",
            json!({ "report_key": "bob", "user_id": "carol" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["error"], "Failed to check report ownership");
}

#[tokio::test]
async fn test_revoke_without_grant_reports_nothing_removed() {
    let app = TestApp::new();
    app.user("alice");
    app.user("bob");

    let response = app
        .delete(
            Some("alice"),
            "/api/v1/report-access",
            Some(json!({ "report_key": "alice", "user_id": "bob" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["removed"], false);
    assert_eq!(response.body["data"]["report_key"], "alice");
}
