mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{ADMIN_KEY, TestApp, admin_headers};
use confab::store::Store;
use confab::types::{MeetingStatus, NewMeeting};

async fn register(app: &TestApp, email: &str, password: &str) -> serde_json::Value {
    let (status, body) = app
        .post(
            "/auth/register",
            &[],
            Some(json!({"email": email, "password": password})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"].clone()
}

#[tokio::test]
async fn health_endpoint_needs_no_auth() {
    let app = TestApp::spawn();
    let (status, _) = app.get("/health", &[]).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn admin_endpoints_reject_missing_and_wrong_keys() {
    let app = TestApp::spawn();

    let (status, body) = app.get("/admin/users", &[]).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "invalid or missing admin token");

    let (status, _) = app
        .get("/admin/users", &[("X-Admin-API-Key", "wrong")])
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.get("/admin/users", &admin_headers()).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn admin_endpoints_report_misconfiguration_when_key_unset() {
    let app = TestApp::spawn_with_admin_key(None);

    // Even a "correct-looking" key must not slip through, and the error is
    // distinct from a plain rejection.
    let (status, body) = app
        .get("/admin/users", &[("X-Admin-API-Key", ADMIN_KEY)])
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["error"],
        "admin authentication is not configured on the server"
    );
}

#[tokio::test]
async fn user_endpoints_distinguish_missing_from_invalid_key() {
    let app = TestApp::spawn();

    let (status, body) = app.get("/user/meetings/count", &[]).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing API key");

    let (status, body) = app
        .get("/user/meetings/count", &[("X-API-Key", "unknown-token")])
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "invalid API key");
}

#[tokio::test]
async fn admin_key_is_not_accepted_as_user_key_and_vice_versa() {
    let app = TestApp::spawn();
    let data = register(&app, "alice@example.com", "pw123").await;
    let user_token = data["token"].as_str().unwrap().to_string();

    let (status, _) = app
        .get("/user/meetings/count", &[("X-API-Key", ADMIN_KEY)])
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .get("/admin/users", &[("X-Admin-API-Key", user_token.as_str())])
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn register_login_revoke_flow() {
    let app = TestApp::spawn();

    // Register: 201, token of the advertised length, first user gets id 1.
    let (status, body) = app
        .post(
            "/auth/register",
            &[],
            Some(json!({"email": "alice@example.com", "password": "pw123", "name": "Alice"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let register_token = body["data"]["token"].as_str().unwrap().to_string();
    assert_eq!(register_token.len(), 40);
    assert_eq!(body["data"]["user"]["id"], 1);
    // The password digest never leaves the server.
    assert!(body["data"]["user"].get("hashed_password").is_none());

    // Second registration for the same email is rejected and creates nothing.
    let (status, body) = app
        .post(
            "/auth/register",
            &[],
            Some(json!({"email": "alice@example.com", "password": "other"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "user with this email already exists");

    // Login yields a fresh token for the same user; the old one stays valid.
    let (status, body) = app
        .post(
            "/auth/login",
            &[],
            Some(json!({"email": "alice@example.com", "password": "pw123"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let login_token = body["data"]["token"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["user"]["id"], 1);
    assert_ne!(login_token, register_token);

    for token in [&register_token, &login_token] {
        let (status, _) = app
            .get("/user/meetings/count", &[("X-API-Key", token.as_str())])
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    // Admin revokes the login token by its storage id.
    let (_, body) = app.get("/admin/users/1", &admin_headers()).await;
    let tokens = body["data"]["api_tokens"].as_array().unwrap();
    assert_eq!(tokens.len(), 2);
    let login_token_id = tokens
        .iter()
        .find(|t| t["token"] == login_token.as_str())
        .unwrap()["id"]
        .as_i64()
        .unwrap();

    let (status, _) = app
        .delete(&format!("/admin/tokens/{login_token_id}"), &admin_headers())
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Revoking again is a plain 404.
    let (status, _) = app
        .delete(&format!("/admin/tokens/{login_token_id}"), &admin_headers())
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The revoked token no longer passes the gate; the register token does.
    let (status, _) = app
        .get("/user/meetings/count", &[("X-API-Key", login_token.as_str())])
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .get(
            "/user/meetings/count",
            &[("X-API-Key", register_token.as_str())],
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn login_failure_reasons_are_distinct() {
    let app = TestApp::spawn();
    register(&app, "alice@example.com", "pw123").await;

    let (status, body) = app
        .post(
            "/auth/login",
            &[],
            Some(json!({"email": "ghost@example.com", "password": "pw123"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "user not found");

    let (status, body) = app
        .post(
            "/auth/login",
            &[],
            Some(json!({"email": "alice@example.com", "password": "wrong"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid credentials");
}

#[tokio::test]
async fn logout_deletes_the_presented_token() {
    let app = TestApp::spawn();
    let data = register(&app, "alice@example.com", "pw123").await;
    let token = data["token"].as_str().unwrap().to_string();

    let (status, body) = app.post("/auth/logout", &[], None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing API key");

    let (status, body) = app
        .post("/auth/logout", &[("X-API-Key", token.as_str())], None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "successfully logged out");

    // The token is gone: logout again is 401, the gate says 403.
    let (status, body) = app
        .post("/auth/logout", &[("X-API-Key", token.as_str())], None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid API key");

    let (status, _) = app
        .get("/user/meetings/count", &[("X-API-Key", token.as_str())])
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn find_or_create_returns_the_same_user() {
    let app = TestApp::spawn();

    let (status, body) = app
        .post(
            "/admin/users",
            &admin_headers(),
            Some(json!({"email": "bob@example.com", "password": "pw", "name": "Bob"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["max_concurrent_meetings"], 1);

    let (status, body) = app
        .post(
            "/admin/users",
            &admin_headers(),
            Some(json!({"email": "bob@example.com", "password": "different", "name": "Robert"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"].as_i64().unwrap(), id);
    // Existing user comes back unchanged.
    assert_eq!(body["data"]["name"], "Bob");

    let (_, body) = app.get("/admin/users", &admin_headers()).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn get_user_by_email_returns_bare_user() {
    let app = TestApp::spawn();
    register(&app, "alice@example.com", "pw123").await;

    let (status, body) = app
        .get("/admin/users/email/alice@example.com", &admin_headers())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "alice@example.com");
    assert!(body["data"].get("api_tokens").is_none());

    let (status, _) = app
        .get("/admin/users/email/ghost@example.com", &admin_headers())
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn patch_semantics() {
    let app = TestApp::spawn();
    let data = register(&app, "alice@example.com", "pw123").await;
    let id = data["user"]["id"].as_i64().unwrap();
    let uri = format!("/admin/users/{id}");

    // Empty update succeeds and changes nothing.
    let (status, body) = app.patch(&uri, &admin_headers(), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "alice@example.com");

    // Email is immutable; restating the current value is fine.
    let (status, body) = app
        .patch(&uri, &admin_headers(), json!({"email": "eve@example.com"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "cannot change user email");

    let (status, _) = app
        .patch(&uri, &admin_headers(), json!({"email": "alice@example.com", "name": "Alice"}))
        .await;
    assert_eq!(status, StatusCode::OK);

    // PATCH replaces the metadata map wholesale.
    app.patch(&uri, &admin_headers(), json!({"data": {"b": 2}}))
        .await;
    let (_, body) = app
        .patch(&uri, &admin_headers(), json!({"data": {"a": 1}}))
        .await;
    assert_eq!(body["data"]["data"], json!({"a": 1}));

    let (status, _) = app
        .patch("/admin/users/999", &admin_headers(), json!({"name": "X"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn put_merges_metadata_and_replaces_scalars() {
    let app = TestApp::spawn();
    let data = register(&app, "alice@example.com", "pw123").await;
    let id = data["user"]["id"].as_i64().unwrap();
    let uri = format!("/admin/users/{id}");

    app.patch(&uri, &admin_headers(), json!({"data": {"b": 2}}))
        .await;

    // PUT overlays the metadata sub-map instead of replacing it.
    let (status, body) = app
        .put(&uri, &admin_headers(), json!({"data": {"a": 1}}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["data"], json!({"b": 2, "a": 1}));

    // Scalars still fully replace under PUT.
    let (_, body) = app
        .put(&uri, &admin_headers(), json!({"max_concurrent_meetings": 5}))
        .await;
    assert_eq!(body["data"]["max_concurrent_meetings"], 5);
    assert_eq!(body["data"]["data"], json!({"b": 2, "a": 1}));
}

#[tokio::test]
async fn password_update_rehashes() {
    let app = TestApp::spawn();
    let data = register(&app, "alice@example.com", "pw123").await;
    let id = data["user"]["id"].as_i64().unwrap();

    let (status, _) = app
        .patch(
            &format!("/admin/users/{id}"),
            &admin_headers(),
            json!({"password": "new-secret"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(
            "/auth/login",
            &[],
            Some(json!({"email": "alice@example.com", "password": "new-secret"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(
            "/auth/login",
            &[],
            Some(json!({"email": "alice@example.com", "password": "pw123"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn webhook_url_is_validated_and_stored() {
    let app = TestApp::spawn();
    let data = register(&app, "alice@example.com", "pw123").await;
    let token = data["token"].as_str().unwrap().to_string();
    let auth = [("X-API-Key", token.as_str())];

    let (status, body) = app
        .put("/user/webhook", &auth, json!({"webhook_url": "not a url"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "webhook_url must be a valid absolute URL");

    let (status, _) = app
        .put("/user/webhook", &auth, json!({"webhook_url": "ftp://example.com/x"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .put(
            "/user/webhook",
            &auth,
            json!({"webhook_url": "https://example.com/hook"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["data"]["webhook_url"], "https://example.com/hook");

    // Other metadata keys survive a webhook update.
    let id = data["user"]["id"].as_i64().unwrap();
    let (_, body) = app
        .put(
            &format!("/admin/users/{id}"),
            &admin_headers(),
            json!({"data": {"plan": "pro"}}),
        )
        .await;
    assert_eq!(body["data"]["data"]["webhook_url"], "https://example.com/hook");
    assert_eq!(body["data"]["data"]["plan"], "pro");
}

#[tokio::test]
async fn meeting_counts_are_scoped_to_the_principal() {
    let app = TestApp::spawn();
    let alice = register(&app, "alice@example.com", "pw123").await;
    let bob = register(&app, "bob@example.com", "pw456").await;
    let alice_id = alice["user"]["id"].as_i64().unwrap();
    let bob_id = bob["user"]["id"].as_i64().unwrap();

    for (user_id, status) in [
        (alice_id, MeetingStatus::Active),
        (alice_id, MeetingStatus::Completed),
        (bob_id, MeetingStatus::Failed),
    ] {
        app.store
            .create_meeting(&NewMeeting {
                user_id,
                platform: "google_meet".to_string(),
                native_meeting_id: None,
                status,
            })
            .unwrap();
    }

    let alice_token = alice["token"].as_str().unwrap();
    let (status, body) = app
        .get("/user/meetings/count", &[("X-API-Key", alice_token)])
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user_id"], alice_id);
    assert_eq!(body["data"]["total_meetings"], 2);
    assert_eq!(body["data"]["by_status"]["active"], 1);
    assert_eq!(body["data"]["by_status"]["completed"], 1);
    assert_eq!(body["data"]["by_status"]["failed"], 0);

    // Admin sees any user's counts; unknown users are a 404.
    let (status, body) = app
        .get(
            &format!("/admin/users/{bob_id}/meetings/count"),
            &admin_headers(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_meetings"], 1);

    let (status, _) = app
        .get("/admin/users/999/meetings/count", &admin_headers())
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_stats_join_meetings_with_users() {
    let app = TestApp::spawn();
    let alice = register(&app, "alice@example.com", "pw123").await;
    let alice_id = alice["user"]["id"].as_i64().unwrap();

    for platform in ["zoom", "teams"] {
        app.store
            .create_meeting(&NewMeeting {
                user_id: alice_id,
                platform: platform.to_string(),
                native_meeting_id: None,
                status: MeetingStatus::Completed,
            })
            .unwrap();
    }

    let (status, body) = app.get("/admin/stats/meetings", &admin_headers()).await;
    assert_eq!(status, StatusCode::OK);

    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    // Newest first, with the owning user embedded.
    assert_eq!(items[0]["platform"], "teams");
    assert_eq!(items[1]["platform"], "zoom");
    assert_eq!(items[0]["user"]["email"], "alice@example.com");
    assert_eq!(body["has_more"], false);
}

#[tokio::test]
async fn admin_token_issuance_for_unknown_user_is_404() {
    let app = TestApp::spawn();

    let (status, _) = app
        .post("/admin/users/42/tokens", &admin_headers(), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    register(&app, "alice@example.com", "pw123").await;
    let (status, body) = app
        .post("/admin/users/1/tokens", &admin_headers(), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let minted = body["data"]["token"].as_str().unwrap().to_string();
    assert_eq!(minted.len(), 40);

    // The minted token passes the user gate.
    let (status, _) = app
        .get("/user/meetings/count", &[("X-API-Key", minted.as_str())])
        .await;
    assert_eq!(status, StatusCode::OK);
}
