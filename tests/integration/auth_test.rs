//! Signup, login, logout and cookie refresh.

use axum::http::StatusCode;
use serde_json::json;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_ping() {
    let app = TestApp::new().await;
    let response = app.request("GET", "/ping", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "pong");
}

#[tokio::test]
async fn test_signup_sets_cookies_and_me_works() {
    let app = TestApp::new().await;
    let response = app
        .request(
            "POST",
            "/auth/signup",
            Some(json!({ "username": "alice", "password": "password123" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["data"]["username"], "alice");

    let set = response.set_cookies();
    assert_eq!(set.len(), 2);
    assert!(set.iter().any(|c| c.starts_with("accessToken=")));
    assert!(set.iter().any(|c| c.starts_with("refreshToken=")));
    assert!(set.iter().all(|c| c.contains("HttpOnly") && c.contains("SameSite=Lax")));

    let me = app
        .request("GET", "/auth/me", None, Some(&response.cookies()))
        .await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["data"]["username"], "alice");
}

#[tokio::test]
async fn test_duplicate_signup_conflicts() {
    let app = TestApp::new().await;
    app.signup("alice").await;

    let response = app
        .request(
            "POST",
            "/auth/signup",
            Some(json!({ "username": "alice", "password": "another123" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["error"], "CONFLICT");
}

#[tokio::test]
async fn test_signup_enforces_credential_rules() {
    let app = TestApp::new().await;

    for (username, password) in [
        ("bob", "password123"),
        ("bobby", "short"),
        ("../bob", "password123"),
        ("", "password123"),
    ] {
        let response = app
            .request(
                "POST",
                "/auth/signup",
                Some(json!({ "username": username, "password": password })),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{username}");
        assert_eq!(response.body["error"], "VALIDATION");
    }
}

#[tokio::test]
async fn test_login() {
    let app = TestApp::new().await;
    app.signup("alice").await;

    let ok = app
        .request(
            "POST",
            "/auth/login",
            Some(json!({ "username": "alice", "password": "password123" })),
            None,
        )
        .await;
    assert_eq!(ok.status, StatusCode::OK);
    assert_eq!(ok.set_cookies().len(), 2);

    let wrong = app
        .request(
            "POST",
            "/auth/login",
            Some(json!({ "username": "alice", "password": "wrongpassword" })),
            None,
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let unknown = app
        .request(
            "POST",
            "/auth/login",
            Some(json!({ "username": "nobody", "password": "password123" })),
            None,
        )
        .await;
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.body["message"], wrong.body["message"]);
}

#[tokio::test]
async fn test_protected_routes_require_cookies() {
    let app = TestApp::new().await;

    for uri in ["/auth/me", "/files", "/stats/usage"] {
        let response = app.request("GET", uri, None, None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{uri}");
    }

    let garbage = app
        .request("GET", "/auth/me", None, Some("accessToken=nope; refreshToken=nope"))
        .await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_cookie_renews_both_tokens() {
    let app = TestApp::new().await;
    let cookies = app.signup("alice").await;
    let refresh_only = cookies
        .split("; ")
        .find(|c| c.starts_with("refreshToken="))
        .unwrap()
        .to_string();

    let response = app
        .request("GET", "/auth/me", None, Some(&refresh_only))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["username"], "alice");

    let renewed = response.set_cookies();
    assert!(renewed.iter().any(|c| c.starts_with("accessToken=")));
    assert!(renewed.iter().any(|c| c.starts_with("refreshToken=")));

    let again = app
        .request("GET", "/auth/me", None, Some(&response.cookies()))
        .await;
    assert_eq!(again.status, StatusCode::OK);
    assert!(again.set_cookies().is_empty());
}

#[tokio::test]
async fn test_access_token_is_not_a_refresh_token() {
    let app = TestApp::new().await;
    let cookies = app.signup("alice").await;
    let access = cookies
        .split("; ")
        .find_map(|c| c.strip_prefix("accessToken="))
        .unwrap();

    let response = app
        .request("GET", "/auth/me", None, Some(&format!("refreshToken={access}")))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_clears_cookies() {
    let app = TestApp::new().await;
    let cookies = app.signup("alice").await;

    let response = app
        .request("POST", "/auth/logout", None, Some(&cookies))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let cleared = response.set_cookies();
    assert_eq!(cleared.len(), 2);
    assert!(cleared.iter().all(|c| c.contains("Max-Age=0")));
}
