#![allow(clippy::unwrap_used, clippy::panic, clippy::todo, clippy::missing_panics_doc, clippy::must_use_candidate, missing_debug_implementations, clippy::cast_precision_loss, clippy::clone_on_ref_ptr, clippy::match_same_arms, clippy::items_after_statements, unreachable_pub, clippy::print_stdout, clippy::similar_names)]
use reqwest::StatusCode;
use serde_json::{Value, json};
use time::Duration;
mod common;

#[tokio::test]
async fn test_login_returns_token_pair_and_sanitized_user() {
    let app = common::TestApp::spawn().await;

    let resp = app.login(common::ADMIN_EMAIL, common::ADMIN_PASSWORD).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    assert!(body["accessToken"].is_string());
    assert!(body["refreshToken"].is_string());
    assert_eq!(body["user"]["email"], common::ADMIN_EMAIL);
    assert_eq!(body["user"]["role"], "ADMIN");
    assert!(body["user"].get("passwordHash").is_none());
    assert!(body["user"].get("password").is_none());
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = common::TestApp::spawn().await;

    let wrong_password = app.login(common::ADMIN_EMAIL, "not-the-password").await;
    let unknown_user = app.login("nobody@pharmacy.test", "whatever").await;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);

    let a: Value = wrong_password.json().await.unwrap();
    let b: Value = unknown_user.json().await.unwrap();
    assert_eq!(a, b);
    assert_eq!(a, json!({ "error": true, "message": "Invalid credentials" }));
}

#[tokio::test]
async fn test_login_email_is_case_insensitive() {
    let app = common::TestApp::spawn().await;
    let resp = app.login("  ADMIN@Pharmacy.Test ", common::ADMIN_PASSWORD).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_and_invalid_token_messages() {
    let app = common::TestApp::spawn().await;

    let missing = app.client.get(app.url("/medications")).send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    let body: Value = missing.json().await.unwrap();
    assert_eq!(body["message"], "No token, authorization denied");

    let invalid = app.get("/medications", "not.a.jwt").await;
    assert_eq!(invalid.status(), StatusCode::UNAUTHORIZED);
    let body: Value = invalid.json().await.unwrap();
    assert_eq!(body["message"], "Token is not valid");
}

#[tokio::test]
async fn test_bearer_header_is_not_accepted() {
    let app = common::TestApp::spawn().await;
    let token = app.admin_token().await;

    let resp = app.client.get(app.url("/medications")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_access_token_expires_after_one_hour() {
    let app = common::TestApp::spawn().await;
    let token = app.admin_token().await;

    app.clock.advance(Duration::minutes(59) + Duration::seconds(59));
    assert_eq!(app.get("/auth/profile", &token).await.status(), StatusCode::OK);

    app.clock.advance(Duration::seconds(1));
    assert_eq!(app.get("/auth/profile", &token).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_issues_working_access_token() {
    let app = common::TestApp::spawn().await;
    let session = app.session(common::ADMIN_EMAIL, common::ADMIN_PASSWORD).await;
    let refresh_token = session["refreshToken"].as_str().unwrap();

    app.clock.advance(Duration::days(6) + Duration::hours(23));

    let resp =
        app.client.post(app.url("/auth/refresh")).json(&json!({ "refreshToken": refresh_token })).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert!(body.get("refreshToken").is_none());

    let access_token = body["accessToken"].as_str().unwrap();
    assert_eq!(app.get("/auth/profile", access_token).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_token_expires_after_seven_days() {
    let app = common::TestApp::spawn().await;
    let session = app.session(common::ADMIN_EMAIL, common::ADMIN_PASSWORD).await;
    let refresh_token = session["refreshToken"].as_str().unwrap();

    app.clock.advance(Duration::days(7) + Duration::hours(1));

    let resp =
        app.client.post(app.url("/auth/refresh")).json(&json!({ "refreshToken": refresh_token })).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_without_token() {
    let app = common::TestApp::spawn().await;
    let resp = app.client.post(app.url("/auth/refresh")).json(&json!({})).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "No token, authorization denied");
}

#[tokio::test]
async fn test_tokens_are_not_interchangeable() {
    let app = common::TestApp::spawn().await;
    let session = app.session(common::ADMIN_EMAIL, common::ADMIN_PASSWORD).await;

    let refresh_as_access = app.get("/auth/profile", session["refreshToken"].as_str().unwrap()).await;
    assert_eq!(refresh_as_access.status(), StatusCode::UNAUTHORIZED);

    let access_as_refresh = app
        .client
        .post(app.url("/auth/refresh"))
        .json(&json!({ "refreshToken": session["accessToken"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(access_as_refresh.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_picks_up_role_change() {
    let app = common::TestApp::spawn().await;
    let admin = app.admin_token().await;
    app.register_user("staff@pharmacy.test", "STAFF").await;

    let session = app.session("staff@pharmacy.test", "password123").await;
    let staff_id = session["user"]["id"].as_str().unwrap();
    let staff_token = session["accessToken"].as_str().unwrap();
    assert_eq!(app.get("/users", staff_token).await.status(), StatusCode::FORBIDDEN);

    let resp = app.put(&format!("/users/{staff_id}/role"), &admin, &json!({ "role": "ADMIN" })).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .client
        .post(app.url("/auth/refresh"))
        .json(&json!({ "refreshToken": session["refreshToken"] }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let promoted = body["accessToken"].as_str().unwrap();
    assert_eq!(app.get("/users", promoted).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_profile_logout_and_password_change() {
    let app = common::TestApp::spawn().await;
    let token = app.register_user("pharm@pharmacy.test", "PHARMACIST").await;

    let profile: Value = app.get("/auth/profile", &token).await.json().await.unwrap();
    assert_eq!(profile["user"]["email"], "pharm@pharmacy.test");
    assert_eq!(profile["user"]["role"], "PHARMACIST");
    assert!(profile["user"].get("passwordHash").is_none());

    let logout = app.post("/auth/logout", &token, &json!({})).await;
    assert_eq!(logout.status(), StatusCode::OK);
    let body: Value = logout.json().await.unwrap();
    assert_eq!(body["success"], true);

    let wrong = app
        .put("/auth/password", &token, &json!({ "currentPassword": "nope", "newPassword": "new-password-1" }))
        .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let ok = app
        .put("/auth/password", &token, &json!({ "currentPassword": "password123", "newPassword": "new-password-1" }))
        .await;
    assert_eq!(ok.status(), StatusCode::OK);

    assert_eq!(app.login("pharm@pharmacy.test", "password123").await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.login("pharm@pharmacy.test", "new-password-1").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_user_admin_routes() {
    let app = common::TestApp::spawn().await;
    let admin = app.admin_token().await;

    let dup = app
        .post(
            "/users",
            &admin,
            &json!({ "name": "Dup", "email": common::ADMIN_EMAIL.to_uppercase(), "password": "password123" }),
        )
        .await;
    assert_eq!(dup.status(), StatusCode::CONFLICT);

    let staff = app.register_user("clerk@pharmacy.test", "STAFF").await;
    let forbidden = app
        .post("/users", &staff, &json!({ "name": "X", "email": "x@pharmacy.test", "password": "password123" }))
        .await;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let users: Vec<Value> = app.get("/users", &admin).await.json().await.unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.get("passwordHash").is_none()));
}

#[tokio::test]
async fn test_logout_needs_no_valid_token() {
    let app = common::TestApp::spawn().await;
    let token = app.admin_token().await;

    let anonymous = app.client.post(app.url("/auth/logout")).send().await.unwrap();
    assert_eq!(anonymous.status(), StatusCode::OK);
    let body: Value = anonymous.json().await.unwrap();
    assert_eq!(body, json!({ "success": true, "message": "Logged out successfully" }));

    app.clock.advance(Duration::hours(2));
    assert_eq!(app.get("/auth/profile", &token).await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.post("/auth/logout", &token, &json!({})).await.status(), StatusCode::OK);
}
