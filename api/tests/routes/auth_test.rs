use axum::http::StatusCode;
use db::models::{session, user::Role};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;
use serial_test::serial;
use services::session_service::{CONFLICT_MESSAGE, SessionService};
use util::config::{AppConfig, SingleSessionPolicy};

use crate::helpers::{PASSWORD, json_body, make_test_app, request};

async fn session_count(db: &sea_orm::DatabaseConnection) -> u64 {
    session::Entity::find().count(db).await.unwrap()
}

#[tokio::test]
#[serial]
async fn test_login_returns_token_and_me_works() {
    let app = make_test_app().await;
    let adviser = app.create_user("maria", Role::Adviser).await;

    let token = app.login("maria").await;
    assert_eq!(token.len(), 48);

    let res = app.send(request("GET", "/api/auth/me", Some(&token), None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let json = json_body(res).await;
    assert_eq!(json["data"]["id"], adviser.id);
    assert_eq!(json["data"]["role"], "adviser");
    assert_eq!(json["data"]["show_student_photo"], true);
}

#[tokio::test]
async fn test_bad_credentials_are_rejected_without_session() {
    let app = make_test_app().await;
    app.create_user("maria", Role::Adviser).await;

    let body = json!({ "username": "maria", "password": "wrong-password" });
    let res = app.send(request("POST", "/api/auth/login", None, Some(body))).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let json = json_body(res).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Invalid username/employee ID or password.");
    assert_eq!(session_count(app.state.db()).await, 0);
}

#[tokio::test]
#[serial]
async fn test_second_login_is_blocked_while_session_is_live() {
    AppConfig::set_single_session_policy(SingleSessionPolicy::Block);
    let app = make_test_app().await;
    app.create_user("maria", Role::Adviser).await;

    let first = app.login("maria").await;
    assert_eq!(session_count(app.state.db()).await, 1);

    let body = json!({ "username": "maria", "password": PASSWORD });
    let res = app.send(request("POST", "/api/auth/login", None, Some(body))).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let json = json_body(res).await;
    assert_eq!(json["message"], CONFLICT_MESSAGE);
    assert_eq!(session_count(app.state.db()).await, 1);

    // The original session is untouched.
    let res = app.send(request("GET", "/api/auth/me", Some(&first), None)).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
#[serial]
async fn test_evict_policy_replaces_old_session() {
    AppConfig::set_single_session_policy(SingleSessionPolicy::Evict);
    let app = make_test_app().await;
    app.create_user("maria", Role::Adviser).await;

    let first = app.login("maria").await;
    let second = app.login("maria").await;
    AppConfig::set_single_session_policy(SingleSessionPolicy::Block);

    assert_ne!(first, second);
    let res = app.send(request("GET", "/api/auth/me", Some(&first), None)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let res = app.send(request("GET", "/api/auth/me", Some(&second), None)).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
#[serial]
async fn test_logout_allows_fresh_login() {
    let app = make_test_app().await;
    app.create_user("maria", Role::Adviser).await;

    let token = app.login("maria").await;
    let res = app.send(request("POST", "/api/auth/logout", Some(&token), None)).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.send(request("GET", "/api/auth/me", Some(&token), None)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let again = app.login("maria").await;
    assert_ne!(again, token);
}

#[tokio::test]
#[serial]
async fn test_token_is_invalid_after_restart_sweep() {
    let app = make_test_app().await;
    app.create_user("maria", Role::Adviser).await;
    let token = app.login("maria").await;

    let report = SessionService::startup_sweep(app.state.db()).await.unwrap();
    assert_eq!(report.removed, 1);

    let res = app.send(request("GET", "/api/auth/me", Some(&token), None)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Nothing left to block a new login.
    app.login("maria").await;
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = make_test_app().await;
    let res = app.send(request("GET", "/api/auth/me", None, None)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app.send(request("GET", "/api/auth/me", Some("not-a-real-session"), None)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[serial]
async fn test_photo_flag_toggles() {
    let app = make_test_app().await;
    app.create_user("maria", Role::Adviser).await;
    let token = app.login("maria").await;

    let res = app.send(request("POST", "/api/auth/session/photo", Some(&token), None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await["data"]["show_student_photo"], false);

    let res = app.send(request("GET", "/api/auth/session/photo", Some(&token), None)).await;
    assert_eq!(json_body(res).await["data"]["show_student_photo"], false);
}

#[tokio::test]
#[serial]
async fn test_student_login_provisions_account() {
    let app = make_test_app().await;
    let s = app.create_student("04A1B2C3", None, None).await;

    let body = json!({ "rfid_tag": "04A1B2C3" });
    let res = app.send(request("POST", "/api/auth/student-login", None, Some(body))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let json = json_body(res).await;
    assert_eq!(json["data"]["user"]["role"], "student");
    assert_eq!(json["data"]["student"]["id"], s.id);

    let body = json!({ "rfid_tag": "UNKNOWN" });
    let res = app.send(request("POST", "/api/auth/student-login", None, Some(body))).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
