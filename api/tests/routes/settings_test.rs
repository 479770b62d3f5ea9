use axum::http::StatusCode;
use db::models::user::Role;
use serde_json::json;

use crate::helpers::{json_body, make_test_app, request};

#[tokio::test]
async fn test_staff_read_admin_write() {
    let app = make_test_app().await;
    app.create_user("admin", Role::Admin).await;
    app.create_user("maria", Role::Adviser).await;
    let adviser = app.login("maria").await;
    let admin = app.login("admin").await;

    let res = app.send(request("GET", "/api/settings", Some(&adviser), None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let json = json_body(res).await;
    assert_eq!(json["data"]["grace_period_minutes"], 15);
    assert_eq!(json["data"]["warning_threshold"], 3);

    let body = json!({ "grace_period_minutes": 10 });
    let res = app.send(request("PUT", "/api/settings", Some(&adviser), Some(body.clone()))).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app.send(request("PUT", "/api/settings", Some(&admin), Some(body))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let json = json_body(res).await;
    assert_eq!(json["data"]["grace_period_minutes"], 10);
    assert_eq!(json["data"]["warning_threshold"], 3);
}

#[tokio::test]
async fn test_invalid_settings_are_rejected() {
    let app = make_test_app().await;
    app.create_user("admin", Role::Admin).await;
    let admin = app.login("admin").await;

    let body = json!({ "warning_threshold": 0 });
    let res = app.send(request("PUT", "/api/settings", Some(&admin), Some(body))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = json!({ "class_start_time": "10:00:00", "class_end_time": "09:00:00" });
    let res = app.send(request("PUT", "/api/settings", Some(&admin), Some(body))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_settings_require_login() {
    let app = make_test_app().await;
    let res = app.send(request("GET", "/api/settings", None, None)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}
