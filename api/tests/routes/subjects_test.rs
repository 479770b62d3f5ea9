use axum::http::StatusCode;
use db::models::user::Role;
use serde_json::json;

use crate::helpers::{json_body, make_test_app, request};

#[tokio::test]
async fn test_subject_lifecycle() {
    let app = make_test_app().await;
    let adviser = app.create_user("maria", Role::Adviser).await;
    let token = app.login("maria").await;

    let body = json!({
        "code": "sci8",
        "name": "Science 8",
        "schedule_time_start": "10:00:00",
        "schedule_time_end": "11:00:00"
    });
    let res = app.send(request("POST", "/api/subjects", Some(&token), Some(body))).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let json = json_body(res).await;
    assert_eq!(json["data"]["code"], "SCI8");
    assert_eq!(json["data"]["adviser_id"], adviser.id);
    let id = json["data"]["id"].as_i64().unwrap();

    let body = json!({ "day_of_week": 0, "time_start": "10:00:00", "time_end": "11:00:00" });
    let uri = format!("/api/subjects/{id}/schedules");
    let res = app.send(request("POST", &uri, Some(&token), Some(body))).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let schedule_id = json_body(res).await["data"]["id"].as_i64().unwrap();

    let body = json!({ "time_start": "10:00:00", "time_end": "11:00:00" });
    let res = app.send(request("POST", &uri, Some(&token), Some(body))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app.send(request("GET", &format!("/api/subjects/{id}"), Some(&token), None)).await;
    let json = json_body(res).await;
    assert_eq!(json["data"]["schedules"].as_array().unwrap().len(), 1);

    let uri = format!("/api/subjects/{id}/schedules/{schedule_id}");
    let res = app.send(request("DELETE", &uri, Some(&token), None)).await;
    assert_eq!(res.status(), StatusCode::OK);

    let body = json!({ "is_active": false });
    let res = app.send(request("PUT", &format!("/api/subjects/{id}"), Some(&token), Some(body))).await;
    assert_eq!(json_body(res).await["data"]["is_active"], false);

    let res = app.send(request("GET", "/api/subjects?active_only=true", Some(&token), None)).await;
    assert!(json_body(res).await["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_enrollment_batch() {
    let app = make_test_app().await;
    let adviser = app.create_user("maria", Role::Adviser).await;
    let other = app.create_user("jose", Role::Adviser).await;
    let subject = app.create_subject(adviser.id).await;
    let mine = app.create_student("TAG1", Some(adviser.id), None).await;
    let theirs = app.create_student("TAG2", Some(other.id), None).await;
    let token = app.login("maria").await;

    let uri = format!("/api/subjects/{}/students", subject.id);
    let body = json!({ "student_ids": [mine.id, theirs.id] });
    let res = app.send(request("POST", &uri, Some(&token), Some(body))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let json = json_body(res).await;
    assert_eq!(json["data"]["enrolled"], json!([mine.id]));
    assert_eq!(json["data"]["not_found"], json!([theirs.id]));

    let body = json!({ "student_ids": [mine.id] });
    let res = app.send(request("POST", &uri, Some(&token), Some(body))).await;
    assert_eq!(json_body(res).await["data"]["already_enrolled"], json!([mine.id]));

    let res = app.send(request("GET", &uri, Some(&token), None)).await;
    assert_eq!(json_body(res).await["data"].as_array().unwrap().len(), 1);

    let res = app
        .send(request("DELETE", &format!("{uri}/{}", mine.id), Some(&token), None))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let res = app
        .send(request("DELETE", &format!("{uri}/{}", mine.id), Some(&token), None))
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_adviser_lists_subjects_of_advisees() {
    let app = make_test_app().await;
    let owner = app.create_user("maria", Role::Adviser).await;
    let other = app.create_user("jose", Role::Adviser).await;
    let subject = app.create_subject(owner.id).await;
    app.create_student("TAG1", Some(other.id), Some(subject.id)).await;
    let token = app.login("jose").await;

    let res = app.send(request("GET", "/api/subjects", Some(&token), None)).await;
    let json = json_body(res).await;
    let list = json["data"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], subject.id);

    // Visible, but not manageable.
    let body = json!({ "name": "Hijacked" });
    let res = app
        .send(request("PUT", &format!("/api/subjects/{}", subject.id), Some(&token), Some(body)))
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}
