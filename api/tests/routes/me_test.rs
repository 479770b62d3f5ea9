use axum::http::StatusCode;
use db::models::{attendance_record::{self, AttendanceStatus, NewRecord}, user::Role};
use serde_json::json;

use crate::helpers::{json_body, make_test_app, request};

#[tokio::test]
async fn test_student_sees_own_attendance() {
    let app = make_test_app().await;
    let adviser = app.create_user("maria", Role::Adviser).await;
    let subject = app.create_subject(adviser.id).await;
    let s = app.create_student("TAG1", Some(adviser.id), Some(subject.id)).await;

    for d in [13, 14] {
        let date = chrono::NaiveDate::from_ymd_opt(2025, 10, d).unwrap();
        attendance_record::Model::insert_if_absent(app.state.db(), NewRecord::absent(s.id, subject.id, date))
            .await
            .unwrap();
    }

    let res = app
        .send(request("POST", "/api/auth/student-login", None, Some(json!({ "rfid_tag": "TAG1" }))))
        .await;
    let token = json_body(res).await["data"]["token"].as_str().unwrap().to_string();

    let res = app.send(request("GET", "/api/me/attendance", Some(&token), None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let json = json_body(res).await;
    assert_eq!(json["data"]["student"]["id"], s.id);
    assert_eq!(json["data"]["records"].as_array().unwrap().len(), 2);
    assert_eq!(json["data"]["subjects"][0]["absent"], 2);
    assert_eq!(json["data"]["records"][0]["status"], AttendanceStatus::Absent.to_string());
}

#[tokio::test]
async fn test_staff_cannot_use_student_view() {
    let app = make_test_app().await;
    app.create_user("maria", Role::Adviser).await;
    let token = app.login("maria").await;

    let res = app.send(request("GET", "/api/me/attendance", Some(&token), None)).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}
