use axum::http::StatusCode;
use db::models::{attendance_record, student::StudentChanges, user::Role};
use serde_json::json;

use crate::helpers::{json_body, make_test_app, request, text_body};

const DAY: &str = "2025-10-13";

fn scan_body(tag: &str, subject_id: i64, time: &str) -> serde_json::Value {
    json!({ "rfid_tag": tag, "subject_id": subject_id, "date": DAY, "manual_time": time })
}

#[tokio::test]
async fn test_scan_records_present_then_late() {
    let app = make_test_app().await;
    let adviser = app.create_user("maria", Role::Adviser).await;
    let subject = app.create_subject(adviser.id).await;
    app.create_student("TAG1", Some(adviser.id), Some(subject.id)).await;
    app.create_student("TAG2", Some(adviser.id), Some(subject.id)).await;
    let token = app.login("maria").await;

    let res = app
        .send(request("POST", "/api/attendance/scan", Some(&token), Some(scan_body("TAG1", subject.id, "08:05:00"))))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let json = json_body(res).await;
    assert_eq!(json["data"]["action"], "time_in");
    assert_eq!(json["data"]["record"]["status"], "PRESENT");
    assert!(json["message"].as_str().unwrap().starts_with("Time In recorded!"));

    let res = app
        .send(request("POST", "/api/attendance/scan", Some(&token), Some(scan_body("TAG2", subject.id, "08:20:00"))))
        .await;
    let json = json_body(res).await;
    assert_eq!(json["data"]["record"]["status"], "LATE");
    assert_eq!(json["data"]["minutes_late"], 20);

    assert_eq!(app.mailer.sent_to("tag1@home.test").len(), 1);
}

#[tokio::test]
async fn test_scan_rejects_unknown_tag_and_outside_window() {
    let app = make_test_app().await;
    let adviser = app.create_user("maria", Role::Adviser).await;
    let subject = app.create_subject(adviser.id).await;
    app.create_student("TAG1", Some(adviser.id), Some(subject.id)).await;
    let token = app.login("maria").await;

    let res = app
        .send(request("POST", "/api/attendance/scan", Some(&token), Some(scan_body("NOPE", subject.id, "08:05:00"))))
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(res).await["message"], "RFID card not recognized");

    let res = app
        .send(request("POST", "/api/attendance/scan", Some(&token), Some(scan_body("TAG1", subject.id, "06:00:00"))))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_logs_derive_absences_once() {
    let app = make_test_app().await;
    let adviser = app.create_user("maria", Role::Adviser).await;
    let subject = app.create_subject(adviser.id).await;
    let a = app.create_student("TAG1", Some(adviser.id), Some(subject.id)).await;
    app.create_student("TAG2", Some(adviser.id), Some(subject.id)).await;
    app.create_student("TAG3", Some(adviser.id), Some(subject.id)).await;
    let token = app.login("maria").await;

    app.send(request("POST", "/api/attendance/scan", Some(&token), Some(scan_body("TAG1", subject.id, "08:00:00"))))
        .await;

    let uri = format!("/api/attendance/logs?subject_id={}&date={DAY}", subject.id);
    let res = app.send(request("GET", &uri, Some(&token), None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let json = json_body(res).await;
    assert_eq!(json["data"]["derivation"]["created"].as_array().unwrap().len(), 2);
    let records = json["data"]["records"].as_array().unwrap();
    assert_eq!(records.len(), 3);
    let a_row = records.iter().find(|r| r["student_id"] == a.id).unwrap();
    assert_eq!(a_row["status"], "PRESENT");
    assert_eq!(records.iter().filter(|r| r["status"] == "ABSENT").count(), 2);

    let res = app.send(request("GET", &uri, Some(&token), None)).await;
    let json = json_body(res).await;
    assert!(json["data"]["derivation"]["created"].as_array().unwrap().is_empty());
    assert_eq!(json["data"]["records"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_other_adviser_without_advisees_is_forbidden() {
    let app = make_test_app().await;
    let owner = app.create_user("maria", Role::Adviser).await;
    app.create_user("jose", Role::Adviser).await;
    let subject = app.create_subject(owner.id).await;
    app.create_student("TAG1", Some(owner.id), Some(subject.id)).await;
    let token = app.login("jose").await;

    let res = app
        .send(request("POST", "/api/attendance/scan", Some(&token), Some(scan_body("TAG1", subject.id, "08:05:00"))))
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let uri = format!("/api/attendance/logs?subject_id={}&date={DAY}", subject.id);
    let res = app.send(request("GET", &uri, Some(&token), None)).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_adviser_sees_only_advisees_in_foreign_subject() {
    let app = make_test_app().await;
    let owner = app.create_user("maria", Role::Adviser).await;
    let other = app.create_user("jose", Role::Adviser).await;
    let subject = app.create_subject(owner.id).await;
    app.create_student("TAG1", Some(owner.id), Some(subject.id)).await;
    let mine = app.create_student("TAG2", Some(other.id), Some(subject.id)).await;
    let token = app.login("jose").await;

    let uri = format!("/api/attendance/logs?subject_id={}&date={DAY}", subject.id);
    let res = app.send(request("GET", &uri, Some(&token), None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let json = json_body(res).await;
    let records = json["data"]["records"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["student_id"], mine.id);

    // Only the adviser's own student was derived.
    let rows = attendance_record::Model::for_subject_on(app.state.db(), subject.id, chrono::NaiveDate::from_ymd_opt(2025, 10, 13).unwrap())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);

    let res = app
        .send(request("POST", "/api/attendance/scan", Some(&token), Some(scan_body("TAG1", subject.id, "08:05:00"))))
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_manual_entry_and_admin_delete() {
    let app = make_test_app().await;
    app.create_user("admin", Role::Admin).await;
    let adviser = app.create_user("maria", Role::Adviser).await;
    let subject = app.create_subject(adviser.id).await;
    let s = app.create_student("TAG1", Some(adviser.id), Some(subject.id)).await;
    let token = app.login("maria").await;

    let body = json!({
        "student_id": s.id,
        "subject_id": subject.id,
        "date": DAY,
        "time_in": "08:10:00",
        "status": "LATE",
        "notes": "Bus delay"
    });
    let res = app.send(request("POST", "/api/attendance/manual", Some(&token), Some(body.clone()))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let json = json_body(res).await;
    assert_eq!(json["data"]["action"], "created");
    let record_id = json["data"]["record"]["id"].as_i64().unwrap();

    let res = app.send(request("POST", "/api/attendance/manual", Some(&token), Some(body))).await;
    assert_eq!(json_body(res).await["data"]["action"], "unchanged");

    let uri = format!("/api/attendance/{record_id}");
    let res = app.send(request("DELETE", &uri, Some(&token), None)).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let admin_token = app.login("admin").await;
    let res = app.send(request("DELETE", &uri, Some(&admin_token), None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let res = app.send(request("DELETE", &uri, Some(&admin_token), None)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_scan_hides_photo_when_flag_is_off() {
    let app = make_test_app().await;
    let adviser = app.create_user("maria", Role::Adviser).await;
    let subject = app.create_subject(adviser.id).await;
    let s = app.create_student("TAG1", Some(adviser.id), Some(subject.id)).await;
    s.update(
        app.state.db(),
        StudentChanges { profile_picture_path: Some("photos/tag1.jpg".into()), ..Default::default() },
    )
    .await
    .unwrap();
    let token = app.login("maria").await;

    app.send(request("POST", "/api/auth/session/photo", Some(&token), None)).await;

    let res = app
        .send(request("POST", "/api/attendance/scan", Some(&token), Some(scan_body("TAG1", subject.id, "08:05:00"))))
        .await;
    let json = json_body(res).await;
    assert!(json["data"]["student"]["profile_picture_path"].is_null());
}

#[tokio::test]
async fn test_students_cannot_use_staff_routes() {
    let app = make_test_app().await;
    app.create_student("TAG1", None, None).await;

    let body = json!({ "rfid_tag": "TAG1" });
    let res = app.send(request("POST", "/api/auth/student-login", None, Some(body))).await;
    let token = json_body(res).await["data"]["token"].as_str().unwrap().to_string();

    let res = app.send(request("GET", "/api/students", Some(&token), None)).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_export_logs_csv() {
    let app = make_test_app().await;
    let adviser = app.create_user("maria", Role::Adviser).await;
    let other = app.create_user("jose", Role::Adviser).await;
    let subject = app.create_subject(adviser.id).await;
    app.create_student("TAG1", Some(adviser.id), Some(subject.id)).await;
    app.create_student("TAG2", Some(adviser.id), Some(subject.id)).await;
    let token = app.login("maria").await;

    app.send(request("POST", "/api/attendance/scan", Some(&token), Some(scan_body("TAG1", subject.id, "08:05:00"))))
        .await;
    let uri = format!("/api/attendance/logs?subject_id={}&date={DAY}", subject.id);
    app.send(request("GET", &uri, Some(&token), None)).await;

    let res = app
        .send(request("GET", &format!("/api/attendance/logs/export?date={DAY}"), Some(&token), None))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "text/csv; charset=utf-8");
    let disposition = res.headers()["content-disposition"].to_str().unwrap().to_string();
    assert!(disposition.contains(&format!("attendance_log_{DAY}.csv")));

    let body = text_body(res).await;
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines[0], "Student Number,Student Name,Subject,Date,Time In,Time Out,Status");
    assert_eq!(lines[1], ",Student TAG1,MATH7,2025-10-13,08:05 AM,--:--,PRESENT");
    assert_eq!(lines[2], ",Student TAG2,MATH7,2025-10-13,--:--,--:--,ABSENT");
    assert_eq!(lines.len(), 3);

    let other_token = app.login(&other.username).await;
    let res = app
        .send(request("GET", &format!("/api/attendance/logs/export?date={DAY}"), Some(&other_token), None))
        .await;
    assert_eq!(text_body(res).await.lines().count(), 1);
}
