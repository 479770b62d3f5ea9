use axum::http::StatusCode;
use db::models::{student::StudentChanges, user::Role};
use serde_json::json;

use crate::helpers::{json_body, make_test_app, request, text_body};

#[tokio::test]
async fn test_bulk_summary_skips_opted_out_and_foreign_students() {
    let app = make_test_app().await;
    let adviser = app.create_user("maria", Role::Adviser).await;
    let other = app.create_user("jose", Role::Adviser).await;
    let subject = app.create_subject(adviser.id).await;
    let a = app.create_student("TAG1", Some(adviser.id), Some(subject.id)).await;
    let b = app.create_student("TAG2", Some(adviser.id), Some(subject.id)).await;
    let foreign = app.create_student("TAG3", Some(other.id), None).await;
    b.update(app.state.db(), StudentChanges { email_opt_in: Some(false), ..Default::default() })
        .await
        .unwrap();
    let token = app.login("maria").await;

    let body = json!({ "student_ids": [a.id, b.id, foreign.id], "term_label": "1st Semester 2025-2026" });
    let res = app.send(request("POST", "/api/emails/bulk", Some(&token), Some(body))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let json = json_body(res).await;
    assert_eq!(json["data"]["sent"], 1);
    assert_eq!(json["data"]["skipped"], 2);
    assert_eq!(json["data"]["failed"], 0);

    let sent = app.mailer.sent_to("tag1@home.test");
    assert_eq!(sent.len(), 1);
    assert!(sent[0].subject.contains("1st Semester 2025-2026"));

    let res = app.send(request("GET", "/api/emails/logs?type=SEMESTER", Some(&token), None)).await;
    let json = json_body(res).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["status"], "SENT");
}

#[tokio::test]
async fn test_resend_after_failure() {
    let app = make_test_app().await;
    let adviser = app.create_user("maria", Role::Adviser).await;
    let a = app.create_student("TAG1", Some(adviser.id), None).await;
    let token = app.login("maria").await;

    app.mailer.set_failing(true);
    let body = json!({ "student_ids": [a.id], "term_label": "Q1" });
    let res = app.send(request("POST", "/api/emails/bulk", Some(&token), Some(body))).await;
    let json = json_body(res).await;
    assert_eq!(json["data"]["failed"], 1);

    let res = app.send(request("GET", "/api/emails/logs?status=FAILED", Some(&token), None)).await;
    let json = json_body(res).await;
    let log_id = json["data"][0]["id"].as_i64().unwrap();

    app.mailer.set_failing(false);
    let uri = format!("/api/emails/logs/{log_id}/resend");
    let res = app.send(request("POST", &uri, Some(&token), None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let json = json_body(res).await;
    assert_eq!(json["data"]["id"], log_id);
    assert_eq!(json["data"]["status"], "SENT");
    assert_eq!(app.mailer.sent().len(), 1);
}

#[tokio::test]
async fn test_export_email_logs_csv() {
    let app = make_test_app().await;
    let adviser = app.create_user("maria", Role::Adviser).await;
    app.create_user("jose", Role::Adviser).await;
    let a = app.create_student("TAG1", Some(adviser.id), None).await;
    let token = app.login("maria").await;

    let body = json!({ "student_ids": [a.id], "term_label": "1st Semester 2025-2026" });
    app.send(request("POST", "/api/emails/bulk", Some(&token), Some(body))).await;

    let res = app
        .send(request("GET", "/api/emails/logs/export?status=SENT", Some(&token), None))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "text/csv; charset=utf-8");
    let body = text_body(res).await;
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "Created At,Student,Recipient,Type,Subject,Status,Sent At,Error");
    assert!(lines[1].contains(",Student TAG1,tag1@home.test,SEMESTER,"));
    assert!(lines[1].contains(",SENT,"));

    let jose = app.login("jose").await;
    let res = app.send(request("GET", "/api/emails/logs/export", Some(&jose), None)).await;
    assert_eq!(text_body(res).await.lines().count(), 1);
}
