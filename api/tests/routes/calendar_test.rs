use axum::http::StatusCode;
use db::models::user::Role;
use serde_json::json;

use crate::helpers::{json_body, make_test_app, request};

const DAY: &str = "2025-10-13";

fn scan_body(tag: &str, subject_id: i64) -> serde_json::Value {
    json!({ "rfid_tag": tag, "subject_id": subject_id, "date": DAY, "manual_time": "08:05:00" })
}

#[tokio::test]
async fn test_event_permissions() {
    let app = make_test_app().await;
    let maria = app.create_user("maria", Role::Adviser).await;
    app.create_user("jose", Role::Adviser).await;
    app.create_user("root", Role::Admin).await;
    let subject = app.create_subject(maria.id).await;
    let maria_token = app.login("maria").await;
    let jose_token = app.login("jose").await;
    let admin_token = app.login("root").await;

    let school_wide = json!({ "title": "All Saints' Day", "date": "2025-11-01", "event_type": "holiday" });
    let res = app
        .send(request("POST", "/api/calendar/events", Some(&maria_token), Some(school_wide.clone())))
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let res = app
        .send(request("POST", "/api/calendar/events", Some(&admin_token), Some(school_wide)))
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let body = json!({ "title": "Math fair", "date": "2025-11-05", "event_type": "event", "subject_id": subject.id });
    let res = app.send(request("POST", "/api/calendar/events", Some(&maria_token), Some(body))).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let json = json_body(res).await;
    assert_eq!(json["data"]["created_by"], maria.id);
    let uri = format!("/api/calendar/events/{}", json["data"]["id"]);

    let rename = json!({ "title": "Math & Science fair" });
    let res = app.send(request("PUT", &uri, Some(&jose_token), Some(rename.clone()))).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let res = app.send(request("PUT", &uri, Some(&maria_token), Some(rename))).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await["data"]["title"], "Math & Science fair");

    let res = app
        .send(request("GET", "/api/calendar/events?type=holiday", Some(&jose_token), None))
        .await;
    let json = json_body(res).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["title"], "All Saints' Day");

    let res = app.send(request("DELETE", &uri, Some(&maria_token), None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let res = app.send(request("DELETE", &uri, Some(&maria_token), None)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_holiday_stops_absence_derivation() {
    let app = make_test_app().await;
    let adviser = app.create_user("maria", Role::Adviser).await;
    app.create_user("root", Role::Admin).await;
    let subject = app.create_subject(adviser.id).await;
    app.create_student("TAG1", Some(adviser.id), Some(subject.id)).await;
    let token = app.login("maria").await;
    let admin_token = app.login("root").await;

    let body = json!({ "title": "Typhoon", "date": DAY, "event_type": "holiday" });
    let res = app.send(request("POST", "/api/calendar/events", Some(&admin_token), Some(body))).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let uri = format!("/api/attendance/logs?subject_id={}&date={DAY}", subject.id);
    let res = app.send(request("GET", &uri, Some(&token), None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let json = json_body(res).await;
    assert_eq!(json["data"]["derivation"]["skipped_holiday"], true);
    assert!(json["data"]["records"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_cleanup_removes_derived_absences_on_holidays() {
    let app = make_test_app().await;
    let adviser = app.create_user("maria", Role::Adviser).await;
    app.create_user("root", Role::Admin).await;
    let subject = app.create_subject(adviser.id).await;
    app.create_student("TAG1", Some(adviser.id), Some(subject.id)).await;
    app.create_student("TAG2", Some(adviser.id), Some(subject.id)).await;
    app.create_student("TAG3", Some(adviser.id), Some(subject.id)).await;
    let token = app.login("maria").await;
    let admin_token = app.login("root").await;

    app.send(request("POST", "/api/attendance/scan", Some(&token), Some(scan_body("TAG1", subject.id))))
        .await;
    let logs_uri = format!("/api/attendance/logs?subject_id={}&date={DAY}", subject.id);
    let res = app.send(request("GET", &logs_uri, Some(&token), None)).await;
    assert_eq!(json_body(res).await["data"]["derivation"]["created"].as_array().unwrap().len(), 2);

    let body = json!({ "title": "Declared holiday", "date": DAY, "event_type": "holiday" });
    let res = app.send(request("POST", "/api/calendar/events", Some(&admin_token), Some(body))).await;
    let event_id = json_body(res).await["data"]["id"].as_i64().unwrap();

    let cleanup = format!("/api/calendar/cleanup-holiday-absences?event_id={event_id}");
    let res = app.send(request("POST", &cleanup, Some(&token), None)).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app.send(request("POST", &cleanup, Some(&admin_token), None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let json = json_body(res).await;
    assert_eq!(json["data"]["holidays_checked"], 1);
    assert_eq!(json["data"]["records_removed"], 2);

    let res = app.send(request("GET", &logs_uri, Some(&token), None)).await;
    let records = json_body(res).await["data"]["records"].as_array().unwrap().clone();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["status"], "PRESENT");
}
