use axum::http::StatusCode;
use db::models::user::Role;
use serde_json::json;

use crate::helpers::{json_body, make_test_app, request, text_body};

#[tokio::test]
async fn test_adviser_creates_and_owns_student() {
    let app = make_test_app().await;
    let adviser = app.create_user("maria", Role::Adviser).await;
    let token = app.login("maria").await;

    let body = json!({
        "name": "Ana Cruz",
        "rfid_tag": "04A1B2C3",
        "student_number": "2025-0001",
        "email": "parent@home.test"
    });
    let res = app.send(request("POST", "/api/students", Some(&token), Some(body.clone()))).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let json = json_body(res).await;
    assert_eq!(json["data"]["adviser_id"], adviser.id);
    let id = json["data"]["id"].as_i64().unwrap();

    let res = app.send(request("POST", "/api/students", Some(&token), Some(body))).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = app.send(request("GET", &format!("/api/students/{id}"), Some(&token), None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await["data"]["name"], "Ana Cruz");
}

#[tokio::test]
async fn test_adviser_cannot_see_other_advisees() {
    let app = make_test_app().await;
    let other = app.create_user("jose", Role::Adviser).await;
    app.create_user("maria", Role::Adviser).await;
    let theirs = app.create_student("TAG1", Some(other.id), None).await;
    let token = app.login("maria").await;

    let res = app.send(request("GET", "/api/students", Some(&token), None)).await;
    assert!(json_body(res).await["data"].as_array().unwrap().is_empty());

    let uri = format!("/api/students/{}", theirs.id);
    let res = app.send(request("GET", &uri, Some(&token), None)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let body = json!({ "adviser_id": 1 });
    let res = app.send(request("PUT", &uri, Some(&token), Some(body))).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_update_and_delete_student() {
    let app = make_test_app().await;
    let adviser = app.create_user("maria", Role::Adviser).await;
    let s = app.create_student("TAG1", Some(adviser.id), None).await;
    let token = app.login("maria").await;
    let uri = format!("/api/students/{}", s.id);

    let body = json!({ "name": "Renamed", "email_opt_in": false });
    let res = app.send(request("PUT", &uri, Some(&token), Some(body))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let json = json_body(res).await;
    assert_eq!(json["data"]["name"], "Renamed");
    assert_eq!(json["data"]["email_opt_in"], false);

    let body = json!({ "email": "not-an-email" });
    let res = app.send(request("PUT", &uri, Some(&token), Some(body))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app.send(request("DELETE", &uri, Some(&token), None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let res = app.send(request("GET", &uri, Some(&token), None)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_blank_rfid_tags_are_not_registered() {
    let app = make_test_app().await;
    let adviser = app.create_user("maria", Role::Adviser).await;
    let subject = app.create_subject(adviser.id).await;
    let token = app.login("maria").await;

    let body = json!({ "name": "Ana", "rfid_tag": "   ", "student_number": " " });
    let res = app.send(request("POST", "/api/students", Some(&token), Some(body))).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let json = json_body(res).await;
    assert!(json["data"]["rfid_tag"].is_null());
    assert!(json["data"]["student_number"].is_null());
    let ana = json["data"]["id"].as_i64().unwrap();

    let body = json!({ "name": "Ben", "rfid_tag": " " });
    let res = app.send(request("POST", "/api/students", Some(&token), Some(body))).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let body = json!({ "student_ids": [ana] });
    let uri = format!("/api/subjects/{}/students", subject.id);
    app.send(request("POST", &uri, Some(&token), Some(body))).await;

    let body = json!({ "rfid_tag": " ", "subject_id": subject.id, "manual_time": "08:05:00", "date": "2025-10-13" });
    let res = app.send(request("POST", "/api/attendance/scan", Some(&token), Some(body))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(res).await["message"], "RFID tag is required");
}

#[tokio::test]
async fn test_create_student_with_opt_out() {
    let app = make_test_app().await;
    app.create_user("maria", Role::Adviser).await;
    let token = app.login("maria").await;

    let body = json!({ "name": "Ana", "email": "ana@home.test", "email_opt_in": false });
    let res = app.send(request("POST", "/api/students", Some(&token), Some(body))).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(json_body(res).await["data"]["email_opt_in"], false);

    let body = json!({ "name": "   " });
    let res = app.send(request("POST", "/api/students", Some(&token), Some(body))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_imports_registry_csv() {
    let app = make_test_app().await;
    let maria = app.create_user("maria", Role::Adviser).await;
    app.create_user("root", Role::Admin).await;
    let admin = app.login("root").await;

    let csv_data = "rfid_tag,student_number,name,email,email_opt_in,adviser\n\
        04A1,2025-0001,\"Cruz, Ana\",ana@home.test,true,maria\n\
        04B2,,Ben Reyes,,no,\n\
        ,,,x@home.test,,\n\
        04C3,,Carl,not-an-email,,\n\
        04D4,,Dina,,,nobody\n";
    let res = app
        .send(request("POST", "/api/students/import", Some(&admin), Some(json!({ "csv_data": csv_data }))))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let json = json_body(res).await;
    assert_eq!(json["data"]["imported"], 2);
    assert_eq!(json["data"]["skipped"], 0);
    assert_eq!(
        json["data"]["errors"],
        json!([
            "Row 4: name is required",
            "Row 5: invalid email 'not-an-email'",
            "Row 6: unknown adviser 'nobody'"
        ])
    );

    let again = "rfid_tag,name\n04A1,Ana Again\n";
    let res = app
        .send(request("POST", "/api/students/import", Some(&admin), Some(json!({ "csv_data": again }))))
        .await;
    let json = json_body(res).await;
    assert_eq!(json["data"]["imported"], 0);
    assert_eq!(json["data"]["skipped"], 1);

    let maria_token = app.login("maria").await;
    let res = app.send(request("GET", "/api/students", Some(&maria_token), None)).await;
    let json = json_body(res).await;
    let students = json["data"].as_array().unwrap();
    assert_eq!(students.len(), 1);
    assert_eq!(students[0]["name"], "Cruz, Ana");
    assert_eq!(students[0]["adviser_id"], maria.id);

    let res = app.send(request("GET", "/api/students", Some(&admin), None)).await;
    let json = json_body(res).await;
    let ben = json["data"].as_array().unwrap().iter().find(|s| s["name"] == "Ben Reyes").unwrap().clone();
    assert_eq!(ben["email_opt_in"], false);
    assert!(ben["adviser_id"].is_null());
}

#[tokio::test]
async fn test_adviser_import_owns_rows_and_rejects_empty_csv() {
    let app = make_test_app().await;
    let maria = app.create_user("maria", Role::Adviser).await;
    app.create_user("jose", Role::Adviser).await;
    let token = app.login("maria").await;

    let csv_data = "name,rfid_tag,adviser\nEve Santos,04E5,jose\n";
    let res = app
        .send(request("POST", "/api/students/import", Some(&token), Some(json!({ "csv_data": csv_data }))))
        .await;
    assert_eq!(json_body(res).await["data"]["imported"], 1);

    let res = app.send(request("GET", "/api/students?q=eve", Some(&token), None)).await;
    assert_eq!(json_body(res).await["data"][0]["adviser_id"], maria.id);

    for empty in ["", "name,rfid_tag\n"] {
        let res = app
            .send(request("POST", "/api/students/import", Some(&token), Some(json!({ "csv_data": empty }))))
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_export_registry_csv_matches_import_layout() {
    let app = make_test_app().await;
    let maria = app.create_user("maria", Role::Adviser).await;
    let jose = app.create_user("jose", Role::Adviser).await;
    app.create_student("TAG1", Some(maria.id), None).await;
    app.create_student("TAG2", Some(jose.id), None).await;
    let token = app.login("maria").await;

    let res = app.send(request("GET", "/api/students/export", Some(&token), None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(
        res.headers()["content-disposition"]
            .to_str()
            .unwrap()
            .contains("students.csv")
    );
    let body = text_body(res).await;
    assert_eq!(
        body,
        "rfid_tag,student_number,name,email,email_opt_in,adviser\n\
         TAG1,,Student TAG1,tag1@home.test,true,maria\n"
    );

    app.create_user("root", Role::Admin).await;
    let admin = app.login("root").await;
    let copy = app.send(request("GET", "/api/students/export", Some(&admin), None)).await;
    let exported = text_body(copy).await;
    assert_eq!(exported.lines().count(), 3);

    let fresh = make_test_app().await;
    fresh.create_user("maria", Role::Adviser).await;
    fresh.create_user("jose", Role::Adviser).await;
    fresh.create_user("root", Role::Admin).await;
    let fresh_admin = fresh.login("root").await;
    let res = fresh
        .send(request("POST", "/api/students/import", Some(&fresh_admin), Some(json!({ "csv_data": exported }))))
        .await;
    let json = json_body(res).await;
    assert_eq!(json["data"]["imported"], 2);
    assert!(json["data"]["errors"].as_array().unwrap().is_empty());
}
