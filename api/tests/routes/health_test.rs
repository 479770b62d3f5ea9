use axum::http::{StatusCode, header::HOST};

use crate::helpers::{json_body, make_test_app, request};

#[tokio::test]
async fn test_health_is_public() {
    let app = make_test_app().await;
    let res = app.send(request("GET", "/api/health", None, None)).await;
    assert_eq!(res.status(), StatusCode::OK);

    let json = json_body(res).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"], "OK");
}

#[tokio::test]
async fn test_unknown_host_is_rejected() {
    let app = make_test_app().await;

    let mut req = request("GET", "/api/health", None, None);
    req.headers_mut().insert(HOST, "evil.example.com".parse().unwrap());
    let res = app.send(req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = json_body(res).await;
    assert!(json["message"].as_str().unwrap().contains("evil.example.com"));

    let mut req = request("GET", "/api/health", None, None);
    req.headers_mut().insert(HOST, "localhost:8000".parse().unwrap());
    assert_eq!(app.send(req).await.status(), StatusCode::OK);
}
