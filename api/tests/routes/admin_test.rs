use axum::http::StatusCode;
use db::models::{session_sweep, user::Role};

use crate::helpers::{json_body, make_test_app, request};

#[tokio::test]
async fn test_admin_sweep_invalidates_every_session() {
    let app = make_test_app().await;
    let admin_user = app.create_user("admin", Role::Admin).await;
    app.create_user("maria", Role::Adviser).await;
    let admin = app.login("admin").await;
    let adviser = app.login("maria").await;

    let res = app.send(request("POST", "/api/admin/sessions/sweep", Some(&adviser), None)).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app.send(request("POST", "/api/admin/sessions/sweep", Some(&admin), None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let json = json_body(res).await;
    assert_eq!(json["data"]["sessions_removed"], 2);

    for token in [&admin, &adviser] {
        let res = app.send(request("GET", "/api/auth/me", Some(token), None)).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    let audits = session_sweep::Model::recent(app.state.db(), 10).await.unwrap();
    assert_eq!(audits.len(), 1);
    assert_eq!(audits[0].reason, session_sweep::SweepReason::Admin);
    assert_eq!(audits[0].triggered_by, Some(admin_user.id));
}
