use api::build_app;
use axum::{
    Router,
    body::Body,
    http::{Request, header::{AUTHORIZATION, CONTENT_TYPE}},
    response::Response,
};
use chrono::NaiveTime;
use db::models::{
    enrollment, student, subject,
    user::{self, Role},
};
use db::test_utils::setup_test_db;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use util::{state::AppState, test_helpers::RecordingMailer};

pub const PASSWORD: &str = "password123";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub mailer: Arc<RecordingMailer>,
}

/// Full router over a fresh in-memory database and a recording mailer.
pub async fn make_test_app() -> TestApp {
    let db = setup_test_db().await;
    let mailer = Arc::new(RecordingMailer::new());
    let state = AppState::new(db, mailer.clone());
    TestApp {
        router: build_app(state.clone()),
        state,
        mailer,
    }
}

pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

pub async fn text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> Response {
        self.router.clone().oneshot(req).await.unwrap()
    }

    pub async fn create_user(&self, username: &str, role: Role) -> user::Model {
        user::Model::create(
            self.state.db(),
            username,
            &format!("{username}@school.test"),
            PASSWORD,
            role,
            None,
            username,
        )
        .await
        .unwrap()
    }

    /// Logs in with the shared test password and returns the bearer token.
    pub async fn login(&self, username: &str) -> String {
        let body = serde_json::json!({ "username": username, "password": PASSWORD });
        let res = self.send(request("POST", "/api/auth/login", None, Some(body))).await;
        let json = json_body(res).await;
        json["data"]["token"].as_str().expect("login failed").to_string()
    }

    /// A MATH7 subject (08:00-09:00) owned by `adviser_id`.
    pub async fn create_subject(&self, adviser_id: i64) -> subject::Model {
        subject::Model::create(
            self.state.db(),
            "MATH7",
            "Mathematics 7",
            Some(adviser_id),
            NaiveTime::from_hms_opt(8, 0, 0),
            NaiveTime::from_hms_opt(9, 0, 0),
        )
        .await
        .unwrap()
    }

    pub async fn create_student(&self, tag: &str, adviser_id: Option<i64>, subject_id: Option<i64>) -> student::Model {
        let email = format!("{}@home.test", tag.to_lowercase());
        let s = student::Model::create(
            self.state.db(),
            &format!("Student {tag}"),
            Some(tag),
            None,
            Some(email.as_str()),
            adviser_id,
        )
        .await
        .unwrap();
        if let Some(subject_id) = subject_id {
            enrollment::Model::enroll(self.state.db(), s.id, subject_id).await.unwrap();
        }
        s
    }
}
