pub mod app;

pub use app::{PASSWORD, TestApp, json_body, make_test_app, request, text_body};
