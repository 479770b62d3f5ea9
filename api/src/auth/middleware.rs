use axum::{
    Json,
    body::Body,
    extract::{ConnectInfo, FromRequestParts},
    http::{Method, Request, StatusCode, header::HOST},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::TypedHeader;
use headers::{Origin, UserAgent};
use std::net::SocketAddr;
use tracing::{info, warn};
use util::config;

use crate::auth::guards::Empty;
use crate::auth::user::AuthUser;
use crate::response::ApiResponse;

/// Logs method, path, status, IP address, user ID (if authenticated), origin,
/// and user-agent for each incoming HTTP request. Skips CORS preflight
/// `OPTIONS` requests.
///
/// ### Fields Logged:
/// - `method`: HTTP method used (`GET`, `POST`, etc.)
/// - `path`: Requested URI path
/// - `status`: Response status code
/// - `ip`: Remote IP address of the client, `unknown` without connect info
/// - `user`: User ID if authenticated, `0` if not
/// - `origin`: Value of the `Origin` header if present
/// - `user_agent`: Value of the `User-Agent` header if present
pub async fn log_request(req: Request<Body>, next: Next) -> Response {
    let (mut parts, body) = req.into_parts();

    if parts.method == Method::OPTIONS {
        let req = Request::from_parts(parts, body);
        return next.run(req).await;
    }

    let ip = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".into());

    let origin = TypedHeader::<Origin>::from_request_parts(&mut parts, &())
        .await
        .ok()
        .map(|TypedHeader(o)| o.to_string());

    let user_agent = TypedHeader::<UserAgent>::from_request_parts(&mut parts, &())
        .await
        .ok()
        .map(|TypedHeader(ua)| ua.to_string());

    let method = parts.method.clone();
    let path = parts.uri.path().to_string();

    let req = Request::from_parts(parts, body);
    let res = next.run(req).await;

    let user_id = res.extensions().get::<AuthUser>().map(|u| u.user_id);

    info!(
        method = ?method,
        path = %path,
        status = res.status().as_u16(),
        ip = %ip,
        user = user_id.unwrap_or(0),
        origin = origin.unwrap_or_else(|| "unknown".into()),
        user_agent = user_agent.unwrap_or_else(|| "unknown".into()),
        "Incoming request"
    );

    res
}

/// Hostname part of a `Host` header value, lowercased, without port or IPv6 brackets.
fn hostname(raw: &str) -> String {
    let raw = raw.trim();
    let host = if let Some(rest) = raw.strip_prefix('[') {
        rest.split(']').next().unwrap_or(rest)
    } else if raw.matches(':').count() > 1 {
        // Bare IPv6 literal without brackets or port.
        raw
    } else {
        raw.split(':').next().unwrap_or(raw)
    };
    host.to_ascii_lowercase()
}

pub fn host_allowed(raw_host: &str, allowed: &[String]) -> bool {
    if allowed.iter().any(|h| h == "*") {
        return true;
    }
    let host = hostname(raw_host);
    allowed.iter().any(|h| *h == host)
}

/// Rejects requests whose `Host` header is not in `ALLOWED_HOSTS` /
/// `ADDITIONAL_HOSTS` with `400 Bad Request`. Requests without a `Host`
/// header pass through.
pub async fn validate_host(
    req: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiResponse<Empty>>)> {
    if let Some(value) = req.headers().get(HOST) {
        let raw = value.to_str().unwrap_or_default();
        if !host_allowed(raw, &config::allowed_hosts()) {
            warn!(host = raw, "Rejected request for disallowed host");
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(format!("Invalid host header: {raw}"))),
            ));
        }
    }

    Ok(next.run(req).await)
}
