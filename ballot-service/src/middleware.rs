//! Client IP resolution ahead of rate limiting

use std::net::SocketAddr;

use axum::{
    extract::ConnectInfo,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::debug;

const CF_CONNECTING_IP: HeaderName = HeaderName::from_static("cf-connecting-ip");
const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Effective client IP: CF-Connecting-IP, then the first X-Forwarded-For entry, then the socket.
pub fn resolve_client_ip<B>(req: &Request<B>) -> Option<(String, &'static str)> {
    let header = |name: &HeaderName| {
        req.headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.split(',').next().unwrap_or("").trim().to_string())
            .filter(|value| !value.is_empty())
    };

    if let Some(ip) = header(&CF_CONNECTING_IP) {
        return Some((ip, "cf-connecting-ip"));
    }
    if let Some(ip) = header(&X_FORWARDED_FOR) {
        return Some((ip, "x-forwarded-for"));
    }
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| (info.0.ip().to_string(), "socket"))
}

// Write the resolved IP into X-Forwarded-For so the rate limiter keys every request the same way.
pub async fn inject_client_ip(mut req: Request<axum::body::Body>, next: Next) -> Response {
    match resolve_client_ip(&req) {
        Some((ip, source)) => {
            debug!("client_ip_source={} ip={}", source, ip);
            if let Ok(value) = HeaderValue::from_str(&ip) {
                req.headers_mut().insert(X_FORWARDED_FOR, value);
            }
        }
        None => debug!("client_ip_source=unavailable"),
    }

    next.run(req).await
}
