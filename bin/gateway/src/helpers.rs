//! Request helpers.

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request, header::USER_AGENT};
use std::net::SocketAddr;

/// Returns the caller's IP address.
///
/// Prefers the first entry of `X-Forwarded-For`, then `X-Real-IP`, then the
/// socket peer address. Returns "" when none is known.
#[must_use]
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = header_str(headers, "x-forwarded-for")
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    if let Some(ip) = header_str(headers, "x-real-ip").map(str::trim).filter(|ip| !ip.is_empty()) {
        return ip.to_string();
    }

    peer.map(|addr| addr.ip().to_string()).unwrap_or_default()
}

/// Returns the caller's IP address for a request, reading the peer address
/// from [`ConnectInfo`] when the server was started with it.
#[must_use]
pub fn request_client_ip<B>(request: &Request<B>) -> String {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    client_ip(request.headers(), peer)
}

/// Returns the `User-Agent` header, or "".
#[must_use]
pub fn user_agent(headers: &HeaderMap) -> &str {
    headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
