use axum::http::HeaderMap;
use std::net::{IpAddr, SocketAddr};

/// Resolve the address a request came from.
///
/// `X-Forwarded-For` and `X-Real-IP` are only read when `trust_forwarded`
/// is set. IPv4-mapped IPv6 peers are reported as plain IPv4.
pub fn client_ip(headers: &HeaderMap, peer: SocketAddr, trust_forwarded: bool) -> String {
    let forwarded = trust_forwarded
        .then(|| forwarded_ip(headers))
        .flatten();

    forwarded.unwrap_or_else(|| peer.ip()).to_canonical().to_string()
}

fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let from_header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .and_then(|value| value.trim().parse::<IpAddr>().ok())
    };

    from_header("x-forwarded-for").or_else(|| from_header("x-real-ip"))
}
