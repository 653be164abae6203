//! Request Locator
//!
//! Picks the client IP used for geolocation.

use axum::http::HeaderMap;
use std::net::SocketAddr;

/// Header that overrides the transport peer address for geolocation.
pub const OVERRIDE_HEADER: &str = "x-forwarded-for-ip";

/// Where the effective client IP came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpSource {
    Header(String),
    Peer(String),
}

impl IpSource {
    pub fn ip(&self) -> &str {
        match self {
            IpSource::Header(ip) | IpSource::Peer(ip) => ip,
        }
    }

    pub fn into_ip(self) -> String {
        match self {
            IpSource::Header(ip) | IpSource::Peer(ip) => ip,
        }
    }
}

/// Determine the effective client IP.
///
/// The override header wins when it carries a non-blank visible-ASCII value;
/// otherwise the connection's peer address is used. The value is not checked
/// for IP syntax here.
pub fn locate(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<IpSource> {
    from_header(headers)
        .map(IpSource::Header)
        .or_else(|| peer.map(|addr| IpSource::Peer(addr.ip().to_string())))
}

fn from_header(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(OVERRIDE_HEADER)?;
    match value.to_str() {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        Ok(_) => None,
        Err(_) => {
            tracing::debug!("ignoring non-ascii {} header", OVERRIDE_HEADER);
            None
        }
    }
}
