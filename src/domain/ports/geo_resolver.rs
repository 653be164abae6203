//! GeoIP Resolver Port
//!
//! Defines the interface for resolving IP addresses to geographic locations.

use crate::domain::entities::GeoRecord;

/// Why no geolocation could be obtained for an IP.
///
/// Callers treat every variant as "country unknown", never as a request error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionFailure {
    #[error("geolocation database unavailable")]
    Unavailable,
    #[error("malformed ip address `{0}`")]
    MalformedIp(String),
    #[error("no location data for {0}")]
    NoMatch(String),
    #[error("lookup failed for {ip}: {reason}")]
    Lookup { ip: String, reason: String },
    #[error("lookup timed out")]
    Timeout,
}

/// Resolver for IP address to geographic location.
///
/// This is an outbound port that abstracts the lookup database.
/// Lookups are synchronous; the application layer takes care of
/// keeping them off the async executor.
pub trait GeoResolver: Send + Sync {
    /// Resolve an IP address string to country and city.
    fn resolve(&self, ip: &str) -> Result<GeoRecord, ResolutionFailure>;
}
