//! MaxMind GeoIP Resolver
//!
//! Implements GeoResolver using a MaxMind City database (GeoLite2-City or
//! any database with the same `country`/`city` layout).

use crate::domain::entities::GeoRecord;
use crate::domain::ports::{GeoResolver, ResolutionFailure};
use maxminddb::Reader;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::sync::Arc;

/// Default locale for country and city names.
pub const DEFAULT_LOCALE: &str = "en";

/// MaxMind GeoIP resolver.
///
/// The reader is opened once and is immutable afterwards, so lookups from
/// many tasks share it without locking.
pub struct MaxMindGeoResolver {
    reader: Arc<Reader<Vec<u8>>>,
    locale: String,
}

#[derive(Debug, Deserialize)]
struct Named {
    #[serde(default)]
    names: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct CityResp {
    country: Option<Named>,
    city: Option<Named>,
}

impl MaxMindGeoResolver {
    /// Load a GeoIP database from a file path.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let reader = Reader::open_readfile(path)?;
        tracing::debug!(
            "opened geoip database {} (type={})",
            path,
            reader.metadata.database_type
        );
        Ok(Self {
            reader: Arc::new(reader),
            locale: DEFAULT_LOCALE.to_string(),
        })
    }

    /// Load a GeoIP database from raw bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> anyhow::Result<Self> {
        let reader = Reader::from_source(bytes)?;
        Ok(Self {
            reader: Arc::new(reader),
            locale: DEFAULT_LOCALE.to_string(),
        })
    }

    /// Use a different locale for names.
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    fn name_of(&self, named: Option<Named>) -> Option<String> {
        let mut names = named?.names;
        names
            .remove(&self.locale)
            .or_else(|| names.remove(DEFAULT_LOCALE))
            .filter(|name| !name.is_empty())
    }
}

impl GeoResolver for MaxMindGeoResolver {
    fn resolve(&self, ip: &str) -> Result<GeoRecord, ResolutionFailure> {
        let ip = ip.trim();
        tracing::debug!("geo resolve: entry ip={}", ip);

        let addr: IpAddr = ip
            .parse()
            .map_err(|_| ResolutionFailure::MalformedIp(ip.to_string()))?;

        let resp: CityResp = self.reader.lookup(addr).map_err(|e| match e {
            maxminddb::MaxMindDBError::AddressNotFoundError(_) => {
                ResolutionFailure::NoMatch(ip.to_string())
            }
            other => ResolutionFailure::Lookup {
                ip: ip.to_string(),
                reason: other.to_string(),
            },
        })?;

        let country = self
            .name_of(resp.country)
            .ok_or_else(|| ResolutionFailure::NoMatch(ip.to_string()))?;
        let city = self.name_of(resp.city).unwrap_or_default();

        tracing::debug!("geo resolve: exit ip={} country={}", ip, country);
        Ok(GeoRecord::new(ip, country, city))
    }
}
