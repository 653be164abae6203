//! geo-lookup - resolve IPs against the lookup database
//!
//! Usage: `geo-lookup [--db PATH] [--locale LOCALE] [IP...]`
//!
//! Prints one JSON object per IP. Without IPs, a small built-in pair is
//! checked, which is handy after replacing the database file.

use clap::Parser;
use geolistings::adapters::outbound::MaxMindGeoResolver;
use geolistings::domain::ports::GeoResolver;
use serde_json::json;

const DEFAULT_IPS: [&str; 2] = ["8.8.8.8", "2404:6800:4001:c01::67"];

/// Resolve IP addresses against a MaxMind City database
#[derive(Parser, Debug)]
#[command(name = "geo-lookup", version)]
struct Args {
    /// Path to the .mmdb file
    #[arg(
        long = "db",
        env = "GEOLISTINGS_GEOIP_PATH",
        default_value = "geolocation/GeoLite2-City.mmdb"
    )]
    db_path: String,

    /// Locale for country and city names (falls back to English)
    #[arg(long)]
    locale: Option<String>,

    /// Addresses to resolve; a built-in IPv4/IPv6 pair when omitted
    ips: Vec<String>,
}

impl Args {
    fn ips(&self) -> Vec<String> {
        if self.ips.is_empty() {
            DEFAULT_IPS.iter().map(|s| s.to_string()).collect()
        } else {
            self.ips.clone()
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut resolver = MaxMindGeoResolver::from_file(&args.db_path)?;
    if let Some(locale) = args.locale.as_deref() {
        resolver = resolver.with_locale(locale);
    }

    for ip in &args.ips() {
        let line = match resolver.resolve(ip) {
            Ok(geo) => serde_json::to_value(&geo)?,
            Err(e) => json!({ "ip": ip, "error": e.to_string() }),
        };
        println!("{}", line);
    }

    Ok(())
}
