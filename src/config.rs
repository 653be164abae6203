use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    // HTTP settings
    pub listen_addr: String,

    // Geolocation settings
    pub geoip_path: String,
    pub geoip_locale: String,
    pub geoip_timeout_ms: u64,

    // Listing store settings
    pub db_path: Option<String>,
    pub seed_path: Option<String>,

    pub shutdown_timeout_secs: u64,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            geoip_path: "geolocation/GeoLite2-City.mmdb".to_string(),
            geoip_locale: "en".to_string(),
            geoip_timeout_ms: 250,
            db_path: None,
            seed_path: None,
            shutdown_timeout_secs: 10,
            debug: false,
        }
    }
}

pub fn load_config() -> anyhow::Result<Config> {
    let defaults = Config::default();

    let listen_addr = std::env::var("GEOLISTINGS_LISTEN_ADDR").unwrap_or(defaults.listen_addr);

    let geoip_path = std::env::var("GEOLISTINGS_GEOIP_PATH").unwrap_or(defaults.geoip_path);

    let geoip_locale = std::env::var("GEOLISTINGS_GEOIP_LOCALE")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(defaults.geoip_locale);

    let geoip_timeout_ms = std::env::var("GEOLISTINGS_GEOIP_TIMEOUT_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.geoip_timeout_ms);

    let db_path = std::env::var("GEOLISTINGS_DB_PATH").ok();
    let seed_path = std::env::var("GEOLISTINGS_SEED_PATH").ok();

    let shutdown_timeout_secs = std::env::var("GEOLISTINGS_SHUTDOWN_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.shutdown_timeout_secs);

    let debug = std::env::var("DEBUG").is_ok();

    Ok(Config {
        listen_addr,
        geoip_path,
        geoip_locale,
        geoip_timeout_ms,
        db_path,
        seed_path,
        shutdown_timeout_secs,
        debug,
    })
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Tests below mutate process-wide environment variables.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.listen_addr, "0.0.0.0:8080");
        assert_eq!(cfg.geoip_locale, "en");
        assert_eq!(cfg.geoip_timeout_ms, 250);
        assert!(cfg.db_path.is_none());
        assert!(cfg.seed_path.is_none());
    }

    #[test]
    fn test_load_config_defaults() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        std::env::remove_var("GEOLISTINGS_LISTEN_ADDR");
        std::env::remove_var("GEOLISTINGS_GEOIP_PATH");
        std::env::remove_var("GEOLISTINGS_DB_PATH");

        let cfg = load_config().unwrap();
        assert_eq!(cfg.listen_addr, "0.0.0.0:8080");
        assert_eq!(cfg.geoip_path, "geolocation/GeoLite2-City.mmdb");
        assert!(cfg.db_path.is_none());
    }

    #[test]
    fn test_load_config_with_custom_values() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        std::env::set_var("GEOLISTINGS_LISTEN_ADDR", "127.0.0.1:9000");
        std::env::set_var("GEOLISTINGS_GEOIP_PATH", "/data/City.mmdb");
        std::env::set_var("GEOLISTINGS_GEOIP_LOCALE", "pt-BR");
        std::env::set_var("GEOLISTINGS_DB_PATH", "/tmp/listings.db");
        std::env::set_var("GEOLISTINGS_SEED_PATH", "/tmp/listings.json");

        let cfg = load_config().unwrap();
        assert_eq!(cfg.listen_addr, "127.0.0.1:9000");
        assert_eq!(cfg.geoip_path, "/data/City.mmdb");
        assert_eq!(cfg.geoip_locale, "pt-BR");
        assert_eq!(cfg.db_path, Some("/tmp/listings.db".to_string()));
        assert_eq!(cfg.seed_path, Some("/tmp/listings.json".to_string()));

        std::env::remove_var("GEOLISTINGS_LISTEN_ADDR");
        std::env::remove_var("GEOLISTINGS_GEOIP_PATH");
        std::env::remove_var("GEOLISTINGS_GEOIP_LOCALE");
        std::env::remove_var("GEOLISTINGS_DB_PATH");
        std::env::remove_var("GEOLISTINGS_SEED_PATH");
    }

    #[test]
    fn test_load_config_with_timeouts() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        std::env::set_var("GEOLISTINGS_GEOIP_TIMEOUT_MS", "40");
        std::env::set_var("GEOLISTINGS_SHUTDOWN_TIMEOUT_SECS", "3");

        let cfg = load_config().unwrap();
        assert_eq!(cfg.geoip_timeout_ms, 40);
        assert_eq!(cfg.shutdown_timeout_secs, 3);

        std::env::remove_var("GEOLISTINGS_GEOIP_TIMEOUT_MS");
        std::env::remove_var("GEOLISTINGS_SHUTDOWN_TIMEOUT_SECS");
    }

    #[test]
    fn test_load_config_parse_error_uses_default() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        std::env::set_var("GEOLISTINGS_GEOIP_TIMEOUT_MS", "not_a_number");

        let cfg = load_config().unwrap();
        assert_eq!(cfg.geoip_timeout_ms, 250);

        std::env::remove_var("GEOLISTINGS_GEOIP_TIMEOUT_MS");
    }

    #[test]
    fn test_blank_locale_uses_default() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        std::env::set_var("GEOLISTINGS_GEOIP_LOCALE", "  ");

        let cfg = load_config().unwrap();
        assert_eq!(cfg.geoip_locale, "en");

        std::env::remove_var("GEOLISTINGS_GEOIP_LOCALE");
    }

    #[test]
    fn test_load_config_with_debug() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        std::env::set_var("DEBUG", "1");
        assert!(load_config().unwrap().debug);
        std::env::remove_var("DEBUG");
    }
}
