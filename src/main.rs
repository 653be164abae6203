//! geolistings - Listing API with IP geolocation
//!
//! This is the composition root that wires together all the components.

use geolistings::adapters::inbound::{ApiServer, ApiState};
use geolistings::adapters::outbound::{
    InMemoryListingRepository, MaxMindGeoResolver, SqliteListingRepository,
};
use geolistings::application::ListingService;
use geolistings::config::{load_config, Config};
use geolistings::domain::ports::{GeoResolver, ListingRepository};
use geolistings::infrastructure::{load_seed_file, shutdown_signal, ShutdownController};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::fmt::format::FmtSpan;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment
    let cfg = load_config()?;

    // Setup logging
    let log_level = if cfg.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    tracing::info!("starting geolistings listen={}", cfg.listen_addr);

    // ===== COMPOSITION ROOT =====

    // 1. Outbound adapters
    let listing_repo = open_listing_store(&cfg).await?;

    // Lookup database; the service keeps running unfiltered without it
    let geo_resolver: Option<Arc<dyn GeoResolver>> =
        match MaxMindGeoResolver::from_file(&cfg.geoip_path) {
            Ok(g) => {
                tracing::info!("GeoIP DB loaded from {}", cfg.geoip_path);
                Some(Arc::new(g.with_locale(cfg.geoip_locale.clone())) as Arc<dyn GeoResolver>)
            }
            Err(e) => {
                tracing::error!("failed to load GeoIP DB from {}: {:?}", cfg.geoip_path, e);
                None
            }
        };

    // 2. Application service
    let service = Arc::new(
        ListingService::new(listing_repo, geo_resolver)
            .with_geo_timeout(Duration::from_millis(cfg.geoip_timeout_ms)),
    );

    // 3. Inbound adapter
    let shutdown = ShutdownController::new();
    let state = ApiState::new(service).with_shutdown(shutdown.clone());
    let server = ApiServer::new(cfg.listen_addr.clone(), state);

    let stop = shutdown.signalled();
    let mut server_task = tokio::spawn(async move { server.run(stop).await });

    tokio::select! {
        res = &mut server_task => {
            // Server exited on its own (bind failure, accept error)
            return res?;
        }
        _ = shutdown_signal(shutdown.clone()) => {}
    }

    let drain_timeout = Duration::from_secs(cfg.shutdown_timeout_secs);
    if shutdown.wait_for_drain(drain_timeout).await {
        server_task.await??;
    } else {
        tracing::warn!("aborting {} in-flight requests", shutdown.in_flight());
        server_task.abort();
    }

    // The service, and with it the lookup database handle, is dropped here
    tracing::info!("geolistings stopped, releasing GeoIP DB");
    Ok(())
}

/// Open the configured listing store and apply the seed file, if any.
async fn open_listing_store(cfg: &Config) -> anyhow::Result<Arc<dyn ListingRepository>> {
    let seed = cfg.seed_path.as_deref().map(load_seed_file).transpose()?;

    match &cfg.db_path {
        Some(path) => {
            let repo = SqliteListingRepository::open(path)?;
            if let Some(listings) = seed {
                let n = repo.upsert_all(listings).await?;
                tracing::info!("seeded {} listings into {}", n, path);
            }
            tracing::info!("listing store: sqlite {}", path);
            Ok(Arc::new(repo))
        }
        None => {
            let repo = InMemoryListingRepository::new();
            if let Some(listings) = seed {
                let n = repo.upsert_all(listings).await?;
                tracing::info!("seeded {} listings into memory", n);
            } else {
                tracing::warn!("in-memory listing store started empty (no GEOLISTINGS_SEED_PATH)");
            }
            Ok(Arc::new(repo))
        }
    }
}
