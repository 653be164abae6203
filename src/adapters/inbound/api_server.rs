//! Listings API Server
//!
//! HTTP API over the listing collection. The collection route is narrowed to
//! the caller's country; single-record routes go straight to the store.

use crate::adapters::inbound::request_locator::{self, IpSource};
use crate::application::ListingService;
use crate::domain::entities::{GeoRecord, Listing, ListingPatch};
use crate::domain::ports::StoreError;
use crate::infrastructure::ShutdownController;
use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, Path, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as CorsAny, CorsLayer};
use tower_http::trace::TraceLayer;

pub const WELCOME_MESSAGE: &str = "Welcome to the application.";
pub const UPDATED_MESSAGE: &str = "Model was updated successfully.";

/// Body of every plain message response, success or error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Collection response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListingsResponse {
    #[serde(rename = "listingsAndReviews")]
    pub listings_and_reviews: Vec<Listing>,
}

/// Health response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub geoip_loaded: bool,
}

/// Errors surfaced to HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn on_read(id: &str, err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError::NotFound(format!("Not found Model with id={}", id)),
            other => {
                tracing::error!("error retrieving listing {}: {}", id, other);
                ApiError::Internal(format!("Error retrieving Model with id={}", id))
            }
        }
    }

    fn on_update(id: &str, err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError::NotFound(format!(
                "Cannot update Model with id={}. Maybe Model was not found!",
                id
            )),
            StoreError::InvalidPatch(reason) => ApiError::BadRequest(reason),
            other => {
                tracing::error!("error updating listing {}: {}", id, other);
                ApiError::Internal(format!("Error updating Model with id={}", id))
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(MessageResponse::new(self.to_string()))).into_response()
    }
}

/// API Server state.
#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<ListingService>,
    pub shutdown: ShutdownController,
}

impl ApiState {
    pub fn new(service: Arc<ListingService>) -> Self {
        Self {
            service,
            shutdown: ShutdownController::new(),
        }
    }

    pub fn with_shutdown(mut self, shutdown: ShutdownController) -> Self {
        self.shutdown = shutdown;
        self
    }
}

/// HTTP server for the listings API.
pub struct ApiServer {
    listen_addr: String,
    state: ApiState,
}

impl ApiServer {
    pub fn new(listen_addr: String, state: ApiState) -> Self {
        Self { listen_addr, state }
    }

    /// Get shared state for use by other components.
    pub fn state(&self) -> ApiState {
        self.state.clone()
    }

    /// Build the application router with all middleware.
    pub fn router(state: ApiState) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(CorsAny)
            .allow_methods(CorsAny)
            .allow_headers(CorsAny);

        Router::new()
            .route("/", get(root_handler))
            .route("/health", get(health_handler))
            .route("/api/model", get(list_handler))
            .route("/api/model/:id", get(get_handler).put(update_handler))
            .route("/api/geolocation", get(geolocation_handler))
            .layer(middleware::from_fn_with_state(
                state.shutdown.clone(),
                track_in_flight,
            ))
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .with_state(state)
    }

    /// Bind the listen address and serve until `shutdown` completes.
    #[cfg_attr(coverage_nightly, coverage(off))]
    pub async fn run<F>(&self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(&self.listen_addr).await?;
        tracing::info!("listings API listening on {}", self.listen_addr);
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = Self::router(self.state.clone());
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await?;
        tracing::info!("listings API stopped");
        Ok(())
    }
}

async fn track_in_flight(
    State(shutdown): State<ShutdownController>,
    request: Request,
    next: Next,
) -> Response {
    let _guard = shutdown.request_guard();
    next.run(request).await
}

/// Turn a handler panic into a 500 instead of dropping the connection.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!("request handler panicked: {}", detail);
    ApiError::Internal("Internal server error".to_string()).into_response()
}

fn client_ip(headers: &HeaderMap, connect_info: Option<ConnectInfo<SocketAddr>>) -> Option<IpSource> {
    request_locator::locate(headers, connect_info.map(|ConnectInfo(addr)| addr))
}

// Handler functions

async fn root_handler() -> impl IntoResponse {
    Json(MessageResponse::new(WELCOME_MESSAGE))
}

async fn health_handler(State(state): State<ApiState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        geoip_loaded: state.service.has_geo_resolver(),
    })
}

async fn list_handler(
    State(state): State<ApiState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Result<Json<ListingsResponse>, ApiError> {
    let source = client_ip(&headers, connect_info);
    tracing::debug!("listing request from {:?}", source);

    let listings = state
        .service
        .list_for_client(source.as_ref().map(IpSource::ip))
        .await
        .map_err(|e| {
            tracing::error!("error listing models: {}", e);
            ApiError::Internal("Some error occurred while retrieving models.".to_string())
        })?;

    Ok(Json(ListingsResponse {
        listings_and_reviews: listings,
    }))
}

async fn get_handler(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Listing>, ApiError> {
    let listing = state
        .service
        .get(&id)
        .await
        .map_err(|e| ApiError::on_read(&id, e))?;
    Ok(Json(listing))
}

async fn update_handler(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let patch = ListingPatch::parse(&id, body).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    state
        .service
        .update(&id, patch)
        .await
        .map_err(|e| ApiError::on_update(&id, e))?;

    Ok(Json(MessageResponse::new(UPDATED_MESSAGE)))
}

/// Caller location. Lookup problems are not errors for the client: an
/// unplaced caller gets empty country and city.
async fn geolocation_handler(
    State(state): State<ApiState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Json<GeoRecord> {
    let Some(ip) = client_ip(&headers, connect_info).map(IpSource::into_ip) else {
        tracing::debug!("geolocation requested without a client ip");
        return Json(GeoRecord::unresolved(""));
    };

    match state.service.locate(&ip).await {
        Ok(geo) => Json(geo),
        Err(e) => {
            tracing::warn!("geolocation skipped for {}: {}", ip, e);
            Json(GeoRecord::unresolved(ip))
        }
    }
}
