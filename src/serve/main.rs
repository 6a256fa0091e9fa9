//! HTTP server for address generation.
//!
//! Exposes the address encoder to the map UI, plus tile inspection and
//! admin boundary listings when boundary files are configured.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use project_address::config::Config;
use project_address::encoder::{self, AddressError};
use project_address::models::{
    AddressResult, AdminEntry, AdminHierarchy, AdminLevel, AdminSelection, Feature, GeoPoint,
    TileIndex,
};
use project_address::pip::PipService;

#[derive(Parser, Debug)]
#[command(name = "serve")]
#[command(about = "Address generation server")]
struct Args {
    /// Listen address (overrides the config file)
    #[arg(short, long)]
    listen: Option<String>,

    /// TOML config file with server and boundary settings
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Application state shared across handlers
struct AppState {
    pip: Option<PipService>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    info!("Project:Address server");

    let config = Config::load_or_default(args.config.as_deref())?;
    let pip = config.load_pip_service()?;

    match &pip {
        Some(service) => info!(
            "Admin resolution ready with {} boundaries",
            service.index().len()
        ),
        None => warn!("No boundaries loaded; /v1/address/resolve and /v1/admin are disabled"),
    }

    let state = Arc::new(AppState { pip });

    // Build router
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/v1/address", post(address_handler))
        .route("/v1/address/resolve", post(resolve_handler))
        .route("/v1/tile", get(tile_handler))
        .route("/v1/admin/{level}", get(admin_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listen = args.listen.unwrap_or(config.server.listen);
    info!("Starting server on {}", listen);

    let listener = tokio::net::TcpListener::bind(&listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        boundaries: state.pip.as_ref().map_or(0, |p| p.index().len()),
    })
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    boundaries: usize,
}

/// Generate an address from a feature and an explicit admin selection
async fn address_handler(
    Json(request): Json<AddressRequest>,
) -> Result<Json<AddressResponse>, ApiError> {
    let response = encode_feature(&request.feature, &request.admin).map_err(address_error)?;
    Ok(Json(response))
}

/// Generate an address with admin segments resolved from boundaries.
///
/// Non-empty fields of the supplied selection override resolved ones.
async fn resolve_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AddressRequest>,
) -> Result<Json<AddressResponse>, ApiError> {
    let pip = state.pip.as_ref().ok_or_else(no_boundaries)?;

    let hierarchy = pip.resolve_feature(&request.feature).unwrap_or_default();
    let mut admin = hierarchy.to_selection();
    admin.overlay(&request.admin);

    let mut response = encode_feature(&request.feature, &admin).map_err(address_error)?;
    response.admin = Some(admin);
    response.hierarchy = Some(hierarchy);
    Ok(Json(response))
}

/// Tile, Morton code and block number for a coordinate
async fn tile_handler(Query(params): Query<TileParams>) -> Result<Json<TileResponse>, ApiError> {
    let point = GeoPoint::new(params.lon, params.lat);
    if !point.is_finite() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "lon and lat must be finite numbers".to_string(),
        ));
    }

    let tile = encoder::lon_lat_to_tile(point.lon, point.lat, encoder::TILE_ZOOM);
    Ok(Json(TileResponse {
        tile,
        morton: encoder::tile_morton(&tile),
        block_no: encoder::block_number(&tile),
    }))
}

/// Boundaries of one admin level, for the selection dropdowns
async fn admin_handler(
    State(state): State<Arc<AppState>>,
    Path(level): Path<String>,
    Query(params): Query<AdminListParams>,
) -> Result<Json<AdminListResponse>, ApiError> {
    let level = AdminLevel::parse(&level).ok_or_else(|| {
        error_response(
            StatusCode::BAD_REQUEST,
            format!("Unknown admin level '{}'", level),
        )
    })?;
    let pip = state.pip.as_ref().ok_or_else(no_boundaries)?;

    let entries = pip.list(level, params.parent.as_deref(), params.q.as_deref());
    Ok(Json(AdminListResponse { level, entries }))
}

fn encode_feature(
    feature: &Feature,
    admin: &AdminSelection,
) -> Result<AddressResponse, AddressError> {
    let geometry = feature.geometry.as_ref().ok_or(AddressError::NoGeometry)?;
    let encoding = encoder::encode_geometry(geometry)?;

    Ok(AddressResponse {
        result: AddressResult::new(admin, encoding.block_no, encoding.building_no),
        centroid: encoding.centroid,
        tile: encoding.tile,
        admin: None,
        hierarchy: None,
    })
}

fn address_error(e: AddressError) -> ApiError {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        format!("Failed to generate address: {}", e),
    )
}

fn no_boundaries() -> ApiError {
    error_response(
        StatusCode::SERVICE_UNAVAILABLE,
        "No admin boundaries loaded".to_string(),
    )
}

fn error_response(status: StatusCode, error: String) -> ApiError {
    (status, Json(ErrorResponse { error }))
}

#[derive(Deserialize)]
struct AddressRequest {
    /// Selected building feature
    feature: Feature,
    /// Admin segments; missing fields are empty
    #[serde(default)]
    admin: AdminSelection,
}

#[derive(Debug, Serialize)]
struct AddressResponse {
    #[serde(flatten)]
    result: AddressResult,
    centroid: GeoPoint,
    tile: TileIndex,
    /// Selection actually used, when it was resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    admin: Option<AdminSelection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hierarchy: Option<AdminHierarchy>,
}

#[derive(Deserialize)]
struct TileParams {
    lon: f64,
    lat: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TileResponse {
    tile: TileIndex,
    morton: u32,
    block_no: u32,
}

#[derive(Deserialize)]
struct AdminListParams {
    /// Parent code or name
    parent: Option<String>,
    /// Name fragment
    q: Option<String>,
}

#[derive(Debug, Serialize)]
struct AdminListResponse {
    level: AdminLevel,
    entries: Vec<AdminEntry>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}
