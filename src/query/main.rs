//! Read-only dashboard server for a stored family table.
//!
//! Serves the table, per-column filter hints, filtered views and map points
//! for any geocoded place column.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use kinmap::config::Config;
use kinmap::dashboard::{
    apply_filters, checked_jitter, coordinate_columns, filter_by_name, jitter, profile_table,
    ColumnSummary, Filter, FilterError, PointFeature, DEFAULT_JITTER, MAX_JITTER,
};
use kinmap::models::GenealogyTable;
use kinmap::store::{SqliteStore, StoreError};

#[derive(Parser, Debug)]
#[command(name = "query")]
#[command(about = "Family dashboard server")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:3000")]
    listen: String,

    /// Configuration file
    #[arg(short, long, default_value = "kinmap.toml")]
    config: std::path::PathBuf,
}

/// Application state shared across handlers
struct AppState {
    store: SqliteStore,
    name_column: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("kinmap dashboard");
    let config = Config::load_from_file(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;

    let store = SqliteStore::new(&config.database.path, &config.table_name());
    info!(
        "Serving table '{}' from {}",
        store.table_name(),
        store.path().display()
    );

    let state = Arc::new(AppState {
        store,
        name_column: config.database.name_column.clone(),
    });

    // Build router
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/v1/columns", get(columns_handler))
        .route("/v1/records", get(records_handler))
        .route("/v1/records/filter", post(filter_handler))
        .route("/v1/map", get(map_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Starting server on {}", args.listen);

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

type ApiError = (StatusCode, String);

/// Map a library error to a response, keeping lookups of absent data as 404s.
fn api_error(context: &str, e: anyhow::Error) -> ApiError {
    if let Some(store_error) = e.downcast_ref::<StoreError>() {
        return (StatusCode::NOT_FOUND, store_error.to_string());
    }
    tracing::error!("{} failed: {:#}", context, e);
    (StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e))
}

fn filter_error(e: FilterError) -> ApiError {
    (StatusCode::BAD_REQUEST, e.to_string())
}

async fn load_table(state: &AppState) -> Result<GenealogyTable, ApiError> {
    state
        .store
        .read_table()
        .await
        .map_err(|e| api_error("Table read", e))
}

/// Health check endpoint
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let table = state.store.table_exists().await.unwrap_or(false);

    Json(HealthResponse {
        status: if table { "ok" } else { "degraded" },
        table,
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    table: bool,
}

/// Column names with the filter each one supports
async fn columns_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ColumnsResponse>, ApiError> {
    let table = load_table(&state).await?;
    Ok(Json(ColumnsResponse {
        rows: table.len(),
        columns: profile_table(&table),
    }))
}

#[derive(Serialize)]
struct ColumnsResponse {
    rows: usize,
    columns: Vec<ColumnSummary>,
}

/// Full table
async fn records_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<GenealogyTable>, ApiError> {
    Ok(Json(load_table(&state).await?))
}

#[derive(Deserialize)]
struct FilterRequest {
    #[serde(default)]
    filters: Vec<Filter>,
}

/// Rows matching every filter in the request body
async fn filter_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FilterRequest>,
) -> Result<Json<GenealogyTable>, ApiError> {
    let table = load_table(&state).await?;
    let filtered = apply_filters(&table, &request.filters).map_err(filter_error)?;
    Ok(Json(filtered))
}

#[derive(Deserialize)]
struct MapQueryParams {
    /// Geocoded place column, original or stored name
    column: String,
    /// Case-insensitive name search
    name: Option<String>,
    /// Jitter standard deviation in degrees (defaults to 0.001, 0 disables)
    jitter: Option<f64>,
}

#[derive(Serialize)]
struct MapResponse {
    #[serde(rename = "type")]
    collection_type: &'static str,
    features: Vec<PointFeature>,
}

/// People with coordinates for one place column
async fn map_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MapQueryParams>,
) -> Result<Json<MapResponse>, ApiError> {
    let requested = params.jitter.unwrap_or(DEFAULT_JITTER);
    let scale = checked_jitter(requested).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            format!("jitter must be between 0 and {} degrees", MAX_JITTER),
        )
    })?;

    let (lat, lon) = coordinate_columns(&params.column);
    let mut points = state
        .store
        .read_points(&state.name_column, &lat, &lon)
        .await
        .map_err(|e| api_error("Map read", e))?;

    if let Some(name) = &params.name {
        filter_by_name(&mut points, name);
    }
    jitter(&mut points, scale, &mut rand::rng());

    Ok(Json(MapResponse {
        collection_type: "FeatureCollection",
        features: points.into_iter().map(PointFeature::from).collect(),
    }))
}
