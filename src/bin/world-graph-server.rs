//! world-graph HTTP server.
//!
//! - `POST /combine`: combine two elements, body `{"a": "...", "b": "..."}`
//! - `GET  /explore`: every stored combination
//! - `GET  /graph`: node/edge view for visualization
//! - `GET  /lineage/{element}`: combinations leading to an element
//! - `GET  /seeds`: starting elements
//! - `GET  /health`: server status
//!
//! Anything else falls through to the static UI directory, if configured.
//!
//! Build and run: `cargo run --features server --bin world-graph-server`

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use world_graph::config::{Strategy, WorldConfig};
use world_graph::error::{CombineError, StoreError};
use world_graph::export::{self, Graph, Lineage};
use world_graph::resolver::{Resolution, Resolver};
use world_graph::store::TripleStore;
use world_graph::triple::Triple;

#[derive(Parser)]
#[command(name = "world-graph-server", version, about = "World graph HTTP server")]
struct Args {
    /// Config file (TOML).
    #[arg(long, env = "WORLD_GRAPH_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for persistent storage.
    #[arg(long, env = "WORLD_GRAPH_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Address to bind.
    #[arg(long, env = "WORLD_GRAPH_BIND")]
    bind: Option<String>,

    /// Port to listen on.
    #[arg(short, long, env = "WORLD_GRAPH_PORT")]
    port: Option<u16>,

    /// Directory of static UI files.
    #[arg(long, env = "WORLD_GRAPH_PUBLIC")]
    public: Option<PathBuf>,

    /// Ollama base URL.
    #[arg(long, env = "OLLAMA_URL")]
    ollama_url: Option<String>,

    /// Ollama model name.
    #[arg(long, env = "WORLD_GRAPH_MODEL")]
    model: Option<String>,

    /// Oracle strategy.
    #[arg(long, env = "WORLD_GRAPH_STRATEGY", value_enum)]
    strategy: Option<Strategy>,

    /// Log filter when RUST_LOG is unset.
    #[arg(long, env = "WORLD_GRAPH_LOG")]
    log_level: Option<String>,
}

impl Args {
    fn into_config(self) -> Result<WorldConfig> {
        let mut config = WorldConfig::load_or_default(self.config.as_deref())?;
        if let Some(dir) = self.data_dir {
            config.data_dir = Some(dir);
        }
        if let Some(bind) = self.bind {
            config.server.bind = bind;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(public) = self.public {
            config.server.public_dir = Some(public);
        }
        if let Some(url) = self.ollama_url {
            config.oracle.ollama.base_url = url;
        }
        if let Some(model) = self.model {
            config.oracle.ollama.model = model;
        }
        if let Some(strategy) = self.strategy {
            config.oracle.strategy = strategy;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        Ok(config)
    }
}

// ── Server state ──────────────────────────────────────────────────────────

struct ServerState {
    resolver: Resolver,
    seeds: Vec<String>,
}

type SharedState = Arc<ServerState>;

// ── Request / response types ──────────────────────────────────────────────

#[derive(Deserialize)]
struct CombineRequest {
    a: String,
    b: String,
}

#[derive(Deserialize)]
struct LineageParams {
    #[serde(default = "default_max_depth")]
    max_depth: usize,
}

fn default_max_depth() -> usize {
    8
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    triples: usize,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

// ── Errors ────────────────────────────────────────────────────────────────

enum ApiError {
    BadRequest(String),
    Combine(CombineError),
    Store(StoreError),
    Internal(String),
}

impl From<CombineError> for ApiError {
    fn from(e: CombineError) -> Self {
        ApiError::Combine(e)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Store(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Combine(e @ CombineError::OracleUnavailable { .. }) => {
                (StatusCode::BAD_GATEWAY, e.to_string())
            }
            ApiError::Combine(e @ CombineError::Storage { .. }) => {
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        if status.is_server_error() || status == StatusCode::BAD_GATEWAY {
            tracing::error!(%status, error = %message, "request failed");
        }
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// Run synchronous resolver/store work off the async executor.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("worker task failed: {e}")))?
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn health(State(state): State<SharedState>) -> Result<Json<HealthResponse>, ApiError> {
    let triples = blocking(move || Ok(state.resolver.store().len()?)).await?;
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        triples,
    }))
}

async fn combine(
    State(state): State<SharedState>,
    Json(request): Json<CombineRequest>,
) -> Result<Json<Resolution>, ApiError> {
    if request.a.trim().is_empty() || request.b.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "both \"a\" and \"b\" must be non-empty element names".into(),
        ));
    }
    let resolution =
        blocking(move || Ok(state.resolver.combine(&request.a, &request.b)?)).await?;
    Ok(Json(resolution))
}

async fn explore(State(state): State<SharedState>) -> Result<Json<Vec<Triple>>, ApiError> {
    let triples = blocking(move || {
        let mut triples = state.resolver.store().all()?;
        triples.sort();
        Ok(triples)
    })
    .await?;
    Ok(Json(triples))
}

async fn graph(State(state): State<SharedState>) -> Result<Json<Graph>, ApiError> {
    let graph =
        blocking(move || Ok(export::export_graph(state.resolver.store().as_ref())?)).await?;
    Ok(Json(graph))
}

async fn lineage(
    State(state): State<SharedState>,
    Path(element): Path<String>,
    Query(params): Query<LineageParams>,
) -> Result<Json<Lineage>, ApiError> {
    let lineage = blocking(move || {
        Ok(export::lineage(
            state.resolver.store().as_ref(),
            &element,
            params.max_depth,
        )?)
    })
    .await?;
    Ok(Json(lineage))
}

async fn seeds(State(state): State<SharedState>) -> Json<Vec<String>> {
    Json(state.seeds.clone())
}

// ── Main ──────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let config = Args::parse().into_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .init();

    let resolver = config.build_resolver()?;
    let state = Arc::new(ServerState {
        resolver,
        seeds: config.seeds.clone(),
    });

    let mut app = Router::new()
        .route("/health", get(health))
        .route("/combine", post(combine))
        .route("/explore", get(explore))
        .route("/graph", get(graph))
        .route("/lineage/{element}", get(lineage))
        .route("/seeds", get(seeds));

    if let Some(public) = &config.server.public_dir {
        tracing::info!(dir = %public.display(), "serving static files");
        app = app.fallback_service(ServeDir::new(public));
    }

    let app = app
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("{}:{}", config.server.bind, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .into_diagnostic()?;
    tracing::info!("world-graph server listening on {addr}");
    axum::serve(listener, app).await.into_diagnostic()?;
    Ok(())
}
