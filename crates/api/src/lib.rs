//! Abalone Age Prediction API Server
//!
//! REST API serving age predictions from the fitted abalone model.

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use data_validator::Validator;
use inference_engine::{AgePipeline, ArtifactBundle, ArtifactLoadError, ArtifactPaths};
use metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod error;
pub mod routes;
mod settings;

pub use error::{ApiError, ErrorBody};
pub use settings::{
    ArtifactSettings, LogSettings, MetricsSettings, ServerSettings, Settings, SettingsError,
};

/// Application state shared across handlers
///
/// Built once before serving and never mutated afterwards, so handlers share
/// it through a plain `Arc`.
pub struct AppState {
    /// Inference pipeline over the loaded artifacts
    pub pipeline: AgePipeline,
    /// Request validator
    pub validator: Validator,
    /// Prometheus handle, when metrics are enabled
    pub metrics: Option<PrometheusHandle>,
    /// Version string
    pub version: String,
}

/// Shared handle to the application state
pub type SharedState = Arc<AppState>;

impl AppState {
    /// Create application state around a pipeline
    pub fn new(pipeline: AgePipeline) -> Self {
        Self {
            pipeline,
            validator: Validator::new(),
            metrics: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Attach a Prometheus handle
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Load the artifacts named by `settings` and build the application state
pub fn build_state(settings: &Settings) -> Result<AppState, ArtifactLoadError> {
    let paths = ArtifactPaths::from_base_dir(
        &settings.artifacts.base_dir,
        &settings.artifacts.model_file,
    );
    info!("Loading artifacts from {}", settings.artifacts.base_dir.display());

    let bundle = ArtifactBundle::load_paths(&paths)?;
    let pipeline = AgePipeline::new(Arc::new(bundle));
    info!(
        "Pipeline ready: {} model inputs {:?}",
        pipeline.artifacts().output_columns().len(),
        pipeline.artifacts().output_columns()
    );
    Ok(AppState::new(pipeline))
}

/// Create the application router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route("/predict", post(routes::predict::predict))
        .route("/metrics", get(routes::metrics::render))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Initialize logging
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_logging(settings: &LogSettings) {
    let level = settings.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    let result = if settings.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if let Err(e) = result {
        eprintln!("Logging already initialized: {}", e);
    }
}

/// Install the global Prometheus recorder and describe the service metrics
pub fn install_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus recorder")?;

    describe_counter!("abalone_predictions_total", "Successful predictions");
    describe_counter!(
        "abalone_prediction_failures_total",
        "Pipeline failures by stage"
    );
    describe_counter!(
        "abalone_validation_failures_total",
        "Requests rejected by schema validation"
    );
    describe_histogram!(
        "abalone_prediction_latency_seconds",
        Unit::Seconds,
        "Pipeline latency per prediction"
    );

    Ok(handle)
}

/// Load artifacts and run the server until interrupted
///
/// Artifacts are loaded before the listener binds; a load failure means the
/// server never starts.
pub async fn run_server(settings: &Settings) -> anyhow::Result<()> {
    let mut state = build_state(settings).context("failed to load model artifacts")?;
    if settings.metrics.enabled {
        state = state.with_metrics(install_metrics()?);
    }

    info!(
        "Starting API server v{} on {}",
        state.version, settings.server.addr
    );
    let app = create_router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(&settings.server.addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.server.addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
