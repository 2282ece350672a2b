mod config;
mod metrics;

use std::sync::Arc;
use std::time::Duration;

use analysis::{AnalysisError, RiskAnalysisPipeline};
use anyhow::Context;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Instrument, error, info, info_span, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::metrics::{Metrics, MetricsSnapshot, TimedOperation};

#[derive(Clone)]
struct AppState {
    /// `None` until an API key is configured.
    pipeline: Option<Arc<RiskAnalysisPipeline>>,
    /// One analysis at a time per workspace.
    run_lock: Arc<Mutex<()>>,
    metrics: Arc<Metrics>,
    request_timeout: Duration,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    api_key_configured: bool,
}

#[derive(Deserialize)]
struct AnalyzeRequest {
    query: Option<String>,
}

#[derive(Serialize)]
struct AnalyzeResponse {
    run_id: Uuid,
    risk_assessment: String,
    mitigation_plan: String,
    raw: String,
    output_path: String,
    retrieved_documents: usize,
    skipped_files: Vec<ingest::SkippedFile>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    kind: &'static str,
}

struct ApiError(AnalysisError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AnalysisError::MissingApiKey => StatusCode::PRECONDITION_FAILED,
            AnalysisError::EmptyCorpus(_) | AnalysisError::EmptyContent(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AnalysisError::Embedding(_) | AnalysisError::Generation(_) => StatusCode::BAD_GATEWAY,
            AnalysisError::Output(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorResponse {
            error: self.0.to_string(),
            kind: self.0.kind(),
        };
        (status, Json(body)).into_response()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    info!(config = ?config, "Loaded configuration");

    let pipeline = build_pipeline(&config)?;
    if pipeline.is_none() {
        warn!("IFI_API_KEY is not set; analyses will be rejected until it is");
    }

    let state = AppState {
        pipeline: pipeline.map(Arc::new),
        run_lock: Arc::new(Mutex::new(())),
        metrics: Metrics::new(),
        request_timeout: config.request_timeout(),
    };

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

    info!("Server listening on http://{}", config.bind_addr);
    axum::serve(listener, app(state)).await?;
    Ok(())
}

fn build_pipeline(config: &ServerConfig) -> anyhow::Result<Option<RiskAnalysisPipeline>> {
    if config.analysis.validate().is_err() {
        return Ok(None);
    }

    let api_key = &config.analysis.api_key;
    let embedder = index::EmbeddingClient::new(
        &config.provider.base_url,
        config.provider.embedding_model.clone(),
        api_key,
        config.http_timeout(),
    )?;
    let generator =
        query::ChatClient::new(&config.provider.base_url, api_key, config.http_timeout())?;

    Ok(Some(RiskAnalysisPipeline::new(
        config.analysis.clone(),
        Arc::new(embedder),
        Arc::new(generator),
    )))
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/analyze", post(run_analysis))
        .route("/metrics", get(get_metrics))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        api_key_configured: state.pipeline.is_some(),
    })
}

async fn get_metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

async fn run_analysis(
    State(state): State<AppState>,
    req: Option<Json<AnalyzeRequest>>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let Some(pipeline) = state.pipeline.clone() else {
        state.metrics.record_rejected();
        return Err(ApiError(AnalysisError::MissingApiKey));
    };

    let query = req
        .and_then(|Json(req)| req.query)
        .filter(|q| !q.trim().is_empty())
        .unwrap_or_else(|| pipeline.config().query.clone());

    let run_id = Uuid::new_v4();
    let _running = state.run_lock.lock().await;
    let timer = TimedOperation::start();

    let analysis = pipeline
        .analyze(&query)
        .instrument(info_span!("analysis", %run_id));
    let result = match tokio::time::timeout(state.request_timeout, analysis).await {
        Ok(result) => result,
        Err(_) => Err(AnalysisError::Generation(anyhow::anyhow!(
            "analysis timed out after {}s",
            state.request_timeout.as_secs()
        ))),
    };

    match result {
        Ok(outcome) => {
            state.metrics.record_success(
                timer.elapsed(),
                outcome.retrieved_documents,
                outcome.skipped_files.len(),
            );
            Ok(Json(AnalyzeResponse {
                run_id,
                risk_assessment: outcome.result.risk_section().to_string(),
                mitigation_plan: outcome.result.mitigation_section().to_string(),
                raw: outcome.result.raw().to_string(),
                output_path: outcome.output_path.to_string_lossy().to_string(),
                retrieved_documents: outcome.retrieved_documents,
                skipped_files: outcome.skipped_files,
            }))
        }
        Err(e) => {
            if e.is_precondition() {
                warn!(%run_id, kind = e.kind(), error = %e, "Analysis rejected");
                state.metrics.record_rejected();
            } else {
                error!(%run_id, kind = e.kind(), error = %e, "Analysis failed");
                state.metrics.record_failure();
            }
            Err(ApiError(e))
        }
    }
}
