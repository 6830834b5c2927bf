use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, HeaderValue, Method},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use panel_layout::{Estimation, PanelSpec};
use roof_estimator::{EstimateRequest, EstimateTarget, RoofEstimator};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

pub mod config;
pub mod error;
pub mod intake;

pub use config::ServerConfig;
pub use error::{ApiError, ErrorResponse};
use intake::{AnalysisTarget, AnalyzeForm};

/// Shared handler state.
pub struct AppState<E> {
    pub estimator: E,
    pub panel: PanelSpec,
    /// Set from `ServerConfig::max_upload_bytes` by [`create_app`].
    upload_limit: usize,
}

impl<E> AppState<E> {
    pub fn new(estimator: E) -> Self {
        Self {
            estimator,
            panel: PanelSpec::CANONICAL,
            upload_limit: ServerConfig::default().max_upload_bytes,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub result: Estimation,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Validate the upload, then ask the estimator. Nothing is sent upstream for bad input.
async fn analyze_handler<E: RoofEstimator + 'static>(
    State(state): State<Arc<AppState<E>>>,
    multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    async move {
        let input = AnalyzeForm::from_multipart(multipart)
            .await
            .map_err(|e| e.with_upload_limit(state.upload_limit))?
            .validate()?;
        info!(
            "Received roof image: {} bytes, {}x{} px",
            input.image.len(),
            input.image_width,
            input.image_height
        );

        let target = match &input.target {
            AnalysisTarget::PanelCount { roof } => {
                info!("Panel count mode, roof {}x{} px", roof.width(), roof.height());
                EstimateTarget::PanelCount {
                    roof: *roof,
                    panel: state.panel,
                }
            }
            AnalysisTarget::Zones { grid } => {
                info!("Zone detection mode, {} cells of {}", grid.cells.len(), grid.size_label());
                EstimateTarget::Zones { grid }
            }
        };

        let result = state
            .estimator
            .estimate(EstimateRequest {
                image: &input.image,
                target,
            })
            .await?;

        info!(
            "Analysis complete: rooftop={}, max panels={:?}",
            result.is_rooftop(),
            result.panel_cap()
        );
        Ok(Json(AnalyzeResponse { result }))
    }
    .instrument(info_span!("analyze", %request_id))
    .await
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    if origins.is_empty() {
        // No valid origins configured
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE])
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE])
    }
}

/// Create the Axum app with all routes and middleware.
pub fn create_app<E: RoofEstimator + 'static>(state: AppState<E>, config: &ServerConfig) -> Router {
    let state = AppState {
        upload_limit: config.max_upload_bytes,
        ..state
    };
    Router::new()
        .route("/health", get(health_check))
        .route("/analyze", post(analyze_handler::<E>))
        .route("/api/pr", post(analyze_handler::<E>))
        .with_state(Arc::new(state))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
}
