use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use shared::{
    error::ServiceErrorBody,
    protocol::{
        AnalysisRequest, RunResponse, UploadResponse, UPLOAD_FILE_FIELD, UPLOAD_FORMAT_FIELD,
    },
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer};
use tracing::{info, warn};

mod api;
mod app_state;
mod config;

use api::{accept_upload, analysis_data, UploadError};
use app_state::AppState;
use config::{load_settings, parse_bind_addr};

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ServiceErrorBody>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = load_settings();
    tracing_subscriber::fmt()
        .with_env_filter(settings.log_filter.as_str())
        .init();

    let addr = parse_bind_addr(&settings.bind_addr)?;
    let app = build_router(Arc::new(AppState::new(&settings)));

    info!(%addr, delay_ms = settings.simulated_delay_ms, "mock analysis service listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    let max_upload_bytes = state.max_upload_bytes;
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/upload", post(upload_matrix))
        .route("/api/run", post(run_analysis))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

fn reject(status: StatusCode, detail: impl Into<String>) -> (StatusCode, Json<ServiceErrorBody>) {
    (status, Json(ServiceErrorBody::new(detail)))
}

async fn upload_matrix(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<UploadResponse> {
    let mut file = None;
    let mut data_format = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| reject(StatusCode::BAD_REQUEST, e.body_text()))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(UPLOAD_FILE_FIELD) => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| reject(StatusCode::BAD_REQUEST, e.body_text()))?;
                file = Some((filename, bytes));
            }
            Some(UPLOAD_FORMAT_FIELD) => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| reject(StatusCode::BAD_REQUEST, e.body_text()))?;
                data_format = Some(text);
            }
            _ => {}
        }
    }

    let (original_filename, bytes) = file
        .ok_or_else(|| reject(StatusCode::BAD_REQUEST, UploadError::MissingFile.to_string()))?;
    let matrix =
        accept_upload(&original_filename, data_format.as_deref(), &bytes).map_err(|error| {
            warn!(%original_filename, %error, "upload rejected");
            reject(StatusCode::BAD_REQUEST, error.to_string())
        })?;

    let filename = state.next_stored_name(&original_filename);
    info!(
        %filename,
        orientation = %matrix.orientation,
        shape = %matrix.shape,
        "upload accepted"
    );
    let response = UploadResponse {
        filename: filename.clone(),
        original_filename,
        original_shape: matrix.shape,
        message: Some(format!("Parsed as {}", matrix.orientation)),
    };
    state.uploads.lock().await.insert(filename, matrix);
    Ok(Json(response))
}

async fn run_analysis(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalysisRequest>,
) -> ApiResult<RunResponse> {
    info!(
        algorithm = request.algorithm(),
        filename = request.target_file(),
        submitted_at = %request.submitted_at(),
        "analysis requested"
    );
    tokio::time::sleep(state.simulated_delay).await;

    let matrix = state
        .uploads
        .lock()
        .await
        .get(request.target_file())
        .cloned()
        .ok_or_else(|| {
            reject(
                StatusCode::NOT_FOUND,
                format!("unknown file '{}'; upload it again", request.target_file()),
            )
        })?;
    let data = analysis_data(request.algorithm(), request.params(), &matrix);

    Ok(Json(RunResponse {
        status: "success".to_string(),
        message: format!("{} analysis completed", request.algorithm()),
        server_time: Some(Utc::now().to_rfc3339()),
        data,
    }))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
