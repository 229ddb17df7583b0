// Axum request handlers - upload form, compression, and single/bulk downloads.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{
        multipart::MultipartRejection, rejection::QueryRejection, DefaultBodyLimit, Multipart,
        Query, State,
    },
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::codec::jpeg::JpegCodec;
use crate::config::{
    ServiceConfig, ARCHIVE_DOWNLOAD_NAME, COMPRESS_SUCCESS_MESSAGE, LANDING_TEMPLATE,
    NO_IMAGES_AVAILABLE_MESSAGE, NO_IMAGE_AVAILABLE_MESSAGE,
};
use crate::engine::archive::build_archive;
use crate::engine::compressor::{Compressor, Upload};
use crate::engine::registry::{Lookup, SessionRegistry};
use crate::engine::stats::StatsCollector;
use crate::error::CompressError;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub registry: SessionRegistry,
    pub compressor: Arc<Compressor>,
    pub stats: Arc<StatsCollector>,
}

impl AppState {
    pub fn new(config: ServiceConfig) -> Self {
        let registry = SessionRegistry::new();
        let compressor = Compressor::new(
            Arc::new(JpegCodec::new()),
            config.outputs_dir.clone(),
            registry.clone(),
        );
        Self {
            config: Arc::new(config),
            registry,
            compressor: Arc::new(compressor),
            stats: Arc::new(StatsCollector::new()),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let static_dir = ServeDir::new(&state.config.static_dir);
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(landing_handler))
        .route("/compress_image/", post(compress_handler))
        .route("/download_image/", get(download_image_handler))
        .route("/download-all-images/", get(download_all_handler))
        .nest_service("/static", static_dir)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub struct ImageServer {
    addr: SocketAddr,
    state: AppState,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ImageServer {
    /// Bind to `config.bind_addr()` and start serving in the background.
    pub async fn start(config: ServiceConfig) -> Result<Self> {
        let listener = TcpListener::bind(config.bind_addr()).await?;
        let addr = listener.local_addr()?;

        let state = AppState::new(config);
        let app = router(state.clone());

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
            {
                error!("server error: {}", e);
            }
        });

        info!("image compression server listening on {}", addr);

        Ok(Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Absolute URL for a path on this server, e.g. `url_for("/compress_image/")`.
    pub fn url_for(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.state.registry
    }

    pub fn stats(&self) -> &StatsCollector {
        &self.state.stats
    }

    /// Stop accepting connections and wait for in-flight requests to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        info!("image compression server on {} stopped", self.addr);
    }
}

impl IntoResponse for CompressError {
    /// Body keeps the `[message, code]` tuple shape existing clients parse;
    /// the status line carries the same code.
    fn into_response(self) -> Response {
        let code = self.status_code();
        let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json((self.to_string(), code))).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct CompressResponse {
    pub message: String,
    pub compression_percentage: String,
    pub compressed_file_size: String,
}

#[derive(Debug, Deserialize)]
struct CompressParams {
    output_quality: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct DownloadParams {
    index: Option<i64>,
}

/// GET / - clear the registry and render the upload form.
async fn landing_handler(State(state): State<AppState>) -> Response {
    state.registry.clear();

    let path = state.config.templates_dir.join(LANDING_TEMPLATE);
    match tokio::fs::read_to_string(&path).await {
        Ok(page) => Html(page).into_response(),
        Err(e) => {
            error!("cannot read template {}: {}", path.display(), e);
            CompressError::Io(e).into_response()
        }
    }
}

/// POST /compress_image/ - multipart `image` plus optional `output_quality`.
async fn compress_handler(
    State(state): State<AppState>,
    params: Result<Query<CompressParams>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    match compress_request(&state, params, multipart).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => {
            state.stats.record_failure();
            warn!("compress_image failed: {}", e);
            e.into_response()
        }
    }
}

async fn compress_request(
    state: &AppState,
    params: Result<Query<CompressParams>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<CompressResponse, CompressError> {
    let Query(params) = params.map_err(|e| CompressError::Validation(e.body_text()))?;
    let mut multipart = multipart.map_err(|_| CompressError::MissingImage)?;

    let mut upload = None;
    let mut form_quality = None;
    while let Some(field) = multipart.next_field().await.map_err(invalid_multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(invalid_multipart)?;
                upload = Some(Upload { filename, data });
            }
            "output_quality" => {
                let text = field.text().await.map_err(invalid_multipart)?;
                form_quality = Some(parse_quality(&text)?);
            }
            other => debug!("ignoring multipart field {:?}", other),
        }
    }

    // A file input left empty is still submitted, with an empty filename.
    let upload = upload
        .filter(|u| !u.filename.is_empty())
        .ok_or(CompressError::MissingImage)?;
    let quality = params
        .output_quality
        .or(form_quality)
        .unwrap_or(state.config.default_quality);

    let compressor = state.compressor.clone();
    let report = tokio::task::spawn_blocking(move || compressor.compress(&upload, quality))
        .await
        .map_err(|e| CompressError::Internal(e.to_string()))??;

    state.stats.record_success(&report.stats);
    let totals = state.stats.snapshot();
    debug!(
        "totals: {} compressed, {} failed, {} bytes saved",
        totals.images_compressed,
        totals.failures,
        totals.bytes_saved()
    );

    Ok(CompressResponse {
        message: COMPRESS_SUCCESS_MESSAGE.to_string(),
        compression_percentage: report.stats.formatted_percentage(),
        compressed_file_size: report.stats.formatted_output_size(),
    })
}

fn invalid_multipart(e: axum::extract::multipart::MultipartError) -> CompressError {
    CompressError::Validation(format!("invalid multipart body: {}", e))
}

fn parse_quality(text: &str) -> Result<i64, CompressError> {
    text.trim().parse().map_err(|_| {
        CompressError::Validation(format!("output_quality must be an integer, got {:?}", text))
    })
}

/// GET /download_image/?index=N - one compressed image as an attachment.
async fn download_image_handler(
    State(state): State<AppState>,
    params: Result<Query<DownloadParams>, QueryRejection>,
) -> Response {
    match download_image(&state, params).await {
        Ok(resp) => resp,
        Err(e) => {
            warn!("download_image failed: {}", e);
            e.into_response()
        }
    }
}

async fn download_image(
    state: &AppState,
    params: Result<Query<DownloadParams>, QueryRejection>,
) -> Result<Response, CompressError> {
    let Query(params) = params.map_err(|e| CompressError::Validation(e.body_text()))?;
    let index = params
        .index
        .ok_or_else(|| CompressError::Validation("query parameter `index` is required".to_string()))?;
    if index < 0 {
        return Err(CompressError::Validation(
            "index must be greater than -1".to_string(),
        ));
    }

    match state.registry.resolve(index) {
        Lookup::Empty => Ok(Json(NO_IMAGE_AVAILABLE_MESSAGE).into_response()),
        Lookup::OutOfRange { index, len } => Err(CompressError::IndexOutOfRange { index, len }),
        Lookup::Found(record) => {
            debug!(
                "download index={} -> {}",
                index,
                record.output_path.display()
            );
            let data = tokio::fs::read(&record.output_path).await?;
            Ok(attachment(
                data,
                state.compressor.codec().content_type(),
                &record.original_filename,
            ))
        }
    }
}

/// GET /download-all-images/ - every registered image bundled into one zip.
async fn download_all_handler(State(state): State<AppState>) -> Response {
    match download_all(&state).await {
        Ok(resp) => resp,
        Err(e) => {
            warn!("download-all-images failed: {}", e);
            e.into_response()
        }
    }
}

async fn download_all(state: &AppState) -> Result<Response, CompressError> {
    let records = state.registry.snapshot();
    if records.is_empty() {
        return Ok(Json(NO_IMAGES_AVAILABLE_MESSAGE).into_response());
    }

    let archive_path = state.config.archive_path.clone();
    let build_path = archive_path.clone();
    tokio::task::spawn_blocking(move || build_archive(&records, &build_path))
        .await
        .map_err(|e| CompressError::Internal(e.to_string()))??;

    let data = tokio::fs::read(&archive_path).await?;
    Ok(attachment(data, "application/zip", ARCHIVE_DOWNLOAD_NAME))
}

fn attachment(data: Vec<u8>, content_type: &'static str, filename: &str) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(header::CONTENT_DISPOSITION, content_disposition(filename));
    (StatusCode::OK, headers, data).into_response()
}

/// `attachment; filename="..."`, falling back to the RFC 5987 form for names
/// that are not plain visible ASCII.
fn content_disposition(filename: &str) -> HeaderValue {
    let plain = filename
        .chars()
        .all(|c| c.is_ascii() && !c.is_ascii_control());

    let value = if plain {
        let escaped = filename.replace('\\', "\\\\").replace('"', "\\\"");
        format!("attachment; filename=\"{}\"", escaped)
    } else {
        format!("attachment; filename*=UTF-8''{}", urlencoding::encode(filename))
    };
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}
