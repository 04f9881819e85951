//! HTTP Server for the sheetjson API.
//!
//! Uploaded workbooks are decoded once and kept in the session cache under a
//! generated id; later requests convert or validate against that id.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                          |
//! |--------|-------------------|--------------------------------------|
//! | GET    | `/health`         | Health check                         |
//! | POST   | `/api/upload`     | Upload a spreadsheet or CSV          |
//! | POST   | `/api/convert`    | Convert sheets of an upload to JSON  |
//! | POST   | `/api/validate`   | Duplicate/empty audit of a column    |
//! | POST   | `/api/preview`    | First rows of a sheet                |
//! | GET    | `/api/logs`       | SSE stream for real-time logs        |

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{
    convert::Infallible,
    net::SocketAddr,
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use super::logs::{log_error, log_info, log_info_indent, log_success, LOG_BROADCASTER};
use super::types::{
    error_response, ConvertBody, ConvertResponse, PreviewBody, UploadResponse, ValidateBody,
    ValidateResponse,
};
use crate::cache::{CachedWorkbook, SheetCache, SheetSelection};
use crate::config::ServerConfig;
use crate::error::{DecodeError, PipelineError, ServerError, ServerResult};
use crate::transform::pipeline::{convert_workbook, preview_workbook};
use crate::transform::preview::SheetPreview;
use crate::validation::validate_column;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    cache: Arc<Mutex<SheetCache>>,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            cache: Arc::new(Mutex::new(SheetCache::with_capacity(config.cache_capacity))),
        }
    }

    fn cache(&self) -> ServerResult<MutexGuard<'_, SheetCache>> {
        self.cache
            .lock()
            .map_err(|_| ServerError::Internal("sheet cache lock poisoned".to_string()))
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::WorkbookNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Pipeline(PipelineError::Convert(_)) => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(PipelineError::Decode(DecodeError::SheetNotFound(_))) => {
                StatusCode::NOT_FOUND
            }
            ServerError::Pipeline(PipelineError::Decode(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Pipeline(_) | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        log_error(self.to_string());
        (status, Json(error_response(&self.to_string()))).into_response()
    }
}

/// Build the application router.
pub fn router(config: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/upload", post(upload))
        .route("/api/convert", post(convert))
        .route("/api/validate", post(validate))
        .route("/api/preview", post(preview))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors)
        .with_state(AppState::new(config))
}

/// Start the HTTP server
pub async fn start_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(&config);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    println!("🚀 sheetjson server running on http://localhost:{}", config.port);
    println!("   POST /api/upload   - Upload spreadsheet or CSV");
    println!("   POST /api/convert  - Convert to JSON");
    println!("   POST /api/validate - Column duplicate audit");
    println!("   POST /api/preview  - Sheet preview");
    println!("   GET  /api/logs     - SSE log stream");
    println!("   GET  /health       - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "sheetjson",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "upload": "POST /api/upload",
            "convert": "POST /api/convert",
            "validate": "POST /api/validate",
            "preview": "POST /api/preview",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Upload endpoint: decode, normalize and cache every sheet.
async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ServerResult<Json<UploadResponse>> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            file_name = field.file_name().map(|s| s.to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
            file_data = Some(bytes.to_vec());
        }
    }

    let bytes = file_data.ok_or_else(|| ServerError::BadRequest("No file provided".to_string()))?;
    log_info(format!(
        "📄 Upload: {} ({} bytes)",
        file_name.as_deref().unwrap_or("unknown"),
        bytes.len()
    ));

    let workbook_id = Uuid::new_v4().to_string();
    let workbook = decode_upload(workbook_id, file_name.clone(), bytes).await?;
    for info in &workbook.infos {
        log_info_indent(
            format!("{} ({} rows × {} columns)", info.name, info.row_count, info.col_count),
            1,
        );
    }

    let response = UploadResponse::new(&workbook, file_name);
    state.cache()?.insert(workbook);
    log_success(format!("Cached workbook {}", response.workbook_id));
    Ok(Json(response))
}

/// Decode off the async runtime.
async fn decode_upload(
    workbook_id: String,
    file_name: Option<String>,
    bytes: Vec<u8>,
) -> ServerResult<CachedWorkbook> {
    let decoded = tokio::task::spawn_blocking(move || {
        let stem = file_name
            .as_deref()
            .and_then(|name| Path::new(name).file_stem())
            .and_then(|s| s.to_str());
        CachedWorkbook::decode_with_hint(&workbook_id, &bytes, stem)
    })
    .await
    .map_err(|e| ServerError::Internal(format!("decode task failed: {}", e)))?;
    Ok(decoded?)
}

/// Convert endpoint.
async fn convert(
    State(state): State<AppState>,
    Json(body): Json<ConvertBody>,
) -> ServerResult<Json<ConvertResponse>> {
    let request = body.request();
    let output = {
        let cache = state.cache()?;
        let workbook = cache
            .get(&body.workbook_id)
            .ok_or_else(|| ServerError::WorkbookNotFound(body.workbook_id.clone()))?;
        convert_workbook(workbook, &request)?
    };

    log_success(format!(
        "Converted {} sheet(s) into {} document(s)",
        output.sheets.len(),
        output.documents
    ));
    Ok(Json(ConvertResponse::from(output)))
}

/// Validate endpoint.
async fn validate(
    State(state): State<AppState>,
    Json(body): Json<ValidateBody>,
) -> ServerResult<Json<ValidateResponse>> {
    let cache = state.cache()?;
    let workbook = cache
        .get(&body.workbook_id)
        .ok_or_else(|| ServerError::WorkbookNotFound(body.workbook_id.clone()))?;

    let selection = match &body.sheet {
        Some(name) => SheetSelection::Named(vec![name.clone()]),
        None => SheetSelection::First,
    };
    let sheet = workbook
        .select(&selection)?
        .into_iter()
        .next()
        .ok_or(DecodeError::NoSheets)?;

    Ok(Json(ValidateResponse {
        sheet: sheet.name.clone(),
        report: validate_column(sheet, &body.column),
    }))
}

/// Preview endpoint.
async fn preview(
    State(state): State<AppState>,
    Json(body): Json<PreviewBody>,
) -> ServerResult<Json<SheetPreview>> {
    let cache = state.cache()?;
    let workbook = cache
        .get(&body.workbook_id)
        .ok_or_else(|| ServerError::WorkbookNotFound(body.workbook_id.clone()))?;
    Ok(Json(preview_workbook(workbook, body.sheet.as_deref(), body.rows)?))
}
