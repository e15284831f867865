//! HTTP surface for the document processing service.
//!
//! Upload endpoints take `multipart/form-data` with a `file` field:
//!
//! - `POST /extract/{pdf,docx,pptx,ocr}` – Extract text from a document of a fixed format.
//! - `POST /extract/auto` – Dispatch on the upload's extension.
//! - `POST /extract-tables` – Detect tables in a PDF and return them as Markdown.
//! - `POST /extract-images` – Write embedded images under the configured output directory.
//! - `POST /convert/pptx-to-pdf` – Convert a presentation with LibreOffice and return the PDF.
//! - `POST /process` – Extract, then chunk with the defaults of the detected format.
//!
//! `POST /chunk` takes JSON text instead of an upload. `GET /`, `/health`, `/metrics`, and
//! `/commands` report service info, tool availability, counters, and the endpoint catalog.
//! Failures are returned as `{"detail": "..."}` with a 400, 503, or 500 status.

use crate::config::Config;
use crate::extraction::{IMAGE_EXTENSIONS, SourceFormat};
use crate::metrics::MetricsSnapshot;
use crate::processing::{
    ChunkRequest, ChunkResponse, DocumentApi, ExtractionReport, HealthReport, ImagesResponse,
    ProcessResponse, ProcessingError, TablesResponse, Upload, sanitize::sanitize_filename,
};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, rejection::JsonRejection},
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Multipart field that carries the uploaded document.
const UPLOAD_FIELD: &str = "file";

/// Build the HTTP router exposing the document processing API.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: DocumentApi + 'static,
{
    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .route("/extract/pdf", post(extract_pdf::<S>))
        .route("/extract/docx", post(extract_docx::<S>))
        .route("/extract/pptx", post(extract_pptx::<S>))
        .route("/extract/ocr", post(extract_ocr::<S>))
        .route("/extract/auto", post(extract_auto::<S>))
        .route("/extract-tables", post(extract_tables::<S>))
        .route("/extract-images", post(extract_images::<S>))
        .route("/convert/pptx-to-pdf", post(convert_to_pdf::<S>))
        .route("/chunk", post(chunk::<S>))
        .route("/process", post(process::<S>))
        .with_state(service)
}

/// Wrap a router with the CORS policy and upload size limit from `config`.
pub fn with_http_layers(router: Router, config: &Config) -> Router {
    router
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors_layer(&config.cors_allowed_origins))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    if origins.iter().any(|origin| origin == "*") {
        // Credentials cannot be combined with a wildcard origin.
        return layer.allow_origin(AllowOrigin::any());
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
}

/// Pull the `file` field out of a multipart request.
async fn read_upload(mut multipart: Multipart) -> Result<Upload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ProcessingError::InvalidUpload(err.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = sanitize_filename(field.file_name());
        let bytes = field
            .bytes()
            .await
            .map_err(|err| ProcessingError::InvalidUpload(err.body_text()))?;
        return Ok(Upload::new(filename, bytes.to_vec())?);
    }
    Err(ProcessingError::InvalidUpload(format!("missing `{UPLOAD_FIELD}` field")).into())
}

async fn service_info() -> Json<serde_json::Value> {
    let images: Vec<String> = IMAGE_EXTENSIONS.iter().map(|ext| format!(".{ext}")).collect();
    Json(json!({
        "service": "Document Processing Service",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "supported_formats": {
            "documents": [".pdf", ".docx", ".pptx"],
            "images": images,
        },
    }))
}

async fn health<S>(State(service): State<Arc<S>>) -> Json<HealthReport>
where
    S: DocumentApi,
{
    Json(service.health().await)
}

/// Return extraction and chunking counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: DocumentApi,
{
    Json(service.metrics_snapshot())
}

async fn extract_with<S>(
    service: Arc<S>,
    multipart: Multipart,
    format: SourceFormat,
) -> Result<Json<ExtractionReport>, AppError>
where
    S: DocumentApi,
{
    let upload = read_upload(multipart).await?;
    Ok(Json(service.extract(format, upload).await?))
}

async fn extract_pdf<S>(
    State(service): State<Arc<S>>,
    multipart: Multipart,
) -> Result<Json<ExtractionReport>, AppError>
where
    S: DocumentApi,
{
    extract_with(service, multipart, SourceFormat::Pdf).await
}

async fn extract_docx<S>(
    State(service): State<Arc<S>>,
    multipart: Multipart,
) -> Result<Json<ExtractionReport>, AppError>
where
    S: DocumentApi,
{
    extract_with(service, multipart, SourceFormat::Docx).await
}

async fn extract_pptx<S>(
    State(service): State<Arc<S>>,
    multipart: Multipart,
) -> Result<Json<ExtractionReport>, AppError>
where
    S: DocumentApi,
{
    extract_with(service, multipart, SourceFormat::Pptx).await
}

async fn extract_ocr<S>(
    State(service): State<Arc<S>>,
    multipart: Multipart,
) -> Result<Json<ExtractionReport>, AppError>
where
    S: DocumentApi,
{
    extract_with(service, multipart, SourceFormat::Image).await
}

/// Extract text after picking the format from the filename extension.
async fn extract_auto<S>(
    State(service): State<Arc<S>>,
    multipart: Multipart,
) -> Result<Json<ExtractionReport>, AppError>
where
    S: DocumentApi,
{
    let upload = read_upload(multipart).await?;
    Ok(Json(service.extract_auto(upload).await?))
}

async fn extract_tables<S>(
    State(service): State<Arc<S>>,
    multipart: Multipart,
) -> Result<Json<TablesResponse>, AppError>
where
    S: DocumentApi,
{
    let upload = read_upload(multipart).await?;
    Ok(Json(service.extract_tables(upload).await?))
}

async fn extract_images<S>(
    State(service): State<Arc<S>>,
    multipart: Multipart,
) -> Result<Json<ImagesResponse>, AppError>
where
    S: DocumentApi,
{
    let upload = read_upload(multipart).await?;
    Ok(Json(service.extract_images(upload).await?))
}

/// Convert a presentation and stream the PDF back as an attachment.
async fn convert_to_pdf<S>(
    State(service): State<Arc<S>>,
    multipart: Multipart,
) -> Result<Response, AppError>
where
    S: DocumentApi,
{
    let upload = read_upload(multipart).await?;
    let converted = service.convert_to_pdf(upload).await?;
    let disposition = format!("attachment; filename=\"{}\"", converted.filename);
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        converted.bytes,
    )
        .into_response())
}

/// Chunk JSON-supplied text with the strategy for its file type.
async fn chunk<S>(
    State(service): State<Arc<S>>,
    payload: Result<Json<ChunkRequest>, JsonRejection>,
) -> Result<Json<ChunkResponse>, AppError>
where
    S: DocumentApi,
{
    let Json(request) =
        payload.map_err(|rejection| ProcessingError::InvalidRequest(rejection.body_text()))?;
    let response = service.chunk(request)?;
    tracing::info!(
        strategy = %response.strategy,
        chunks = response.chunk_count,
        total_tokens = response.total_tokens,
        "Chunk request completed"
    );
    Ok(Json(response))
}

async fn process<S>(
    State(service): State<Arc<S>>,
    multipart: Multipart,
) -> Result<Json<ProcessResponse>, AppError>
where
    S: DocumentApi,
{
    let upload = read_upload(multipart).await?;
    Ok(Json(service.process(upload).await?))
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

fn upload_command(
    name: &'static str,
    path: &'static str,
    description: &'static str,
) -> CommandDescriptor {
    CommandDescriptor {
        name,
        method: "POST",
        path,
        description,
        request_example: None,
    }
}

/// Enumerate supported HTTP commands for discovery by hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            upload_command(
                "extract_pdf",
                "/extract/pdf",
                "Extract per-page text from a PDF upload (multipart field `file`).",
            ),
            upload_command(
                "extract_docx",
                "/extract/docx",
                "Extract paragraphs and table rows from a DOCX upload.",
            ),
            upload_command(
                "extract_pptx",
                "/extract/pptx",
                "Extract slide text, tables, and speaker notes from a PPTX upload.",
            ),
            upload_command(
                "extract_ocr",
                "/extract/ocr",
                "Recognize text in an image upload with Tesseract.",
            ),
            upload_command(
                "extract_auto",
                "/extract/auto",
                "Extract text, choosing the extractor from the file extension.",
            ),
            upload_command(
                "extract_tables",
                "/extract-tables",
                "Detect tables in a PDF upload and return them as Markdown.",
            ),
            upload_command(
                "extract_images",
                "/extract-images",
                "Write images embedded in a PDF, DOCX, or PPTX upload to disk.",
            ),
            upload_command(
                "convert_pptx_to_pdf",
                "/convert/pptx-to-pdf",
                "Convert a presentation to PDF with LibreOffice; responds with the PDF bytes.",
            ),
            CommandDescriptor {
                name: "chunk",
                method: "POST",
                path: "/chunk",
                description: "Split extracted text into token-bounded chunks with the strategy for its file type.",
                request_example: Some(json!({
                    "text": "--- Page 1 ---\nIntroduction\n\nBody text.",
                    "file_type": "pdf",
                    "chunk_size": 800,
                    "chunk_overlap": 150
                })),
            },
            upload_command(
                "process",
                "/process",
                "Extract text from an upload and chunk it with the format defaults.",
            ),
            CommandDescriptor {
                name: "health",
                method: "GET",
                path: "/health",
                description: "Report service status and whether Tesseract and LibreOffice are available.",
                request_example: None,
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return extraction and chunking counters.",
                request_example: None,
            },
        ],
    })
}

struct AppError(ProcessingError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else if self.0.is_unavailable() {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self.0, "Request failed");
        }
        (status, Json(json!({ "detail": self.0.to_string() }))).into_response()
    }
}

impl From<ProcessingError> for AppError {
    fn from(inner: ProcessingError) -> Self {
        Self(inner)
    }
}
