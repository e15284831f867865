//! Processing service coordinating extraction, conversion, and chunking.

use crate::{
    chunking::chunk_text,
    config::Config,
    extraction::{
        ExtractionError, OcrEngine, SourceFormat,
        convert::{convert_to_pdf, locate_soffice, pdf_name},
        extract_docx, extract_images, extract_pdf, extract_pptx, extract_tables,
    },
    metrics::{MetricsSnapshot, ServiceMetrics},
    processing::{
        mappers::{chunk_response, docx_report, ocr_report, pdf_report, pptx_report},
        sanitize::{extension_of, stem_of},
        types::{
            ChunkRequest, ChunkResponse, ConvertedPdf, ExtractionReport, HealthReport,
            ImagesResponse, ProcessResponse, ProcessingError, TablesResponse, Upload,
        },
    },
};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

const SERVICE_NAME: &str = "document-processor";
const CONVERTIBLE_EXTENSIONS: &[&str] = &["pptx", "ppt"];

/// Runs extraction, conversion, and chunking on behalf of the HTTP surface and the CLI.
///
/// The service owns the OCR engine handle, the configuration snapshot it was built with,
/// and the metrics registry. Construct it once near process start and share it through an
/// `Arc`.
pub struct DocumentService {
    config: Config,
    ocr: OcrEngine,
    metrics: Arc<ServiceMetrics>,
}

/// Abstraction over the processing pipeline used by external surfaces.
#[async_trait]
pub trait DocumentApi: Send + Sync {
    /// Extract text from an upload of a known format.
    async fn extract(
        &self,
        format: SourceFormat,
        upload: Upload,
    ) -> Result<ExtractionReport, ProcessingError>;

    /// Find tables in a PDF upload.
    async fn extract_tables(&self, upload: Upload) -> Result<TablesResponse, ProcessingError>;

    /// Write the images embedded in a PDF, DOCX, or PPTX upload to disk.
    async fn extract_images(&self, upload: Upload) -> Result<ImagesResponse, ProcessingError>;

    /// Convert a presentation to PDF.
    async fn convert_to_pdf(&self, upload: Upload) -> Result<ConvertedPdf, ProcessingError>;

    /// Chunk caller-supplied text.
    fn chunk(&self, request: ChunkRequest) -> Result<ChunkResponse, ProcessingError>;

    /// Report service status and external tool availability.
    async fn health(&self) -> HealthReport;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;

    /// Extract text, choosing the format from the upload's extension.
    async fn extract_auto(&self, upload: Upload) -> Result<ExtractionReport, ProcessingError> {
        let format = upload.detect_format()?;
        tracing::debug!(file = %upload.filename, format = format.as_str(), "Dispatching upload");
        self.extract(format, upload).await
    }

    /// Extract text and chunk it with the defaults of the detected format.
    async fn process(&self, upload: Upload) -> Result<ProcessResponse, ProcessingError> {
        let extraction = self.extract_auto(upload).await?;
        let chunking = self.chunk(ChunkRequest {
            text: extraction.text.clone(),
            file_type: extraction.document_kind().as_str().to_string(),
            chunk_size: None,
            chunk_overlap: None,
        })?;
        Ok(ProcessResponse {
            success: true,
            extraction,
            chunking,
        })
    }
}

/// Run a CPU-bound extraction step on the blocking pool.
async fn blocking<T, F>(format: SourceFormat, task: F) -> Result<T, ProcessingError>
where
    F: FnOnce() -> Result<T, ExtractionError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await?
        .map_err(|source| ProcessingError::extraction(format, source))
}

impl DocumentService {
    /// Build a service from a configuration snapshot.
    pub fn new(config: Config) -> Self {
        let ocr = OcrEngine::new(&config);
        tracing::debug!(
            tesseract = %config.tesseract_cmd,
            language = %config.ocr_language,
            image_dir = %config.image_output_dir.display(),
            "Document service initialized"
        );
        Self {
            config,
            ocr,
            metrics: Arc::new(ServiceMetrics::new()),
        }
    }

    fn soffice(&self) -> Option<PathBuf> {
        locate_soffice(self.config.soffice_path.as_deref())
    }

    async fn run_extraction(
        &self,
        format: SourceFormat,
        upload: Upload,
    ) -> Result<ExtractionReport, ProcessingError> {
        let Upload { filename, bytes } = upload;
        match format {
            SourceFormat::Pdf => {
                blocking(format, move || {
                    let pdf = extract_pdf(&bytes)?;
                    Ok(pdf_report(&filename, &bytes, pdf))
                })
                .await
            }
            SourceFormat::Docx => {
                blocking(format, move || {
                    let docx = extract_docx(&bytes)?;
                    Ok(docx_report(&filename, &bytes, docx))
                })
                .await
            }
            SourceFormat::Pptx => {
                blocking(format, move || {
                    let pptx = extract_pptx(&bytes)?;
                    Ok(pptx_report(&filename, &bytes, pptx))
                })
                .await
            }
            SourceFormat::Image => {
                let output = self
                    .ocr
                    .recognize(bytes.clone())
                    .await
                    .map_err(|source| ProcessingError::extraction(format, source))?;
                Ok(ocr_report(&filename, &bytes, output))
            }
        }
    }

    fn record<T>(&self, operation: &str, result: &Result<T, ProcessingError>) {
        match result {
            Ok(_) => self.metrics.record_extraction(),
            Err(err) => {
                self.metrics.record_failure();
                if err.is_client_error() {
                    tracing::warn!(operation, error = %err, "Request rejected");
                } else {
                    tracing::error!(operation, error = %err, "Document processing failed");
                }
            }
        }
    }
}

#[async_trait]
impl DocumentApi for DocumentService {
    async fn extract(
        &self,
        format: SourceFormat,
        upload: Upload,
    ) -> Result<ExtractionReport, ProcessingError> {
        tracing::info!(
            format = format.as_str(),
            file = %upload.filename,
            bytes = upload.bytes.len(),
            "Extracting document"
        );
        let result = self.run_extraction(format, upload).await;
        if let Ok(report) = &result {
            tracing::info!(
                format = format.as_str(),
                file = %report.filename,
                chars = report.char_count,
                empty = report.warning.is_some(),
                "Extraction finished"
            );
        }
        self.record("extract", &result);
        result
    }

    async fn extract_tables(&self, upload: Upload) -> Result<TablesResponse, ProcessingError> {
        let result: Result<TablesResponse, ProcessingError> = async {
            if upload.detect_format()? != SourceFormat::Pdf {
                return Err(ProcessingError::unsupported(&upload.filename));
            }
            let Upload { filename, bytes } = upload;
            let tables = blocking(SourceFormat::Pdf, move || {
                let pdf = extract_pdf(&bytes)?;
                Ok(extract_tables(&pdf.pages))
            })
            .await?;
            tracing::info!(file = %filename, tables = tables.len(), "Table extraction finished");
            Ok(TablesResponse {
                success: true,
                filename,
                table_count: tables.len(),
                tables,
            })
        }
        .await;
        self.record("extract_tables", &result);
        result
    }

    async fn extract_images(&self, upload: Upload) -> Result<ImagesResponse, ProcessingError> {
        let result: Result<ImagesResponse, ProcessingError> = async {
            let format = upload.detect_format()?;
            if format == SourceFormat::Image {
                return Err(ProcessingError::unsupported(&upload.filename));
            }
            let folder = format!(
                "{}_{}",
                stem_of(&upload.filename),
                &uuid::Uuid::new_v4().simple().to_string()[..8]
            );
            let output_dir = self.config.image_output_dir.join(folder);
            let Upload { filename, bytes } = upload;
            let target = output_dir.clone();
            let images = blocking(format, move || {
                std::fs::create_dir_all(&target)?;
                extract_images(format, &bytes, &target)
            })
            .await?;
            Ok(ImagesResponse {
                success: true,
                filename,
                output_dir: output_dir.display().to_string(),
                image_count: images.len(),
                images,
            })
        }
        .await;
        self.record("extract_images", &result);
        result
    }

    async fn convert_to_pdf(&self, upload: Upload) -> Result<ConvertedPdf, ProcessingError> {
        let result: Result<ConvertedPdf, ProcessingError> = async {
            if !extension_of(&upload.filename)
                .is_some_and(|ext| CONVERTIBLE_EXTENSIONS.contains(&ext.as_str()))
            {
                return Err(ProcessingError::unsupported(&upload.filename));
            }
            let soffice = self.soffice().ok_or_else(|| {
                ProcessingError::extraction(
                    SourceFormat::Pptx,
                    ExtractionError::ToolUnavailable { tool: "LibreOffice" },
                )
            })?;
            let bytes = convert_to_pdf(
                &soffice,
                &upload.filename,
                &upload.bytes,
                self.config.conversion_timeout,
            )
            .await
            .map_err(|source| ProcessingError::extraction(SourceFormat::Pptx, source))?;
            Ok(ConvertedPdf {
                filename: pdf_name(&upload.filename),
                bytes,
            })
        }
        .await;
        self.record("convert_to_pdf", &result);
        result
    }

    fn chunk(&self, request: ChunkRequest) -> Result<ChunkResponse, ProcessingError> {
        let ChunkRequest {
            text,
            file_type,
            chunk_size,
            chunk_overlap,
        } = request;
        let outcome = chunk_text(&text, &file_type, chunk_size, chunk_overlap)?;
        self.metrics.record_chunking(
            outcome.chunks.len() as u64,
            outcome.options.chunk_size as u64,
        );
        Ok(chunk_response(outcome))
    }

    async fn health(&self) -> HealthReport {
        let tesseract_available = self.ocr.is_available().await;
        let libreoffice_available = self.soffice().is_some();
        HealthReport {
            status: "healthy",
            service: SERVICE_NAME,
            version: env!("CARGO_PKG_VERSION"),
            tesseract_available,
            libreoffice_available,
        }
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::DocumentKind;
    use crate::extraction::ScratchDir;
    use crate::extraction::docx::fixtures::{docx, paragraph};
    use crate::extraction::pdf::fixtures::text_pdf;
    use crate::extraction::pptx::fixtures::{pptx, shape};

    fn service_with(config: Config) -> DocumentService {
        DocumentService::new(config)
    }

    fn service() -> DocumentService {
        service_with(Config {
            tesseract_cmd: "/nonexistent/tesseract-binary".to_string(),
            soffice_path: None,
            ..Config::default()
        })
    }

    #[tokio::test]
    async fn extracts_docx_and_records_metrics() {
        let service = service();
        let body = format!("{}{}", paragraph("First"), paragraph("Second"));
        let upload = Upload::new("memo.docx", docx(&body)).unwrap();

        let report = service.extract_auto(upload).await.unwrap();
        assert_eq!(report.text, "First\n\nSecond");
        assert_eq!(report.paragraphs, Some(2));
        assert_eq!(report.format, "docx");
        assert_eq!(report.sha256.len(), 64);
        assert_eq!(service.metrics_snapshot().documents_extracted, 1);
    }

    #[tokio::test]
    async fn corrupt_documents_count_as_failures() {
        let service = service();
        let upload = Upload::new("broken.pdf", b"not a pdf".to_vec()).unwrap();
        let err = service.extract(SourceFormat::Pdf, upload).await.unwrap_err();
        assert!(matches!(err, ProcessingError::Extraction { format: "pdf", .. }));
        assert!(!err.is_client_error());
        assert_eq!(service.metrics_snapshot().extraction_failures, 1);
    }

    #[tokio::test]
    async fn ocr_without_tesseract_is_unavailable() {
        let service = service();
        let upload = Upload::new("scan.png", vec![1, 2, 3]).unwrap();
        let err = service.extract_auto(upload).await.unwrap_err();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn process_chunks_with_the_detected_strategy() {
        let service = service();
        let deck = pptx(&[
            (shape(Some("title"), &["Intro"]).as_str(), None),
            (shape(Some("title"), &["Results"]).as_str(), None),
        ]);
        let upload = Upload::new("deck.pptx", deck).unwrap();

        let response = service.process(upload).await.unwrap();
        assert_eq!(response.chunking.strategy, DocumentKind::Pptx);
        assert_eq!(response.chunking.chunk_count, 2);
        assert_eq!(response.chunking.chunks[1].metadata.slide_number, Some(2));
        assert_eq!(service.metrics_snapshot().chunk_requests, 1);
    }

    #[tokio::test]
    async fn tables_require_a_pdf() {
        let service = service();
        let upload = Upload::new("memo.docx", docx(&paragraph("x"))).unwrap();
        let err = service.extract_tables(upload).await.unwrap_err();
        assert!(matches!(err, ProcessingError::UnsupportedFileType { .. }));

        let pdf = text_pdf(&["Name  Score"]);
        let upload = Upload::new("scores.pdf", pdf).unwrap();
        let response = service.extract_tables(upload).await.unwrap();
        assert_eq!(response.table_count, response.tables.len());
    }

    #[tokio::test]
    async fn images_land_in_a_per_request_folder() {
        let scratch = ScratchDir::new().unwrap();
        let service = service_with(Config {
            image_output_dir: scratch.path().to_path_buf(),
            ..Config::default()
        });
        let upload = Upload::new("memo report.docx", docx(&paragraph("x"))).unwrap();

        let response = service.extract_images(upload).await.unwrap();
        assert_eq!(response.image_count, 0);
        assert!(response.output_dir.contains("memo_report_"));
        assert!(PathBuf::from(&response.output_dir).is_dir());
    }

    #[tokio::test]
    async fn conversion_rejects_non_presentations() {
        let service = service();
        let upload = Upload::new("memo.docx", vec![1]).unwrap();
        let err = service.convert_to_pdf(upload).await.unwrap_err();
        assert!(matches!(err, ProcessingError::UnsupportedFileType { .. }));
    }

    #[test]
    fn chunk_rejects_zero_budget() {
        let service = service();
        let err = service
            .chunk(ChunkRequest {
                text: "Some text".to_string(),
                file_type: "pdf".to_string(),
                chunk_size: Some(0),
                chunk_overlap: None,
            })
            .unwrap_err();
        assert!(err.is_client_error());
    }
}
