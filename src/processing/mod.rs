//! Document processing pipeline: extraction dispatch, conversion, and chunking.

mod mappers;
pub mod sanitize;
mod service;
pub mod types;

pub use service::{DocumentApi, DocumentService};
pub use types::{
    ChunkPayload, ChunkRequest, ChunkResponse, ConvertedPdf, ExtractionReport, HealthReport,
    ImagesResponse, ProcessResponse, ProcessingError, TablesResponse, Upload,
};
