#![deny(missing_docs)]

//! Core library for the document processing service.

/// HTTP routing and REST handlers.
pub mod api;
/// Structure-aware chunking of extracted text.
pub mod chunking;
/// Environment-driven configuration management.
pub mod config;
/// Text, table, and image extraction from uploaded documents.
pub mod extraction;
/// Structured logging and tracing setup.
pub mod logging;
/// Extraction and chunking counters.
pub mod metrics;
/// Document processing pipeline utilities.
pub mod processing;
