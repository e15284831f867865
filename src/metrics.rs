use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing extraction and chunking activity.
#[derive(Default)]
pub struct ServiceMetrics {
    documents_extracted: AtomicU64,
    extraction_failures: AtomicU64,
    chunk_requests: AtomicU64,
    chunks_produced: AtomicU64,
    last_chunk_size: AtomicU64,
}

impl ServiceMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful extraction.
    pub fn record_extraction(&self) {
        self.documents_extracted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an extraction that ended in an error.
    pub fn record_failure(&self) {
        self.extraction_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a chunking run, its chunk count, and the budget it used.
    pub fn record_chunking(&self, chunk_count: u64, chunk_size: u64) {
        self.chunk_requests.fetch_add(1, Ordering::Relaxed);
        self.chunks_produced.fetch_add(chunk_count, Ordering::Relaxed);
        self.last_chunk_size.store(chunk_size, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let last_chunk_size = self.last_chunk_size.load(Ordering::Relaxed);
        MetricsSnapshot {
            documents_extracted: self.documents_extracted.load(Ordering::Relaxed),
            extraction_failures: self.extraction_failures.load(Ordering::Relaxed),
            chunk_requests: self.chunk_requests.load(Ordering::Relaxed),
            chunks_produced: self.chunks_produced.load(Ordering::Relaxed),
            last_chunk_size: (last_chunk_size > 0).then_some(last_chunk_size),
        }
    }
}

/// Immutable view of service counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Documents extracted successfully since startup.
    pub documents_extracted: u64,
    /// Extraction requests that failed.
    pub extraction_failures: u64,
    /// Chunking runs served.
    pub chunk_requests: u64,
    /// Total chunks produced across all runs.
    pub chunks_produced: u64,
    /// Chunk size used by the most recent run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_chunk_size: Option<u64>,
}
