//! Application state management

use profrag_core::config::AppConfig;
use profrag_rag::ProfessorRag;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Recommendation pipeline with its provider clients
    pub rag: Arc<ProfessorRag>,
    /// Server start time
    pub start_time: Instant,
    /// Request counter
    pub request_count: AtomicU64,
    /// Requests answered with a 4xx or 5xx status
    pub failed_count: AtomicU64,
    /// Ready status
    pub is_ready: AtomicBool,
}

impl AppState {
    /// Create new application state
    pub fn new(config: AppConfig, rag: ProfessorRag) -> Self {
        Self {
            config,
            rag: Arc::new(rag),
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
            failed_count: AtomicU64::new(0),
            is_ready: AtomicBool::new(true),
        }
    }

    /// Increment request counter
    pub fn increment_requests(&self) -> u64 {
        self.request_count.fetch_add(1, Ordering::SeqCst)
    }

    pub fn record_failure(&self) {
        self.failed_count.fetch_add(1, Ordering::SeqCst);
    }

    /// Get total request count
    pub fn get_request_count(&self) -> u64 {
        self.request_count.load(Ordering::SeqCst)
    }

    pub fn get_failed_count(&self) -> u64 {
        self.failed_count.load(Ordering::SeqCst)
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Check if service is ready
    pub fn is_ready(&self) -> bool {
        self.is_ready.load(Ordering::SeqCst)
    }

    /// Set ready status
    pub fn set_ready(&self, ready: bool) {
        self.is_ready.store(ready, Ordering::SeqCst);
    }
}
